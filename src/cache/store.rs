//! Cache store - owns the cache directory and reads/writes artifacts
//!
//! Writes go to a temporary file in the target directory which is renamed
//! over the final path once fully written, so readers never see a partial
//! artifact. The temporary file is removed on every failure path.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::cache::cached::CacheBuilder;
use crate::cache::codec::Codec;
use crate::core::error::{CacheError, Result};
use crate::core::fingerprint::HashAlgorithm;
use crate::core::value::Value;

/// Store-wide settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageConfig {
    /// Print a notice on every cache hit
    pub verbose: bool,

    /// Digest used for `hash`-classified template fields
    pub algorithm: HashAlgorithm,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            verbose: true,
            algorithm: HashAlgorithm::default(),
        }
    }
}

/// A cache rooted at one directory
#[derive(Debug, Clone)]
pub struct Storage {
    directory: PathBuf,
    config: StorageConfig,
}

impl Storage {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self::with_config(directory, StorageConfig::default())
    }

    pub fn with_config(directory: impl Into<PathBuf>, config: StorageConfig) -> Self {
        Self {
            directory: directory.into(),
            config,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Load the artifact at `path`, decoding by extension
    pub fn load(&self, path: &Path) -> Result<Value> {
        let file = File::open(path).map_err(|e| CacheError::deserialization(path, e))?;
        Codec::for_path(path).decode(path, BufReader::new(file))
    }

    /// Atomically write `value` to `path`, encoding by extension
    pub fn save(&self, path: &Path, value: &Value) -> Result<()> {
        let codec = Codec::for_path(path);
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        ensure_dir(&parent)?;

        let mut tmp = NamedTempFile::new_in(&parent).map_err(|e| CacheError::io(&parent, e))?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            codec.encode(path, value, &mut writer)?;
            writer.flush().map_err(|e| CacheError::io(path, e))?;
        }
        tmp.as_file()
            .sync_all()
            .map_err(|e| CacheError::io(path, e))?;
        tmp.persist(path)
            .map_err(|e| CacheError::io(path, e.error))?;

        tracing::debug!(path = %path.display(), %codec, "saved artifact");
        Ok(())
    }

    /// Start building a cached function whose filenames follow `template`
    pub fn cache(&self, template: &str) -> CacheBuilder {
        CacheBuilder::new(self.clone(), template)
    }
}

/// Ensure a directory exists
pub fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| CacheError::io(dir, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::array::NdArray;
    use tempfile::tempdir;

    #[test]
    fn test_save_creates_parent_dirs() {
        let temp = tempdir().unwrap();
        let storage = Storage::new(temp.path());
        let path = temp.path().join("deep/nested/value.json");

        storage.save(&path, &Value::list([1, 2, 3])).unwrap();
        assert!(path.exists());
        assert_eq!(storage.load(&path).unwrap(), Value::list([1, 2, 3]));
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let temp = tempdir().unwrap();
        let storage = Storage::new(temp.path());
        let path = temp.path().join("a.npy");

        storage
            .save(&path, &Value::Array(NdArray::from_fn(vec![3], |i| i as f64).unwrap()))
            .unwrap();

        let names: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.npy"]);
    }

    #[test]
    fn test_failed_save_keeps_previous_artifact() {
        let temp = tempdir().unwrap();
        let storage = Storage::new(temp.path());
        let path = temp.path().join("a.npy");

        let original = Value::Array(NdArray::from_fn(vec![2], |i| i as f64).unwrap());
        storage.save(&path, &original).unwrap();

        let err = storage.save(&path, &Value::from("not an array")).unwrap_err();
        assert!(matches!(err, CacheError::Serialization { .. }));
        assert_eq!(storage.load(&path).unwrap(), original);
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_overwrite_replaces_wholesale() {
        let temp = tempdir().unwrap();
        let storage = Storage::new(temp.path());
        let path = temp.path().join("v");

        storage.save(&path, &Value::from("a much longer first value")).unwrap();
        storage.save(&path, &Value::from("b")).unwrap();
        assert_eq!(storage.load(&path).unwrap(), Value::from("b"));
    }

    #[test]
    fn test_load_missing_is_deserialization_error() {
        let temp = tempdir().unwrap();
        let storage = Storage::new(temp.path());
        let err = storage.load(&temp.path().join("missing.npy")).unwrap_err();
        assert!(matches!(err, CacheError::Deserialization { .. }));
    }

    #[test]
    fn test_load_corrupt_is_deserialization_error() {
        let temp = tempdir().unwrap();
        let storage = Storage::new(temp.path());
        let path = temp.path().join("broken.npz");
        fs::write(&path, b"PK\x03\x04 definitely not a zip").unwrap();

        let err = storage.load(&path).unwrap_err();
        assert!(matches!(err, CacheError::Deserialization { .. }));
    }

    #[test]
    fn test_default_config() {
        let config = StorageConfig::default();
        assert!(config.verbose);
        assert_eq!(config.algorithm, HashAlgorithm::Sha1);
    }
}

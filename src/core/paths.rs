//! Path normalization utilities
//!
//! Report paths use '/' as separator and are relative to the cache root.

use std::path::Path;

/// Normalize a path to use '/' as separator (for cross-platform consistency)
pub fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Make a path relative to the root directory
pub fn make_relative(path: &Path, root: &Path) -> Option<String> {
    path.strip_prefix(root).ok().map(normalize_path)
}

/// Relative to `root` when under it, otherwise the normalized path itself
pub fn display_path(path: &Path, root: &Path) -> String {
    make_relative(path, root).unwrap_or_else(|| normalize_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        let path = Path::new("tmp/image-(50, 50).npy");
        assert_eq!(normalize_path(path), "tmp/image-(50, 50).npy");
    }

    #[test]
    fn test_make_relative() {
        let root = Path::new("/cache");
        let path = Path::new("/cache/sub/a.npz");
        assert_eq!(make_relative(path, root), Some("sub/a.npz".to_string()));
    }

    #[test]
    fn test_make_relative_not_under_root() {
        let root = Path::new("/cache");
        let path = Path::new("/other/file");
        assert_eq!(make_relative(path, root), None);
    }

    #[test]
    fn test_display_path_falls_back() {
        let root = Path::new("/cache");
        assert_eq!(display_path(Path::new("/cache/x"), root), "x");
        assert_eq!(display_path(Path::new("/elsewhere/x"), root), "/elsewhere/x");
    }
}

//! Bundled demonstration of the cache
//!
//! Four cached functions share one store: an array saved as `.npy`, a set of
//! named arrays saved as `.npz`, a one-element list saved as JSON, and the
//! identity function whose filename uses a hashed argument. A second run
//! against the same root loads every result from disk.

use anyhow::{Context, Result};
use xxhash_rust::xxh3::xxh3_64_with_seed;

use crate::cache::store::Storage;
use crate::core::args::Args;
use crate::core::array::NdArray;
use crate::core::model::{ResultItem, ResultSet};
use crate::core::paths::display_path;
use crate::core::render::{RenderConfig, Renderer};
use crate::core::util::truncate_string;
use crate::core::value::Value;

const SUMMARY_CHARS: usize = 120;

/// Dimensions from a `(rows, cols)`-style argument
fn dims(shape: &Value) -> Result<Vec<usize>> {
    let items = match shape {
        Value::Tuple(items) | Value::List(items) => items.as_slice(),
        other => std::slice::from_ref(other),
    };
    items
        .iter()
        .map(|d| {
            d.as_i64()
                .and_then(|d| usize::try_from(d).ok())
                .with_context(|| format!("invalid dimension {}", d.repr()))
        })
        .collect()
}

/// Uniform values in `[0, 1)`, reproducible per seed
fn random_array(shape: &Value, seed: u64) -> Result<NdArray> {
    let dims = dims(shape)?;
    let array = NdArray::from_fn(dims, |i| {
        let bits = xxh3_64_with_seed(&(i as u64).to_le_bytes(), seed) >> 11;
        bits as f64 / (1u64 << 53) as f64
    })?;
    Ok(array)
}

fn arg<'a>(args: &'a Args, name: &str, index: usize) -> Result<&'a Value> {
    args.lookup(name, Some(index))
        .with_context(|| format!("missing argument {}", name))
}

fn describe(value: &Value) -> String {
    truncate_string(&value.to_string(), SUMMARY_CHARS)
}

/// Run every demo function once and report each result
pub fn demo_results(storage: &Storage) -> crate::core::error::Result<ResultSet> {
    let root = storage.directory();
    let mut result_set = ResultSet::new();

    let f = storage
        .cache("image-{shape}.npy")
        .params(["shape"])
        .build(|args: &Args| Ok(Value::Array(random_array(arg(args, "shape", 0)?, 0)?)))?;

    let g = storage
        .cache("images-{shape}-{size}.npz")
        .params(["shape", "size"])
        .build(|args: &Args| {
            let shape = arg(args, "shape", 0)?;
            let size = arg(args, "size", 1)?
                .as_i64()
                .context("size must be an integer")?;
            let mut arrays = Vec::new();
            for i in 0..size {
                arrays.push((i.to_string(), random_array(shape, i as u64 + 1)?));
            }
            Ok(Value::dict(arrays))
        })?;

    let h = storage
        .cache("plain-{x}")
        .params(["x"])
        .build(|args: &Args| Ok(Value::List(vec![arg(args, "x", 0)?.clone()])))?;

    let k = storage
        .cache("hashed-{x}")
        .params(["x"])
        .hash(["x"])
        .build(|args: &Args| Ok(arg(args, "x", 0)?.clone()))?;

    let image_args = Args::new().arg(Value::tuple([50, 50]));
    let images_args = Args::new().arg(Value::tuple([50, 50])).arg(20);
    let plain_args = Args::new().arg("hello");
    let hashed_args = Args::new().arg(Value::list(0..100i64));

    let image = f.call(&image_args)?;
    result_set.push(
        ResultItem::value(describe(&image))
            .with_path(display_path(&f.cache_filename(&image_args)?, root)),
    );

    let images = g.call(&images_args)?;
    let count = images.as_dict().map_or(0, |d| d.len());
    result_set.push(
        ResultItem::value(format!("{} arrays", count))
            .with_path(display_path(&g.cache_filename(&images_args)?, root)),
    );

    let plain = h.call(&plain_args)?;
    result_set.push(
        ResultItem::value(describe(&plain))
            .with_path(display_path(&h.cache_filename(&plain_args)?, root))
            .with_data(plain.to_json()),
    );

    // Read back without computing
    let loaded = h.load(&plain_args)?;
    result_set.push(
        ResultItem::value(format!("loaded {}", describe(&loaded)))
            .with_path(display_path(&h.cache_filename(&plain_args)?, root)),
    );

    let hashed = k.call(&hashed_args)?;
    result_set.push(
        ResultItem::value(describe(&hashed))
            .with_path(display_path(&k.cache_filename(&hashed_args)?, root)),
    );

    Ok(result_set)
}

/// Run the demo command
pub fn run_demo(storage: &Storage, config: RenderConfig) -> Result<()> {
    let result_set = demo_results(storage)
        .with_context(|| format!("Demo failed under {}", storage.directory().display()))?;

    println!("{}", Renderer::with_config(config).render(&result_set));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::StorageConfig;
    use tempfile::tempdir;

    #[test]
    fn test_random_array_in_unit_interval() {
        let array = random_array(&Value::tuple([4, 5]), 7).unwrap();
        assert_eq!(array.shape(), &[4, 5]);
        match array.data() {
            crate::core::array::ArrayData::F64(values) => {
                assert!(values.iter().all(|v| (0.0..1.0).contains(v)));
            }
            other => panic!("unexpected dtype {:?}", other.dtype()),
        }
    }

    #[test]
    fn test_dims_rejects_negative() {
        assert!(dims(&Value::tuple([-1, 2])).is_err());
        assert_eq!(dims(&Value::Int(3)).unwrap(), vec![3]);
    }

    #[test]
    fn test_demo_writes_artifacts_and_rerun_matches() {
        let temp = tempdir().unwrap();
        let storage = Storage::with_config(
            temp.path(),
            StorageConfig {
                verbose: false,
                ..StorageConfig::default()
            },
        );

        let first = demo_results(&storage).unwrap();
        let second = demo_results(&storage).unwrap();

        assert!(temp.path().join("image-(50, 50).npy").exists());
        assert!(temp.path().join("images-(50, 50)-20.npz").exists());
        assert!(temp.path().join("plain-hello").exists());

        let paths: Vec<_> = first.items.iter().map(|i| i.path.clone()).collect();
        let again: Vec<_> = second.items.iter().map(|i| i.path.clone()).collect();
        assert_eq!(paths, again);
        assert_eq!(first.items[2].summary.as_deref(), Some("['hello']"));
        assert!(paths[4].as_deref().unwrap().starts_with("hashed-"));
    }
}

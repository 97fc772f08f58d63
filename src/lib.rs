//! memostash - disk-backed memoization
//!
//! Wraps a compute function so repeated calls with equal arguments read a
//! previously computed result from a file. The filename is rendered from a
//! template over the call's arguments, and the file's extension picks the
//! encoding:
//! - `.npy`: a single dense array
//! - `.npz`: a compressed collection of named arrays
//! - anything else: any value, as JSON
//!
//! ```no_run
//! use memostash::{Args, NdArray, Storage, Value};
//!
//! let storage = Storage::new("tmp");
//! let image = storage
//!     .cache("image-{shape}.npy")
//!     .params(["shape"])
//!     .build(|_args: &Args| Ok(Value::Array(NdArray::from_fn(vec![50, 50], |i| i as f64)?)))?;
//!
//! let args = Args::new().arg(Value::tuple([50, 50]));
//! let result = image.call(&args)?; // computes and writes tmp/image-(50, 50).npy
//! let again = image.call(&args)?; // loads from disk
//! assert_eq!(result, again);
//! # Ok::<(), memostash::CacheError>(())
//! ```

pub mod cache;
pub mod cli;
pub mod core;
pub mod demo;

pub use crate::cache::cached::{CacheBuilder, CachedFn};
pub use crate::cache::codec::Codec;
pub use crate::cache::memo::Memoize;
pub use crate::cache::resolver::PathResolver;
pub use crate::cache::store::{Storage, StorageConfig};
pub use crate::core::args::{Args, Signature};
pub use crate::core::array::{ArrayData, DType, NdArray};
pub use crate::core::error::{CacheError, Result};
pub use crate::core::fingerprint::{fingerprint, HashAlgorithm};
pub use crate::core::template::Template;
pub use crate::core::value::Value;

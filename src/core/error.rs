//! Error taxonomy for the cache library
//!
//! Command handlers wrap these in `anyhow` with context; library callers
//! can match on the variants.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CacheError>;

#[derive(Debug, Error)]
pub enum CacheError {
    /// A template field could not be bound from the call's arguments
    #[error("couldn't find argument `{field}` needed for `{template}`")]
    MissingArgument { field: String, template: String },

    /// A template field names a parameter the function does not declare
    #[error("template `{template}` references `{field}`, which is not a declared parameter")]
    UnknownField { field: String, template: String },

    #[error("invalid template `{template}`: {reason}")]
    InvalidTemplate { template: String, reason: String },

    /// Parameter list declared twice under the same name
    #[error("parameter `{0}` is declared more than once")]
    DuplicateParameter(String),

    /// A field value cannot be rendered with its format spec
    #[error("cannot format field `{field}` with spec `{spec}`: {reason}")]
    Format {
        field: String,
        spec: String,
        reason: String,
    },

    #[error("shape {shape:?} holds {expected} elements but {actual} were given")]
    Shape {
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },

    /// The product of the dimensions does not fit in `usize`
    #[error("shape {0:?} overflows the addressable element count")]
    ShapeOverflow(Vec<usize>),

    #[error("failed to load {}: {reason}", path.display())]
    Deserialization { path: PathBuf, reason: String },

    #[error("failed to save {}: {reason}", path.display())]
    Serialization { path: PathBuf, reason: String },

    /// The wrapped compute function failed
    #[error("compute function failed")]
    Compute(#[source] anyhow::Error),

    #[error("I/O error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CacheError {
    pub(crate) fn deserialization(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        CacheError::Deserialization {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn serialization(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        CacheError::Serialization {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }
}

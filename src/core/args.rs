//! Call arguments and declared parameter lists

use std::collections::{BTreeMap, HashSet};

use crate::core::error::{CacheError, Result};
use crate::core::value::Value;

/// Positional and keyword arguments for one call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    pub positional: Vec<Value>,
    pub keyword: BTreeMap<String, Value>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Set a keyword argument
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keyword.insert(name.into(), value.into());
        self
    }

    /// Keyword lookup first, then the positional slot if one is known
    pub fn lookup(&self, name: &str, index: Option<usize>) -> Option<&Value> {
        self.keyword
            .get(name)
            .or_else(|| index.and_then(|i| self.positional.get(i)))
    }

    /// `(positional tuple, keyword dict)` as a single value, for fingerprinting
    pub fn to_value(&self) -> Value {
        Value::Tuple(vec![
            Value::Tuple(self.positional.clone()),
            Value::Dict(self.keyword.clone()),
        ])
    }
}

/// Declared parameter names of a wrapped function
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    positional: Vec<String>,
    keyword_only: Vec<String>,
}

impl Signature {
    pub fn new<I, S>(positional: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_keyword_only(positional, Vec::<String>::new())
    }

    pub fn with_keyword_only<I, S, K, T>(positional: I, keyword_only: K) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        K: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let positional: Vec<String> = positional.into_iter().map(Into::into).collect();
        let keyword_only: Vec<String> = keyword_only.into_iter().map(Into::into).collect();

        let mut seen = HashSet::new();
        for name in positional.iter().chain(&keyword_only) {
            if !seen.insert(name.as_str()) {
                return Err(CacheError::DuplicateParameter(name.clone()));
            }
        }

        Ok(Self {
            positional,
            keyword_only,
        })
    }

    /// Positional slot of `name`; `None` for keyword-only or unknown names
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.positional.iter().position(|p| p == name)
    }

    pub fn declares(&self, name: &str) -> bool {
        self.index_of(name).is_some() || self.keyword_only.iter().any(|k| k == name)
    }
}

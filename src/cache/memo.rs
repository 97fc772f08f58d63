//! In-process memoization keyed by argument fingerprints
//!
//! Entries live as long as the `Memoize` value and are never evicted, so
//! memory grows with the number of distinct argument sets. The table sits
//! in a `RefCell`, which keeps the type `!Sync`: share it across threads
//! only behind your own lock.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::core::args::Args;
use crate::core::error::{CacheError, Result};
use crate::core::fingerprint::{fingerprint, HashAlgorithm};
use crate::core::value::Value;

pub struct Memoize<F> {
    func: F,
    algorithm: HashAlgorithm,
    entries: RefCell<HashMap<String, Value>>,
}

impl<F> Memoize<F>
where
    F: Fn(&Args) -> anyhow::Result<Value>,
{
    pub fn new(func: F) -> Self {
        Self::with_algorithm(func, HashAlgorithm::default())
    }

    pub fn with_algorithm(func: F, algorithm: HashAlgorithm) -> Self {
        Self {
            func,
            algorithm,
            entries: RefCell::new(HashMap::new()),
        }
    }

    /// Return the stored result for equal arguments, computing it once
    pub fn call(&self, args: &Args) -> Result<Value> {
        let key = fingerprint(&args.to_value(), self.algorithm);

        let cached = self.entries.borrow().get(&key).cloned();
        if let Some(value) = cached {
            return Ok(value);
        }

        // No borrow is held here, so `func` may call back into this memo
        let result = (self.func)(args).map_err(CacheError::Compute)?;
        self.entries.borrow_mut().insert(key, result.clone());
        Ok(result)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

//! Cached functions - read-through/write-through wrapper around a compute
//! function, keyed by the path its arguments resolve to

use colored::Colorize;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use crate::cache::resolver::{PathResolver, Transform};
use crate::cache::store::{ensure_dir, Storage};
use crate::core::args::{Args, Signature};
use crate::core::error::{CacheError, Result};
use crate::core::template::Template;
use crate::core::value::Value;

/// Configures a cached function; created by [`Storage::cache`]
pub struct CacheBuilder {
    storage: Storage,
    template: String,
    positional: Vec<String>,
    keyword_only: Vec<String>,
    hash: HashSet<String>,
    transforms: HashMap<String, Transform>,
    verbose: bool,
}

impl CacheBuilder {
    pub(crate) fn new(storage: Storage, template: &str) -> Self {
        Self {
            storage,
            template: template.to_string(),
            positional: Vec::new(),
            keyword_only: Vec::new(),
            hash: HashSet::new(),
            transforms: HashMap::new(),
            verbose: true,
        }
    }

    /// Declared positional parameters, in order
    pub fn params<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.positional.extend(names.into_iter().map(Into::into));
        self
    }

    /// Declared keyword-only parameters
    pub fn keyword_only<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keyword_only.extend(names.into_iter().map(Into::into));
        self
    }

    /// Fields replaced by their content fingerprint
    pub fn hash<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hash.extend(names.into_iter().map(Into::into));
        self
    }

    /// Field rendered through `f`
    pub fn transform(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&Value) -> String + 'static,
    ) -> Self {
        self.transforms.insert(name.into(), Box::new(f));
        self
    }

    /// Per-function hit notice; also gated by the store's own flag
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Wrap `func`. Template and parameter problems are reported here,
    /// before the first call.
    pub fn build<F>(self, func: F) -> Result<CachedFn<F>>
    where
        F: Fn(&Args) -> anyhow::Result<Value>,
    {
        let template = Template::parse(&self.template)?;
        let signature = Signature::with_keyword_only(self.positional, self.keyword_only)?;
        let resolver = PathResolver::new(
            template,
            &signature,
            &self.hash,
            self.transforms,
            self.storage.directory(),
            self.storage.config().algorithm,
        )?;

        Ok(CachedFn {
            storage: self.storage,
            resolver,
            verbose: self.verbose,
            func,
        })
    }
}

/// A compute function backed by the disk cache
pub struct CachedFn<F> {
    storage: Storage,
    resolver: PathResolver,
    verbose: bool,
    func: F,
}

impl<F> CachedFn<F>
where
    F: Fn(&Args) -> anyhow::Result<Value>,
{
    /// Return the cached result for `args`, computing and saving it on a miss.
    ///
    /// Results that are neither arrays nor truthy are returned but not
    /// saved, so they are recomputed on every call. A corrupt artifact is
    /// an error, never a silent recompute.
    pub fn call(&self, args: &Args) -> Result<Value> {
        let path = self.resolver.resolve(args)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_dir(parent)?;
        }

        if path.exists() {
            if self.verbose && self.storage.config().verbose {
                eprintln!("{} {}", "Loading from cache:".green(), path.display());
            }
            return self.storage.load(&path);
        }

        tracing::debug!(path = %path.display(), "cache miss");
        let result = (self.func)(args).map_err(CacheError::Compute)?;

        if result.is_array_like() || result.is_truthy() {
            self.storage.save(&path, &result)?;
        } else {
            tracing::debug!(
                path = %path.display(),
                kind = result.type_name(),
                "empty result, not cached"
            );
        }

        Ok(result)
    }

    /// Path the result for `args` is cached at; computes nothing
    pub fn cache_filename(&self, args: &Args) -> Result<PathBuf> {
        self.resolver.resolve(args)
    }

    /// Load the cached result for `args` without computing it
    pub fn load(&self, args: &Args) -> Result<Value> {
        let path = self.resolver.resolve(args)?;
        self.storage.load(&path)
    }

    pub fn template(&self) -> &Template {
        self.resolver.template()
    }
}

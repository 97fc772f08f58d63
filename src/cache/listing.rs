//! Artifact inventory
//!
//! Walks the cache root and reports every file as an artifact. Hidden
//! files are included and ignore files are not honoured: everything under
//! the root is cache content.

use anyhow::Context;
use ignore::WalkBuilder;
use std::path::Path;

use crate::cache::codec::Codec;
use crate::cache::store::Storage;
use crate::core::error::{CacheError, Result};
use crate::core::model::{Meta, ResultItem, ResultSet};
use crate::core::paths::make_relative;
use crate::core::render::{RenderConfig, Renderer};
use crate::core::util::{format_ms, get_file_size, get_mtime_ms};

/// List artifacts under `root`, sorted by path
pub fn list_artifacts(root: &Path) -> Result<ResultSet> {
    if !root.exists() {
        return Ok(ResultSet::new());
    }

    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(false)
        .ignore(false)
        .parents(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false);

    let mut result_set = ResultSet::new();

    for entry in builder.build() {
        let entry = entry.map_err(|e| CacheError::io(root, std::io::Error::other(e.to_string())))?;
        let path = entry.path();

        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        let relative = match make_relative(path, root) {
            Some(r) => r,
            None => continue,
        };

        let mut meta = Meta::default();
        if let Ok(size) = get_file_size(path) {
            meta.size = Some(size);
        }
        if let Ok(mtime) = get_mtime_ms(path) {
            meta.mtime_ms = Some(mtime);
            meta.modified = format_ms(mtime);
        }

        result_set.push(ResultItem::artifact(relative, Codec::for_path(path)).with_meta(meta));
    }

    result_set.sort();
    Ok(result_set)
}

/// Run the list command
pub fn run_list(storage: &Storage, config: RenderConfig) -> anyhow::Result<()> {
    let result_set = list_artifacts(storage.directory())
        .with_context(|| format!("Failed to list {}", storage.directory().display()))?;

    let renderer = Renderer::with_config(config);
    println!("{}", renderer.render(&result_set));

    Ok(())
}

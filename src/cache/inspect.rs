//! Inspection commands - describe artifacts, fingerprint values and resolve
//! templates without computing anything

use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::cache::codec::Codec;
use crate::cache::resolver::PathResolver;
use crate::cache::store::Storage;
use crate::core::args::{Args, Signature};
use crate::core::fingerprint::{fingerprint, HashAlgorithm};
use crate::core::model::{Meta, ResultItem, ResultSet};
use crate::core::paths::display_path;
use crate::core::render::{RenderConfig, Renderer};
use crate::core::template::Template;
use crate::core::util::{format_ms, get_file_size, get_mtime_ms, truncate_string};
use crate::core::value::Value;

const SUMMARY_CHARS: usize = 200;

/// One-line description of a loaded value
pub fn summarize(value: &Value) -> String {
    match value {
        Value::Array(array) => array.summary(),
        Value::Dict(map) if !map.is_empty() && map.values().all(Value::is_array_like) => {
            let members = map
                .iter()
                .map(|(k, v)| format!("{}: {}", k, v))
                .collect::<Vec<_>>()
                .join(", ");
            truncate_string(&format!("{} arrays {{{}}}", map.len(), members), SUMMARY_CHARS)
        }
        other => truncate_string(&other.repr(), SUMMARY_CHARS),
    }
}

/// Load `path` and describe it
pub fn inspect_artifact(storage: &Storage, path: &Path) -> crate::core::error::Result<ResultItem> {
    let value = storage.load(path)?;

    let mut meta = Meta::default();
    if let Ok(size) = get_file_size(path) {
        meta.size = Some(size);
    }
    if let Ok(mtime) = get_mtime_ms(path) {
        meta.mtime_ms = Some(mtime);
        meta.modified = format_ms(mtime);
    }

    let mut item = ResultItem::artifact(
        display_path(path, storage.directory()),
        Codec::for_path(path),
    )
    .with_meta(meta)
    .with_summary(summarize(&value))
    .with_data(value.to_json());
    item.fingerprint = Some(fingerprint(&value, storage.config().algorithm));
    Ok(item)
}

/// Parse a command-line value: JSON, `(a, b)` as a tuple, otherwise a string
pub fn parse_cli_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if let Some(inner) = trimmed
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
    {
        let inner = inner.trim().trim_end_matches(',');
        if let Ok(serde_json::Value::Array(items)) =
            serde_json::from_str::<serde_json::Value>(&format!("[{}]", inner))
        {
            return Value::Tuple(items.iter().map(Value::from_json).collect());
        }
    }

    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(json) => Value::from_json(&json),
        Err(_) => Value::Str(raw.to_string()),
    }
}

/// Split `NAME=VALUE`
pub fn parse_named_arg(raw: &str) -> Result<(String, Value)> {
    let (name, value) = raw
        .split_once('=')
        .with_context(|| format!("Expected NAME=VALUE, got `{}`", raw))?;
    Ok((name.trim().to_string(), parse_cli_value(value)))
}

/// Resolve `template` under the storage root from keyword arguments
pub fn resolve_template(
    storage: &Storage,
    template: &str,
    named: &[(String, Value)],
    hash: &[String],
) -> crate::core::error::Result<ResultItem> {
    let template = Template::parse(template)?;

    // Every template field and every supplied name is a parameter, so an
    // absent field surfaces as a missing argument
    let mut params: Vec<String> = template
        .field_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    for (name, _) in named {
        if !params.contains(name) {
            params.push(name.clone());
        }
    }
    let signature = Signature::new(params)?;

    let args = named
        .iter()
        .fold(Args::new(), |args, (name, value)| args.kwarg(name, value.clone()));
    let hash: HashSet<String> = hash.iter().cloned().collect();

    let resolver = PathResolver::new(
        template,
        &signature,
        &hash,
        HashMap::new(),
        storage.directory(),
        storage.config().algorithm,
    )?;
    let path = resolver.resolve(&args)?;

    Ok(ResultItem::path(
        display_path(&path, storage.directory()),
        Codec::for_path(&path),
        path.exists(),
    ))
}

/// Run the inspect command
pub fn run_inspect(storage: &Storage, file: &Path, config: RenderConfig) -> Result<()> {
    let path = if file.is_absolute() {
        file.to_path_buf()
    } else {
        storage.directory().join(file)
    };

    let item = inspect_artifact(storage, &path)
        .with_context(|| format!("Failed to inspect {}", path.display()))?;

    let mut result_set = ResultSet::new();
    result_set.push(item);
    println!("{}", Renderer::with_config(config).render(&result_set));
    Ok(())
}

/// Run the fingerprint command
pub fn run_fingerprint(raw: &str, algorithm: HashAlgorithm, config: RenderConfig) -> Result<()> {
    let value = parse_cli_value(raw);

    let mut result_set = ResultSet::new();
    result_set.push(
        ResultItem::fingerprint(fingerprint(&value, algorithm)).with_summary(summarize(&value)),
    );
    println!("{}", Renderer::with_config(config).render(&result_set));
    Ok(())
}

/// Run the path command
pub fn run_path(
    storage: &Storage,
    template: &str,
    args: &[String],
    hash: &[String],
    config: RenderConfig,
) -> Result<()> {
    let named = args
        .iter()
        .map(|raw| parse_named_arg(raw))
        .collect::<Result<Vec<_>>>()?;

    let item = resolve_template(storage, template, &named, hash)
        .with_context(|| format!("Failed to resolve `{}`", template))?;

    let mut result_set = ResultSet::new();
    result_set.push(item);
    println!("{}", Renderer::with_config(config).render(&result_set));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::array::NdArray;
    use tempfile::tempdir;

    #[test]
    fn test_parse_cli_value() {
        assert_eq!(parse_cli_value("(50, 50)"), Value::tuple([50, 50]));
        assert_eq!(parse_cli_value("(7,)"), Value::tuple([7]));
        assert_eq!(parse_cli_value("[1, 2]"), Value::list([1, 2]));
        assert_eq!(parse_cli_value("20"), Value::Int(20));
        assert_eq!(parse_cli_value("hello"), Value::from("hello"));
        assert_eq!(parse_cli_value("\"quoted\""), Value::from("quoted"));
    }

    #[test]
    fn test_parse_named_arg() {
        let (name, value) = parse_named_arg("size=20").unwrap();
        assert_eq!(name, "size");
        assert_eq!(value, Value::Int(20));
        assert!(parse_named_arg("novalue").is_err());
    }

    #[test]
    fn test_resolve_template() {
        let temp = tempdir().unwrap();
        let storage = Storage::new(temp.path());
        let named = vec![
            ("shape".to_string(), Value::tuple([50, 50])),
            ("size".to_string(), Value::Int(20)),
        ];

        let item = resolve_template(&storage, "images-{shape}-{size}.npz", &named, &[]).unwrap();
        assert_eq!(item.path.as_deref(), Some("images-(50, 50)-20.npz"));
        assert_eq!(item.codec, Some(Codec::Npz));
        assert_eq!(item.meta.exists, Some(false));
    }

    #[test]
    fn test_resolve_template_missing_field() {
        let temp = tempdir().unwrap();
        let storage = Storage::new(temp.path());
        let err = resolve_template(&storage, "{a}-{b}", &[("a".to_string(), Value::Int(1))], &[])
            .unwrap_err();
        assert!(matches!(
            err,
            crate::core::error::CacheError::MissingArgument { .. }
        ));
    }

    #[test]
    fn test_inspect_array() {
        let temp = tempdir().unwrap();
        let storage = Storage::new(temp.path());
        let path = temp.path().join("a.npy");
        storage
            .save(&path, &Value::Array(NdArray::from_fn(vec![2, 3], |i| i as f64).unwrap()))
            .unwrap();

        let item = inspect_artifact(&storage, &path).unwrap();
        assert_eq!(item.path.as_deref(), Some("a.npy"));
        assert_eq!(
            item.summary.as_deref(),
            Some("array(shape=(2, 3), dtype=float64)")
        );
        assert!(item.fingerprint.is_some());
    }

    #[test]
    fn test_summarize_npz_dict() {
        let value = Value::dict([("0", NdArray::from_fn(vec![2], |i| i as f64).unwrap())]);
        assert_eq!(
            summarize(&value),
            "1 arrays {0: array(shape=(2,), dtype=float64)}"
        );
    }
}

//! Path resolution - maps one call's arguments to its cache file

use colored::Colorize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::args::{Args, Signature};
use crate::core::error::{CacheError, Result};
use crate::core::fingerprint::{fingerprint, HashAlgorithm};
use crate::core::template::Template;
use crate::core::value::Value;

/// User-supplied `value -> string` conversion for a template field
pub type Transform = Box<dyn Fn(&Value) -> String>;

/// How a field's value becomes text in the filename
pub enum FieldPolicy {
    /// Replace the value with its content fingerprint
    Hash,
    Transform(Transform),
    /// Use the value's natural string form
    Verbatim,
}

impl fmt::Debug for FieldPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPolicy::Hash => f.write_str("Hash"),
            FieldPolicy::Transform(_) => f.write_str("Transform(..)"),
            FieldPolicy::Verbatim => f.write_str("Verbatim"),
        }
    }
}

#[derive(Debug)]
struct FieldBinding {
    name: String,
    /// Positional slot; `None` for keyword-only parameters
    index: Option<usize>,
    policy: FieldPolicy,
}

/// Computes the on-disk path for a specific invocation
#[derive(Debug)]
pub struct PathResolver {
    template: Template,
    directory: PathBuf,
    algorithm: HashAlgorithm,
    fields: Vec<FieldBinding>,
}

impl PathResolver {
    /// Bind every template field to a declared parameter and a policy.
    ///
    /// Fails with `UnknownField` when the template names a parameter the
    /// signature does not declare. A field listed in both `hash` and
    /// `transforms` is hashed.
    pub fn new(
        template: Template,
        signature: &Signature,
        hash: &HashSet<String>,
        mut transforms: HashMap<String, Transform>,
        directory: &Path,
        algorithm: HashAlgorithm,
    ) -> Result<Self> {
        let names: Vec<String> = template
            .field_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        for configured in hash.iter().chain(transforms.keys()) {
            if !names.contains(configured) {
                tracing::warn!(
                    field = %configured,
                    template = %template,
                    "classified field does not appear in template; ignoring"
                );
            }
        }

        let mut fields = Vec::with_capacity(names.len());
        for name in names {
            if !signature.declares(&name) {
                return Err(CacheError::UnknownField {
                    field: name,
                    template: template.as_str().to_string(),
                });
            }

            let policy = if hash.contains(&name) {
                FieldPolicy::Hash
            } else if let Some(transform) = transforms.remove(&name) {
                FieldPolicy::Transform(transform)
            } else {
                FieldPolicy::Verbatim
            };

            fields.push(FieldBinding {
                index: signature.index_of(&name),
                name,
                policy,
            });
        }

        Ok(Self {
            template,
            directory: directory.to_path_buf(),
            algorithm,
            fields,
        })
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Resolve the cache path for `args`. Performs no I/O.
    pub fn resolve(&self, args: &Args) -> Result<PathBuf> {
        let mut values = BTreeMap::new();

        for field in &self.fields {
            let Some(value) = args.lookup(&field.name, field.index) else {
                eprintln!(
                    "{} couldn't find argument {} needed for {}",
                    "error:".red().bold(),
                    field.name,
                    self.template
                );
                return Err(CacheError::MissingArgument {
                    field: field.name.clone(),
                    template: self.template.as_str().to_string(),
                });
            };

            let rendered = match &field.policy {
                FieldPolicy::Hash => Value::Str(fingerprint(value, self.algorithm)),
                FieldPolicy::Transform(transform) => Value::Str(transform(value)),
                FieldPolicy::Verbatim => value.clone(),
            };
            values.insert(field.name.clone(), rendered);
        }

        let filename = self.template.render(&values)?;
        Ok(self.directory.join(filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(
        template: &str,
        params: &[&str],
        hash: &[&str],
        transforms: HashMap<String, Transform>,
    ) -> Result<PathResolver> {
        let signature = Signature::new(params.iter().copied())?;
        let hash: HashSet<String> = hash.iter().map(|s| s.to_string()).collect();
        PathResolver::new(
            Template::parse(template)?,
            &signature,
            &hash,
            transforms,
            Path::new("tmp"),
            HashAlgorithm::Sha1,
        )
    }

    #[test]
    fn test_positional_and_keyword_agree() {
        let r = resolver("images-{shape}-{size}.npz", &["shape", "size"], &[], HashMap::new())
            .unwrap();
        let positional = Args::new().arg(Value::tuple([50, 50])).arg(20);
        let keyword = Args::new()
            .kwarg("size", 20)
            .kwarg("shape", Value::tuple([50, 50]));
        let mixed = Args::new().arg(Value::tuple([50, 50])).kwarg("size", 20);

        let expected = PathBuf::from("tmp").join("images-(50, 50)-20.npz");
        assert_eq!(r.resolve(&positional).unwrap(), expected);
        assert_eq!(r.resolve(&keyword).unwrap(), expected);
        assert_eq!(r.resolve(&mixed).unwrap(), expected);
    }

    #[test]
    fn test_hash_field_uses_fingerprint() {
        let r = resolver("hashed-{x}", &["x"], &["x"], HashMap::new()).unwrap();
        let x = Value::list((0..100).collect::<Vec<i64>>());
        let path = r.resolve(&Args::new().arg(x.clone())).unwrap();

        let expected = format!("hashed-{}", fingerprint(&x, HashAlgorithm::Sha1));
        assert_eq!(path, PathBuf::from("tmp").join(expected));
        assert!(!path.to_string_lossy().contains("[0, 1"));
    }

    #[test]
    fn test_transform_field() {
        let mut transforms: HashMap<String, Transform> = HashMap::new();
        transforms.insert(
            "name".to_string(),
            Box::new(|v: &Value| v.to_string().to_uppercase()),
        );
        let r = resolver("{name}.json", &["name"], &[], transforms).unwrap();
        let path = r.resolve(&Args::new().arg("abc")).unwrap();
        assert_eq!(path, PathBuf::from("tmp").join("ABC.json"));
    }

    #[test]
    fn test_hash_wins_over_transform() {
        let mut transforms: HashMap<String, Transform> = HashMap::new();
        transforms.insert("x".to_string(), Box::new(|_: &Value| "t".to_string()));
        let r = resolver("{x}", &["x"], &["x"], transforms).unwrap();
        let path = r.resolve(&Args::new().arg(1)).unwrap();
        assert_ne!(path, PathBuf::from("tmp").join("t"));
    }

    #[test]
    fn test_repeated_field() {
        let r = resolver("{x}/{x}.json", &["x"], &[], HashMap::new()).unwrap();
        let path = r.resolve(&Args::new().arg("a")).unwrap();
        assert_eq!(path, PathBuf::from("tmp").join("a/a.json"));
    }

    #[test]
    fn test_missing_argument() {
        let r = resolver("{a}-{b}", &["a", "b"], &[], HashMap::new()).unwrap();
        let err = r.resolve(&Args::new().arg(1)).unwrap_err();
        match err {
            CacheError::MissingArgument { field, template } => {
                assert_eq!(field, "b");
                assert_eq!(template, "{a}-{b}");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_field_is_configuration_error() {
        let err = resolver("{a}-{c}", &["a", "b"], &[], HashMap::new()).unwrap_err();
        assert!(matches!(err, CacheError::UnknownField { field, .. } if field == "c"));
    }

    #[test]
    fn test_keyword_only_field() {
        let signature = Signature::with_keyword_only(["a"], ["seed"]).unwrap();
        let r = PathResolver::new(
            Template::parse("{a}-{seed}").unwrap(),
            &signature,
            &HashSet::new(),
            HashMap::new(),
            Path::new("tmp"),
            HashAlgorithm::Sha1,
        )
        .unwrap();

        // Positional slot 1 does not belong to `seed`
        assert!(r.resolve(&Args::new().arg(1).arg(2)).is_err());
        let path = r.resolve(&Args::new().arg(1).kwarg("seed", 2)).unwrap();
        assert_eq!(path, PathBuf::from("tmp").join("1-2"));
    }

    #[test]
    fn test_deterministic() {
        let r = resolver("v-{x}", &["x"], &["x"], HashMap::new()).unwrap();
        let args = Args::new().arg(Value::dict([("k", 1.5)]));
        assert_eq!(r.resolve(&args).unwrap(), r.resolve(&args).unwrap());
    }
}

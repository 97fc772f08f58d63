//! Unified Result Model
//!
//! Every CLI command maps its output to `ResultItem`s before rendering.

use serde::{Deserialize, Serialize};

use crate::cache::codec::Codec;

/// The kind of result item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// A cached file on disk
    Artifact,
    /// A resolved cache path that may or may not exist yet
    Path,
    Fingerprint,
    /// A computed or loaded value
    Value,
}

/// Metadata for a result item
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Meta {
    /// File size in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    /// Modification time in milliseconds since epoch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtime_ms: Option<i64>,

    /// Modification time as RFC 3339
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,

    /// Whether the artifact already exists on disk
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exists: Option<bool>,
}

/// The unified result item that all commands produce
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultItem {
    pub kind: Kind,

    /// Path relative to the cache root when possible, using '/' as separator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Codec selected by the path's extension
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec: Option<Codec>,

    /// One-line human readable description of the content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,

    /// Structured payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    #[serde(default)]
    pub meta: Meta,
}

impl ResultItem {
    fn empty(kind: Kind) -> Self {
        Self {
            kind,
            path: None,
            codec: None,
            summary: None,
            fingerprint: None,
            data: None,
            meta: Meta::default(),
        }
    }

    /// An artifact found on disk
    pub fn artifact(path: impl Into<String>, codec: Codec) -> Self {
        let mut item = Self::empty(Kind::Artifact);
        item.path = Some(path.into());
        item.codec = Some(codec);
        item
    }

    /// A resolved path
    pub fn path(path: impl Into<String>, codec: Codec, exists: bool) -> Self {
        let mut item = Self::empty(Kind::Path);
        item.path = Some(path.into());
        item.codec = Some(codec);
        item.meta.exists = Some(exists);
        item
    }

    pub fn fingerprint(fingerprint: impl Into<String>) -> Self {
        let mut item = Self::empty(Kind::Fingerprint);
        item.fingerprint = Some(fingerprint.into());
        item
    }

    pub fn value(summary: impl Into<String>) -> Self {
        let mut item = Self::empty(Kind::Value);
        item.summary = Some(summary.into());
        item
    }

    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = meta;
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Result set containing multiple result items
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultSet {
    pub items: Vec<ResultItem>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn push(&mut self, item: ResultItem) {
        self.items.push(item);
    }

    /// Sort items by path for stable output; pathless items go last
    pub fn sort(&mut self) {
        self.items.sort_by(|a, b| match (&a.path, &b.path) {
            (Some(pa), Some(pb)) => pa.cmp(pb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<ResultItem> for ResultSet {
    fn from_iter<T: IntoIterator<Item = ResultItem>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

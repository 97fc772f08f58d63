//! Renderer module
//!
//! Renders ResultSet to different output formats: jsonl, json, md

use serde::Serialize;

use crate::core::model::{Kind, ResultItem, ResultSet};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per line
    #[default]
    Jsonl,
    /// A single JSON array
    Json,
    #[value(name = "md", alias = "markdown")]
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as clap::ValueEnum>::from_str(s, true).map_err(|_| format!("Unknown format: {}", s))
    }
}

/// Format plus layout options
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderConfig {
    pub format: OutputFormat,
    /// Indent JSON; jsonl items are then separated by a blank line
    pub pretty: bool,
}

impl RenderConfig {
    pub fn with_pretty(format: OutputFormat, pretty: bool) -> Self {
        Self { format, pretty }
    }
}

pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn with_config(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn render(&self, result_set: &ResultSet) -> String {
        match self.config.format {
            OutputFormat::Jsonl => {
                let separator = if self.config.pretty { "\n\n" } else { "\n" };
                result_set
                    .items
                    .iter()
                    .filter_map(|item| self.encode(item))
                    .collect::<Vec<_>>()
                    .join(separator)
            }
            OutputFormat::Json => self
                .encode(&result_set.items)
                .unwrap_or_else(|| "[]".to_string()),
            OutputFormat::Markdown => self.render_markdown(result_set),
        }
    }

    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Option<String> {
        let encoded = if self.config.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        encoded.ok()
    }

    /// Render as Markdown, one section per kind
    fn render_markdown(&self, result_set: &ResultSet) -> String {
        let mut output = String::new();

        let sections = [
            (Kind::Artifact, "Artifacts"),
            (Kind::Path, "Paths"),
            (Kind::Fingerprint, "Fingerprints"),
            (Kind::Value, "Values"),
        ];
        for (kind, title) in sections {
            let items: Vec<_> = result_set.items.iter().filter(|i| i.kind == kind).collect();
            if items.is_empty() {
                continue;
            }
            output.push_str(&format!("## {}\n\n", title));
            for item in items {
                self.render_item_md(&mut output, item);
            }
            output.push('\n');
        }

        output
    }

    fn render_item_md(&self, output: &mut String, item: &ResultItem) {
        output.push('-');
        if let Some(path) = &item.path {
            output.push_str(&format!(" `{}`", path));
        }
        if let Some(codec) = item.codec {
            output.push_str(&format!(" [{}]", codec));
        }
        if let Some(size) = item.meta.size {
            output.push_str(&format!(" ({} bytes)", size));
        }
        if item.meta.exists == Some(false) {
            output.push_str(" (not cached)");
        }
        if let Some(fingerprint) = &item.fingerprint {
            output.push_str(&format!(" `{}`", fingerprint));
        }
        if let Some(summary) = &item.summary {
            output.push_str(&format!(": {}", summary));
        }
        output.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::codec::Codec;

    fn renderer(format: OutputFormat) -> Renderer {
        Renderer::with_config(RenderConfig::with_pretty(format, false))
    }

    #[test]
    fn test_render_jsonl() {
        let mut result_set = ResultSet::new();
        result_set.push(ResultItem::artifact("image-(50, 50).npy", Codec::Npy));
        result_set.push(ResultItem::artifact("plain-hello", Codec::Object));

        let output = renderer(OutputFormat::Jsonl).render(&result_set);

        assert!(output.contains("image-(50, 50).npy"));
        assert!(output.contains("\"codec\":\"object\""));
        assert_eq!(output.lines().count(), 2);
    }

    #[test]
    fn test_render_json() {
        let mut result_set = ResultSet::new();
        result_set.push(ResultItem::fingerprint("abc"));

        let output = renderer(OutputFormat::Json).render(&result_set);

        assert!(output.starts_with('['));
        assert!(output.ends_with(']'));
    }

    #[test]
    fn test_render_markdown_sections() {
        let mut result_set = ResultSet::new();
        result_set.push(ResultItem::path("x.npz", Codec::Npz, false));
        result_set.push(ResultItem::fingerprint("abc123"));

        let output = renderer(OutputFormat::Markdown).render(&result_set);

        assert!(output.contains("## Fingerprints"));
        assert!(output.contains("- `abc123`"));
        assert!(output.contains("## Paths"));
        assert!(output.contains("`x.npz` [npz] (not cached)"));
    }

    #[test]
    fn test_output_format_parse_case_insensitive() {
        assert_eq!("JSONL".parse::<OutputFormat>().unwrap(), OutputFormat::Jsonl);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("MARKDOWN".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert!("raw".parse::<OutputFormat>().is_err());
    }
}

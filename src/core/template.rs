//! Filename templates
//!
//! A template is literal text with `{name}` or `{name:spec}` fields and
//! `{{`/`}}` escapes. Only named fields are accepted; the spec grammar is
//! `[[fill]align][0][width][.precision][type]` with types `s`, `d`, `f`, `x`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::core::error::{CacheError, Result};
use crate::core::value::Value;

static IDENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("Invalid IDENT_RE regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
    Center,
}

/// Parsed format spec of a single field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSpec {
    raw: String,
    fill: char,
    align: Option<Align>,
    zero: bool,
    width: Option<usize>,
    precision: Option<usize>,
    kind: Option<char>,
}

impl FormatSpec {
    fn parse(raw: &str) -> std::result::Result<Self, String> {
        let chars: Vec<char> = raw.chars().collect();
        let align_of = |c: char| match c {
            '<' => Some(Align::Left),
            '>' => Some(Align::Right),
            '^' => Some(Align::Center),
            _ => None,
        };

        let mut spec = FormatSpec {
            raw: raw.to_string(),
            fill: ' ',
            align: None,
            zero: false,
            width: None,
            precision: None,
            kind: None,
        };
        let mut i = 0;

        if chars.len() >= 2 && align_of(chars[1]).is_some() {
            spec.fill = chars[0];
            spec.align = align_of(chars[1]);
            i = 2;
        } else if let Some(align) = chars.first().and_then(|&c| align_of(c)) {
            spec.align = Some(align);
            i = 1;
        }

        if chars.get(i) == Some(&'0') {
            spec.zero = true;
            i += 1;
        }

        let start = i;
        while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
            i += 1;
        }
        if i > start {
            spec.width = chars[start..i].iter().collect::<String>().parse().ok();
        }

        if chars.get(i) == Some(&'.') {
            i += 1;
            let start = i;
            while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
                i += 1;
            }
            if i == start {
                return Err("format specifier missing precision".to_string());
            }
            spec.precision = chars[start..i].iter().collect::<String>().parse().ok();
        }

        if let Some(&c) = chars.get(i) {
            if !matches!(c, 's' | 'd' | 'f' | 'x') {
                return Err(format!("unsupported format type '{}'", c));
            }
            spec.kind = Some(c);
            i += 1;
        }

        if i != chars.len() {
            return Err(format!("invalid format specifier '{}'", raw));
        }
        Ok(spec)
    }

    fn apply(&self, field: &str, value: &Value) -> Result<String> {
        let error = |reason: String| CacheError::Format {
            field: field.to_string(),
            spec: self.raw.clone(),
            reason,
        };
        let numeric = matches!(value, Value::Int(_) | Value::Float(_) | Value::Bool(_));

        let body = match self.kind {
            Some('d') => match value.as_i64() {
                Some(i) => i.to_string(),
                None => {
                    return Err(error(format!(
                        "unknown format code 'd' for object of type '{}'",
                        value.type_name()
                    )))
                }
            },
            Some('x') => match value.as_i64() {
                Some(i) if i < 0 => format!("-{:x}", i.unsigned_abs()),
                Some(i) => format!("{:x}", i),
                None => {
                    return Err(error(format!(
                        "unknown format code 'x' for object of type '{}'",
                        value.type_name()
                    )))
                }
            },
            Some('f') => match value.as_f64() {
                Some(x) => format!("{:.*}", self.precision.unwrap_or(6), x),
                None => {
                    return Err(error(format!(
                        "unknown format code 'f' for object of type '{}'",
                        value.type_name()
                    )))
                }
            },
            Some('s') => match value {
                Value::Str(s) => self.truncate(s),
                other => {
                    return Err(error(format!(
                        "unknown format code 's' for object of type '{}'",
                        other.type_name()
                    )))
                }
            },
            _ => match value {
                Value::Str(s) => self.truncate(s),
                Value::Float(x) if self.precision.is_some() => {
                    format!("{:.*}", self.precision.unwrap_or(6), x)
                }
                Value::Int(_) | Value::Float(_) | Value::Bool(_) => value.to_string(),
                other => {
                    return Err(error(format!(
                        "unsupported format string passed to {}.__format__",
                        other.type_name()
                    )))
                }
            },
        };

        Ok(self.pad(body, numeric))
    }

    fn truncate(&self, s: &str) -> String {
        match self.precision {
            Some(p) => s.chars().take(p).collect(),
            None => s.to_string(),
        }
    }

    fn pad(&self, body: String, numeric: bool) -> String {
        let width = self.width.unwrap_or(0);
        let len = body.chars().count();
        if len >= width {
            return body;
        }
        let missing = width - len;

        // Zero padding goes between the sign and the digits
        if self.zero && self.align.is_none() && numeric {
            let (sign, digits) = match body.strip_prefix('-') {
                Some(rest) => ("-", rest),
                None => ("", body.as_str()),
            };
            return format!("{}{}{}", sign, "0".repeat(missing), digits);
        }

        let fill = if self.zero && self.align.is_none() {
            '0'
        } else {
            self.fill
        };
        let fill_str = |n: usize| fill.to_string().repeat(n);
        let align = self
            .align
            .unwrap_or(if numeric { Align::Right } else { Align::Left });

        match align {
            Align::Left => format!("{}{}", body, fill_str(missing)),
            Align::Right => format!("{}{}", fill_str(missing), body),
            Align::Center => {
                let left = missing / 2;
                format!("{}{}{}", fill_str(left), body, fill_str(missing - left))
            }
        }
    }
}

/// One piece of a parsed template
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field {
        name: String,
        spec: Option<FormatSpec>,
    },
}

/// A parsed filename template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self> {
        let invalid = |reason: &str| CacheError::InvalidTemplate {
            template: source.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '{' => {
                    let mut field = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some('{') => return Err(invalid("nested fields are not supported")),
                            Some(ch) => field.push(ch),
                            None => return Err(invalid("expected '}' before end of string")),
                        }
                    }

                    let (name, spec) = match field.split_once(':') {
                        Some((name, spec)) => (name, Some(spec)),
                        None => (field.as_str(), None),
                    };
                    if name.contains('!') {
                        return Err(invalid("conversions are not supported"));
                    }
                    if !IDENT_RE.is_match(name) {
                        return Err(invalid(&format!(
                            "field '{}' must be a parameter name",
                            name
                        )));
                    }
                    let spec = match spec {
                        Some(raw) if !raw.is_empty() => {
                            Some(FormatSpec::parse(raw).map_err(|e| invalid(&e))?)
                        }
                        _ => None,
                    };

                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field {
                        name: name.to_string(),
                        spec,
                    });
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(invalid("single '}' encountered")),
                other => literal.push(other),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Distinct field names in order of first appearance
    pub fn field_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Field { name, .. } = segment {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Substitute every field from `values`
    pub fn render(&self, values: &BTreeMap<String, Value>) -> Result<String> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field { name, spec } => {
                    let value = values.get(name).ok_or_else(|| CacheError::MissingArgument {
                        field: name.clone(),
                        template: self.source.clone(),
                    })?;
                    match spec {
                        Some(spec) => out.push_str(&spec.apply(name, value)?),
                        None => out.push_str(&value.to_string()),
                    }
                }
            }
        }
        Ok(out)
    }
}

impl FromStr for Template {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        Template::parse(s)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

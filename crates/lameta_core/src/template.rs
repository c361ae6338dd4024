//! Field template interpreter.
//!
//! # Responsibility
//! - Compile catalog templates such as `{"@id": "#language_[code]"}` into
//!   literal/placeholder segments once, at catalog load time.
//! - Render a compiled template against one field value.
//!
//! # Invariants
//! - Only `[v]`, `[code]` and `[languageName]` are recognized; anything else
//!   fails compilation.
//! - Rendering is a single pass over segments; substituted text is never
//!   re-scanned for placeholders.

use crate::iri::sanitize_for_iri;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

static CODE_SANITIZE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9_-]").expect("valid language code regex"));

/// Template compile failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// `[name]` is not a known placeholder.
    UnknownPlaceholder { property: String, name: String },
    /// `[` without a closing `]`.
    UnclosedBracket { property: String },
    /// Template property values must be strings.
    NotAString { property: String },
}

impl Display for TemplateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownPlaceholder { property, name } => {
                write!(f, "unknown template placeholder `[{name}]` in `{property}`")
            }
            Self::UnclosedBracket { property } => {
                write!(f, "unclosed `[` in template property `{property}`")
            }
            Self::NotAString { property } => {
                write!(f, "template property `{property}` must be a string")
            }
        }
    }
}

impl Error for TemplateError {}

pub type TemplateResult<T> = Result<T, TemplateError>;

/// Substitution slot inside a template string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// `[v]`: the field value.
    Value,
    /// `[code]`: language code before `:`, lowercased.
    Code,
    /// `[languageName]`: text after `:`, or the code.
    LanguageName,
}

impl Placeholder {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "v" => Some(Self::Value),
            "code" => Some(Self::Code),
            "languageName" => Some(Self::LanguageName),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Placeholder(Placeholder),
}

/// How a field's template shapes the parent property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    /// No template: the value is assigned as text.
    Scalar,
    /// One `{"@id"}` reference to a rendered entity.
    Reference,
    /// An array of references, one per value.
    Array,
}

impl TemplateKind {
    pub fn of(has_template: bool, array: Option<bool>) -> Self {
        match (has_template, array) {
            (false, _) => Self::Scalar,
            (true, Some(true)) => Self::Array,
            (true, _) => Self::Reference,
        }
    }
}

/// One compiled template property value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateString {
    segments: Vec<Segment>,
}

impl TemplateString {
    /// Parses `raw` into literal and placeholder segments.
    pub fn parse(property: &str, raw: &str) -> TemplateResult<Self> {
        let mut segments = Vec::new();
        let mut rest = raw;
        while let Some(open) = rest.find('[') {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let after = &rest[open + 1..];
            let close = after.find(']').ok_or_else(|| TemplateError::UnclosedBracket {
                property: property.to_string(),
            })?;
            let name = &after[..close];
            let placeholder =
                Placeholder::parse(name).ok_or_else(|| TemplateError::UnknownPlaceholder {
                    property: property.to_string(),
                    name: name.to_string(),
                })?;
            segments.push(Segment::Placeholder(placeholder));
            rest = &after[close + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the text when the string has no placeholders.
    pub fn literal(&self) -> Option<String> {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => Some(text.as_str()),
                Segment::Placeholder(_) => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(|parts| parts.concat())
    }

    fn render(&self, value: &str, in_id: bool) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(Placeholder::Value) if in_id => {
                    out.push_str(&sanitize_for_iri(value))
                }
                Segment::Placeholder(Placeholder::Value) => out.push_str(value),
                Segment::Placeholder(Placeholder::Code) if in_id => {
                    out.push_str(&CODE_SANITIZE_RE.replace_all(&language_code(value), "_"))
                }
                Segment::Placeholder(Placeholder::Code) => out.push_str(&language_code(value)),
                Segment::Placeholder(Placeholder::LanguageName) => {
                    out.push_str(&language_name(value))
                }
            }
        }
        out
    }
}

/// Compiled catalog template: ordered property name to template string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct Template {
    properties: Vec<(String, TemplateString)>,
}

impl Template {
    /// Compiles a JSON object whose values are template strings.
    pub fn compile(raw: &Map<String, Value>) -> TemplateResult<Self> {
        let properties = raw
            .iter()
            .map(|(property, value)| {
                let text = value.as_str().ok_or_else(|| TemplateError::NotAString {
                    property: property.clone(),
                })?;
                Ok((property.clone(), TemplateString::parse(property, text)?))
            })
            .collect::<TemplateResult<Vec<_>>>()?;
        Ok(Self { properties })
    }

    /// Literal value of `property` when it has no placeholders.
    pub fn literal(&self, property: &str) -> Option<String> {
        self.get(property).and_then(TemplateString::literal)
    }

    pub fn get(&self, property: &str) -> Option<&TemplateString> {
        self.properties
            .iter()
            .find(|(name, _)| name == property)
            .map(|(_, template)| template)
    }

    /// True when the `@id` template produces `#language_` fragments.
    pub fn is_language(&self) -> bool {
        self.get("@id").is_some_and(|id| {
            id.segments()
                .iter()
                .any(|segment| matches!(segment, Segment::Literal(text) if text.contains("#language_")))
        })
    }

    /// True when the template describes a `Place`.
    pub fn is_place(&self) -> bool {
        self.literal("@type").as_deref() == Some("Place")
    }

    /// Renders every property against `value`.
    pub fn render(&self, value: &str) -> Map<String, Value> {
        self.properties
            .iter()
            .map(|(property, template)| {
                let rendered = template.render(value, property == "@id");
                (property.clone(), Value::String(rendered))
            })
            .collect()
    }
}

impl TryFrom<Map<String, Value>> for Template {
    type Error = TemplateError;

    fn try_from(raw: Map<String, Value>) -> Result<Self, Self::Error> {
        Self::compile(&raw)
    }
}

/// Language code of `etr: Edolo` style values, lowercased.
pub fn language_code(value: &str) -> String {
    value
        .split(':')
        .next()
        .unwrap_or(value)
        .trim()
        .to_lowercase()
}

/// Language name of `etr: Edolo` style values, or the code.
pub fn language_name(value: &str) -> String {
    match value.split_once(':') {
        Some((_, name)) if !name.trim().is_empty() => name.trim().to_string(),
        _ => value.trim().to_string(),
    }
}

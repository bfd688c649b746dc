//! Structured-data formats
//!
//! A [`FormatAdapter`] turns file content into a neutral [`Value`] document and back.
//! File content is never deserialized straight into a type: it is parsed, then
//! deep-merged onto the instance being built with [`merge`], so nested objects that
//! already exist are updated in place rather than replaced.
//!
//! Three adapters are provided:
//! - [`JsonFormat`] (default, `.json`)
//! - [`YamlFormat`] (`.yaml`)
//! - [`TomlFormat`] (`.toml`)
//!
//! Templates are cloned by rendering and re-parsing through the active adapter
//! ([`FormatAdapter::round_trip`]). Anything the format cannot represent is lost in
//! the clone; TOML, for example, has no `null`, so null fields are dropped.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::core::NodeType;

/// Parser and renderer for one structured-data format.
pub trait FormatAdapter: Send + Sync {
    /// Human-readable format name, used in diagnostics
    fn name(&self) -> &'static str;

    /// Extension files of this format usually carry, including the leading "."
    fn extension(&self) -> &'static str;

    /// Parse a whole document
    fn parse(&self, content: &str) -> Result<Value>;

    /// Render a document
    fn render(&self, value: &Value) -> Result<String>;

    /// Produce an independent copy of `value` by rendering and re-parsing it
    fn round_trip(&self, value: &Value) -> Result<Value> {
        let rendered = self.render(value)?;
        self.parse(&rendered)
    }

    /// Check that `sample` deserializes into `node`
    fn can_deserialize(&self, node: &NodeType, sample: Value) -> Result<()> {
        node.verify(sample)
            .with_context(|| format!("{} cannot be deserialized from {}", node, self.name()))
    }
}

/// JSON via `serde_json`
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl FormatAdapter for JsonFormat {
    fn name(&self) -> &'static str {
        "JSON"
    }

    fn extension(&self) -> &'static str {
        ".json"
    }

    fn parse(&self, content: &str) -> Result<Value> {
        serde_json::from_str(content).context("Invalid JSON")
    }

    fn render(&self, value: &Value) -> Result<String> {
        serde_json::to_string_pretty(value).context("Failed to render JSON")
    }
}

/// YAML via `serde_yaml`
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlFormat;

impl FormatAdapter for YamlFormat {
    fn name(&self) -> &'static str {
        "YAML"
    }

    fn extension(&self) -> &'static str {
        ".yaml"
    }

    fn parse(&self, content: &str) -> Result<Value> {
        serde_yaml::from_str(content).context("Invalid YAML")
    }

    fn render(&self, value: &Value) -> Result<String> {
        serde_yaml::to_string(value).context("Failed to render YAML")
    }
}

/// TOML via `toml`
///
/// Rendering drops null values, which TOML cannot express.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlFormat;

impl FormatAdapter for TomlFormat {
    fn name(&self) -> &'static str {
        "TOML"
    }

    fn extension(&self) -> &'static str {
        ".toml"
    }

    fn parse(&self, content: &str) -> Result<Value> {
        toml::from_str(content).context("Invalid TOML")
    }

    fn render(&self, value: &Value) -> Result<String> {
        toml::to_string(&without_nulls(value)).context("Failed to render TOML")
    }
}

fn without_nulls(value: &Value) -> Value {
    match value {
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), without_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => {
            Value::Array(items.iter().filter(|v| !v.is_null()).map(without_nulls).collect())
        }
        other => other.clone(),
    }
}

/// Built-in formats, selectable by name in configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
    #[default]
    Json,
    Yaml,
    Toml,
}

impl FormatKind {
    /// A shared adapter for this format
    #[must_use]
    pub fn adapter(self) -> Arc<dyn FormatAdapter> {
        match self {
            Self::Json => Arc::new(JsonFormat),
            Self::Yaml => Arc::new(YamlFormat),
            Self::Toml => Arc::new(TomlFormat),
        }
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::Yaml => f.write_str("yaml"),
            Self::Toml => f.write_str("toml"),
        }
    }
}

impl FromStr for FormatKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "toml" => Ok(Self::Toml),
            other => Err(anyhow::anyhow!("Unknown format: {other} (expected json, yaml or toml)")),
        }
    }
}

/// Deep-merge `overlay` onto `target`.
///
/// Objects merge key by key, recursively. Anything else in the overlay, arrays
/// included, replaces what was there.
pub fn merge(target: &mut Value, overlay: Value) {
    match (target, overlay) {
        (Value::Object(fields), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match fields.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        fields.insert(key, value);
                    }
                }
            }
        }
        (slot, overlay) => *slot = overlay,
    }
}

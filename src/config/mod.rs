//! Builder configuration.
//!
//! A [`BuilderConfig`] selects the format and default extension of a
//! [`TreeBuilder`](crate::TreeBuilder). It can be written by hand, loaded from a TOML
//! file, and overridden from the environment.
//!
//! # File Format
//!
//! ```toml
//! # json (default), yaml or toml
//! format = "yaml"
//! # optional; defaults to the format's own extension
//! default_extension = "yml"
//! ```
//!
//! # Environment Variables
//!
//! - `BEANTREE_FORMAT` - overrides `format`
//! - `BEANTREE_DEFAULT_EXTENSION` - overrides `default_extension`

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::builder::normalize_extension;
use crate::format::FormatKind;

/// Environment variable overriding the format
pub const FORMAT_ENV: &str = "BEANTREE_FORMAT";

/// Environment variable overriding the default extension
pub const EXTENSION_ENV: &str = "BEANTREE_DEFAULT_EXTENSION";

/// Format and extension settings for a builder
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Format files are parsed with
    pub format: FormatKind,
    /// Extension appended to file names without one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_extension: Option<String>,
}

impl BuilderConfig {
    /// Load configuration from a TOML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read builder config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse builder config from {}", path.display()))
    }

    /// Apply `BEANTREE_*` environment overrides
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides looked up by environment variable name
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(format) = lookup(FORMAT_ENV) {
            self.format = format
                .parse()
                .with_context(|| format!("Invalid {FORMAT_ENV} value: {format}"))?;
            debug!("Format overridden to {} from {}", self.format, FORMAT_ENV);
        }
        if let Some(extension) = lookup(EXTENSION_ENV) {
            debug!("Default extension overridden to '{}' from {}", extension, EXTENSION_ENV);
            self.default_extension = Some(extension);
        }
        Ok(self)
    }

    /// Effective default extension, normalized with a leading "."
    #[must_use]
    pub fn extension(&self) -> String {
        match &self.default_extension {
            Some(extension) => normalize_extension(extension),
            None => self.format.adapter().extension().to_string(),
        }
    }
}

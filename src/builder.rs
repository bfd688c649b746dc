//! Entry point for building object graphs from file trees.
//!
//! A [`TreeBuilder`] holds the long-lived parts of a build: the format adapter, the
//! default extension, the schema cache and the instance factories. Every call to
//! [`TreeBuilder::build`] runs with a fresh per-build context, so open files, names
//! and templates never leak from one build into the next, even when the cache and
//! factories are shared with other builders.
//!
//! # Examples
//!
//! ```rust,no_run
//! use beantree::{Bean, ConfigNode, SchemaBuilder, TreeBuilder, YamlFormat};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! #[serde(default)]
//! struct Database {
//!     url: String,
//! }
//!
//! impl ConfigNode for Database {}
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! #[serde(default)]
//! struct App {
//!     port: u16,
//!     database: Option<Database>,
//! }
//!
//! impl ConfigNode for App {
//!     fn describe(schema: &mut SchemaBuilder) {
//!         schema.bean::<Database>("database", Bean::new());
//!     }
//! }
//!
//! # fn example() -> beantree::Result<()> {
//! let builder = TreeBuilder::new().with_format(YamlFormat).with_default_extension("yaml");
//! let app: App = builder.build("config/app.yaml")?;
//! # Ok(())
//! # }
//! ```

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::config::BuilderConfig;
use crate::context::{DeserializationContext, Naming};
use crate::core::{CollectionRole, ConfigNode, NodeType, Result, TreeError};
use crate::factory::Factories;
use crate::format::{FormatAdapter, FormatKind, JsonFormat};
use crate::schema::SchemaCache;

/// Extension used when none is configured
pub const DEFAULT_EXTENSION: &str = ".json";

/// Configured entry point for builds. Cloning shares the cache and factories.
#[derive(Clone)]
pub struct TreeBuilder {
    format: Arc<dyn FormatAdapter>,
    default_extension: String,
    cache: SchemaCache,
    factories: Factories,
}

impl TreeBuilder {
    /// JSON, `.json`, a private cache and the default factories
    #[must_use]
    pub fn new() -> Self {
        Self {
            format: Arc::new(JsonFormat),
            default_extension: DEFAULT_EXTENSION.to_string(),
            cache: SchemaCache::new(),
            factories: Factories::new(),
        }
    }

    /// A builder configured from `config`
    #[must_use]
    pub fn from_config(config: &BuilderConfig) -> Self {
        Self::new().with_format_kind(config.format).with_default_extension(config.extension())
    }

    /// Parse files with `format`
    #[must_use]
    pub fn with_format(mut self, format: impl FormatAdapter + 'static) -> Self {
        self.format = Arc::new(format);
        self
    }

    /// Parse files with one of the built-in formats
    #[must_use]
    pub fn with_format_kind(mut self, kind: FormatKind) -> Self {
        self.format = kind.adapter();
        self
    }

    /// Extension appended to file names without one; "json" and ".json" are the same
    #[must_use]
    pub fn with_default_extension(mut self, extension: impl AsRef<str>) -> Self {
        self.default_extension = normalize_extension(extension.as_ref());
        self
    }

    /// Construct instances of `T` with `factory` instead of `Default`
    #[must_use]
    pub fn with_factory<T, F>(self, factory: F) -> Self
    where
        T: Serialize + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.factories.register(factory);
        self
    }

    /// Start every empty collection member of `role` from `factory`
    #[must_use]
    pub fn with_collection_factory<C, F>(self, role: CollectionRole, factory: F) -> Self
    where
        C: Serialize + 'static,
        F: Fn() -> C + Send + Sync + 'static,
    {
        self.factories.register_role(role, factory);
        self
    }

    /// Share `other`'s schema cache
    #[must_use]
    pub fn reuse_cache(mut self, other: &Self) -> Self {
        self.cache = other.cache.clone();
        self
    }

    /// Use `cache` as the schema cache
    #[must_use]
    pub fn with_cache(mut self, cache: SchemaCache) -> Self {
        self.cache = cache;
        self
    }

    /// Copy `other`'s factories into this builder's own set
    #[must_use]
    pub fn reuse_factories(self, other: &Self) -> Self {
        self.factories.extend_from(&other.factories);
        self
    }

    /// Share `other`'s factory set; later registrations on either builder affect both
    #[must_use]
    pub fn share_factories(mut self, other: &Self) -> Self {
        self.factories = other.factories.clone();
        self
    }

    #[must_use]
    pub fn format(&self) -> &dyn FormatAdapter {
        self.format.as_ref()
    }

    #[must_use]
    pub fn default_extension(&self) -> &str {
        &self.default_extension
    }

    #[must_use]
    pub const fn cache(&self) -> &SchemaCache {
        &self.cache
    }

    /// Factory set; registrations through it apply to later builds
    #[must_use]
    pub const fn factories(&self) -> &Factories {
        &self.factories
    }

    /// Build a `T` from the file at `path`
    pub fn build<T: ConfigNode>(&self, path: impl AsRef<Path>) -> Result<T> {
        let node = NodeType::of::<T>();
        let value = self.run(&node, None, path.as_ref())?;
        into_typed(&node, value)
    }

    /// Load the file at `path` onto an existing instance
    pub fn build_into<T: ConfigNode>(&self, instance: T, path: impl AsRef<Path>) -> Result<T> {
        let node = NodeType::of::<T>();
        let start = serde_json::to_value(instance).map_err(|e| TreeError::Instantiation {
            type_name: node.name().to_string(),
            reason: e.to_string(),
        })?;
        let value = self.run(&node, Some(start), path.as_ref())?;
        into_typed(&node, value)
    }

    /// Build the file at `path` as `node`, returning the document
    pub fn build_value(&self, node: &NodeType, path: impl AsRef<Path>) -> Result<Value> {
        self.run(node, None, path.as_ref())
    }

    fn run(&self, node: &NodeType, start: Option<Value>, path: &Path) -> Result<Value> {
        debug!("Building {} from {}", node, path.display());
        let mut ctx = DeserializationContext::new(
            self.format.as_ref(),
            &self.cache,
            &self.factories,
            &self.default_extension,
        );
        match start {
            Some(instance) => ctx.deserialize(node, instance, path, Naming::FileStem),
            None => ctx.load(node, path, Naming::FileStem),
        }
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TreeBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeBuilder")
            .field("format", &self.format.name())
            .field("default_extension", &self.default_extension)
            .field("cached_types", &self.cache.len())
            .field("factories", &self.factories)
            .finish()
    }
}

fn into_typed<T: ConfigNode>(node: &NodeType, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| {
        TreeError::Deserialize {
            type_name: node.name().to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

/// `extension` with exactly one leading "."; blank stays blank
#[must_use]
pub fn normalize_extension(extension: &str) -> String {
    let trimmed = extension.trim().trim_start_matches('.');
    if trimmed.is_empty() { String::new() } else { format!(".{trimmed}") }
}

//! beantree - map a tree of structured-data files onto one object graph
//!
//! A configuration is often spread over many files: a root file, sibling files for
//! large sections, a directory with one file per plugin, shared defaults. beantree
//! loads such a tree into a single typed value. The shape of the tree is declared on
//! the target types with directives and resolved against the file system layout.
//!
//! # Architecture Overview
//!
//! A build starts at one file and descends recursively:
//! 1. The file is opened (a file that is already open is a cycle and fails the build)
//! 2. Its content is deep-merged onto the instance being built
//! 3. The type's directives are applied in order: templates, then sibling files and
//!    directory collections (which recurse), then metadata
//! 4. The file is closed, whether or not the steps above succeeded
//!
//! ## Directives
//! - **Bean** - load a member from a sibling file
//! - **BeanCollection** - load a map, list, set, or queue from a directory layout
//!   (`CONF_DIR`: every file in a directory, `MULTI_DIRS`: one file per subdirectory)
//! - **Template** - register a named default object that later loads start from
//! - **Name** / **SourceFile** - record the resolved name or path of the current file
//!
//! # Core Modules
//!
//! - [`builder`] - [`TreeBuilder`], the entry point
//! - [`core`] - errors and type descriptors
//! - [`directive`] - the directive model
//! - [`schema`] - schema authoring, analysis, ordering and caching
//! - [`context`] - per-build state and recursive descent
//! - [`injector`] - one handler per directive kind
//! - [`pattern`] - directory scanning for collections
//! - [`format`] - JSON, YAML and TOML adapters and deep merge
//! - [`factory`] - instance factories
//! - [`config`] - loadable builder configuration
//! - [`utils`] - path validation
//!
//! # Example
//!
//! Given this layout:
//!
//! ```text
//! config/
//! ├── app.json              {"port": 8080}
//! ├── database.json         {"url": "postgres://db"}
//! └── plugins/
//!     ├── audit/plugin.json {"enabled": true}
//!     └── cache/plugin.json {}
//! ```
//!
//! ```rust,no_run
//! use beantree::{Bean, BeanCollection, ConfigNode, MemberType, SchemaBuilder, TreeBuilder};
//! use serde::{Deserialize, Serialize};
//! use std::collections::HashMap;
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
//! struct Plugin {
//!     name: String,
//!     enabled: bool,
//! }
//!
//! impl ConfigNode for Plugin {
//!     fn describe(schema: &mut SchemaBuilder) {
//!         schema.name("name");
//!     }
//! }
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! #[serde(default)]
//! struct App {
//!     port: u16,
//!     database: Option<Database>,
//!     plugins: HashMap<String, Plugin>,
//! }
//!
//! impl ConfigNode for App {
//!     fn describe(schema: &mut SchemaBuilder) {
//!         schema
//!             .bean::<Database>("database", Bean::new())
//!             .bean_collection("plugins", MemberType::map::<Plugin>(), BeanCollection::multi_dirs("plugin"));
//!     }
//! }
//!
//! # fn example() -> beantree::Result<()> {
//! let app: App = TreeBuilder::new().build("config/app.json")?;
//! assert_eq!(app.plugins["audit"].name, "audit");
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod context;
pub mod core;
pub mod directive;
pub mod factory;
pub mod format;
pub mod injector;
pub mod pattern;
pub mod schema;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use crate::builder::TreeBuilder;
pub use crate::config::BuilderConfig;
pub use crate::core::{
    BuildError, CollectionRole, ConfigNode, MemberType, NodeType, Result, TreeError, TypeKey,
};
pub use crate::directive::{Bean, BeanCollection, Directive, Mapping, Phase, Template};
pub use crate::factory::Factories;
pub use crate::format::{FormatAdapter, FormatKind, JsonFormat, TomlFormat, YamlFormat};
pub use crate::schema::{SchemaBuilder, SchemaCache};

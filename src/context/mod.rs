//! Per-build state and recursive descent.
//!
//! A [`DeserializationContext`] drives one build from its root file down through every
//! sibling file and directory it reaches. It owns the state that must never outlive
//! or leak out of a build:
//! - the open-file stack, used to detect cycles
//! - the name stack, whose top is the resolved name of the file being loaded
//! - the template registry
//!
//! and borrows the long-lived parts from the builder: the format adapter, the schema
//! cache, the factories and the default extension.
//!
//! # Loading one file
//!
//! [`DeserializationContext::deserialize`] pushes the file, merges its content onto the
//! starting instance, applies the type's injection points in order (templates, then
//! sibling files and collections, which may recurse, then metadata) and pops the file
//! again, on success and on failure alike.

pub mod templates;

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::core::{BuildError, CollectionType, NodeType, Result, TreeError};
use crate::directive::{Mapping, Template};
use crate::factory::Factories;
use crate::format::{FormatAdapter, merge};
use crate::schema::{InjectionPoint, SchemaCache};
use templates::{TemplateRecord, TemplateRegistry};

/// How the resolved name of a loaded file is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Naming {
    /// File name without its extension
    FileStem,
    /// Name of the directory holding the file
    ParentDir,
}

impl Naming {
    /// Naming used for the entries of a directory mapping
    #[must_use]
    pub const fn for_mapping(mapping: Mapping) -> Self {
        match mapping {
            Mapping::ConfDir => Self::FileStem,
            Mapping::MultiDirs => Self::ParentDir,
        }
    }

    #[must_use]
    pub fn apply(self, path: &Path) -> String {
        let name = match self {
            Self::FileStem => path.file_stem(),
            Self::ParentDir => path.parent().and_then(Path::file_name),
        };
        name.map(|name| name.to_string_lossy().into_owned()).unwrap_or_default()
    }
}

#[derive(Debug)]
struct OpenFile {
    path: PathBuf,
    identity: PathBuf,
}

/// State of one build
pub struct DeserializationContext<'b> {
    format: &'b dyn FormatAdapter,
    cache: &'b SchemaCache,
    factories: &'b Factories,
    default_extension: &'b str,
    open_files: Vec<OpenFile>,
    names: Vec<String>,
    templates: TemplateRegistry,
}

impl<'b> DeserializationContext<'b> {
    pub fn new(
        format: &'b dyn FormatAdapter,
        cache: &'b SchemaCache,
        factories: &'b Factories,
        default_extension: &'b str,
    ) -> Self {
        Self {
            format,
            cache,
            factories,
            default_extension,
            open_files: Vec::new(),
            names: Vec::new(),
            templates: TemplateRegistry::new(),
        }
    }

    #[must_use]
    pub fn format(&self) -> &dyn FormatAdapter {
        self.format
    }

    #[must_use]
    pub const fn factories(&self) -> &Factories {
        self.factories
    }

    /// Extension appended to file names that have none, including the leading "."
    #[must_use]
    pub const fn default_extension(&self) -> &str {
        self.default_extension
    }

    #[must_use]
    pub const fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    /// Open files as given, outermost first
    #[must_use]
    pub fn open_files(&self) -> Vec<PathBuf> {
        self.open_files.iter().map(|file| file.path.clone()).collect()
    }

    /// Resolved names, outermost first
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// File currently being loaded
    #[must_use]
    pub fn current_file(&self) -> Option<&Path> {
        self.open_files.last().map(|file| file.path.as_path())
    }

    /// Resolved name of the file currently being loaded
    #[must_use]
    pub fn current_name(&self) -> Option<&str> {
        self.names.last().map(String::as_str)
    }

    /// Directory sibling files are resolved against
    pub fn current_dir(&self) -> Result<PathBuf> {
        let file = self
            .current_file()
            .ok_or_else(|| BuildError::from(TreeError::validation("No file is open")))?;
        file.parent().map(Path::to_path_buf).ok_or_else(|| {
            TreeError::validation(format!("Failed to get parent directory of {}", file.display()))
                .into()
        })
    }

    /// Open `path`, failing if it is already open
    pub fn push(&mut self, path: &Path, naming: Naming) -> Result<()> {
        let identity = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if self.open_files.iter().any(|file| file.identity == identity) {
            return Err(TreeError::Cycle {
                path: path.to_path_buf(),
                open_files: self.open_files(),
                names: self.names.clone(),
            }
            .into());
        }

        let name = naming.apply(path);
        debug!("Opening {} as '{}' (depth {})", path.display(), name, self.open_files.len());
        self.open_files.push(OpenFile {
            path: path.to_path_buf(),
            identity,
        });
        self.names.push(name);
        Ok(())
    }

    /// Close the file opened last
    pub fn pop(&mut self) {
        if let Some(file) = self.open_files.pop() {
            debug!("Closing {}", file.path.display());
        }
        self.names.pop();
    }

    /// Starting document for `node`, from its factory or default
    pub fn instantiate(&self, node: &NodeType) -> Result<Value> {
        self.factories.instantiate(node).map_err(|e| {
            TreeError::Instantiation {
                type_name: node.name().to_string(),
                reason: format!("{e:#}"),
            }
            .into()
        })
    }

    /// Starting container for a collection member
    pub fn instantiate_collection(&self, collection: &CollectionType) -> Result<Value> {
        self.factories.instantiate_collection(collection).map_err(|e| {
            TreeError::Instantiation {
                type_name: collection.container.name().to_string(),
                reason: format!("{e:#}"),
            }
            .into()
        })
    }

    /// A fresh instance of `node` with `partial` merged onto it
    pub fn hydrate(&self, node: &NodeType, partial: Value) -> Result<Value> {
        let mut instance = self.instantiate(node)?;
        merge(&mut instance, partial);
        Ok(instance)
    }

    /// Fail unless `node` can be instantiated and deserialized in this build
    pub fn assert_can_deserialize(&self, node: &NodeType) -> Result<()> {
        let sample = self.instantiate(node)?;
        self.format.can_deserialize(node, sample).map_err(|e| {
            TreeError::validation(format!("Type {node} cannot be deserialized: {e:#}")).into()
        })
    }

    /// Register the value of a template directive
    pub fn register_template(
        &mut self,
        template: &Template,
        value: Value,
        node: NodeType,
        point: &InjectionPoint,
    ) -> Result<()> {
        if let Some(existing) = self.templates.get(template.name()) {
            return Err(BuildError::from(TreeError::DuplicateTemplate {
                name: template.name().to_string(),
            })
            .at_point(point)
            .with_template(existing));
        }

        debug!("Registering template '{}' ({}) from {}", template.name(), node, point.location());
        self.templates.insert(TemplateRecord::new(
            template.name().to_string(),
            value,
            node,
            point.location(),
            point.directive().to_string(),
        ));
        Ok(())
    }

    /// An independent copy of template `name`, or a fresh `node` if no such template
    /// has been registered
    pub fn template_or_instantiate(&self, name: &str, node: &NodeType) -> Result<Value> {
        let Some(record) = self.templates.get(name) else {
            return self.instantiate(node);
        };
        trace!("Cloning template '{}'", name);
        self.format.round_trip(record.value()).map_err(|e| {
            TreeError::Deserialize {
                type_name: record.node().name().to_string(),
                reason: format!("failed to clone template '{name}': {e:#}"),
            }
            .into()
        })
    }

    /// Load `path` into a fresh instance of `node`
    pub fn load(&mut self, node: &NodeType, path: &Path, naming: Naming) -> Result<Value> {
        let instance = self.instantiate(node)?;
        self.deserialize(node, instance, path, naming)
    }

    /// Load `path` onto `instance`, applying every directive of `node`
    pub fn deserialize(
        &mut self,
        node: &NodeType,
        instance: Value,
        path: &Path,
        naming: Naming,
    ) -> Result<Value> {
        self.push(path, naming)?;
        let result = self.descend(node, instance, path);
        self.pop();
        result
    }

    fn descend(&mut self, node: &NodeType, mut instance: Value, path: &Path) -> Result<Value> {
        let content = fs::read_to_string(path).map_err(|e| TreeError::FileSystem {
            operation: "reading".to_string(),
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        if content.trim().is_empty() {
            trace!("{} is empty", path.display());
        } else {
            let overlay = self.format.parse(&content).map_err(|e| TreeError::Parse {
                path: path.to_path_buf(),
                format: self.format.name(),
                reason: format!("{e:#}"),
            })?;
            if overlay.is_null() {
                trace!("{} holds no document", path.display());
            } else {
                merge(&mut instance, overlay);
            }
        }

        let cache = self.cache;
        let points = cache.injection_points(node, self)?;
        for point in points.iter() {
            let existing = instance.get(point.name()).filter(|value| !value.is_null()).cloned();
            let resolved = point.resolve(self, existing).map_err(|e| e.at_point(point))?;
            point.assign(&mut instance, resolved).map_err(|e| e.at_point(point))?;
        }

        node.verify(instance.clone()).map_err(|e| TreeError::Deserialize {
            type_name: node.name().to_string(),
            reason: format!("{e} (in {})", path.display()),
        })?;
        Ok(instance)
    }
}

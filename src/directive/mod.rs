//! Directive model
//!
//! Directives are the declarative markers attached to schema members. They describe
//! how a member is populated from the file tree:
//!
//! | Directive | Phase | Populates the member with |
//! |-----------|-------|---------------------------|
//! | [`Template`] | pre | a named default object, registered for later consumers |
//! | [`Bean`] | main | the content of a sibling file |
//! | [`BeanCollection`] | main | one entry per file found in a directory layout |
//! | [`Directive::Name`] | post | the resolved name of the current file |
//! | [`Directive::SourceFile`] | post | the path of the current file |
//!
//! The set is closed: each kind maps to exactly one handler in
//! [`crate::injector`].

use std::fmt;

use crate::core::{ConfigNode, NodeType};

/// Resolution phase. Every pre-phase directive of a node runs before any main-phase
/// directive, and every main-phase directive before any post-phase one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// Templates
    Pre,
    /// Sibling files and directory collections
    Main,
    /// Metadata
    Post,
}

/// Kind of a directive, without its configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    Bean,
    BeanCollection,
    Template,
    Name,
    SourceFile,
}

impl DirectiveKind {
    /// Phase every directive of this kind runs in
    #[must_use]
    pub const fn phase(self) -> Phase {
        match self {
            Self::Template => Phase::Pre,
            Self::Bean | Self::BeanCollection => Phase::Main,
            Self::Name | Self::SourceFile => Phase::Post,
        }
    }
}

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bean => "Bean",
            Self::BeanCollection => "BeanCollection",
            Self::Template => "Template",
            Self::Name => "Name",
            Self::SourceFile => "SourceFile",
        };
        f.write_str(name)
    }
}

/// A directive together with its configuration
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// Load the member from a sibling file
    Bean(Bean),
    /// Load the member from a directory layout
    BeanCollection(BeanCollection),
    /// Register the member as a named template
    Template(Template),
    /// Set the member to the resolved name of the current file
    Name,
    /// Set the member to the path of the current file
    SourceFile,
}

impl Directive {
    /// Kind of this directive
    #[must_use]
    pub const fn kind(&self) -> DirectiveKind {
        match self {
            Self::Bean(_) => DirectiveKind::Bean,
            Self::BeanCollection(_) => DirectiveKind::BeanCollection,
            Self::Template(_) => DirectiveKind::Template,
            Self::Name => DirectiveKind::Name,
            Self::SourceFile => DirectiveKind::SourceFile,
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bean(bean) => write!(f, "{bean}"),
            Self::BeanCollection(collection) => write!(f, "{collection}"),
            Self::Template(template) => write!(f, "{template}"),
            Self::Name => f.write_str("@Name"),
            Self::SourceFile => f.write_str("@SourceFile"),
        }
    }
}

/// Configuration of a sibling-file reference.
///
/// An empty file name means "use the member name". A file name without an extension
/// gets the build's default extension.
///
/// ```rust,no_run
/// use beantree::Bean;
///
/// let bean = Bean::from_file("database").with_template("database-defaults").with_index(1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bean {
    file: String,
    template: String,
    load_as: Option<NodeType>,
    index: i32,
}

impl Bean {
    /// A reference named after its member
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A reference to an explicit sibling file
    #[must_use]
    pub fn from_file(file: impl Into<String>) -> Self {
        Self::new().with_file(file)
    }

    /// Name the sibling file explicitly.
    ///
    /// The default extension is appended unless the name already has an extension as
    /// [`std::path::Path::extension`] sees it: `settings.local` is kept as is, while a
    /// dot-file such as `.hidden` has no extension and becomes `.hidden.json`.
    #[must_use]
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = file.into();
        self
    }

    /// Start from a clone of the named template instead of the member's current value
    #[must_use]
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// Load the file as `T` instead of the member's declared type
    #[must_use]
    pub fn with_type<T: ConfigNode>(mut self) -> Self {
        self.load_as = Some(NodeType::of::<T>());
        self
    }

    /// Load the file as a dynamic node
    #[must_use]
    pub fn with_dynamic_type(mut self) -> Self {
        self.load_as = Some(NodeType::dynamic());
        self
    }

    #[must_use]
    pub const fn with_index(mut self, index: i32) -> Self {
        self.index = index;
        self
    }

    /// Configured file name; empty when the member name applies
    #[must_use]
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Configured template name; empty when none was set
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Override type, if any
    #[must_use]
    pub const fn load_as(&self) -> Option<NodeType> {
        self.load_as
    }

    #[must_use]
    pub const fn index(&self) -> i32 {
        self.index
    }
}

impl fmt::Display for Bean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@Bean(file=\"{}\", template=\"{}\"", self.file, self.template)?;
        if let Some(load_as) = self.load_as {
            write!(f, ", type={load_as}")?;
        }
        write!(f, ", index={})", self.index)
    }
}

/// How a directory layout maps onto collection entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Mapping {
    /// Every file directly inside `<dir>/` with the default extension; entries are
    /// named after the file without its extension
    #[default]
    ConfDir,
    /// Every immediate subdirectory holding a file named `<file>` plus the default
    /// extension; entries are named after the subdirectory
    MultiDirs,
}

impl fmt::Display for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfDir => f.write_str("CONF_DIR"),
            Self::MultiDirs => f.write_str("MULTI_DIRS"),
        }
    }
}

/// Configuration of a directory-to-collection mapping.
///
/// For [`Mapping::ConfDir`] the value names the directory; for
/// [`Mapping::MultiDirs`] it names the file expected in each subdirectory. An empty
/// value means "use the member name".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BeanCollection {
    value: String,
    mapping: Mapping,
    load_as: Option<NodeType>,
    template: String,
    index: i32,
}

impl BeanCollection {
    /// Map every file inside `dir`
    #[must_use]
    pub fn conf_dir(dir: impl Into<String>) -> Self {
        Self {
            value: dir.into(),
            mapping: Mapping::ConfDir,
            ..Self::default()
        }
    }

    /// Map every subdirectory holding `file`
    #[must_use]
    pub fn multi_dirs(file: impl Into<String>) -> Self {
        Self {
            value: file.into(),
            mapping: Mapping::MultiDirs,
            ..Self::default()
        }
    }

    /// Load entries as `T` instead of the collection's declared element type
    #[must_use]
    pub fn with_type<T: ConfigNode>(mut self) -> Self {
        self.load_as = Some(NodeType::of::<T>());
        self
    }

    /// Load entries as dynamic nodes
    #[must_use]
    pub fn with_dynamic_type(mut self) -> Self {
        self.load_as = Some(NodeType::dynamic());
        self
    }

    /// Start every entry from a clone of the named template
    #[must_use]
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    #[must_use]
    pub const fn with_index(mut self, index: i32) -> Self {
        self.index = index;
        self
    }

    /// Directory (CONF_DIR) or entry file (MULTI_DIRS); empty when the member name applies
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub const fn mapping(&self) -> Mapping {
        self.mapping
    }

    #[must_use]
    pub const fn load_as(&self) -> Option<NodeType> {
        self.load_as
    }

    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    #[must_use]
    pub const fn index(&self) -> i32 {
        self.index
    }
}

impl fmt::Display for BeanCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "@BeanCollection(value=\"{}\", mapping={}, template=\"{}\"",
            self.value, self.mapping, self.template
        )?;
        if let Some(load_as) = self.load_as {
            write!(f, ", type={load_as}")?;
        }
        write!(f, ", index={})", self.index)
    }
}

/// Configuration of a named template.
///
/// Without an external source the template is the member's own content in the
/// current file. With one, it is loaded from a sibling file following the [`Bean`]
/// rules; that bean's template name declares a dependency on another template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Template {
    name: String,
    external: Option<Bean>,
}

impl Template {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            external: None,
        }
    }

    /// Load the template from a sibling file
    #[must_use]
    pub fn with_external(mut self, bean: Bean) -> Self {
        self.external = Some(bean);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn external(&self) -> Option<&Bean> {
        self.external.as_ref()
    }

    /// Name of the template this one is built from, if any
    #[must_use]
    pub fn depends_on(&self) -> Option<&str> {
        self.external
            .as_ref()
            .map(Bean::template)
            .filter(|name| !name.trim().is_empty())
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@Template(name=\"{}\"", self.name)?;
        if let Some(external) = &self.external {
            write!(f, ", external={external}")?;
        }
        f.write_str(")")
    }
}

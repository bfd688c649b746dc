//! Error handling for beantree
//!
//! Every failure a build can run into is a configuration or data problem rather than
//! an execution bug, so diagnostics point at the configuration source instead of at a
//! stack trace. The error system consists of two types:
//! - [`TreeError`] - the root cause, one variant per fault class
//! - [`BuildError`] - the root cause plus an ordered list of ancillary diagnostic
//!   entries (declaring member, directive detail, template source)
//!
//! # Fault Classes
//!
//! - **Validation**: malformed directive configuration, detected while analyzing a type
//!   ([`TreeError::Validation`], [`TreeError::Instantiation`])
//! - **Cycle**: a file opened while it is already open ([`TreeError::Cycle`])
//! - **Template**: duplicate registration or an incompatible template
//!   ([`TreeError::DuplicateTemplate`], [`TreeError::TemplateMismatch`])
//! - **Member assignment**: writing a resolved value back onto its node failed
//!   ([`TreeError::MemberAssignment`])
//! - **Data**: unreadable files, unparsable content, or content that does not fit the
//!   target type ([`TreeError::FileSystem`], [`TreeError::Parse`], [`TreeError::Deserialize`])
//!
//! A missing sibling file is not a fault: the member is simply left empty.
//!
//! # Examples
//!
//! ```rust,no_run
//! use beantree::core::{BuildError, TreeError};
//!
//! let error = BuildError::new(TreeError::DuplicateTemplate { name: "server".to_string() })
//!     .with_ancillary("Error at target defaults: app::Config::defaults");
//!
//! assert_eq!(
//!     error.to_string(),
//!     "Template has already been defined: server\n\t=> Error at target defaults: app::Config::defaults"
//! );
//! error.display(); // colored rendition on stderr
//! ```

use colored::Colorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::context::templates::TemplateRecord;
use crate::schema::InjectionPoint;

/// Root cause of a failed build.
///
/// Each variant carries enough context to describe the failure on its own; the
/// location inside the schema is attached separately by [`BuildError`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// A directive is malformed or does not fit the member it is attached to
    ///
    /// Raised while analyzing a type: illegal path syntax, wrong collection shape,
    /// an element type that cannot be determined, or an override type that is not
    /// assignable to the member.
    #[error("{reason}")]
    Validation {
        /// What is wrong with the directive
        reason: String,
    },

    /// A file was opened while it was already open higher up in the same build
    ///
    /// `open_files` and `names` hold the open-file and name stacks exactly as they
    /// were when the second open was attempted.
    #[error(
        "Cycle detected: {} is already open (open files: {open_files:?}, names: {names:?})",
        .path.display()
    )]
    Cycle {
        /// The file that was opened twice
        path: PathBuf,
        /// Open-file stack at the time of the second open, outermost first
        open_files: Vec<PathBuf>,
        /// Name stack at the time of the second open, outermost first
        names: Vec<String>,
    },

    /// A second template was registered under a name already in use
    #[error("Template has already been defined: {name}")]
    DuplicateTemplate {
        /// Template name
        name: String,
    },

    /// A registered template does not fit the type its consumer deserializes into
    #[error("Template '{name}' of type {actual} is not compatible with {expected}")]
    TemplateMismatch {
        /// Template name
        name: String,
        /// Type the template was registered with
        actual: String,
        /// Type the consumer expected
        expected: String,
    },

    /// Writing a resolved value onto its node failed
    ///
    /// Custom setter failures always end up here, wrapped with their full cause chain.
    #[error("Failed to assign member '{member}': {reason}")]
    MemberAssignment {
        /// Serialized member name
        member: String,
        /// Why the assignment failed
        reason: String,
    },

    /// No instance of a type could be produced from its factory or default
    #[error("Cannot instantiate {type_name}: {reason}")]
    Instantiation {
        /// Type that could not be instantiated
        type_name: String,
        /// Why instantiation failed
        reason: String,
    },

    /// A merged document does not fit the type it is deserialized into
    #[error("Cannot deserialize {type_name}: {reason}")]
    Deserialize {
        /// Target type
        type_name: String,
        /// Underlying serde error
        reason: String,
    },

    /// A file's content could not be parsed in the active format
    #[error("Failed to parse {} as {format}: {reason}", .path.display())]
    Parse {
        /// File being parsed
        path: PathBuf,
        /// Name of the active format
        format: &'static str,
        /// Underlying parser error
        reason: String,
    },

    /// A file system operation failed
    #[error("File system error while {operation} {}: {reason}", .path.display())]
    FileSystem {
        /// What was being done, e.g. "reading"
        operation: String,
        /// Path involved
        path: PathBuf,
        /// Underlying I/O error
        reason: String,
    },
}

impl TreeError {
    /// Shorthand for a [`TreeError::Validation`] fault.
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }
}

/// A build failure: the root cause followed by ancillary diagnostics.
///
/// The primary message is always the root cause. Ancillary entries are appended in
/// the order they were attached and rendered one per line, prefixed with `=>`.
/// Member annotations are attached once, by the innermost injection point that saw
/// the failure, so an error raised deep inside a nested file keeps pointing at the
/// member that actually failed.
#[derive(Debug, Clone)]
pub struct BuildError {
    error: TreeError,
    ancillary: Vec<String>,
    located: bool,
}

impl BuildError {
    /// Create a build error with no ancillary entries
    #[must_use]
    pub const fn new(error: TreeError) -> Self {
        Self {
            error,
            ancillary: Vec::new(),
            located: false,
        }
    }

    /// The root cause
    #[must_use]
    pub const fn error(&self) -> &TreeError {
        &self.error
    }

    /// Ancillary diagnostic entries, in the order they were attached
    #[must_use]
    pub fn ancillary(&self) -> &[String] {
        &self.ancillary
    }

    /// Consume the error, returning its root cause
    #[must_use]
    pub fn into_inner(self) -> TreeError {
        self.error
    }

    /// Append an ancillary diagnostic entry
    #[must_use]
    pub fn with_ancillary(mut self, entry: impl Into<String>) -> Self {
        self.ancillary.push(entry.into());
        self
    }

    /// Attach the member and directive of the injection point that failed.
    ///
    /// Only the first call has any effect.
    #[must_use]
    pub(crate) fn at_point(mut self, point: &InjectionPoint) -> Self {
        if !self.located {
            self.located = true;
            self.ancillary.push(format!("Error at target {}: {}", point.name(), point.location()));
            self.ancillary.push(format!("Error with directive: {}", point.directive()));
        }
        self
    }

    /// Attach the declaration site of a template
    #[must_use]
    pub(crate) fn with_template(self, record: &TemplateRecord) -> Self {
        self.with_ancillary(format!("Template source: {}", record.source()))
            .with_ancillary(format!("Template directive: {}", record.directive()))
    }

    /// Print the error to stderr with terminal colors
    ///
    /// The root cause is printed red and bold, each ancillary entry yellow.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);
        for entry in &self.ancillary {
            eprintln!("  {} {}", "=>".yellow(), entry);
        }
    }
}

impl From<TreeError> for BuildError {
    fn from(error: TreeError) -> Self {
        Self::new(error)
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;
        for entry in &self.ancillary {
            write!(f, "\n\t=> {entry}")?;
        }
        Ok(())
    }
}

impl std::error::Error for BuildError {}

/// Result type used throughout the crate.
pub type Result<T, E = BuildError> = std::result::Result<T, E>;

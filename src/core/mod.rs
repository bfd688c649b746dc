//! Core types for beantree
//!
//! This module holds the foundations every other module builds on:
//!
//! ## `error` - Error Handling
//! - [`TreeError`] - root cause of a failed build, one variant per fault class
//! - [`BuildError`] - root cause plus ordered ancillary diagnostics
//! - [`Result`] - crate-wide result alias
//!
//! ## `node` - Type Descriptors
//! - [`ConfigNode`] - trait implemented by every loadable type
//! - [`NodeType`] - runtime descriptor of a node type
//! - [`MemberType`] - declared type of a member, used by directive validation

pub mod error;
pub mod node;

pub use error::{BuildError, Result, TreeError};
pub use node::{CollectionRole, CollectionType, ConfigNode, MemberType, NodeType, TypeKey};

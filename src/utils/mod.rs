//! Shared utilities
//!
//! - [`path_validation`] - syntax checks for paths named by directives

pub mod path_validation;

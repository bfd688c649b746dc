//! Path syntax checks for directive values.
//!
//! Directive paths are always resolved against the directory of the file currently
//! being loaded, so they must be plain relative paths: no root, no drive, and no "."
//! or ".." segments that would step outside the tree or make two spellings of the
//! same file possible.

use std::path::Path;

use crate::core::{Result, TreeError};

/// Characters with a meaning in glob patterns
pub const GLOB_CHARACTERS: [char; 5] = ['\\', '*', '?', '[', '{'];

/// Whether `value` is rooted (absolute, or starting at a root or drive)
#[must_use]
pub fn is_rooted(value: &str) -> bool {
    let path = Path::new(value);
    path.is_absolute() || path.has_root() || value.starts_with('/') || value.starts_with('\\')
}

/// Whether any segment of `value` is "." or ".."
#[must_use]
pub fn has_relative_segments(value: &str) -> bool {
    value.split(['/', '\\']).any(|segment| segment == "." || segment == "..")
}

/// The first glob metacharacter in `value`, if any
#[must_use]
pub fn find_glob_character(value: &str) -> Option<char> {
    value.chars().find(|c| GLOB_CHARACTERS.contains(c))
}

/// Validate the file name of a sibling-file reference.
pub fn validate_sibling_file(file: &str) -> Result<()> {
    if is_rooted(file) {
        return Err(TreeError::validation(format!("File name cannot be an absolute path: {file}"))
            .into());
    }
    if has_relative_segments(file) {
        return Err(
            TreeError::validation(format!("File name cannot be relativized: {file}")).into()
        );
    }
    Ok(())
}

/// Validate the directory or entry file of a directory mapping.
///
/// The value becomes part of a glob pattern, so metacharacters are rejected as well.
pub fn validate_collection_path(value: &str) -> Result<()> {
    if let Some(c) = find_glob_character(value) {
        return Err(TreeError::validation(format!(
            "Dir/file cannot contain special character: {c}"
        ))
        .into());
    }
    if is_rooted(value) {
        return Err(TreeError::validation(format!("Dir/file cannot be an absolute path: {value}"))
            .into());
    }
    if has_relative_segments(value) {
        return Err(TreeError::validation(format!("Dir/file name cannot be relativized: {value}"))
            .into());
    }
    Ok(())
}

//! Directory scanning for collection members.
//!
//! A directory mapping is turned into a two-segment glob pattern relative to the
//! directory of the file being loaded:
//!
//! | Mapping | Value | Pattern | Entry name |
//! |---------|-------|---------|------------|
//! | CONF_DIR | `beans` | `beans/*.json` | file name without extension |
//! | MULTI_DIRS | `account` | `*/account.json` | subdirectory name |
//!
//! Scans never descend more than two directory levels below their base and never
//! follow directory symlinks. Only regular files match. Matches are returned sorted by
//! path so collections are populated in a stable order.
//!
//! # Examples
//!
//! ```rust,no_run
//! use beantree::directive::Mapping;
//! use beantree::pattern::DirectoryScanner;
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! let scanner = DirectoryScanner::for_mapping(Mapping::ConfDir, "beans", ".json")?;
//! for file in scanner.find_matches(Path::new("config"))? {
//!     println!("Found: {}", file.display());
//! }
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use glob::{MatchOptions, Pattern};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::directive::Mapping;

/// Deepest level a scan descends to below its base directory
pub const MAX_SCAN_DEPTH: usize = 2;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Compiled two-level glob pattern for one directory mapping.
#[derive(Debug, Clone)]
pub struct DirectoryScanner {
    pattern: Pattern,
    original_pattern: String,
}

impl DirectoryScanner {
    /// Build the scanner for `mapping` over `value` with the given default extension.
    ///
    /// `value` and `extension` are matched literally; any glob metacharacters they
    /// contain are escaped. For MULTI_DIRS an entry file that already ends with the
    /// extension is used as-is.
    pub fn for_mapping(mapping: Mapping, value: &str, extension: &str) -> Result<Self> {
        let pattern = match mapping {
            Mapping::ConfDir => {
                format!("{}/*{}", Pattern::escape(value), Pattern::escape(extension))
            }
            Mapping::MultiDirs => {
                let file = if value.ends_with(extension) {
                    value.to_string()
                } else {
                    format!("{value}{extension}")
                };
                format!("*/{}", Pattern::escape(&file))
            }
        };
        Self::new(&pattern)
    }

    /// Compile a raw pattern, relative to the scan base
    pub fn new(pattern: &str) -> Result<Self> {
        let compiled =
            Pattern::new(pattern).with_context(|| format!("Invalid glob pattern: {pattern}"))?;
        Ok(Self {
            pattern: compiled,
            original_pattern: pattern.to_string(),
        })
    }

    /// The pattern as written
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.original_pattern
    }

    /// Whether a path relative to the scan base matches
    #[must_use]
    pub fn matches(&self, relative: &Path) -> bool {
        self.pattern.matches_with(&to_pattern_path(relative), MATCH_OPTIONS)
    }

    /// Every regular file below `base` matching the pattern, sorted by path.
    ///
    /// A missing or unreadable base yields no matches.
    pub fn find_matches(&self, base: &Path) -> Result<Vec<PathBuf>> {
        debug!("Scanning {} for '{}'", base.display(), self.original_pattern);

        let mut matches = Vec::new();
        for entry in WalkDir::new(base)
            .min_depth(1)
            .max_depth(MAX_SCAN_DEPTH)
            .follow_links(false)
            .into_iter()
            .filter_map(std::result::Result::ok)
        {
            let path = entry.path();
            let Ok(relative) = path.strip_prefix(base) else {
                continue;
            };

            trace!("Checking path: {}", relative.display());

            if self.matches(relative) && path.is_file() {
                trace!("Found match: {}", relative.display());
                matches.push(path.to_path_buf());
            }
        }

        matches.sort();
        debug!("Found {} matches for '{}'", matches.len(), self.original_pattern);
        Ok(matches)
    }
}

/// Relative path with `/` separators on every platform
fn to_pattern_path(relative: &Path) -> String {
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

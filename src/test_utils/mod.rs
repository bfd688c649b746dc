//! Test utilities for beantree
//!
//! Helpers for building throwaway file trees and for turning on logging in tests.
//!
//! # Example
//!
//! ```rust,no_run
//! use beantree::test_utils::{TestTree, init_test_logging};
//!
//! # fn example() -> anyhow::Result<()> {
//! init_test_logging(None);
//!
//! let tree = TestTree::new()?;
//! tree.write("entry.json", r#"{"port": 8080}"#)?;
//! tree.write("beans/foo.json", "{}")?;
//! assert!(tree.path("beans/foo.json").is_file());
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tempfile::TempDir;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has any effect. Uses `level` when given, otherwise
/// `RUST_LOG`; with neither, logging stays off.
///
/// ```bash
/// RUST_LOG=beantree=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// A file tree in a temporary directory, removed on drop
#[derive(Debug)]
pub struct TestTree {
    temp: TempDir,
}

impl TestTree {
    pub fn new() -> Result<Self> {
        let temp = TempDir::new().context("Failed to create temporary directory")?;
        Ok(Self { temp })
    }

    /// Root of the tree
    #[must_use]
    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    /// Absolute path of `relative`
    #[must_use]
    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.temp.path().join(relative)
    }

    /// Write `content` to `relative`, creating parent directories; returns the path
    pub fn write(&self, relative: impl AsRef<Path>, content: &str) -> Result<PathBuf> {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Create directory `relative` and its parents; returns the path
    pub fn mkdir(&self, relative: impl AsRef<Path>) -> Result<PathBuf> {
        let path = self.path(relative);
        fs::create_dir_all(&path).with_context(|| format!("Failed to create {}", path.display()))?;
        Ok(path)
    }
}

//! Process-wide cache of analyzed schemas.
//!
//! Analysis results depend only on the type, so they are computed once and shared.
//! Validation against a build's factories and format does depend on the build, so a
//! hit is revalidated before it is handed out.
//!
//! The cache is a [`DashMap`] behind an [`Arc`]: clones share entries, and builds on
//! different threads can read and insert concurrently. Per-build state never lives
//! here.

use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, trace};

use super::{InjectionPoint, analyze, revalidate};
use crate::context::DeserializationContext;
use crate::core::{NodeType, Result, TypeKey};

/// Shared map of type to ordered injection points
#[derive(Debug, Clone, Default)]
pub struct SchemaCache {
    schemas: Arc<DashMap<TypeKey, Arc<[InjectionPoint]>>>,
}

impl SchemaCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ordered injection points of `node`, analyzing it on first use.
    ///
    /// A cached entry is revalidated against `ctx`; its order is reused as-is.
    pub fn injection_points(
        &self,
        node: &NodeType,
        ctx: &DeserializationContext<'_>,
    ) -> Result<Arc<[InjectionPoint]>> {
        let key = node.key();
        let cached = self.schemas.get(&key).map(|entry| Arc::clone(entry.value()));

        if let Some(points) = cached {
            trace!("Schema cache hit for {}", key);
            revalidate(&points, ctx)?;
            return Ok(points);
        }

        debug!("Schema cache miss for {}", key);
        let analyzed: Arc<[InjectionPoint]> = analyze(node, ctx)?.into();
        let stored = Arc::clone(self.schemas.entry(key).or_insert(analyzed).value());
        Ok(stored)
    }

    /// Cached points of `node`, without validation
    #[must_use]
    pub fn get(&self, node: &NodeType) -> Option<Arc<[InjectionPoint]>> {
        self.schemas.get(&node.key()).map(|entry| Arc::clone(entry.value()))
    }

    #[must_use]
    pub fn contains(&self, node: &NodeType) -> bool {
        self.schemas.contains_key(&node.key())
    }

    /// Number of cached types
    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn clear(&self) {
        self.schemas.clear();
    }

    /// Whether two handles point at the same cache
    #[must_use]
    pub fn shares_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.schemas, &other.schemas)
    }
}

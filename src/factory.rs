//! Instance factories
//!
//! Every node a build creates starts from a constructor. A constructor registered for
//! the node's type takes priority; otherwise the type's [`Default`] is used. Collection
//! members with no value yet start from a factory for their container type or, failing
//! that, from the factory for their [`CollectionRole`]. Role factories always exist:
//! an empty object for maps, an empty array for everything else.
//!
//! [`Factories`] is cheap to clone and clones share the same registry, which is how a
//! factory set is shared between builders. The registry is a [`DashMap`], so builds
//! running on different threads can read it while factories are being registered.

use anyhow::Result;
use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::core::{CollectionRole, CollectionType, NodeType, TypeKey};

/// A constructor producing a starting document
pub type FactoryFn = Arc<dyn Fn() -> Result<Value> + Send + Sync>;

/// What a factory is registered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FactoryKey {
    /// A concrete node or container type
    Type(TypeKey),
    /// Every collection member of a role
    Role(CollectionRole),
}

const ROLES: [CollectionRole; 4] =
    [CollectionRole::Map, CollectionRole::List, CollectionRole::Set, CollectionRole::Queue];

/// Shared registry of instance factories
#[derive(Clone)]
pub struct Factories {
    entries: Arc<DashMap<FactoryKey, FactoryFn>>,
}

impl Factories {
    /// A registry holding only the default role factories
    #[must_use]
    pub fn new() -> Self {
        let factories = Self {
            entries: Arc::new(DashMap::new()),
        };
        for role in ROLES {
            factories.reset_role(role);
        }
        factories
    }

    /// Register a factory for node or container type `T`
    pub fn register<T, F>(&self, factory: F)
    where
        T: Serialize + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let key = TypeKey::of::<T>();
        debug!("Registering factory for {}", key);
        self.entries.insert(FactoryKey::Type(key), serialized(factory));
    }

    /// Register the starting container for every collection member of `role`
    pub fn register_role<C, F>(&self, role: CollectionRole, factory: F)
    where
        C: Serialize + 'static,
        F: Fn() -> C + Send + Sync + 'static,
    {
        debug!("Registering {} collection factory", role);
        self.entries.insert(FactoryKey::Role(role), serialized(factory));
    }

    /// Register a raw factory under any key
    pub fn register_raw(&self, key: FactoryKey, factory: FactoryFn) {
        self.entries.insert(key, factory);
    }

    /// Remove the factory for `T`; instances fall back to `Default`
    pub fn remove_type<T: 'static>(&self) -> bool {
        self.entries.remove(&FactoryKey::Type(TypeKey::of::<T>())).is_some()
    }

    /// Restore the default factory for `role`
    pub fn remove_role(&self, role: CollectionRole) {
        self.reset_role(role);
    }

    /// Whether a factory is registered for `T`
    #[must_use]
    pub fn contains<T: 'static>(&self) -> bool {
        self.entries.contains_key(&FactoryKey::Type(TypeKey::of::<T>()))
    }

    /// Copy every entry of `other` into this registry, replacing existing entries
    pub fn extend_from(&self, other: &Self) {
        for entry in other.entries.iter() {
            self.entries.insert(*entry.key(), Arc::clone(entry.value()));
        }
    }

    /// Whether two handles point at the same registry
    #[must_use]
    pub fn shares_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }

    /// Produce a starting document for `node`
    pub fn instantiate(&self, node: &NodeType) -> Result<Value> {
        match self.lookup(FactoryKey::Type(node.key())) {
            Some(factory) => factory(),
            None => Ok(node.construct()?),
        }
    }

    /// Produce a starting container for a collection member
    pub fn instantiate_collection(&self, collection: &CollectionType) -> Result<Value> {
        if let Some(factory) = self.lookup(FactoryKey::Type(collection.container)) {
            return factory();
        }
        match self.lookup(FactoryKey::Role(collection.role)) {
            Some(factory) => factory(),
            None => Ok(collection.role.empty()),
        }
    }

    fn lookup(&self, key: FactoryKey) -> Option<FactoryFn> {
        self.entries.get(&key).map(|entry| Arc::clone(entry.value()))
    }

    fn reset_role(&self, role: CollectionRole) {
        let factory: FactoryFn = Arc::new(move || -> Result<Value> { Ok(role.empty()) });
        self.entries.insert(FactoryKey::Role(role), factory);
    }
}

impl Default for Factories {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Factories {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<FactoryKey> = self.entries.iter().map(|entry| *entry.key()).collect();
        f.debug_struct("Factories").field("keys", &keys).finish()
    }
}

fn serialized<T, F>(factory: F) -> FactoryFn
where
    T: Serialize + 'static,
    F: Fn() -> T + Send + Sync + 'static,
{
    Arc::new(move || -> Result<Value> { Ok(serde_json::to_value(factory())?) })
}

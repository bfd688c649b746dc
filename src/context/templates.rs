//! Per-build template registry.

use serde_json::Value;
use std::collections::HashMap;

use crate::core::NodeType;

/// A registered template and where it was declared
#[derive(Debug, Clone)]
pub struct TemplateRecord {
    name: String,
    value: Value,
    node: NodeType,
    source: String,
    directive: String,
}

impl TemplateRecord {
    #[must_use]
    pub const fn new(
        name: String,
        value: Value,
        node: NodeType,
        source: String,
        directive: String,
    ) -> Self {
        Self {
            name,
            value,
            node,
            source,
            directive,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The stored instance; consumers get clones, never this value
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// Type the template was registered with
    #[must_use]
    pub const fn node(&self) -> NodeType {
        self.node
    }

    /// Declaring member, as `Type::member`
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Declaring directive, rendered
    #[must_use]
    pub fn directive(&self) -> &str {
        &self.directive
    }
}

/// Templates registered so far in one build, by name
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    records: HashMap<String, TemplateRecord>,
}

impl TemplateRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record. Returns `false`, leaving the registry untouched, if the name is
    /// already taken.
    pub fn insert(&mut self, record: TemplateRecord) -> bool {
        if self.records.contains_key(&record.name) {
            return false;
        }
        self.records.insert(record.name.clone(), record);
        true
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TemplateRecord> {
        self.records.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Registered names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.records.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

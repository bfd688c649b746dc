//! Common node types and helpers for beantree integration tests
//!
//! The types here model a small application configuration: a root [`App`] with a
//! sibling database file, a server built from a named template, a directory of
//! plain entries and one subdirectory per account.

// Allow dead code because these fixtures are used across different test files
// and not all fixtures are used in every test file
#![allow(dead_code)]

use beantree::test_utils::TestTree;
use beantree::{Bean, BeanCollection, ConfigNode, MemberType, SchemaBuilder, Template, TreeBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Server {
    pub port: u16,
    pub base_path: String,
}

impl ConfigNode for Server {}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Database {
    pub url: String,
    pub pool: u32,
}

impl ConfigNode for Database {}

/// A named entry, used as collection element
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Entry {
    pub name: String,
    pub value: u32,
}

impl ConfigNode for Entry {
    fn describe(schema: &mut SchemaBuilder) {
        schema.name("name");
    }
}

impl Entry {
    pub fn new(name: &str, value: u32) -> Self {
        Self {
            name: name.to_string(),
            value,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Details {
    pub level: u32,
    pub source: Option<PathBuf>,
}

impl ConfigNode for Details {
    fn describe(schema: &mut SchemaBuilder) {
        schema.source_file("source");
    }
}

/// One account per subdirectory, with an optional details file next to it
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Account {
    pub name: String,
    pub owner: String,
    pub details: Option<Details>,
}

impl ConfigNode for Account {
    fn describe(schema: &mut SchemaBuilder) {
        schema.bean::<Details>("details", Bean::new()).name("name");
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct App {
    pub name: String,
    pub port: u16,
    pub database: Option<Database>,
    pub defaults: Option<Server>,
    pub server: Option<Server>,
    pub beans: HashMap<String, Entry>,
    pub accounts: HashMap<String, Account>,
    pub source: Option<PathBuf>,
}

impl ConfigNode for App {
    fn describe(schema: &mut SchemaBuilder) {
        schema
            .name("name")
            .source_file("source")
            .bean::<Database>("database", Bean::new())
            .bean::<Server>("server", Bean::new().with_template("server"))
            .bean_collection("beans", MemberType::map::<Entry>(), BeanCollection::conf_dir("beans"))
            .bean_collection(
                "accounts",
                MemberType::map::<Account>(),
                BeanCollection::multi_dirs("account"),
            )
            .template::<Server>("defaults", Template::named("server"));
    }
}

/// Lay out a complete [`App`] tree rooted at `app.json`
pub fn write_app_tree(tree: &TestTree) -> anyhow::Result<PathBuf> {
    let root = tree.write(
        "app.json",
        r#"{"port": 80, "defaults": {"port": 8080, "basePath": "/api"}}"#,
    )?;
    tree.write("database.json", r#"{"url": "postgres://db", "pool": 4}"#)?;
    tree.write("server.json", r#"{"port": 8888}"#)?;
    tree.write("beans/foo.json", r#"{"value": 1}"#)?;
    tree.write("beans/bar.json", r#"{"value": 2}"#)?;
    tree.write("beans/baz.txt", "not an entry")?;
    tree.write("x/account.json", r#"{"owner": "xavier"}"#)?;
    tree.write("x/details.json", r#"{"level": 3}"#)?;
    tree.write("y/account.json", r#"{"owner": "yvonne"}"#)?;
    tree.write("z/other.json", r#"{"owner": "zed"}"#)?;
    Ok(root)
}

/// Build `file` inside `tree` with a default builder
pub fn build<T: ConfigNode>(tree: &TestTree, file: &str) -> beantree::Result<T> {
    TreeBuilder::new().build(tree.path(file))
}

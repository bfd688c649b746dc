//! Builder configuration, reuse, factories and custom setters.

use anyhow::Result;
use beantree::factory::FactoryKey;
use beantree::test_utils::{TestTree, init_test_logging};
use beantree::{
    Bean, BuilderConfig, ConfigNode, FormatKind, NodeType, SchemaBuilder, TreeBuilder, TreeError,
    TypeKey,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use std::thread;

use crate::common::{App, Database, Server, write_app_tree};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct Holder {
    port: u16,
    database: Option<Database>,
}

impl ConfigNode for Holder {
    fn describe(schema: &mut SchemaBuilder) {
        schema.bean::<Database>("database", Bean::new());
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct WithSetter {
    database: Option<Database>,
    database_url: String,
}

impl ConfigNode for WithSetter {
    fn describe(schema: &mut SchemaBuilder) {
        schema.bean::<Database>("database", Bean::new()).with_setter(|fields, value| {
            let url = value.get("url").and_then(Value::as_str).unwrap_or("none").to_uppercase();
            fields.insert("database_url".to_string(), Value::String(url));
            fields.insert("database".to_string(), value);
            Ok(())
        });
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct FailingSetter {
    server: Option<Server>,
}

impl ConfigNode for FailingSetter {
    fn describe(schema: &mut SchemaBuilder) {
        schema
            .bean::<Server>("server", Bean::new())
            .with_setter(|_, _| anyhow::bail!("port is reserved"));
    }
}

#[test]
fn test_build_into_existing_instance() -> Result<()> {
    init_test_logging(None);
    let tree = TestTree::new()?;
    tree.write("root.json", "{}")?;
    tree.write("database.json", r#"{"url": "postgres://db"}"#)?;

    let existing = Holder {
        port: 4242,
        database: Some(Database {
            url: "old".to_string(),
            pool: 7,
        }),
    };
    let holder = TreeBuilder::new().build_into(existing, tree.path("root.json"))?;
    assert_eq!(holder.port, 4242);
    assert_eq!(
        holder.database,
        Some(Database {
            url: "postgres://db".to_string(),
            pool: 7,
        })
    );
    Ok(())
}

#[test]
fn test_build_value_for_dynamic_root() -> Result<()> {
    init_test_logging(None);
    let tree = TestTree::new()?;
    tree.write("root.json", r#"{"anything": {"goes": true}}"#)?;

    let value = TreeBuilder::new().build_value(&NodeType::dynamic(), tree.path("root.json"))?;
    assert_eq!(value, json!({"anything": {"goes": true}}));

    let typed = TreeBuilder::new().build_value(&NodeType::of::<Holder>(), tree.path("root.json"))?;
    assert_eq!(typed["port"], json!(0));
    Ok(())
}

#[test]
fn test_missing_root_file_is_a_file_system_error() -> Result<()> {
    init_test_logging(None);
    let tree = TestTree::new()?;

    let error = TreeBuilder::new().build::<Holder>(tree.path("missing.json")).unwrap_err();
    match error.error() {
        TreeError::FileSystem {
            operation,
            path,
            ..
        } => {
            assert_eq!(operation, "reading");
            assert_eq!(path, &tree.path("missing.json"));
        }
        other => panic!("expected a file system error, got {other:?}"),
    }
    Ok(())
}

#[test]
fn test_extension_is_normalized() -> Result<()> {
    init_test_logging(None);
    for extension in ["yaml", ".yaml", " .yaml "] {
        let builder = TreeBuilder::new().with_default_extension(extension);
        assert_eq!(builder.default_extension(), ".yaml");
    }
    Ok(())
}

#[test]
fn test_type_factory_seeds_loaded_nodes() -> Result<()> {
    init_test_logging(None);
    let tree = TestTree::new()?;
    tree.write("root.json", "{}")?;
    tree.write("database.json", r#"{"url": "postgres://db"}"#)?;

    let builder = TreeBuilder::new().with_factory(|| Database {
        url: "unset".to_string(),
        pool: 16,
    });
    let holder: Holder = builder.build(tree.path("root.json"))?;
    assert_eq!(holder.database.as_ref().map(|db| db.pool), Some(16));
    assert_eq!(holder.database.map(|db| db.url).as_deref(), Some("postgres://db"));

    assert!(builder.factories().remove_type::<Database>());
    let holder: Holder = builder.build(tree.path("root.json"))?;
    assert_eq!(holder.database.map(|db| db.pool), Some(0));
    Ok(())
}

#[test]
fn test_shared_cache_is_revalidated_per_builder() -> Result<()> {
    init_test_logging(None);
    let tree = TestTree::new()?;
    tree.write("root.json", "{}")?;

    let first = TreeBuilder::new();
    let _: Holder = first.build(tree.path("root.json"))?;
    assert!(first.cache().contains(&NodeType::of::<Holder>()));

    let second = TreeBuilder::new().reuse_cache(&first);
    assert!(second.cache().shares_with(first.cache()));
    second.factories().register_raw(
        FactoryKey::Type(TypeKey::of::<Database>()),
        Arc::new(|| -> anyhow::Result<Value> { anyhow::bail!("database factory offline") }),
    );

    let error = second.build::<Holder>(tree.path("root.json")).unwrap_err();
    assert!(matches!(error.error(), TreeError::Instantiation { .. }));
    assert!(error.to_string().contains("database factory offline"));

    // The first builder's factories are untouched
    let _: Holder = first.build(tree.path("root.json"))?;
    Ok(())
}

#[test]
fn test_shared_and_copied_factories() -> Result<()> {
    init_test_logging(None);
    let first = TreeBuilder::new();
    let shared = TreeBuilder::new().share_factories(&first);
    let copied = TreeBuilder::new().reuse_factories(&first);

    first.factories().register(Server::default);
    assert!(shared.factories().contains::<Server>());
    assert!(!copied.factories().contains::<Server>());
    Ok(())
}

#[test]
fn test_concurrent_builds_share_cache() -> Result<()> {
    init_test_logging(None);
    let tree = TestTree::new()?;
    let root = write_app_tree(&tree)?;
    let builder = TreeBuilder::new();

    let results: Vec<beantree::Result<App>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let builder = builder.clone();
                let root = root.clone();
                scope.spawn(move || builder.build::<App>(&root))
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().expect("build thread panicked")).collect()
    });

    let apps = results.into_iter().collect::<beantree::Result<Vec<App>>>()?;
    assert!(apps.windows(2).all(|pair| pair[0] == pair[1]));
    assert!(builder.cache().len() >= 4);
    Ok(())
}

#[test]
fn test_custom_setter_receives_resolved_value() -> Result<()> {
    init_test_logging(None);
    let tree = TestTree::new()?;
    tree.write("root.json", "{}")?;
    tree.write("database.json", r#"{"url": "postgres://db"}"#)?;

    let with_setter: WithSetter = TreeBuilder::new().build(tree.path("root.json"))?;
    assert_eq!(with_setter.database_url, "POSTGRES://DB");
    assert!(with_setter.database.is_some());
    Ok(())
}

#[test]
fn test_custom_setter_receives_null_for_absence() -> Result<()> {
    init_test_logging(None);
    let tree = TestTree::new()?;
    tree.write("root.json", "{}")?;

    let with_setter: WithSetter = TreeBuilder::new().build(tree.path("root.json"))?;
    assert_eq!(with_setter.database_url, "NONE");
    assert!(with_setter.database.is_none());
    Ok(())
}

#[test]
fn test_custom_setter_failure_is_wrapped() -> Result<()> {
    init_test_logging(None);
    let tree = TestTree::new()?;
    tree.write("root.json", "{}")?;
    tree.write("server.json", r#"{"port": 22}"#)?;

    let error = TreeBuilder::new().build::<FailingSetter>(tree.path("root.json")).unwrap_err();
    assert_eq!(
        error.error(),
        &TreeError::MemberAssignment {
            member: "server".to_string(),
            reason: "port is reserved".to_string(),
        }
    );
    assert!(error.to_string().contains("\n\t=> Error at target server:"));
    Ok(())
}

#[test]
fn test_from_config_file() -> Result<()> {
    init_test_logging(None);
    let tree = TestTree::new()?;
    let config_path = tree.write("beantree.toml", "format = \"yaml\"\ndefault_extension = \"yml\"\n")?;
    tree.write("root.yml", "port: 7\n")?;
    tree.write("database.yml", "url: yaml://db\n")?;

    let config = BuilderConfig::load_from(&config_path)?;
    assert_eq!(config.format, FormatKind::Yaml);

    let holder: Holder = TreeBuilder::from_config(&config).build(tree.path("root.yml"))?;
    assert_eq!(holder.port, 7);
    assert_eq!(holder.database.map(|db| db.url).as_deref(), Some("yaml://db"));
    Ok(())
}

//! Template registration, cloning and compatibility.

use anyhow::Result;
use beantree::test_utils::{TestTree, init_test_logging};
use beantree::{Bean, ConfigNode, SchemaBuilder, Template, TreeError};
use serde::{Deserialize, Serialize};

use crate::common::{Entry, Server, build};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct Explicit {
    defaults: Option<Server>,
    server: Option<Server>,
}

impl ConfigNode for Explicit {
    fn describe(schema: &mut SchemaBuilder) {
        schema
            .bean::<Server>("server", Bean::new().with_template("server"))
            .template::<Server>("defaults", Template::named("server"));
    }
}

/// Consumer relying on the template named after the member
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct Implied {
    defaults: Option<Server>,
    server: Option<Server>,
}

impl ConfigNode for Implied {
    fn describe(schema: &mut SchemaBuilder) {
        schema
            .template::<Server>("defaults", Template::named("server"))
            .bean::<Server>("server", Bean::new());
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct External {
    defaults: Option<Server>,
    server: Option<Server>,
}

impl ConfigNode for External {
    fn describe(schema: &mut SchemaBuilder) {
        schema
            .template::<Server>(
                "defaults",
                Template::named("server").with_external(Bean::from_file("shared/server")),
            )
            .bean::<Server>("server", Bean::new());
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct Duplicate {
    first: Option<Server>,
    second: Option<Server>,
}

impl ConfigNode for Duplicate {
    fn describe(schema: &mut SchemaBuilder) {
        schema
            .template::<Server>("first", Template::named("server"))
            .template::<Server>("second", Template::named("server"));
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct Mismatch {
    defaults: Option<Server>,
    entry: Option<Entry>,
}

impl ConfigNode for Mismatch {
    fn describe(schema: &mut SchemaBuilder) {
        schema
            .template::<Server>("defaults", Template::named("server"))
            .bean::<Entry>("entry", Bean::new().with_template("server"));
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct Unregistered {
    server: Option<Server>,
}

impl ConfigNode for Unregistered {
    fn describe(schema: &mut SchemaBuilder) {
        schema.bean::<Server>("server", Bean::new().with_template("missing"));
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct Unnamed {
    defaults: Option<Server>,
}

impl ConfigNode for Unnamed {
    fn describe(schema: &mut SchemaBuilder) {
        schema.template::<Server>("defaults", Template::named("  "));
    }
}

fn server(port: u16, base_path: &str) -> Server {
    Server {
        port,
        base_path: base_path.to_string(),
    }
}

#[test]
fn test_template_merged_with_sibling_file() -> Result<()> {
    init_test_logging(None);
    let tree = TestTree::new()?;
    tree.write("root.json", r#"{"defaults": {"port": 8080, "basePath": "/api"}}"#)?;
    tree.write("server.json", r#"{"port": 8888}"#)?;

    let explicit: Explicit = build(&tree, "root.json")?;
    assert_eq!(explicit.server, Some(server(8888, "/api")));
    assert_eq!(explicit.defaults, Some(server(8080, "/api")));
    Ok(())
}

#[test]
fn test_explicit_template_replaces_in_place_value() -> Result<()> {
    init_test_logging(None);
    let tree = TestTree::new()?;
    tree.write(
        "root.json",
        r#"{"defaults": {"port": 8080, "basePath": "/api"}, "server": {"basePath": "/inline"}}"#,
    )?;
    tree.write("server.json", r#"{"port": 8888}"#)?;

    let explicit: Explicit = build(&tree, "root.json")?;
    assert_eq!(explicit.server, Some(server(8888, "/api")));
    Ok(())
}

#[test]
fn test_implied_template_applies_without_in_place_value() -> Result<()> {
    init_test_logging(None);
    let tree = TestTree::new()?;
    tree.write("root.json", r#"{"defaults": {"port": 8080, "basePath": "/api"}}"#)?;
    tree.write("server.json", r#"{"port": 8888}"#)?;

    let implied: Implied = build(&tree, "root.json")?;
    assert_eq!(implied.server, Some(server(8888, "/api")));
    Ok(())
}

#[test]
fn test_in_place_value_wins_over_implied_template() -> Result<()> {
    init_test_logging(None);
    let tree = TestTree::new()?;
    tree.write(
        "root.json",
        r#"{"defaults": {"port": 8080, "basePath": "/api"}, "server": {"basePath": "/inline"}}"#,
    )?;
    tree.write("server.json", r#"{"port": 8888}"#)?;

    let implied: Implied = build(&tree, "root.json")?;
    assert_eq!(implied.server, Some(server(8888, "/inline")));
    Ok(())
}

#[test]
fn test_external_template_source() -> Result<()> {
    init_test_logging(None);
    let tree = TestTree::new()?;
    tree.write("root.json", "{}")?;
    tree.write("shared/server.json", r#"{"port": 8080, "basePath": "/shared"}"#)?;
    tree.write("server.json", r#"{"port": 9090}"#)?;

    let external: External = build(&tree, "root.json")?;
    assert_eq!(external.defaults, Some(server(8080, "/shared")));
    assert_eq!(external.server, Some(server(9090, "/shared")));
    Ok(())
}

#[test]
fn test_template_without_content_registers_fresh_instance() -> Result<()> {
    init_test_logging(None);
    let tree = TestTree::new()?;
    tree.write("root.json", "{}")?;
    tree.write("server.json", r#"{"port": 9090}"#)?;

    let external: External = build(&tree, "root.json")?;
    assert_eq!(external.defaults, None);
    assert_eq!(external.server, Some(server(9090, "")));
    Ok(())
}

#[test]
fn test_duplicate_template_is_fatal() -> Result<()> {
    init_test_logging(None);
    let tree = TestTree::new()?;
    tree.write("root.json", "{}")?;

    let error = build::<Duplicate>(&tree, "root.json").unwrap_err();
    assert_eq!(
        error.error(),
        &TreeError::DuplicateTemplate {
            name: "server".to_string(),
        }
    );

    let ancillary = error.ancillary();
    assert!(ancillary[0].starts_with("Error at target second:"), "{ancillary:?}");
    assert!(ancillary[1].starts_with("Error with directive: @Template(name=\"server\""));
    assert!(ancillary[2].starts_with("Template source:"));
    assert!(ancillary[2].ends_with("::first"), "{ancillary:?}");
    assert!(ancillary[3].starts_with("Template directive:"));
    Ok(())
}

#[test]
fn test_incompatible_template_is_fatal() -> Result<()> {
    init_test_logging(None);
    let tree = TestTree::new()?;
    tree.write("root.json", r#"{"defaults": {"port": 8080}}"#)?;
    tree.write("entry.json", "{}")?;

    let error = build::<Mismatch>(&tree, "root.json").unwrap_err();
    match error.error() {
        TreeError::TemplateMismatch {
            name,
            actual,
            expected,
        } => {
            assert_eq!(name, "server");
            assert!(actual.ends_with("Server"), "{actual}");
            assert!(expected.ends_with("Entry"), "{expected}");
        }
        other => panic!("expected a template mismatch, got {other:?}"),
    }
    assert!(error.ancillary()[0].starts_with("Error at target entry:"));
    assert!(error.ancillary().iter().any(|entry| entry.starts_with("Template source:")));
    Ok(())
}

#[test]
fn test_unregistered_template_yields_fresh_instance() -> Result<()> {
    init_test_logging(None);
    let tree = TestTree::new()?;
    tree.write("root.json", "{}")?;
    tree.write("server.json", r#"{"port": 1}"#)?;

    let unregistered: Unregistered = build(&tree, "root.json")?;
    assert_eq!(unregistered.server, Some(server(1, "")));
    Ok(())
}

#[test]
fn test_template_requires_name() -> Result<()> {
    init_test_logging(None);
    let tree = TestTree::new()?;
    tree.write("root.json", "{}")?;

    let error = build::<Unnamed>(&tree, "root.json").unwrap_err();
    assert_eq!(error.error(), &TreeError::validation("Must specify name for template."));
    Ok(())
}

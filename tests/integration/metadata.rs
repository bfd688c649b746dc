//! Name and SourceFile metadata.

use anyhow::Result;
use beantree::directive::Directive;
use beantree::test_utils::{TestTree, init_test_logging};
use beantree::{Bean, ConfigNode, MemberType, SchemaBuilder, TreeError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::common::{Details, Entry, build};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct Labeled {
    label: String,
    origin: PathBuf,
    entry: Option<Entry>,
    details: Option<Details>,
}

impl ConfigNode for Labeled {
    fn describe(schema: &mut SchemaBuilder) {
        schema
            .name("label")
            .source_file("origin")
            .bean::<Entry>("entry", Bean::from_file("first-entry"))
            .bean::<Details>("details", Bean::new());
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct NumericName {
    count: u32,
}

impl ConfigNode for NumericName {
    fn describe(schema: &mut SchemaBuilder) {
        schema.directive("count", MemberType::scalar::<u32>(), Directive::Name);
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct TextSource {
    source: String,
}

impl ConfigNode for TextSource {
    fn describe(schema: &mut SchemaBuilder) {
        schema.directive("source", MemberType::text(), Directive::SourceFile);
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct NumericSource {
    source: u32,
}

impl ConfigNode for NumericSource {
    fn describe(schema: &mut SchemaBuilder) {
        schema.directive("source", MemberType::scalar::<u32>(), Directive::SourceFile);
    }
}

#[test]
fn test_name_and_source_of_each_file() -> Result<()> {
    init_test_logging(None);
    let tree = TestTree::new()?;
    let root = tree.write("labeled.json", r#"{"label": "overwritten"}"#)?;
    tree.write("first-entry.json", r#"{"name": "also overwritten", "value": 5}"#)?;
    tree.write("details.json", "{}")?;

    let labeled: Labeled = build(&tree, "labeled.json")?;
    assert_eq!(labeled.label, "labeled");
    assert_eq!(labeled.origin, root);
    assert_eq!(labeled.entry, Some(Entry::new("first-entry", 5)));
    assert_eq!(labeled.details.and_then(|details| details.source), Some(tree.path("details.json")));
    Ok(())
}

#[test]
fn test_source_file_accepts_string_members() -> Result<()> {
    init_test_logging(None);
    let tree = TestTree::new()?;
    let root = tree.write("text.json", "{}")?;

    let text: TextSource = build(&tree, "text.json")?;
    assert_eq!(PathBuf::from(text.source), root);
    Ok(())
}

#[test]
fn test_name_requires_string_member() -> Result<()> {
    init_test_logging(None);
    let tree = TestTree::new()?;
    tree.write("numeric.json", "{}")?;

    let error = build::<NumericName>(&tree, "numeric.json").unwrap_err();
    assert_eq!(error.error(), &TreeError::validation("Name target must be a string type, found u32"));
    assert!(error.ancillary()[1].ends_with("@Name"));
    Ok(())
}

#[test]
fn test_source_file_requires_path_member() -> Result<()> {
    init_test_logging(None);
    let tree = TestTree::new()?;
    tree.write("numeric.json", "{}")?;

    let error = build::<NumericSource>(&tree, "numeric.json").unwrap_err();
    assert!(matches!(error.error(), TreeError::Validation { .. }));
    assert!(error.to_string().starts_with("SourceFile target must be a string or path type"));
    Ok(())
}

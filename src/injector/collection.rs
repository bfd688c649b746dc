//! Directory-to-collection mapping.
//!
//! A collection member is filled with one entry per matching file, scanned relative to
//! the directory of the file currently being loaded (see [`crate::pattern`]). Every
//! entry starts from its own clone of the directive's template, or from a fresh
//! instance, so entries never share state. Map members are keyed by entry name; the
//! other roles append entries in path order.
//!
//! A member with no in-place entries starts from the collection factory, so a role
//! factory can seed collections with entries of its own.

use serde_json::Value;
use tracing::trace;

use super::{Injector, effective_node, ensure_template_compatible, or_member_name};
use crate::context::{DeserializationContext, Naming};
use crate::core::{CollectionRole, CollectionType, MemberType, NodeType, Result, TreeError};
use crate::directive::{BeanCollection, Directive};
use crate::pattern::DirectoryScanner;
use crate::schema::{InjectionPoint, kind_of};
use crate::utils::path_validation::validate_collection_path;

/// Handler for [`Directive::BeanCollection`]
pub struct BeanCollectionInjector;

impl BeanCollectionInjector {
    fn directive(point: &InjectionPoint) -> Result<&BeanCollection> {
        match point.directive() {
            Directive::BeanCollection(collection) => Ok(collection),
            _ => Err(super::unexpected_directive(point, "BeanCollection")),
        }
    }

    fn collection_type(point: &InjectionPoint) -> Result<CollectionType> {
        match point.member_type() {
            MemberType::Collection(collection) => Ok(*collection),
            _ => Err(TreeError::validation("Target type must be Map, List, Queue, or Set.").into()),
        }
    }

    fn element(directive: &BeanCollection, collection: &CollectionType) -> Result<NodeType> {
        match (collection.element, directive.load_as()) {
            (Some(declared), load_as) => effective_node(declared, load_as),
            (None, Some(load_as)) => Ok(load_as),
            (None, None) => {
                Err(TreeError::validation("Must specify deserialization target type.").into())
            }
        }
    }

    fn check_container(role: CollectionRole, container: &Value) -> Result<()> {
        let fits = if role.is_keyed() { container.is_object() } else { container.is_array() };
        if fits {
            return Ok(());
        }
        Err(TreeError::validation(format!(
            "{role} collections must start from {}, found {}",
            kind_of(&role.empty()),
            kind_of(container)
        ))
        .into())
    }

    fn store(
        container: &mut Value,
        role: CollectionRole,
        name: String,
        entry: Value,
        point: &InjectionPoint,
    ) -> Result<()> {
        match container {
            Value::Object(entries) if role.is_keyed() => {
                entries.insert(name, entry);
                Ok(())
            }
            Value::Array(entries) if !role.is_keyed() => {
                entries.push(entry);
                Ok(())
            }
            other => Err(TreeError::MemberAssignment {
                member: point.name().to_string(),
                reason: format!("{role} member holds {}", kind_of(other)),
            }
            .into()),
        }
    }
}

fn is_empty_container(value: &Value) -> bool {
    match value {
        Value::Object(entries) => entries.is_empty(),
        Value::Array(entries) => entries.is_empty(),
        _ => false,
    }
}

impl Injector for BeanCollectionInjector {
    fn validate_directive(&self, point: &InjectionPoint) -> Result<()> {
        let directive = Self::directive(point)?;
        validate_collection_path(or_member_name(directive.value(), point))
    }

    fn validate_in_context(
        &self,
        point: &InjectionPoint,
        ctx: &DeserializationContext<'_>,
    ) -> Result<()> {
        let directive = Self::directive(point)?;
        let collection = Self::collection_type(point)?;

        if collection.role.is_keyed() {
            match collection.key {
                Some(key) if !key.is_string_like() => {
                    return Err(TreeError::validation("Maps must have String key.").into());
                }
                None if directive.load_as().is_none() => {
                    return Err(TreeError::validation(
                        "Must specify deserialization target type.",
                    )
                    .into());
                }
                _ => {}
            }
        }

        let element = Self::element(directive, &collection)?;
        let container = ctx.instantiate_collection(&collection)?;
        Self::check_container(collection.role, &container)?;
        ctx.assert_can_deserialize(&element)
    }

    fn resolve(
        &self,
        point: &InjectionPoint,
        ctx: &mut DeserializationContext<'_>,
        existing: Option<Value>,
    ) -> Result<Option<Value>> {
        let directive = Self::directive(point)?;
        let collection = Self::collection_type(point)?;
        let element = Self::element(directive, &collection)?;

        let template = or_member_name(directive.template(), point);
        ensure_template_compatible(ctx, template, &element, point)?;

        let mut container = match existing.filter(|value| !is_empty_container(value)) {
            Some(current) => current,
            None => ctx.instantiate_collection(&collection)?,
        };

        let value = or_member_name(directive.value(), point);
        let scanner =
            DirectoryScanner::for_mapping(directive.mapping(), value, ctx.default_extension())
                .map_err(|e| TreeError::validation(format!("{e:#}")))?;
        let base = ctx.current_dir()?;
        let files = scanner.find_matches(&base).map_err(|e| TreeError::FileSystem {
            operation: "scanning".to_string(),
            path: base.clone(),
            reason: format!("{e:#}"),
        })?;

        let naming = Naming::for_mapping(directive.mapping());
        for file in files {
            let name = naming.apply(&file);
            trace!("Loading {} entry '{}' from {}", point.location(), name, file.display());
            let start = ctx.template_or_instantiate(template, &element)?;
            let entry = ctx.deserialize(&element, start, &file, naming)?;
            Self::store(&mut container, collection.role, name, entry, point)?;
        }

        Ok(Some(container))
    }

    fn index(&self, point: &InjectionPoint) -> i32 {
        Self::directive(point).map(BeanCollection::index).unwrap_or_default()
    }
}

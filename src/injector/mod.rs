//! Directive handlers
//!
//! Each directive kind has exactly one handler implementing [`Injector`]. Handlers are
//! stateless statics looked up through [`handler_for`]; everything they need comes
//! from the [`InjectionPoint`] and the [`DeserializationContext`] passed in.
//!
//! A handler participates in three stages:
//! 1. [`validate_directive`](Injector::validate_directive) - context-free sanity
//!    checks of the directive configuration, run once per analysis
//! 2. [`validate_in_context`](Injector::validate_in_context) - type, assignability
//!    and deserializability checks against the current build, run on every use of
//!    the schema
//! 3. [`resolve`](Injector::resolve) - compute the member's new value from its
//!    current one, possibly loading further files

pub mod bean;
pub mod collection;
pub mod metadata;
pub mod template;

use serde_json::Value;

use crate::context::DeserializationContext;
use crate::core::{BuildError, MemberType, NodeType, Result, TreeError};
use crate::directive::DirectiveKind;
use crate::schema::InjectionPoint;

/// Contract shared by all directive handlers
pub trait Injector: Send + Sync {
    /// Context-free validation of the directive configuration
    fn validate_directive(&self, point: &InjectionPoint) -> Result<()> {
        let _ = point;
        Ok(())
    }

    /// Validation against the member type and the build's capabilities
    fn validate_in_context(
        &self,
        point: &InjectionPoint,
        ctx: &DeserializationContext<'_>,
    ) -> Result<()>;

    /// The member's new value; `None` leaves the member empty
    fn resolve(
        &self,
        point: &InjectionPoint,
        ctx: &mut DeserializationContext<'_>,
        existing: Option<Value>,
    ) -> Result<Option<Value>>;

    /// Explicit index within the phase
    fn index(&self, point: &InjectionPoint) -> i32 {
        let _ = point;
        0
    }
}

static BEAN: bean::BeanInjector = bean::BeanInjector;
static BEAN_COLLECTION: collection::BeanCollectionInjector = collection::BeanCollectionInjector;
static TEMPLATE: template::TemplateInjector = template::TemplateInjector;
static NAME: metadata::NameInjector = metadata::NameInjector;
static SOURCE_FILE: metadata::SourceFileInjector = metadata::SourceFileInjector;

/// Handler for a directive kind
#[must_use]
pub fn handler_for(kind: DirectiveKind) -> &'static dyn Injector {
    match kind {
        DirectiveKind::Bean => &BEAN,
        DirectiveKind::BeanCollection => &BEAN_COLLECTION,
        DirectiveKind::Template => &TEMPLATE,
        DirectiveKind::Name => &NAME,
        DirectiveKind::SourceFile => &SOURCE_FILE,
    }
}

/// The member name when `explicit` is blank
pub(crate) fn or_member_name<'a>(explicit: &'a str, point: &'a InjectionPoint) -> &'a str {
    if explicit.trim().is_empty() { point.name() } else { explicit }
}

/// Declared node type of a member that holds a single loaded node
pub(crate) fn declared_node(point: &InjectionPoint) -> Result<NodeType> {
    match point.member_type() {
        MemberType::Node(node) => Ok(*node),
        other => Err(TreeError::validation(format!(
            "{} cannot hold a loaded node: declared type is {}",
            point.location(),
            other.type_name()
        ))
        .into()),
    }
}

/// `load_as` if it can be stored where `declared` is declared, else `declared`
pub(crate) fn effective_node(declared: NodeType, load_as: Option<NodeType>) -> Result<NodeType> {
    match load_as {
        Some(load_as) if !declared.accepts(&load_as) => Err(TreeError::validation(format!(
            "Type {load_as} not assignable to target type: {declared}"
        ))
        .into()),
        Some(load_as) => Ok(load_as),
        None => Ok(declared),
    }
}

/// Fail if template `name` is registered with a type `expected` cannot hold
pub(crate) fn ensure_template_compatible(
    ctx: &DeserializationContext<'_>,
    name: &str,
    expected: &NodeType,
    point: &InjectionPoint,
) -> Result<()> {
    let Some(record) = ctx.templates().get(name) else {
        return Ok(());
    };
    if expected.accepts(&record.node()) {
        return Ok(());
    }
    Err(BuildError::from(TreeError::TemplateMismatch {
        name: name.to_string(),
        actual: record.node().name().to_string(),
        expected: expected.name().to_string(),
    })
    .at_point(point)
    .with_template(record))
}

/// Error for a point routed to the wrong handler
pub(crate) fn unexpected_directive(point: &InjectionPoint, handler: &str) -> BuildError {
    TreeError::validation(format!(
        "{} cannot be handled as {}: {}",
        point.location(),
        handler,
        point.directive()
    ))
    .into()
}

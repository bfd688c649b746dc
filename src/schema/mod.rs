//! Schema analysis
//!
//! A type's schema is the ordered list of its directive-bearing members, each paired
//! with the handler for its directive kind. Types author their schema explicitly in
//! [`ConfigNode::describe`](crate::core::ConfigNode::describe) through a
//! [`SchemaBuilder`]; composed parent types are pulled in with
//! [`SchemaBuilder::include`], parent entries first.
//!
//! Analysis turns the authored members into [`InjectionPoint`]s, validates every one
//! of them (first on its own, then against the current build's factories and format)
//! and sorts them into application order (see [`ordering`]). Results are cached per
//! type in a [`SchemaCache`]; a cache hit skips the analysis but still revalidates
//! every point against the current context.
//!
//! # Example
//!
//! ```rust,no_run
//! use beantree::{Bean, BeanCollection, ConfigNode, MemberType, SchemaBuilder, Template};
//! use serde::{Deserialize, Serialize};
//! use std::collections::HashMap;
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! #[serde(default)]
//! struct Plugin {
//!     name: String,
//!     enabled: bool,
//! }
//!
//! impl ConfigNode for Plugin {
//!     fn describe(schema: &mut SchemaBuilder) {
//!         schema.name("name");
//!     }
//! }
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! #[serde(default)]
//! struct App {
//!     plugin_defaults: Plugin,
//!     plugins: HashMap<String, Plugin>,
//! }
//!
//! impl ConfigNode for App {
//!     fn describe(schema: &mut SchemaBuilder) {
//!         schema
//!             .template::<Plugin>("plugin_defaults", Template::named("plugin"))
//!             .bean_collection(
//!                 "plugins",
//!                 MemberType::map::<Plugin>(),
//!                 BeanCollection::multi_dirs("plugin").with_template("plugin"),
//!             );
//!     }
//! }
//! ```

pub mod cache;
pub mod ordering;

pub use cache::SchemaCache;

use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::context::DeserializationContext;
use crate::core::{BuildError, ConfigNode, MemberType, NodeType, Result, TreeError, TypeKey};
use crate::directive::{Bean, BeanCollection, Directive, DirectiveKind, Phase, Template};
use crate::injector::{self, Injector};

/// Custom assignment for a member: receives the node's fields and the resolved value
/// (`null` when the directive resolved to nothing).
pub type Setter = Arc<dyn Fn(&mut Map<String, Value>, Value) -> anyhow::Result<()> + Send + Sync>;

/// One authored directive-bearing member
#[derive(Clone)]
pub struct MemberSpec {
    name: String,
    member_type: MemberType,
    directive: Directive,
    setter: Option<Setter>,
    declared_in: TypeKey,
}

/// Collects the directive-bearing members of a type.
pub struct SchemaBuilder {
    owner: TypeKey,
    members: Vec<MemberSpec>,
    included: Vec<TypeKey>,
}

impl SchemaBuilder {
    pub(crate) fn new(owner: TypeKey) -> Self {
        Self {
            owner,
            members: Vec::new(),
            included: vec![owner],
        }
    }

    /// Include every member declared by `T`, in `T`'s order.
    ///
    /// Call this before declaring the type's own members so parent entries come
    /// first. A type already included (directly or through another parent) is skipped.
    pub fn include<T: ConfigNode>(&mut self) -> &mut Self {
        let parent = TypeKey::of::<T>();
        if self.included.contains(&parent) {
            return self;
        }
        self.included.push(parent);
        let owner = std::mem::replace(&mut self.owner, parent);
        T::describe(self);
        self.owner = owner;
        self
    }

    /// Declare a member with an arbitrary directive
    pub fn directive(
        &mut self,
        member: impl Into<String>,
        member_type: MemberType,
        directive: Directive,
    ) -> &mut Self {
        self.members.push(MemberSpec {
            name: member.into(),
            member_type,
            directive,
            setter: None,
            declared_in: self.owner,
        });
        self
    }

    /// A member of type `T` loaded from a sibling file
    pub fn bean<T: ConfigNode>(&mut self, member: impl Into<String>, bean: Bean) -> &mut Self {
        self.directive(member, MemberType::node::<T>(), Directive::Bean(bean))
    }

    /// A dynamic member loaded from a sibling file
    pub fn dynamic_bean(&mut self, member: impl Into<String>, bean: Bean) -> &mut Self {
        self.directive(member, MemberType::dynamic(), Directive::Bean(bean))
    }

    /// A collection member loaded from a directory layout
    pub fn bean_collection(
        &mut self,
        member: impl Into<String>,
        member_type: MemberType,
        collection: BeanCollection,
    ) -> &mut Self {
        self.directive(member, member_type, Directive::BeanCollection(collection))
    }

    /// A member of type `T` registered as a named template
    pub fn template<T: ConfigNode>(
        &mut self,
        member: impl Into<String>,
        template: Template,
    ) -> &mut Self {
        self.directive(member, MemberType::node::<T>(), Directive::Template(template))
    }

    /// A [`String`] member set to the resolved name of the current file
    pub fn name(&mut self, member: impl Into<String>) -> &mut Self {
        self.directive(member, MemberType::text(), Directive::Name)
    }

    /// A [`PathBuf`](std::path::PathBuf) member set to the path of the current file
    pub fn source_file(&mut self, member: impl Into<String>) -> &mut Self {
        self.directive(member, MemberType::path(), Directive::SourceFile)
    }

    /// Route the most recently declared member through `setter` instead of writing
    /// the resolved value directly.
    pub fn with_setter<F>(&mut self, setter: F) -> &mut Self
    where
        F: Fn(&mut Map<String, Value>, Value) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        match self.members.last_mut() {
            Some(member) => member.setter = Some(Arc::new(setter)),
            None => debug!("Ignoring setter for {}: no member declared yet", self.owner),
        }
        self
    }

    pub(crate) fn into_members(self) -> Vec<MemberSpec> {
        self.members
    }
}

/// A member paired with its directive and the handler for that directive.
#[derive(Clone)]
pub struct InjectionPoint {
    member: MemberSpec,
    injector: &'static dyn Injector,
}

impl InjectionPoint {
    pub(crate) fn from_spec(member: MemberSpec) -> Self {
        let injector = injector::handler_for(member.directive.kind());
        Self { member, injector }
    }

    /// Serialized member name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.member.name
    }

    #[must_use]
    pub const fn member_type(&self) -> &MemberType {
        &self.member.member_type
    }

    #[must_use]
    pub const fn directive(&self) -> &Directive {
        &self.member.directive
    }

    #[must_use]
    pub const fn kind(&self) -> DirectiveKind {
        self.member.directive.kind()
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.kind().phase()
    }

    /// Explicit index within the phase
    #[must_use]
    pub fn index(&self) -> i32 {
        self.injector.index(self)
    }

    /// Type that declared the member
    #[must_use]
    pub const fn declared_in(&self) -> TypeKey {
        self.member.declared_in
    }

    /// `Type::member`, for diagnostics
    #[must_use]
    pub fn location(&self) -> String {
        format!("{}::{}", self.member.declared_in, self.member.name)
    }

    /// Name this point registers a template under, if it is a template
    #[must_use]
    pub fn provides_template(&self) -> Option<&str> {
        match &self.member.directive {
            Directive::Template(template) => Some(template.name()),
            _ => None,
        }
    }

    /// Name of the template this point's template is built from, if any
    #[must_use]
    pub fn depends_on_template(&self) -> Option<&str> {
        match &self.member.directive {
            Directive::Template(template) => template.depends_on(),
            _ => None,
        }
    }

    /// Context-free check of the directive configuration
    pub fn validate_directive(&self) -> Result<()> {
        self.injector.validate_directive(self)
    }

    /// Check the directive against the member's type and the build's capabilities
    pub fn validate_in_context(&self, ctx: &DeserializationContext<'_>) -> Result<()> {
        self.injector.validate_in_context(self, ctx)
    }

    /// Compute the member's new value from its current one
    pub fn resolve(
        &self,
        ctx: &mut DeserializationContext<'_>,
        existing: Option<Value>,
    ) -> Result<Option<Value>> {
        self.injector.resolve(self, ctx, existing)
    }

    /// Write a resolved value onto `instance`.
    ///
    /// Nothing resolved removes the member, leaving it to its serde default.
    pub(crate) fn assign(&self, instance: &mut Value, value: Option<Value>) -> Result<()> {
        let Value::Object(fields) = instance else {
            return Err(TreeError::MemberAssignment {
                member: self.member.name.clone(),
                reason: format!("owner is not an object but {}", kind_of(instance)),
            }
            .into());
        };

        match (&self.member.setter, value) {
            (Some(setter), value) => setter(fields, value.unwrap_or(Value::Null)).map_err(|e| {
                BuildError::from(TreeError::MemberAssignment {
                    member: self.member.name.clone(),
                    reason: format!("{e:#}"),
                })
            }),
            (None, Some(value)) => {
                fields.insert(self.member.name.clone(), value);
                Ok(())
            }
            (None, None) => {
                fields.remove(&self.member.name);
                Ok(())
            }
        }
    }
}

impl fmt::Debug for InjectionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectionPoint")
            .field("member", &self.location())
            .field("type", &self.member.member_type)
            .field("directive", &self.member.directive)
            .field("custom_setter", &self.member.setter.is_some())
            .finish()
    }
}

/// JSON kind of a value, for diagnostics
pub(crate) const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// The directive-bearing members of `node`, in declaration order, unvalidated
#[must_use]
pub fn collect(node: &NodeType) -> Vec<InjectionPoint> {
    let mut schema = SchemaBuilder::new(node.key());
    node.describe_into(&mut schema);
    schema.into_members().into_iter().map(InjectionPoint::from_spec).collect()
}

/// Collect, validate and order the injection points of `node`
pub fn analyze(node: &NodeType, ctx: &DeserializationContext<'_>) -> Result<Vec<InjectionPoint>> {
    let points = collect(node);
    debug!("Analyzing {} ({} directives)", node, points.len());

    for point in &points {
        point.validate_directive().map_err(|e| e.at_point(point))?;
        point.validate_in_context(ctx).map_err(|e| e.at_point(point))?;
    }

    ordering::order(points)
}

/// Revalidate cached points against the current context
pub fn revalidate(points: &[InjectionPoint], ctx: &DeserializationContext<'_>) -> Result<()> {
    for point in points {
        point.validate_in_context(ctx).map_err(|e| e.at_point(point))?;
    }
    Ok(())
}

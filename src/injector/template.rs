//! Named templates.
//!
//! A template member is registered under its name before any sibling file or
//! collection of the same node is loaded, so those can start from a clone of it.
//! Without an external source the template is the member's own content in the current
//! file; with one, it is loaded from a sibling file following the bean rules.
//!
//! A template with nothing to register (no in-place content and no external file) is
//! registered as a fresh instance of its type.

use serde_json::Value;

use super::bean::BeanInjector;
use super::{Injector, declared_node};
use crate::context::DeserializationContext;
use crate::core::{NodeType, Result, TreeError};
use crate::directive::{Directive, Template};
use crate::schema::InjectionPoint;

/// Handler for [`Directive::Template`]
pub struct TemplateInjector;

impl TemplateInjector {
    fn template(point: &InjectionPoint) -> Result<&Template> {
        match point.directive() {
            Directive::Template(template) => Ok(template),
            _ => Err(super::unexpected_directive(point, "Template")),
        }
    }

    fn node(template: &Template, point: &InjectionPoint) -> Result<NodeType> {
        match template.external() {
            Some(bean) => BeanInjector::target(bean, point),
            None => declared_node(point),
        }
    }
}

impl Injector for TemplateInjector {
    fn validate_directive(&self, point: &InjectionPoint) -> Result<()> {
        let template = Self::template(point)?;
        if template.name().trim().is_empty() {
            return Err(TreeError::validation("Must specify name for template.").into());
        }
        match template.external() {
            Some(bean) => BeanInjector::validate_bean(bean, point),
            None => Ok(()),
        }
    }

    fn validate_in_context(
        &self,
        point: &InjectionPoint,
        ctx: &DeserializationContext<'_>,
    ) -> Result<()> {
        let node = Self::node(Self::template(point)?, point)?;
        ctx.assert_can_deserialize(&node)
    }

    fn resolve(
        &self,
        point: &InjectionPoint,
        ctx: &mut DeserializationContext<'_>,
        existing: Option<Value>,
    ) -> Result<Option<Value>> {
        let template = Self::template(point)?;
        let node = Self::node(template, point)?;

        let value = match template.external() {
            Some(bean) => BeanInjector::load(ctx, bean, point, existing)?,
            None => existing,
        };

        let registered = match &value {
            Some(value) => ctx.hydrate(&node, value.clone())?,
            None => ctx.instantiate(&node)?,
        };
        ctx.register_template(template, registered, node, point)?;

        Ok(value)
    }
}

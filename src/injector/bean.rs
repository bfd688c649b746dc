//! Sibling-file references.
//!
//! A bean member is loaded from a file next to the file currently being loaded. The
//! file is named explicitly or after the member, and gets the default extension when
//! it has none. A missing file (or anything that is not a regular file) leaves the
//! member empty.
//!
//! The starting value for the load is, in order of preference:
//! - a clone of the explicitly named template
//! - the member's current in-place value
//! - a clone of the template named after the member, if one is registered
//! - a fresh instance

use serde_json::Value;
use std::path::Path;
use tracing::{debug, warn};

use super::{Injector, declared_node, effective_node, ensure_template_compatible, or_member_name};
use crate::context::{DeserializationContext, Naming};
use crate::core::{NodeType, Result};
use crate::directive::{Bean, Directive};
use crate::schema::InjectionPoint;
use crate::utils::path_validation::validate_sibling_file;

/// Handler for [`Directive::Bean`]
pub struct BeanInjector;

impl BeanInjector {
    fn bean(point: &InjectionPoint) -> Result<&Bean> {
        match point.directive() {
            Directive::Bean(bean) => Ok(bean),
            _ => Err(super::unexpected_directive(point, "Bean")),
        }
    }

    /// Context-free checks of a bean configuration; a bean without a file name is
    /// checked under the member's serialized name
    pub(crate) fn validate_bean(bean: &Bean, point: &InjectionPoint) -> Result<()> {
        validate_sibling_file(or_member_name(bean.file(), point))
    }

    /// Node type `bean` loads into when attached to `point`
    pub(crate) fn target(bean: &Bean, point: &InjectionPoint) -> Result<NodeType> {
        effective_node(declared_node(point)?, bean.load_as())
    }

    /// Name of the file `bean` refers to, with the default extension applied
    pub(crate) fn file_name(bean: &Bean, point: &InjectionPoint, extension: &str) -> String {
        let name = or_member_name(bean.file(), point);
        if Path::new(name).extension().is_some() {
            name.to_string()
        } else {
            format!("{name}{extension}")
        }
    }

    /// Load the sibling file referenced by `bean` onto the member's current value
    pub(crate) fn load(
        ctx: &mut DeserializationContext<'_>,
        bean: &Bean,
        point: &InjectionPoint,
        existing: Option<Value>,
    ) -> Result<Option<Value>> {
        let file = ctx.current_dir()?.join(Self::file_name(bean, point, ctx.default_extension()));
        if !file.is_file() {
            debug!("{} not found, leaving {} empty", file.display(), point.location());
            return Ok(None);
        }

        let node = Self::target(bean, point)?;
        let template = or_member_name(bean.template(), point);
        ensure_template_compatible(ctx, template, &node, point)?;

        let explicit_template = !bean.template().trim().is_empty();
        let start = match existing {
            Some(current) if !explicit_template => ctx.hydrate(&node, current)?,
            Some(_) => {
                warn!(
                    "{} has an in-place value and template '{}'; starting from the template",
                    point.location(),
                    template
                );
                ctx.template_or_instantiate(template, &node)?
            }
            None => ctx.template_or_instantiate(template, &node)?,
        };

        ctx.deserialize(&node, start, &file, Naming::FileStem).map(Some)
    }
}

impl Injector for BeanInjector {
    fn validate_directive(&self, point: &InjectionPoint) -> Result<()> {
        Self::validate_bean(Self::bean(point)?, point)
    }

    fn validate_in_context(
        &self,
        point: &InjectionPoint,
        ctx: &DeserializationContext<'_>,
    ) -> Result<()> {
        let node = Self::target(Self::bean(point)?, point)?;
        ctx.assert_can_deserialize(&node)
    }

    fn resolve(
        &self,
        point: &InjectionPoint,
        ctx: &mut DeserializationContext<'_>,
        existing: Option<Value>,
    ) -> Result<Option<Value>> {
        Self::load(ctx, Self::bean(point)?, point, existing)
    }

    fn index(&self, point: &InjectionPoint) -> i32 {
        Self::bean(point).map(Bean::index).unwrap_or_default()
    }
}

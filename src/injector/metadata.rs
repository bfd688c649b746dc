//! Name and source-file metadata.
//!
//! Both run after every other directive of the node and never load anything.

use serde_json::Value;

use super::Injector;
use crate::context::DeserializationContext;
use crate::core::{MemberType, Result, TreeError};
use crate::schema::InjectionPoint;

/// Handler for [`Directive::Name`](crate::directive::Directive::Name)
pub struct NameInjector;

impl Injector for NameInjector {
    fn validate_in_context(
        &self,
        point: &InjectionPoint,
        _ctx: &DeserializationContext<'_>,
    ) -> Result<()> {
        match point.member_type() {
            MemberType::Scalar(key) if key.is_string_like() => Ok(()),
            other => Err(TreeError::validation(format!(
                "Name target must be a string type, found {}",
                other.type_name()
            ))
            .into()),
        }
    }

    fn resolve(
        &self,
        _point: &InjectionPoint,
        ctx: &mut DeserializationContext<'_>,
        _existing: Option<Value>,
    ) -> Result<Option<Value>> {
        Ok(ctx.current_name().map(|name| Value::String(name.to_string())))
    }
}

/// Handler for [`Directive::SourceFile`](crate::directive::Directive::SourceFile)
pub struct SourceFileInjector;

impl Injector for SourceFileInjector {
    fn validate_in_context(
        &self,
        point: &InjectionPoint,
        _ctx: &DeserializationContext<'_>,
    ) -> Result<()> {
        match point.member_type() {
            MemberType::Scalar(key) if key.is_path_like() => Ok(()),
            other => Err(TreeError::validation(format!(
                "SourceFile target must be a string or path type, found {}",
                other.type_name()
            ))
            .into()),
        }
    }

    fn resolve(
        &self,
        _point: &InjectionPoint,
        ctx: &mut DeserializationContext<'_>,
        _existing: Option<Value>,
    ) -> Result<Option<Value>> {
        Ok(ctx
            .current_file()
            .map(|path| Value::String(path.to_string_lossy().into_owned())))
    }
}

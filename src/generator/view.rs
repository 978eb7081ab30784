//! `@Bind` fields

use super::context::{BindingContext, TARGET};
use super::BindingGenerator;
use crate::binding::naming::view_variable;
use crate::common::error::{Error, Result};
use crate::consts::VIEW;
use crate::content::GeneratedContent;
use crate::annotation::ViewAnnotation;

pub struct ViewGenerator;

impl BindingGenerator for ViewGenerator {
    fn bind(&self, context: &mut BindingContext<'_, '_>) -> Result<Vec<GeneratedContent>> {
        let binding = context.field()?;
        let field = &binding.field;
        let registry = context.environment.registry;

        if !registry.is_interface(&field.ty) && !registry.is_subclass_of(&field.ty, &VIEW) {
            return Err(Error::binding_error(format!(
                "Unable to generate @{} binding for '{}#{}' field - '{}' isn't a subclass of '{}'.",
                binding.annotation.simple_name(),
                context.class.ty().class_name(),
                field.name,
                field.ty.class_name(),
                VIEW.class_name()
            )));
        }

        let id = binding.annotation.resolve::<ViewAnnotation>()?.id;
        context.load(TARGET)?;
        context.load(&view_variable(id))?;
        if field.ty != *VIEW {
            context.method.check_cast(&field.ty)?;
        }
        context.method.put_field(&context.class.name, &field.name, &field.ty)?;
        Ok(Vec::new())
    }

    fn unbind(&self, context: &mut BindingContext<'_, '_>) -> Result<Vec<GeneratedContent>> {
        let field = &context.field()?.field;
        context.load(TARGET)?;
        context.method.push_null();
        context.method.put_field(&context.class.name, &field.name, &field.ty)?;
        Ok(Vec::new())
    }
}

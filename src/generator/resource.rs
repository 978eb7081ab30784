//! Resource fields: `@BindArray`, `@BindBool`, `@BindColor`, `@BindDimen`,
//! `@BindDrawable`, `@BindInteger`, `@BindString` and any annotation carrying
//! `@ResourceBindings`
//!
//! Every binding reads `finder.resources(source)` and calls one getter of
//! `android.content.res.Resources` chosen by the annotation and the field type.
//! Annotations declaring their getters use those; the built-in table covers
//! the stock annotations when their classes aren't on the classpath.

use super::context::{BindingContext, FINDER, SOURCE, TARGET};
use super::{BindingGenerator, ResourceKind};
use crate::annotation::ResourceAnnotation;
use crate::binding::Getter;
use crate::codegen::descriptor::Type;
use crate::common::error::{Error, Result};
use crate::consts::{CHAR_SEQUENCE, DRAWABLE, FINDER as FINDER_TYPE, FINDER_RESOURCES, FINDER_RESOURCES_DESCRIPTOR, RESOURCES, STRING};
use crate::content::GeneratedContent;
use crate::registry::ClassRegistry;

pub struct ResourceGenerator {
    kind: ResourceKind,
}

impl ResourceGenerator {
    pub fn new(kind: ResourceKind) -> Self {
        Self { kind }
    }

    /// The built-in getter for a field of type `ty`, `None` when the kind can't produce one
    pub fn getter(&self, ty: &Type, registry: &ClassRegistry) -> Option<Getter> {
        let getter = match (self.kind, ty) {
            (ResourceKind::Array, Type::Array(element)) => match element.as_ref() {
                Type::Int => Getter::new("getIntArray", "(I)[I", ty.clone()),
                element if *element == *STRING => Getter::new("getStringArray", "(I)[Ljava/lang/String;", ty.clone()),
                element if *element == *CHAR_SEQUENCE => {
                    Getter::new("getTextArray", "(I)[Ljava/lang/CharSequence;", ty.clone())
                }
                _ => return None,
            },
            (ResourceKind::Bool, Type::Boolean) => Getter::new("getBoolean", "(I)Z", Type::Boolean),
            (ResourceKind::Color, Type::Int) => Getter::new("getColor", "(I)I", Type::Int),
            (ResourceKind::Dimen, Type::Int) => Getter::new("getDimensionPixelSize", "(I)I", Type::Int),
            (ResourceKind::Dimen, Type::Float) => Getter::new("getDimension", "(I)F", Type::Float),
            (ResourceKind::Drawable, Type::Object(_)) if registry.is_subclass_of(ty, &DRAWABLE) => Getter::new(
                "getDrawable",
                "(I)Landroid/graphics/drawable/Drawable;",
                (*DRAWABLE).clone(),
            ),
            (ResourceKind::Integer, Type::Int) => Getter::new("getInteger", "(I)I", Type::Int),
            (ResourceKind::String, Type::Object(_)) if *ty == *STRING => {
                Getter::new("getString", "(I)Ljava/lang/String;", ty.clone())
            }
            _ => return None,
        };
        Some(getter)
    }
}

impl BindingGenerator for ResourceGenerator {
    fn bind(&self, context: &mut BindingContext<'_, '_>) -> Result<Vec<GeneratedContent>> {
        let binding = context.field()?;
        let field = &binding.field;

        let registry = context.environment.registry;
        let getter = match &binding.resource {
            Some(resource) => resource.getter(&field.ty, registry),
            None => self.getter(&field.ty, registry),
        };
        let getter = getter.ok_or_else(|| {
            Error::binding_error(format!(
                "Unable to generate @{} binding for '{}#{}' field - '{}' is not a supported field type.",
                binding.annotation.simple_name(),
                context.class.ty().class_name(),
                field.name,
                field.ty.class_name()
            ))
        })?;
        let id = binding.annotation.resolve::<ResourceAnnotation>()?.id;

        context.load(TARGET)?;
        context.load(FINDER)?;
        context.load(SOURCE)?;
        context.method.invoke_interface(&FINDER_TYPE.internal_name(), FINDER_RESOURCES, FINDER_RESOURCES_DESCRIPTOR)?;
        context.method.push_int(id)?;
        context.method.invoke_virtual(&RESOURCES.internal_name(), &getter.name, &getter.descriptor)?;
        if getter.returns != field.ty {
            context.method.check_cast(&field.ty)?;
        }
        context.method.put_field(&context.class.name, &field.name, &field.ty)?;
        Ok(Vec::new())
    }

    // Resources stay on the target after unbinding.
    fn unbind(&self, _context: &mut BindingContext<'_, '_>) -> Result<Vec<GeneratedContent>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::class_writer::ClassBuilder;
    use crate::codegen::flag::access_flags::*;
    use crate::registry::ClassReference;

    fn registry() -> ClassRegistry {
        let class = |name: &str, parent: &str| {
            let builder = ClassBuilder::new(ACC_PUBLIC, name, parent, &[]).unwrap();
            ClassReference::from_bytes(builder.to_bytes()).unwrap()
        };
        ClassRegistry::builder()
            .references(vec![
                class("android/graphics/drawable/Drawable", "java/lang/Object"),
                class("android/graphics/drawable/ColorDrawable", "android/graphics/drawable/Drawable"),
            ])
            .build()
    }

    #[test]
    fn test_getter_table() {
        let registry = registry();
        let dimen = ResourceGenerator::new(ResourceKind::Dimen);
        assert_eq!(dimen.getter(&Type::Int, &registry).unwrap().name, "getDimensionPixelSize");
        assert_eq!(dimen.getter(&Type::Float, &registry).unwrap().name, "getDimension");
        assert!(dimen.getter(&Type::Long, &registry).is_none());

        let array = ResourceGenerator::new(ResourceKind::Array);
        let text = array.getter(&Type::array_of((*CHAR_SEQUENCE).clone()), &registry).unwrap();
        assert_eq!(text.descriptor, "(I)[Ljava/lang/CharSequence;");
        assert!(array.getter(&Type::array_of(Type::Long), &registry).is_none());

        let string = ResourceGenerator::new(ResourceKind::String);
        assert!(string.getter(&STRING, &registry).is_some());
        assert!(string.getter(&CHAR_SEQUENCE, &registry).is_none());
    }

    #[test]
    fn test_drawable_subclass_needs_cast() {
        let registry = registry();
        let drawable = ResourceGenerator::new(ResourceKind::Drawable);
        let narrow = Type::object("android/graphics/drawable/ColorDrawable");
        let getter = drawable.getter(&narrow, &registry).unwrap();
        assert_eq!(getter.returns, *DRAWABLE);
        assert_ne!(getter.returns, narrow);
        assert!(drawable.getter(&STRING, &registry).is_none());
    }
}

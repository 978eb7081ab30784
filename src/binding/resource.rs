//! Resource annotations described by `@ResourceBindings`
//!
//! A resource annotation class lists the `android.content.res.Resources`
//! getter to call for each field type it supports. Each entry is checked
//! against the registry once per annotation type.

use crate::annotation::ResourceBindingsAnnotation;
use crate::codegen::descriptor::Type;
use crate::common::error::{Error, Result};
use crate::consts::RESOURCES;
use crate::registry::{ClassRegistry, MethodSpec};

/// A `Resources` getter and the type it returns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Getter {
    pub name: String,
    pub descriptor: String,
    pub returns: Type,
}

impl Getter {
    pub fn new(name: impl Into<String>, descriptor: impl Into<String>, returns: Type) -> Self {
        Self { name: name.into(), descriptor: descriptor.into(), returns }
    }
}

impl From<&MethodSpec> for Getter {
    fn from(method: &MethodSpec) -> Self {
        Self::new(method.name.clone(), method.descriptor.clone(), method.returns().clone())
    }
}

#[derive(Debug, Clone)]
pub struct ResourceGetter {
    /// Field type this entry serves
    pub ty: Type,
    pub method: MethodSpec,
}

/// A validated resource annotation
#[derive(Debug, Clone)]
pub struct ResourceClassSpec {
    pub annotation: Type,
    pub getters: Vec<ResourceGetter>,
}

impl ResourceClassSpec {
    pub fn create(annotation: &Type, bindings: &ResourceBindingsAnnotation, registry: &ClassRegistry) -> Result<Self> {
        let fail = |detail: String| {
            Error::binding_error(format!("Unable to process @{} annotation - {}", annotation.simple_name(), detail))
        };

        if bindings.bindings.is_empty() {
            return Err(fail("it must declare at least one @ResourceBinding.".to_string()));
        }
        if !registry.contains(&RESOURCES) {
            return Err(fail(format!("class '{}' wasn't found.", RESOURCES.class_name())));
        }

        let mut getters = Vec::with_capacity(bindings.bindings.len());
        for binding in &bindings.bindings {
            let mut component = &binding.ty;
            while let Some(element) = component.element_type() {
                component = element;
            }
            if *component == Type::Void || (!component.is_primitive() && !registry.contains(component)) {
                return Err(fail(format!("class '{}' wasn't found.", component.class_name())));
            }

            let method = registry
                .methods_named(&RESOURCES, &binding.getter)?
                .into_iter()
                .find(|method| matches!(method.arguments(), [Type::Int]) && *method.returns() != Type::Void)
                .ok_or_else(|| {
                    fail(format!("method '{}#{}(int)' wasn't found.", RESOURCES.class_name(), binding.getter))
                })?;

            let returns = method.returns();
            if *returns != binding.ty && !registry.is_subclass_of(returns, &binding.ty) {
                return Err(fail(format!(
                    "method '{}#{}(int)' returns '{}' which is not assignable to '{}'.",
                    RESOURCES.class_name(),
                    binding.getter,
                    returns.class_name(),
                    binding.ty.class_name()
                )));
            }
            getters.push(ResourceGetter { ty: binding.ty.clone(), method });
        }

        log::debug!(
            "resource @{}: {}",
            annotation.simple_name(),
            getters.iter().map(|getter| format!("{} -> {}", getter.ty.class_name(), getter.method.name)).collect::<Vec<_>>().join(", ")
        );
        Ok(Self { annotation: annotation.clone(), getters })
    }

    /// The getter for a field of type `ty`: an exact entry first, then the
    /// first entry whose type is an ancestor of `ty` (the value is cast down).
    pub fn getter(&self, ty: &Type, registry: &ClassRegistry) -> Option<Getter> {
        self.getters
            .iter()
            .find(|getter| getter.ty == *ty)
            .or_else(|| {
                self.getters
                    .iter()
                    .find(|getter| matches!(ty, Type::Object(_)) && registry.is_subclass_of(ty, &getter.ty))
            })
            .map(|getter| Getter::from(&getter.method))
    }
}

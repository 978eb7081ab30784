//! Listener classes described by `@ListenerBinding`
//!
//! Every listener annotation (`@OnClick`, `@OnCheckedChanged`, user-defined
//! ones) carries a `@ListenerBinding` naming the view type that accepts the
//! listener, the listener type itself and the setter used to attach it. The
//! description is validated against the registry once per annotation type;
//! any problem is fatal and reported against the annotation.

use std::rc::Rc;

use crate::annotation::ListenerBindingAnnotation;
use crate::codegen::descriptor::Type;
use crate::codegen::flag::Access;
use crate::common::error::{Error, Result};
use crate::consts::OBJECT;
use crate::registry::{ClassRegistry, ClassSpec, MethodSpec};

/// A validated listener description
#[derive(Debug, Clone)]
pub struct ListenerClassSpec {
    /// The listener annotation type, e.g. `io/sento/annotations/OnClick`
    pub annotation: Type,
    pub owner: Rc<ClassSpec>,
    pub listener: Rc<ClassSpec>,
    pub setter: MethodSpec,
    pub unsetter: MethodSpec,
    /// The abstract method that forwards to the annotated method
    pub callback: MethodSpec,
    /// Every abstract method the adapter must implement, the callback included
    pub callbacks: Vec<MethodSpec>,
}

impl ListenerClassSpec {
    pub fn create(annotation: &Type, binding: &ListenerBindingAnnotation, registry: &ClassRegistry) -> Result<Self> {
        let fail = |detail: String| {
            Error::binding_error(format!("Unable to process @{} annotation - {}", annotation.simple_name(), detail))
        };

        let owner = resolve_type(registry, &binding.owner, "owner").map_err(&fail)?;
        let listener = resolve_type(registry, &binding.listener, "listener").map_err(&fail)?;
        let owner = registry.resolve(&owner)?;
        let listener = registry.resolve(&listener)?;

        if !owner.access.is_public() {
            return Err(fail(format!("owner type '{}' must be public.", owner.ty().class_name())));
        }
        if !listener.access.is_public() {
            return Err(fail(format!("listener type '{}' must be public.", listener.ty().class_name())));
        }
        if !listener.access.is_abstract() && !listener.access.is_interface() {
            return Err(fail(format!(
                "listener type '{}' must be an abstract class or an interface.",
                listener.ty().class_name()
            )));
        }
        if !listener.access.is_interface() {
            let accessible = listener
                .default_constructor()
                .map_or(false, |constructor| constructor.access.is_public() || constructor.access.is_protected());
            if !accessible {
                return Err(fail(format!(
                    "listener type '{}' must have a zero-arg constructor with public or protected visibility.",
                    listener.ty().class_name()
                )));
            }
        }

        let callbacks = registry.abstract_methods(&listener.ty())?;
        let callback = select_callback(&listener, &callbacks, binding.callback.as_deref()).map_err(&fail)?;
        let setter = single_arg_method(registry, &owner, &binding.setter).map_err(&fail)?;
        let unsetter = if binding.has_distinct_unsetter() {
            single_arg_method(registry, &owner, binding.unsetter()).map_err(&fail)?
        } else {
            setter.clone()
        };

        for method in [&setter, &unsetter] {
            let accepted = &method.arguments()[0];
            if !registry.is_assignable(&listener.ty(), accepted) {
                return Err(fail(format!(
                    "listener setter '{}' doesn't accept '{}' as an argument. Only subclasses of '{}' are allowed.",
                    method.name,
                    listener.ty().class_name(),
                    accepted.class_name()
                )));
            }
        }

        for method in &callbacks {
            if !matches!(method.returns(), Type::Void | Type::Boolean) {
                return Err(fail(format!(
                    "listener method '{}' returns '{}', but only [void, boolean] are supported.",
                    method.name,
                    method.returns().class_name()
                )));
            }
        }

        log::debug!(
            "listener @{}: {}#{} -> {}#{}",
            annotation.simple_name(),
            owner.name,
            setter.name,
            listener.name,
            callback.name
        );
        Ok(Self { annotation: annotation.clone(), owner, listener, setter, unsetter, callback, callbacks })
    }

    pub fn has_distinct_unsetter(&self) -> bool {
        self.setter.name != self.unsetter.name || self.setter.descriptor != self.unsetter.descriptor
    }

    pub fn owner_type(&self) -> Type {
        self.owner.ty()
    }

    pub fn listener_type(&self) -> Type {
        self.listener.ty()
    }

    /// Parent of a generated adapter: the listener itself when it is an abstract class
    pub fn adapter_parent(&self) -> Type {
        if self.listener.is_interface() {
            (*OBJECT).clone()
        } else {
            self.listener.ty()
        }
    }

    pub fn adapter_interfaces(&self) -> Vec<Type> {
        if self.listener.is_interface() {
            vec![self.listener.ty()]
        } else {
            Vec::new()
        }
    }
}

fn resolve_type(registry: &ClassRegistry, ty: &Type, role: &str) -> std::result::Result<Type, String> {
    if ty.is_array() {
        return Err(format!("{} type mustn't be an array, but '{}' was found.", role, ty.class_name()));
    }
    if ty.is_primitive() || *ty == Type::Void {
        return Err(format!("{} type mustn't be a primitive one, but '{}' was found.", role, ty.class_name()));
    }
    if !registry.contains(ty) {
        return Err(format!("{} type '{}' wasn't found.", role, ty.class_name()));
    }
    Ok(ty.clone())
}

fn select_callback(
    listener: &ClassSpec,
    callbacks: &[MethodSpec],
    name: Option<&str>,
) -> std::result::Result<MethodSpec, String> {
    let candidates: Vec<&MethodSpec> = match name {
        Some(name) => callbacks.iter().filter(|method| method.name == name).collect(),
        None => callbacks.iter().collect(),
    };
    let subject = match name {
        Some(name) => format!("exactly one abstract method '{}'", name),
        None => "exactly one abstract method".to_string(),
    };

    match candidates.as_slice() {
        [callback] => Ok((*callback).clone()),
        [] => Err(format!(
            "listener type '{}' must have {}, but none was found.",
            listener.ty().class_name(),
            subject
        )),
        _ => Err(format!(
            "listener type '{}' must have {}, but {} were found [{}].",
            listener.ty().class_name(),
            subject,
            candidates.len(),
            candidates.iter().map(|method| method.java_declaration()).collect::<Vec<_>>().join(", ")
        )),
    }
}

fn single_arg_method(
    registry: &ClassRegistry,
    owner: &ClassSpec,
    name: &str,
) -> std::result::Result<MethodSpec, String> {
    let methods = registry
        .methods_named(&owner.ty(), name)
        .map_err(|error| error.to_string())?;
    let candidates: Vec<MethodSpec> = methods
        .into_iter()
        .filter(|method| method.arguments().len() == 1 && !method.access.is_static())
        .collect();

    match candidates.as_slice() {
        [method] => Ok(method.clone()),
        [] => Err(format!(
            "owner type '{}' must have exactly one single-arg method '{}', but none was found.",
            owner.ty().class_name(),
            name
        )),
        _ => Err(format!(
            "owner type '{}' must have exactly one single-arg method '{}', but {} were found [{}].",
            owner.ty().class_name(),
            name,
            candidates.len(),
            candidates.iter().map(MethodSpec::java_declaration).collect::<Vec<_>>().join(", ")
        )),
    }
}

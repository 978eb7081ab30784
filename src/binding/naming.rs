//! Names of generated classes, members and bind-method locals

use crate::codegen::descriptor::{method_descriptor, Type};
use crate::common::config::Config;
use crate::registry::MethodSpec;

/// `com/example/Target` -> `com/example/Target$$SentoBinding`
pub fn binding_class_name(config: &Config, target: &str) -> String {
    format!("{}{}", target, config.binding_suffix)
}

/// The `index`-th listener adapter of a binding class
pub fn adapter_class_name(binding: &str, index: usize) -> String {
    format!("{}${}", binding, index)
}

pub fn class_file_path(internal_name: &str) -> String {
    format!("{}.class", internal_name)
}

/// Bind-method local holding the looked up view
pub fn view_variable(id: i32) -> String {
    format!("view{}", id)
}

/// Field on the target caching a view that a listener was attached to
pub fn cached_view_field(id: i32) -> String {
    format!("sento$view$id_{}", id)
}

/// Field on the target caching a listener instance for its unsetter.
/// `index` is the listener binding's position, so overloads stay apart.
pub fn cached_listener_field(method: &str, annotation: &Type, index: usize, id: i32) -> String {
    format!("sento$listener${}${}${}$id_{}", method, annotation.simple_name(), index, id)
}

pub fn accessor_name(method: &MethodSpec) -> String {
    format!("sento$accessor${}", method.name)
}

/// `(LTarget;args...)ret`
pub fn accessor_descriptor(target: &Type, method: &MethodSpec) -> String {
    let mut arguments = Vec::with_capacity(method.arguments().len() + 1);
    arguments.push(target.clone());
    arguments.extend(method.arguments().iter().cloned());
    method_descriptor(method.returns(), &arguments)
}

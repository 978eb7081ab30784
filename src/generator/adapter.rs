//! Listener adapter classes
//!
//! One adapter is generated per annotated listener method. It extends or
//! implements the listener type, keeps the target in a final field and
//! forwards the selected callback to the annotated method. The callback's
//! parameters are remapped onto the method's parameters first-fit, so
//! `onItemClick(AdapterView, View, int, long)` can feed `onItem(int)`.

use super::context::GenerationEnvironment;
use crate::binding::naming::{accessor_descriptor, accessor_name, class_file_path};
use crate::binding::ListenerBinding;
use crate::codegen::class_writer::ClassBuilder;
use crate::codegen::defs::CONSTRUCTOR_METHOD_NAME;
use crate::codegen::descriptor::{method_descriptor, Type};
use crate::codegen::flag::access_flags::*;
use crate::codegen::flag::Access;
use crate::common::error::{Error, Result};
use crate::consts::extras;
use crate::content::GeneratedContent;
use crate::registry::{ClassRegistry, ClassSpec, MethodSpec};

/// Name of the adapter field holding the target
pub const TARGET_FIELD: &str = "target";

/// A callback parameter forwarded to the target method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    /// Index among the callback's parameters
    pub index: usize,
    /// Parameter type of the target method
    pub ty: Type,
}

/// Constructor descriptor of every adapter: `(LTarget;)V`
pub fn adapter_constructor(target: &Type) -> String {
    method_descriptor(&Type::Void, std::slice::from_ref(target))
}

/// Match every parameter of the annotated method with the first unused callback
/// parameter that can be cast to it
pub fn remap_arguments(binding: &ListenerBinding, class: &ClassSpec, registry: &ClassRegistry) -> Result<Vec<Argument>> {
    let from = binding.listener.callback.arguments();
    let mut available: Vec<usize> = (0..from.len()).collect();
    let mut result = Vec::with_capacity(binding.method.arguments().len());

    for argument in binding.method.arguments() {
        let position = available
            .iter()
            .position(|index| registry.is_castable(&from[*index], argument))
            .ok_or_else(|| {
                generation_error(
                    binding,
                    class,
                    format!("argument '{}' didn't match any listener parameters.", argument.class_name()),
                )
            })?;
        let index = available.remove(position);
        result.push(Argument { index, ty: argument.clone() });
    }

    Ok(result)
}

/// The annotated method may only return `void` or `boolean`
pub fn check_returns(binding: &ListenerBinding, class: &ClassSpec) -> Result<()> {
    match binding.method.returns() {
        Type::Void | Type::Boolean => Ok(()),
        other => Err(generation_error(
            binding,
            class,
            format!("it returns '{}', but only [void, boolean] are supported.", other.class_name()),
        )),
    }
}

fn generation_error(binding: &ListenerBinding, class: &ClassSpec, detail: String) -> Error {
    Error::binding_error(format!(
        "Unable to generate @{} binding for '{}#{}' method - {}",
        binding.annotation.simple_name(),
        class.ty().class_name(),
        binding.method.name,
        detail
    ))
}

pub fn generate_adapter(
    binding: &ListenerBinding,
    class: &ClassSpec,
    adapter: &str,
    environment: &GenerationEnvironment<'_>,
) -> Result<GeneratedContent> {
    check_returns(binding, class)?;
    let arguments = remap_arguments(binding, class, environment.registry)?;

    let spec = &binding.listener;
    let target = class.ty();
    let parent = spec.adapter_parent().internal_name();
    let interfaces: Vec<String> = spec.adapter_interfaces().iter().map(Type::internal_name).collect();
    let interfaces: Vec<&str> = interfaces.iter().map(String::as_str).collect();

    let mut builder = ClassBuilder::new(ACC_PUBLIC | ACC_SUPER, adapter, &parent, &interfaces)?.configure(environment.config);
    builder.field(ACC_PRIVATE | ACC_FINAL, TARGET_FIELD, &target)?;

    let mut constructor = builder.method(ACC_PUBLIC, CONSTRUCTOR_METHOD_NAME, &adapter_constructor(&target))?;
    constructor.load_this()?;
    constructor.invoke_constructor(&parent, "()V")?;
    constructor.load_this()?;
    constructor.load_arg(0)?;
    constructor.put_field(adapter, TARGET_FIELD, &target)?;
    constructor.return_value()?;
    constructor.end_method()?;

    for callback in &spec.callbacks {
        if callback.name == spec.callback.name && callback.descriptor == spec.callback.descriptor {
            forward_callback(&mut builder, binding, class, &arguments)?;
        } else {
            stub_callback(&mut builder, callback)?;
        }
    }

    log::info!("generated listener adapter {} for {}#{}", adapter, class.name, binding.method.name);
    Ok(GeneratedContent::new(class_file_path(adapter), builder.to_bytes())
        .with_extra(extras::KIND, extras::KIND_LISTENER)
        .with_extra(extras::ORIGINAL, class.name.clone()))
}

fn forward_callback(
    builder: &mut ClassBuilder,
    binding: &ListenerBinding,
    class: &ClassSpec,
    arguments: &[Argument],
) -> Result<()> {
    let callback = &binding.listener.callback;
    let method = &binding.method;
    let target = class.ty();
    let adapter = builder.name().to_string();

    let mut visitor = builder.method(ACC_PUBLIC, &callback.name, &callback.descriptor)?;
    visitor.load_this()?;
    visitor.get_field(&adapter, TARGET_FIELD, &target)?;
    for argument in arguments {
        visitor.load_arg(argument.index)?;
        if argument.ty.is_reference() {
            visitor.check_cast(&argument.ty)?;
        }
    }

    if method.access.is_public() {
        visitor.invoke_virtual(&class.name, &method.name, &method.descriptor)?;
    } else {
        visitor.invoke_static(&class.name, &accessor_name(method), &accessor_descriptor(&target, method))?;
    }

    match (callback.returns(), method.returns()) {
        (Type::Boolean, Type::Void) => visitor.push_bool(false)?,
        (Type::Void, Type::Boolean) => visitor.pop()?,
        _ => {}
    }
    visitor.return_value()?;
    visitor.end_method()?;
    Ok(())
}

fn stub_callback(builder: &mut ClassBuilder, callback: &MethodSpec) -> Result<()> {
    let mut visitor = builder.method(ACC_PUBLIC, &callback.name, &callback.descriptor)?;
    visitor.push_default(callback.returns())?;
    visitor.return_value()?;
    visitor.end_method()?;
    Ok(())
}

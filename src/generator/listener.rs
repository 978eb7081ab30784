//! Listener method bindings: `@OnClick` and friends
//!
//! `bind` attaches one adapter instance per view id through the setter named
//! by `@ListenerBinding`. When the listener has a distinct unsetter the
//! instance is also cached on the target so `unbind` can hand the same object
//! back; otherwise `unbind` calls the setter with `null`.

use super::adapter::{adapter_constructor, generate_adapter};
use super::context::{BindingContext, TARGET};
use super::BindingGenerator;
use crate::binding::naming::{adapter_class_name, cached_listener_field, cached_view_field, view_variable};
use crate::binding::{ListenerBinding, ListenerClassSpec};
use crate::codegen::descriptor::Type;
use crate::codegen::method_writer::MethodBuilder;
use crate::common::error::Result;
use crate::consts::VIEW;
use crate::content::GeneratedContent;

pub struct ListenerGenerator;

impl BindingGenerator for ListenerGenerator {
    fn bind(&self, context: &mut BindingContext<'_, '_>) -> Result<Vec<GeneratedContent>> {
        let binding = context.listener()?;
        let spec = &binding.listener;
        let adapter = adapter_class_name(context.binding, binding.index);
        let content = generate_adapter(binding, context.class, &adapter, context.environment)?;

        let target = context.variable(TARGET)?;
        let instance = spec.has_distinct_unsetter().then(|| context.method.new_local(&target.ty));

        for id in &binding.ids {
            let view = context.variable(&view_variable(*id))?;
            let skip = if binding.optional {
                let skip = context.method.new_label();
                context.method.load_local(view.slot, &view.ty)?;
                context.method.if_null(skip)?;
                Some(skip)
            } else {
                None
            };

            context.method.load_local(view.slot, &view.ty)?;
            cast_to_owner(context.method, spec)?;

            context.method.new_instance(&adapter)?;
            context.method.dup()?;
            context.method.load_local(target.slot, &target.ty)?;
            context.method.invoke_constructor(&adapter, &adapter_constructor(&target.ty))?;

            if let Some(slot) = instance {
                let field = cached_listener_field(&binding.method.name, &spec.annotation, binding.index, *id);
                let adapter_type = Type::object(adapter.as_str());
                context.method.store_local(slot, &adapter_type)?;
                context.method.load_local(target.slot, &target.ty)?;
                context.method.load_local(slot, &adapter_type)?;
                context.method.put_field(&context.class.name, &field, &spec.listener_type())?;
                context.method.load_local(slot, &adapter_type)?;
            }

            invoke_on_owner(context.method, spec, &spec.setter.name, &spec.setter.descriptor)?;
            if let Some(skip) = skip {
                context.method.mark(skip)?;
            }
        }

        log::debug!("{}: attached @{} to {} view(s)", context.class.name, binding.annotation.simple_name(), binding.ids.len());
        Ok(vec![content])
    }

    fn unbind(&self, context: &mut BindingContext<'_, '_>) -> Result<Vec<GeneratedContent>> {
        let binding = context.listener()?;
        let spec = &binding.listener;
        let class = context.class.name.clone();

        for id in &binding.ids {
            let skip = if binding.optional {
                let skip = context.method.new_label();
                load_cached_view(context, &class, *id)?;
                context.method.if_null(skip)?;
                Some(skip)
            } else {
                None
            };

            load_cached_view(context, &class, *id)?;
            cast_to_owner(context.method, spec)?;

            if spec.has_distinct_unsetter() {
                let field = cached_listener_field(&binding.method.name, &spec.annotation, binding.index, *id);
                context.load(TARGET)?;
                context.method.get_field(&class, &field, &spec.listener_type())?;
                invoke_on_owner(context.method, spec, &spec.unsetter.name, &spec.unsetter.descriptor)?;
            } else {
                context.method.push_null();
                invoke_on_owner(context.method, spec, &spec.setter.name, &spec.setter.descriptor)?;
            }

            if let Some(skip) = skip {
                context.method.mark(skip)?;
            }
        }
        Ok(Vec::new())
    }
}

fn load_cached_view(context: &mut BindingContext<'_, '_>, class: &str, id: i32) -> Result<()> {
    context.load(TARGET)?;
    context.method.get_field(class, &cached_view_field(id), &VIEW)
}

fn cast_to_owner(method: &mut MethodBuilder<'_>, spec: &ListenerClassSpec) -> Result<()> {
    let owner = spec.owner_type();
    if owner != *VIEW {
        method.check_cast(&owner)?;
    }
    Ok(())
}

fn invoke_on_owner(method: &mut MethodBuilder<'_>, spec: &ListenerClassSpec, name: &str, descriptor: &str) -> Result<()> {
    if spec.owner.is_interface() {
        method.invoke_interface(&spec.owner.name, name, descriptor)
    } else {
        method.invoke_virtual(&spec.owner.name, name, descriptor)
    }
}

/// Fields the target needs for a listener binding whose unsetter differs from its setter
pub fn cached_listener_fields(binding: &ListenerBinding) -> Vec<String> {
    if !binding.listener.has_distinct_unsetter() {
        return Vec::new();
    }
    binding
        .ids
        .iter()
        .map(|id| cached_listener_field(&binding.method.name, &binding.listener.annotation, binding.index, *id))
        .collect()
}

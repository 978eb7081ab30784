//! `Target$$SentoBinding` assembly
//!
//! `bind(Object target, Object source, Finder finder)` looks every distinct
//! view id up exactly once, checks the required ones before anything reads
//! them, caches the views listeners are attached to and then hands over to
//! the field and listener generators in declaration order. `unbind` reverses
//! the work: listeners are detached first, then fields and caches are cleared.

use super::context::{BindingContext, GenerationEnvironment, Member, Variables, FINDER, SOURCE, TARGET};
use super::listener::cached_listener_fields;
use super::BindingKind;
use crate::binding::naming::{binding_class_name, cached_view_field, class_file_path, view_variable};
use crate::binding::BindingSpec;
use crate::codegen::class_writer::ClassBuilder;
use crate::codegen::defs::CONSTRUCTOR_METHOD_NAME;
use crate::codegen::descriptor::Type;
use crate::codegen::flag::access_flags::*;
use crate::codegen::method_writer::MethodBuilder;
use crate::common::error::{Error, Result};
use crate::consts::*;
use crate::content::GeneratedContent;

/// Class signature of every binding: `Binding<T>`
pub const BINDING_SIGNATURE: &str = "<T:Ljava/lang/Object;>Ljava/lang/Object;Lio/sento/Binding<TT;>;";

/// Generate the binding class for `spec` plus every listener adapter it needs.
/// The binding class comes first.
pub fn generate_binding(spec: &BindingSpec, environment: &GenerationEnvironment<'_>) -> Result<Vec<GeneratedContent>> {
    let class = &spec.class;
    let binding = binding_class_name(environment.config, &class.name);
    log::info!("generating {} for {}", binding, class.name);

    let mut builder = ClassBuilder::new(ACC_PUBLIC | ACC_SUPER, &binding, OBJECT_NAME, &[BINDING.internal_name().as_str()])?
        .configure(environment.config);
    builder.signature(BINDING_SIGNATURE)?;

    let mut constructor = builder.method(ACC_PUBLIC, CONSTRUCTOR_METHOD_NAME, "()V")?;
    constructor.load_this()?;
    constructor.invoke_constructor(OBJECT_NAME, "()V")?;
    constructor.return_value()?;
    constructor.end_method()?;

    let mut extra = Vec::new();
    {
        let mut method = builder.method(ACC_PUBLIC, BIND_METHOD, BIND_METHOD_DESCRIPTOR)?;
        extra.extend(generate_bind(spec, &binding, &mut method, environment)?);
        method.end_method()?;
    }
    {
        let mut method = builder.method(ACC_PUBLIC, UNBIND_METHOD, UNBIND_METHOD_DESCRIPTOR)?;
        generate_unbind(spec, &binding, &mut method, environment)?;
        method.end_method()?;
    }

    let mut result = vec![GeneratedContent::new(class_file_path(&binding), builder.to_bytes())
        .with_extra(extras::KIND, extras::KIND_BINDING)
        .with_extra(extras::ORIGINAL, class.name.clone())];
    result.extend(extra);
    Ok(result)
}

/// `target` is arg 0 cast to the target type and kept in a fresh local
fn define_target(method: &mut MethodBuilder<'_>, variables: &mut Variables, ty: &Type) -> Result<()> {
    method.load_arg(0)?;
    method.check_cast(ty)?;
    let slot = method.new_local(ty);
    method.store_local(slot, ty)?;
    variables.define(TARGET, slot, ty.clone());
    Ok(())
}

fn generate_bind(
    spec: &BindingSpec,
    binding: &str,
    method: &mut MethodBuilder<'_>,
    environment: &GenerationEnvironment<'_>,
) -> Result<Vec<GeneratedContent>> {
    let class = &spec.class;
    let target = class.ty();
    let mut variables = Variables::new();

    define_target(method, &mut variables, &target)?;
    variables.define(SOURCE, method.arg_slot(1)?, (*OBJECT).clone());
    variables.define(FINDER, method.arg_slot(2)?, (*crate::consts::FINDER).clone());

    for id in spec.view_ids() {
        let optional = spec.is_optional(id);
        log::debug!("{}: view {} ({})", class.name, id, if optional { "optional" } else { "required" });

        variables.load(method, FINDER)?;
        method.push_int(id)?;
        variables.load(method, SOURCE)?;
        method.push_bool(optional)?;
        method.invoke_interface(&crate::consts::FINDER.internal_name(), FINDER_FIND, FINDER_FIND_DESCRIPTOR)?;
        let slot = method.new_local(&VIEW);
        method.store_local(slot, &VIEW)?;
        variables.define(view_variable(id), slot, (*VIEW).clone());
    }

    for id in spec.required_ids() {
        let owner = spec
            .first_required_owner(id)
            .ok_or_else(|| Error::no_such_element(format!("No owner for view {}", id)))?;
        variables.load(method, FINDER)?;
        method.push_int(id)?;
        variables.load(method, &view_variable(id))?;
        variables.load(method, SOURCE)?;
        method.push_string(&owner.description())?;
        method.invoke_interface(&crate::consts::FINDER.internal_name(), FINDER_REQUIRE, FINDER_REQUIRE_DESCRIPTOR)?;
    }

    for id in spec.listener_view_ids() {
        variables.load(method, TARGET)?;
        variables.load(method, &view_variable(id))?;
        method.put_field(&class.name, &cached_view_field(id), &VIEW)?;
    }

    let mut result = Vec::new();
    for member in members(spec) {
        let mut context = BindingContext {
            class,
            binding,
            member,
            variables: &variables,
            environment,
            method: &mut *method,
        };
        result.extend(generator(member).bind(&mut context)?);
    }

    method.return_value()?;
    Ok(result)
}

fn generate_unbind(
    spec: &BindingSpec,
    binding: &str,
    method: &mut MethodBuilder<'_>,
    environment: &GenerationEnvironment<'_>,
) -> Result<()> {
    let class = &spec.class;
    let mut variables = Variables::new();
    define_target(method, &mut variables, &class.ty())?;

    let listeners = spec.listeners.iter().map(Member::Listener);
    let fields = spec.fields.iter().map(Member::Field);
    for member in listeners.chain(fields) {
        let mut context = BindingContext {
            class,
            binding,
            member,
            variables: &variables,
            environment,
            method: &mut *method,
        };
        generator(member).unbind(&mut context)?;
    }

    for id in spec.listener_view_ids() {
        variables.load(method, TARGET)?;
        method.push_null();
        method.put_field(&class.name, &cached_view_field(id), &VIEW)?;
    }
    for listener in &spec.listeners {
        for field in cached_listener_fields(listener) {
            variables.load(method, TARGET)?;
            method.push_null();
            method.put_field(&class.name, &field, &listener.listener.listener_type())?;
        }
    }

    method.return_value()
}

/// Field bindings first, then listener bindings, each in declaration order
fn members(spec: &BindingSpec) -> impl Iterator<Item = Member<'_>> {
    spec.fields.iter().map(Member::Field).chain(spec.listeners.iter().map(Member::Listener))
}

fn generator(member: Member<'_>) -> Box<dyn super::BindingGenerator> {
    match member {
        Member::Field(binding) => binding.kind.generator(),
        Member::Listener(_) => BindingKind::Listener.generator(),
    }
}

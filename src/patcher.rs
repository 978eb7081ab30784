//! Accessibility patching of target classes
//!
//! A binding class lives next to its target but is a different class, so the
//! target is rewritten to let it in: the class and every bound field become
//! public (bound fields also lose `final`), listener views and instances get
//! synthetic cache fields, and non-public listener methods get a static
//! synthetic accessor. Everything else, including method bodies and their
//! stack maps, is copied unchanged.

use crate::binding::naming::{accessor_descriptor, accessor_name, cached_view_field, class_file_path};
use crate::binding::BindingSpec;
use crate::codegen::attribute::InnerClassesAttribute;
use crate::codegen::class::ClassFile;
use crate::codegen::class_writer::ClassBuilder;
use crate::codegen::defs::attribute_names;
use crate::codegen::flag::access_flags::*;
use crate::codegen::flag::{make_public, Access};
use crate::codegen::reader::parse_class;
use crate::common::error::{Error, Result};
use crate::consts::{extras, VIEW};
use crate::content::GeneratedContent;
use crate::generator::listener::cached_listener_fields;
use crate::registry::MethodSpec;

pub fn patch_class(bytes: &[u8], spec: &BindingSpec) -> Result<GeneratedContent> {
    let mut class_file = parse_class(bytes)?;
    let name = class_file.name()?.to_string();
    if name != spec.class.name {
        return Err(Error::class_format_error(format!(
            "expected class '{}' but found '{}'",
            spec.class.name, name
        )));
    }

    class_file.access_flags = make_public(class_file.access_flags);
    widen_inner_class_entry(&mut class_file, &name)?;

    for binding in &spec.fields {
        let pool = &class_file.constant_pool;
        let field = class_file
            .fields
            .iter_mut()
            .find(|field| field.name(pool).map_or(false, |field_name| field_name == binding.field.name))
            .ok_or_else(|| Error::no_such_element(format!("field '{}' of {}", binding.field.name, name)))?;
        field.access_flags = make_public(field.access_flags) & !ACC_FINAL;
    }

    let mut builder = ClassBuilder::from_class(class_file)?;

    for id in spec.listener_view_ids() {
        let field = cached_view_field(id);
        if !builder.has_field(&field) {
            builder.field(ACC_PUBLIC | ACC_SYNTHETIC, &field, &VIEW)?;
        }
    }
    for listener in &spec.listeners {
        for field in cached_listener_fields(listener) {
            if !builder.has_field(&field) {
                builder.field(ACC_PUBLIC | ACC_SYNTHETIC, &field, &listener.listener.listener_type())?;
            }
        }
    }

    let mut accessed: Vec<&MethodSpec> = Vec::new();
    for listener in &spec.listeners {
        let method = &listener.method;
        let known = accessed.iter().any(|other| other.name == method.name && other.descriptor == method.descriptor);
        if !method.access.is_public() && !known {
            accessed.push(method);
        }
    }
    for method in accessed {
        generate_accessor(&mut builder, spec, method)?;
    }

    log::info!("patched {}", name);
    Ok(GeneratedContent::new(class_file_path(&name), builder.to_bytes())
        .with_extra(extras::KIND, extras::KIND_PATCHED)
        .with_extra(extras::ORIGINAL, name))
}

/// Make the `InnerClasses` row describing the class itself public too
fn widen_inner_class_entry(class_file: &mut ClassFile, name: &str) -> Result<()> {
    let pool = &class_file.constant_pool;
    let Some(attribute) = class_file
        .attributes
        .iter_mut()
        .find(|attribute| attribute.name(pool).map_or(false, |attribute_name| attribute_name == attribute_names::INNER_CLASSES))
    else {
        return Ok(());
    };

    let mut inner_classes = InnerClassesAttribute::parse(&attribute.info)
        .ok_or_else(|| Error::class_format_error(format!("truncated InnerClasses attribute in {}", name)))?;
    for entry in &mut inner_classes.classes {
        if pool.class_name(entry.inner_class_info_index)? == name {
            entry.inner_class_access_flags = make_public(entry.inner_class_access_flags);
        }
    }
    attribute.info = inner_classes.to_bytes();
    Ok(())
}

/// `public static synthetic sento$accessor$<name>(Target, args...)`
fn generate_accessor(builder: &mut ClassBuilder, spec: &BindingSpec, method: &MethodSpec) -> Result<()> {
    let target = spec.class.ty();
    let name = accessor_name(method);
    let descriptor = accessor_descriptor(&target, method);
    if builder.has_method(&name, &descriptor) {
        return Ok(());
    }

    let mut visitor = builder.method(ACC_PUBLIC | ACC_STATIC | ACC_SYNTHETIC, &name, &descriptor)?;
    for index in 0..=method.arguments().len() {
        visitor.load_arg(index)?;
    }
    if method.access.is_private() {
        visitor.invoke_special(&spec.class.name, &method.name, &method.descriptor)?;
    } else {
        visitor.invoke_virtual(&spec.class.name, &method.name, &method.descriptor)?;
    }
    visitor.return_value()?;
    visitor.end_method()?;
    log::debug!("{}: accessor {}{}", spec.class.name, name, descriptor);
    Ok(())
}

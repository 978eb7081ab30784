//! Class emission
//!
//! `ClassBuilder` owns a [`ClassFile`] under construction. It is used both for
//! brand new classes (binding classes, listener adapters, the factory) and for
//! appending members to a class that was read from disk.

use super::attribute::{make_signature_attribute, AttributeInfo};
use super::class::ClassFile;
use super::constpool::ConstantPool;
use super::defs::attribute_names;
use super::descriptor::Type;
use super::field::FieldInfo;
use super::method::MethodInfo;
use super::method_writer::MethodBuilder;
use super::writer::ClassfileWritable;
use crate::annotation::{encode_annotations, AnnotationSpec};
use crate::common::config::Config;
use crate::common::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct ClassBuilder {
    class_file: ClassFile,
    name: String,
    emit_frames: bool,
}

impl ClassBuilder {
    /// Start a new class with the given header
    pub fn new(access: u16, name: &str, parent: &str, interfaces: &[&str]) -> Result<Self> {
        let mut class_file = ClassFile::new();
        class_file.access_flags = access;
        class_file.this_class = class_file.constant_pool.try_add_class(name)?;
        class_file.super_class = class_file.constant_pool.try_add_class(parent)?;
        for interface in interfaces {
            let index = class_file.constant_pool.try_add_class(interface)?;
            class_file.interfaces.push(index);
        }
        Ok(Self { class_file, name: name.to_string(), emit_frames: true })
    }

    /// Continue building on an existing class; the constant pool is only appended to
    pub fn from_class(class_file: ClassFile) -> Result<Self> {
        let name = class_file.name()?.to_string();
        Ok(Self { class_file, name, emit_frames: true })
    }

    /// Apply the class file version and frame settings of a run
    pub fn configure(mut self, config: &Config) -> Self {
        self.class_file.major_version = config.major_version;
        self.class_file.minor_version = config.minor_version;
        self.emit_frames = config.emit_frames;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class_file(&self) -> &ClassFile {
        &self.class_file
    }

    pub fn class_file_mut(&mut self) -> &mut ClassFile {
        &mut self.class_file
    }

    pub fn constant_pool_mut(&mut self) -> &mut ConstantPool {
        &mut self.class_file.constant_pool
    }

    pub fn emits_frames(&self) -> bool {
        self.emit_frames
    }

    /// Generic signature of the class itself
    pub fn signature(&mut self, signature: &str) -> Result<()> {
        let attribute = make_signature_attribute(&mut self.class_file.constant_pool, signature)?;
        self.class_file.attributes.push(attribute);
        Ok(())
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.class_file.find_field(name).is_some()
    }

    pub fn has_method(&self, name: &str, descriptor: &str) -> bool {
        self.class_file.find_method(name, descriptor).is_some()
    }

    /// Declare a field, returning its index
    pub fn field(&mut self, access: u16, name: &str, ty: &Type) -> Result<usize> {
        let pool = &mut self.class_file.constant_pool;
        let field = FieldInfo::new(access, pool.try_add_utf8(name)?, pool.try_add_utf8(&ty.descriptor())?);
        self.class_file.fields.push(field);
        Ok(self.class_file.fields.len() - 1)
    }

    pub fn field_with_signature(&mut self, access: u16, name: &str, ty: &Type, signature: &str) -> Result<usize> {
        let index = self.field(access, name, ty)?;
        let attribute = make_signature_attribute(&mut self.class_file.constant_pool, signature)?;
        self.class_file.fields[index].attributes.push(attribute);
        Ok(index)
    }

    /// Start a method body; the method is appended by [`MethodBuilder::end_method`]
    pub fn method(&mut self, access: u16, name: &str, descriptor: &str) -> Result<MethodBuilder<'_>> {
        MethodBuilder::new(self, access, name, descriptor)
    }

    /// Declare a method without a body (abstract, native or interface methods)
    pub fn declare_method(&mut self, access: u16, name: &str, descriptor: &str) -> Result<usize> {
        let pool = &mut self.class_file.constant_pool;
        let method = MethodInfo::new(access, pool.try_add_utf8(name)?, pool.try_add_utf8(descriptor)?);
        Ok(self.push_method(method))
    }

    pub(crate) fn push_method(&mut self, method: MethodInfo) -> usize {
        self.class_file.methods.push(method);
        self.class_file.methods.len() - 1
    }

    pub fn annotate_class(&mut self, annotations: &[AnnotationSpec], visible: bool) -> Result<()> {
        let attribute = self.annotations_attribute(annotations, visible)?;
        self.class_file.attributes.push(attribute);
        Ok(())
    }

    pub fn annotate_field(&mut self, index: usize, annotations: &[AnnotationSpec], visible: bool) -> Result<()> {
        let attribute = self.annotations_attribute(annotations, visible)?;
        self.class_file
            .fields
            .get_mut(index)
            .ok_or_else(|| Error::no_such_element(format!("field #{} of {}", index, self.name)))?
            .attributes
            .push(attribute);
        Ok(())
    }

    pub fn annotate_method(&mut self, index: usize, annotations: &[AnnotationSpec], visible: bool) -> Result<()> {
        let attribute = self.annotations_attribute(annotations, visible)?;
        self.class_file
            .methods
            .get_mut(index)
            .ok_or_else(|| Error::no_such_element(format!("method #{} of {}", index, self.name)))?
            .attributes
            .push(attribute);
        Ok(())
    }

    fn annotations_attribute(&mut self, annotations: &[AnnotationSpec], visible: bool) -> Result<AttributeInfo> {
        let name = if visible {
            attribute_names::RUNTIME_VISIBLE_ANNOTATIONS
        } else {
            attribute_names::RUNTIME_INVISIBLE_ANNOTATIONS
        };
        let payload = encode_annotations(&mut self.class_file.constant_pool, annotations)?;
        Ok(AttributeInfo::named(&mut self.class_file.constant_pool, name, payload)?)
    }

    pub fn finish(self) -> ClassFile {
        self.class_file
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.class_file.to_classfile_bytes()
    }
}

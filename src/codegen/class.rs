//! Core classfile structure

use super::attribute::AttributeInfo;
use super::constpool::ConstantPool;
use super::defs::{JAVA_1_7, MAGIC};
use super::error::ConstPoolResult;
use super::field::FieldInfo;
use super::method::MethodInfo;

#[derive(Debug, Clone)]
pub struct ClassFile {
    pub magic: u32,
    pub minor_version: u16,
    pub major_version: u16,
    pub constant_pool: ConstantPool,
    pub access_flags: u16,
    pub this_class: u16,
    pub super_class: u16,
    pub interfaces: Vec<u16>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
    pub attributes: Vec<AttributeInfo>,
}

impl ClassFile {
    pub fn new() -> Self {
        Self {
            magic: MAGIC,
            minor_version: 0,
            major_version: JAVA_1_7,
            constant_pool: ConstantPool::new(),
            access_flags: 0,
            this_class: 0,
            super_class: 0,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn name(&self) -> ConstPoolResult<&str> {
        self.constant_pool.class_name(self.this_class)
    }

    /// `None` only for `java/lang/Object`
    pub fn super_name(&self) -> ConstPoolResult<Option<&str>> {
        if self.super_class == 0 {
            return Ok(None);
        }
        self.constant_pool.class_name(self.super_class).map(Some)
    }

    pub fn interface_names(&self) -> ConstPoolResult<Vec<&str>> {
        self.interfaces
            .iter()
            .map(|index| self.constant_pool.class_name(*index))
            .collect()
    }

    pub fn find_method(&self, name: &str, descriptor: &str) -> Option<&MethodInfo> {
        self.methods.iter().find(|method| {
            method.name(&self.constant_pool).ok() == Some(name)
                && method.descriptor(&self.constant_pool).ok() == Some(descriptor)
        })
    }

    pub fn find_field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields
            .iter()
            .find(|field| field.name(&self.constant_pool).ok() == Some(name))
    }

    /// Class-level attribute by name
    pub fn attribute(&self, name: &str) -> Option<&AttributeInfo> {
        self.attributes
            .iter()
            .find(|attribute| attribute.name(&self.constant_pool).ok() == Some(name))
    }
}

impl Default for ClassFile {
    fn default() -> Self {
        Self::new()
    }
}

//! Attributes and exception table structures for Java class files

use super::constpool::ConstantPool;
use super::defs::attribute_names;
use super::error::ConstPoolResult;

/// An attribute whose payload is kept as raw bytes
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeInfo {
    pub name_index: u16,
    pub info: Vec<u8>,
}

impl AttributeInfo {
    pub fn new(name_index: u16, info: Vec<u8>) -> Self {
        Self { name_index, info }
    }

    /// Build an attribute, registering its name in the pool
    pub fn named(constant_pool: &mut ConstantPool, name: &str, info: Vec<u8>) -> ConstPoolResult<Self> {
        let name_index = constant_pool.try_add_utf8(name)?;
        Ok(Self::new(name_index, info))
    }

    pub fn name<'a>(&self, constant_pool: &'a ConstantPool) -> ConstPoolResult<&'a str> {
        constant_pool.utf8(self.name_index)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(6 + self.info.len());
        bytes.extend_from_slice(&self.name_index.to_be_bytes());
        bytes.extend_from_slice(&(self.info.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&self.info);
        bytes
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CodeAttribute {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    pub exception_table: Vec<ExceptionTableEntry>,
    pub attributes: Vec<AttributeInfo>,
}

impl CodeAttribute {
    pub fn new(max_stack: u16, max_locals: u16, code: Vec<u8>) -> Self {
        Self {
            max_stack,
            max_locals,
            code,
            exception_table: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&self.max_stack.to_be_bytes());
        bytes.extend_from_slice(&self.max_locals.to_be_bytes());
        bytes.extend_from_slice(&(self.code.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&self.code);
        bytes.extend_from_slice(&(self.exception_table.len() as u16).to_be_bytes());
        for entry in &self.exception_table {
            bytes.extend_from_slice(&entry.to_bytes());
        }
        bytes.extend_from_slice(&(self.attributes.len() as u16).to_be_bytes());
        for attribute in &self.attributes {
            bytes.extend_from_slice(&attribute.to_bytes());
        }
        bytes
    }

    /// Wrap into a `Code` attribute
    pub fn into_attribute(self, constant_pool: &mut ConstantPool) -> ConstPoolResult<AttributeInfo> {
        AttributeInfo::named(constant_pool, attribute_names::CODE, self.to_bytes())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExceptionTableEntry {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    pub catch_type: u16,
}

impl ExceptionTableEntry {
    pub fn new(start_pc: u16, end_pc: u16, handler_pc: u16, catch_type: u16) -> Self {
        Self { start_pc, end_pc, handler_pc, catch_type }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&self.start_pc.to_be_bytes());
        bytes.extend_from_slice(&self.end_pc.to_be_bytes());
        bytes.extend_from_slice(&self.handler_pc.to_be_bytes());
        bytes.extend_from_slice(&self.catch_type.to_be_bytes());
        bytes
    }
}

/// One row of an `InnerClasses` attribute
#[derive(Debug, Clone, PartialEq)]
pub struct InnerClassEntry {
    pub inner_class_info_index: u16,
    pub outer_class_info_index: u16,
    pub inner_name_index: u16,
    pub inner_class_access_flags: u16,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct InnerClassesAttribute {
    pub classes: Vec<InnerClassEntry>,
}

impl InnerClassesAttribute {
    /// Decode the payload, `None` if it is truncated
    pub fn parse(info: &[u8]) -> Option<Self> {
        let count = u16::from_be_bytes([*info.first()?, *info.get(1)?]) as usize;
        let mut classes = Vec::with_capacity(count);
        for row in 0..count {
            let base = 2 + row * 8;
            let word = |offset: usize| -> Option<u16> {
                Some(u16::from_be_bytes([*info.get(base + offset)?, *info.get(base + offset + 1)?]))
            };
            classes.push(InnerClassEntry {
                inner_class_info_index: word(0)?,
                outer_class_info_index: word(2)?,
                inner_name_index: word(4)?,
                inner_class_access_flags: word(6)?,
            });
        }
        Some(Self { classes })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(2 + self.classes.len() * 8);
        bytes.extend_from_slice(&(self.classes.len() as u16).to_be_bytes());
        for entry in &self.classes {
            bytes.extend_from_slice(&entry.inner_class_info_index.to_be_bytes());
            bytes.extend_from_slice(&entry.outer_class_info_index.to_be_bytes());
            bytes.extend_from_slice(&entry.inner_name_index.to_be_bytes());
            bytes.extend_from_slice(&entry.inner_class_access_flags.to_be_bytes());
        }
        bytes
    }
}

/// Helper to build a `Signature` attribute
pub fn make_signature_attribute(constant_pool: &mut ConstantPool, signature: &str) -> ConstPoolResult<AttributeInfo> {
    let signature_index = constant_pool.try_add_utf8(signature)?;
    AttributeInfo::named(constant_pool, attribute_names::SIGNATURE, signature_index.to_be_bytes().to_vec())
}

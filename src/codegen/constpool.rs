//! Constant pool and constants for Java class files
//!
//! Indices are 1-based as in the class file. `Long` and `Double` occupy two
//! slots; the second slot is kept as an empty entry so that indices read from
//! an existing class stay valid when the pool is appended to.

use std::collections::HashMap;

use super::error::{ConstPoolError, ConstPoolResult};

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class(u16),
    String(u16),
    FieldRef(u16, u16),
    MethodRef(u16, u16),
    InterfaceMethodRef(u16, u16),
    NameAndType(u16, u16),
    MethodHandle(u8, u16),
    MethodType(u16),
    Dynamic(u16, u16),
    InvokeDynamic(u16, u16),
    Module(u16),
    Package(u16),
}

pub mod constant_tags {
    pub const CONSTANT_UTF8: u8 = 1;
    pub const CONSTANT_INTEGER: u8 = 3;
    pub const CONSTANT_FLOAT: u8 = 4;
    pub const CONSTANT_LONG: u8 = 5;
    pub const CONSTANT_DOUBLE: u8 = 6;
    pub const CONSTANT_CLASS: u8 = 7;
    pub const CONSTANT_STRING: u8 = 8;
    pub const CONSTANT_FIELDREF: u8 = 9;
    pub const CONSTANT_METHODREF: u8 = 10;
    pub const CONSTANT_INTERFACEMETHODREF: u8 = 11;
    pub const CONSTANT_NAMEANDTYPE: u8 = 12;
    pub const CONSTANT_METHODHANDLE: u8 = 15;
    pub const CONSTANT_METHODTYPE: u8 = 16;
    pub const CONSTANT_DYNAMIC: u8 = 17;
    pub const CONSTANT_INVOKEDYNAMIC: u8 = 18;
    pub const CONSTANT_MODULE: u8 = 19;
    pub const CONSTANT_PACKAGE: u8 = 20;
}

impl Constant {
    /// Whether this constant takes two pool slots
    pub fn is_wide(&self) -> bool {
        matches!(self, Constant::Long(_) | Constant::Double(_))
    }
}

/// Hashable identity of a constant, floats compared by bit pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ConstantKey {
    Utf8(String),
    Integer(i32),
    Float(u32),
    Long(i64),
    Double(u64),
    Class(u16),
    String(u16),
    FieldRef(u16, u16),
    MethodRef(u16, u16),
    InterfaceMethodRef(u16, u16),
    NameAndType(u16, u16),
    MethodHandle(u8, u16),
    MethodType(u16),
    Dynamic(u16, u16),
    InvokeDynamic(u16, u16),
    Module(u16),
    Package(u16),
}

impl From<&Constant> for ConstantKey {
    fn from(constant: &Constant) -> Self {
        match constant {
            Constant::Utf8(value) => ConstantKey::Utf8(value.clone()),
            Constant::Integer(value) => ConstantKey::Integer(*value),
            Constant::Float(value) => ConstantKey::Float(value.to_bits()),
            Constant::Long(value) => ConstantKey::Long(*value),
            Constant::Double(value) => ConstantKey::Double(value.to_bits()),
            Constant::Class(index) => ConstantKey::Class(*index),
            Constant::String(index) => ConstantKey::String(*index),
            Constant::FieldRef(a, b) => ConstantKey::FieldRef(*a, *b),
            Constant::MethodRef(a, b) => ConstantKey::MethodRef(*a, *b),
            Constant::InterfaceMethodRef(a, b) => ConstantKey::InterfaceMethodRef(*a, *b),
            Constant::NameAndType(a, b) => ConstantKey::NameAndType(*a, *b),
            Constant::MethodHandle(kind, index) => ConstantKey::MethodHandle(*kind, *index),
            Constant::MethodType(index) => ConstantKey::MethodType(*index),
            Constant::Dynamic(a, b) => ConstantKey::Dynamic(*a, *b),
            Constant::InvokeDynamic(a, b) => ConstantKey::InvokeDynamic(*a, *b),
            Constant::Module(index) => ConstantKey::Module(*index),
            Constant::Package(index) => ConstantKey::Package(*index),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConstantPool {
    /// Slot `i` holds constant pool index `i + 1`; `None` marks the upper half of a wide constant.
    pub(crate) constants: Vec<Option<Constant>>,
    lookup: HashMap<ConstantKey, u16>,
}

impl ConstantPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a pool from slots read out of an existing class file
    pub fn from_slots(constants: Vec<Option<Constant>>) -> Self {
        let mut lookup = HashMap::new();
        for (slot, constant) in constants.iter().enumerate() {
            if let Some(constant) = constant {
                lookup.entry(ConstantKey::from(constant)).or_insert((slot + 1) as u16);
            }
        }
        Self { constants, lookup }
    }

    /// Value of the `constant_pool_count` header field
    pub fn count(&self) -> u16 {
        (self.constants.len() + 1) as u16
    }

    pub fn slots(&self) -> &[Option<Constant>] {
        &self.constants
    }

    pub fn try_add(&mut self, constant: Constant) -> ConstPoolResult<u16> {
        let key = ConstantKey::from(&constant);
        if let Some(index) = self.lookup.get(&key) {
            return Ok(*index);
        }

        let width = if constant.is_wide() { 2 } else { 1 };
        if self.constants.len() + width > u16::MAX as usize - 1 {
            return Err(ConstPoolError::OutOfSpace);
        }

        let index = (self.constants.len() + 1) as u16;
        self.constants.push(Some(constant));
        if width == 2 {
            self.constants.push(None);
        }
        self.lookup.insert(key, index);
        Ok(index)
    }

    pub fn try_add_utf8(&mut self, value: &str) -> ConstPoolResult<u16> {
        self.try_add(Constant::Utf8(value.to_string()))
    }

    pub fn try_add_class(&mut self, name: &str) -> ConstPoolResult<u16> {
        let name_index = self.try_add_utf8(name)?;
        self.try_add(Constant::Class(name_index))
    }

    pub fn try_add_string(&mut self, value: &str) -> ConstPoolResult<u16> {
        let utf8_index = self.try_add_utf8(value)?;
        self.try_add(Constant::String(utf8_index))
    }

    pub fn try_add_integer(&mut self, value: i32) -> ConstPoolResult<u16> {
        self.try_add(Constant::Integer(value))
    }

    pub fn try_add_float(&mut self, value: f32) -> ConstPoolResult<u16> {
        self.try_add(Constant::Float(value))
    }

    pub fn try_add_long(&mut self, value: i64) -> ConstPoolResult<u16> {
        self.try_add(Constant::Long(value))
    }

    pub fn try_add_double(&mut self, value: f64) -> ConstPoolResult<u16> {
        self.try_add(Constant::Double(value))
    }

    pub fn try_add_name_and_type(&mut self, name: &str, descriptor: &str) -> ConstPoolResult<u16> {
        let name_index = self.try_add_utf8(name)?;
        let descriptor_index = self.try_add_utf8(descriptor)?;
        self.try_add(Constant::NameAndType(name_index, descriptor_index))
    }

    pub fn try_add_field_ref(&mut self, class: &str, name: &str, descriptor: &str) -> ConstPoolResult<u16> {
        let class_index = self.try_add_class(class)?;
        let name_and_type_index = self.try_add_name_and_type(name, descriptor)?;
        self.try_add(Constant::FieldRef(class_index, name_and_type_index))
    }

    pub fn try_add_method_ref(&mut self, class: &str, name: &str, descriptor: &str) -> ConstPoolResult<u16> {
        let class_index = self.try_add_class(class)?;
        let name_and_type_index = self.try_add_name_and_type(name, descriptor)?;
        self.try_add(Constant::MethodRef(class_index, name_and_type_index))
    }

    pub fn try_add_interface_method_ref(&mut self, class: &str, name: &str, descriptor: &str) -> ConstPoolResult<u16> {
        let class_index = self.try_add_class(class)?;
        let name_and_type_index = self.try_add_name_and_type(name, descriptor)?;
        self.try_add(Constant::InterfaceMethodRef(class_index, name_and_type_index))
    }

    pub fn get(&self, index: u16) -> ConstPoolResult<&Constant> {
        if index == 0 {
            return Err(ConstPoolError::InvalidIndex(index));
        }
        self.constants
            .get(index as usize - 1)
            .and_then(|slot| slot.as_ref())
            .ok_or(ConstPoolError::InvalidIndex(index))
    }

    pub fn utf8(&self, index: u16) -> ConstPoolResult<&str> {
        match self.get(index)? {
            Constant::Utf8(value) => Ok(value.as_str()),
            _ => Err(ConstPoolError::UnexpectedEntry { index, expected: "Utf8" }),
        }
    }

    /// Internal name referenced by a `Class` entry
    pub fn class_name(&self, index: u16) -> ConstPoolResult<&str> {
        match self.get(index)? {
            Constant::Class(name_index) => self.utf8(*name_index),
            _ => Err(ConstPoolError::UnexpectedEntry { index, expected: "Class" }),
        }
    }

    /// Owner, name and descriptor of a field, method or interface method reference
    pub fn member_ref(&self, index: u16) -> ConstPoolResult<(&str, &str, &str)> {
        let (class_index, name_and_type_index) = match self.get(index)? {
            Constant::FieldRef(class, name_and_type)
            | Constant::MethodRef(class, name_and_type)
            | Constant::InterfaceMethodRef(class, name_and_type) => (*class, *name_and_type),
            _ => return Err(ConstPoolError::UnexpectedEntry { index, expected: "member reference" }),
        };
        match self.get(name_and_type_index)? {
            Constant::NameAndType(name, descriptor) => {
                Ok((self.class_name(class_index)?, self.utf8(*name)?, self.utf8(*descriptor)?))
            }
            _ => Err(ConstPoolError::UnexpectedEntry { index: name_and_type_index, expected: "NameAndType" }),
        }
    }
}

/// Encode a string in the JVM's modified UTF-8
pub fn encode_modified_utf8(value: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(value.len());
    for unit in value.encode_utf16() {
        match unit {
            0x0001..=0x007f => bytes.push(unit as u8),
            0x0000 | 0x0080..=0x07ff => {
                bytes.push((0xc0 | ((unit >> 6) & 0x1f)) as u8);
                bytes.push((0x80 | (unit & 0x3f)) as u8);
            }
            _ => {
                bytes.push((0xe0 | ((unit >> 12) & 0x0f)) as u8);
                bytes.push((0x80 | ((unit >> 6) & 0x3f)) as u8);
                bytes.push((0x80 | (unit & 0x3f)) as u8);
            }
        }
    }
    bytes
}

/// Decode modified UTF-8, `None` for malformed input
pub fn decode_modified_utf8(bytes: &[u8]) -> Option<String> {
    let mut units = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i] as u16;
        if b & 0x80 == 0 {
            units.push(b);
            i += 1;
        } else if b & 0xe0 == 0xc0 {
            let b2 = *bytes.get(i + 1)? as u16;
            units.push(((b & 0x1f) << 6) | (b2 & 0x3f));
            i += 2;
        } else if b & 0xf0 == 0xe0 {
            let b2 = *bytes.get(i + 1)? as u16;
            let b3 = *bytes.get(i + 2)? as u16;
            units.push(((b & 0x0f) << 12) | ((b2 & 0x3f) << 6) | (b3 & 0x3f));
            i += 3;
        } else {
            return None;
        }
    }
    String::from_utf16(&units).ok()
}

//! Class file parser
//!
//! Everything is kept in its raw form except the constant pool and the member
//! tables: attributes keep their payload bytes so that an unchanged class can
//! be written back byte-for-byte.

use super::attribute::{AttributeInfo, CodeAttribute, ExceptionTableEntry};
use super::class::ClassFile;
use super::constpool::{constant_tags::*, decode_modified_utf8, Constant, ConstantPool};
use super::defs::MAGIC;
use super::field::FieldInfo;
use super::method::MethodInfo;
use crate::common::error::{Error, Result};

/// Big-endian cursor over class file bytes
#[derive(Debug, Clone)]
pub struct ClassBuffer<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ClassBuffer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.offset >= self.data.len()
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.offset.checked_add(len).filter(|end| *end <= self.data.len()).ok_or_else(|| {
            Error::class_format_error(format!(
                "unexpected end of data: wanted {} bytes at offset {} of {}",
                len,
                self.offset,
                self.data.len()
            ))
        })?;
        let slice = &self.data[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let high = self.read_u32()? as u64;
        let low = self.read_u32()? as u64;
        Ok((high << 32) | low)
    }
}

/// Parse a complete class file
pub fn parse_class(bytes: &[u8]) -> Result<ClassFile> {
    let mut buffer = ClassBuffer::new(bytes);

    let magic = buffer.read_u32()?;
    if magic != MAGIC {
        return Err(Error::class_format_error(format!("bad magic number 0x{:08x}", magic)));
    }

    let minor_version = buffer.read_u16()?;
    let major_version = buffer.read_u16()?;
    let constant_pool = read_constant_pool(&mut buffer)?;

    let access_flags = buffer.read_u16()?;
    let this_class = buffer.read_u16()?;
    let super_class = buffer.read_u16()?;

    let interfaces_count = buffer.read_u16()?;
    let mut interfaces = Vec::with_capacity(interfaces_count as usize);
    for _ in 0..interfaces_count {
        interfaces.push(buffer.read_u16()?);
    }

    let fields_count = buffer.read_u16()?;
    let mut fields = Vec::with_capacity(fields_count as usize);
    for _ in 0..fields_count {
        let mut field = FieldInfo::new(buffer.read_u16()?, buffer.read_u16()?, buffer.read_u16()?);
        field.attributes = read_attributes(&mut buffer)?;
        fields.push(field);
    }

    let methods_count = buffer.read_u16()?;
    let mut methods = Vec::with_capacity(methods_count as usize);
    for _ in 0..methods_count {
        let mut method = MethodInfo::new(buffer.read_u16()?, buffer.read_u16()?, buffer.read_u16()?);
        method.attributes = read_attributes(&mut buffer)?;
        methods.push(method);
    }

    let attributes = read_attributes(&mut buffer)?;

    if !buffer.is_empty() {
        return Err(Error::class_format_error(format!(
            "{} trailing bytes after class attributes",
            bytes.len() - buffer.offset()
        )));
    }

    let class_file = ClassFile {
        magic,
        minor_version,
        major_version,
        constant_pool,
        access_flags,
        this_class,
        super_class,
        interfaces,
        fields,
        methods,
        attributes,
    };

    // Fail early on a dangling this_class.
    class_file.name()?;
    Ok(class_file)
}

fn read_constant_pool(buffer: &mut ClassBuffer<'_>) -> Result<ConstantPool> {
    let count = buffer.read_u16()?;
    if count == 0 {
        return Err(Error::class_format_error("constant pool count is zero"));
    }

    let mut slots: Vec<Option<Constant>> = Vec::with_capacity(count as usize);
    while slots.len() + 1 < count as usize {
        let tag = buffer.read_u8()?;
        let constant = match tag {
            CONSTANT_UTF8 => {
                let length = buffer.read_u16()? as usize;
                let raw = buffer.read_bytes(length)?;
                let value = decode_modified_utf8(raw).ok_or_else(|| {
                    Error::class_format_error(format!("malformed utf8 constant #{}", slots.len() + 1))
                })?;
                Constant::Utf8(value)
            }
            CONSTANT_INTEGER => Constant::Integer(buffer.read_u32()? as i32),
            CONSTANT_FLOAT => Constant::Float(f32::from_bits(buffer.read_u32()?)),
            CONSTANT_LONG => Constant::Long(buffer.read_u64()? as i64),
            CONSTANT_DOUBLE => Constant::Double(f64::from_bits(buffer.read_u64()?)),
            CONSTANT_CLASS => Constant::Class(buffer.read_u16()?),
            CONSTANT_STRING => Constant::String(buffer.read_u16()?),
            CONSTANT_FIELDREF => Constant::FieldRef(buffer.read_u16()?, buffer.read_u16()?),
            CONSTANT_METHODREF => Constant::MethodRef(buffer.read_u16()?, buffer.read_u16()?),
            CONSTANT_INTERFACEMETHODREF => Constant::InterfaceMethodRef(buffer.read_u16()?, buffer.read_u16()?),
            CONSTANT_NAMEANDTYPE => Constant::NameAndType(buffer.read_u16()?, buffer.read_u16()?),
            CONSTANT_METHODHANDLE => Constant::MethodHandle(buffer.read_u8()?, buffer.read_u16()?),
            CONSTANT_METHODTYPE => Constant::MethodType(buffer.read_u16()?),
            CONSTANT_DYNAMIC => Constant::Dynamic(buffer.read_u16()?, buffer.read_u16()?),
            CONSTANT_INVOKEDYNAMIC => Constant::InvokeDynamic(buffer.read_u16()?, buffer.read_u16()?),
            CONSTANT_MODULE => Constant::Module(buffer.read_u16()?),
            CONSTANT_PACKAGE => Constant::Package(buffer.read_u16()?),
            _ => {
                return Err(Error::class_format_error(format!(
                    "unknown constant pool tag {} at entry #{}",
                    tag,
                    slots.len() + 1
                )))
            }
        };

        let wide = constant.is_wide();
        slots.push(Some(constant));
        if wide {
            slots.push(None);
        }
    }

    if slots.len() + 1 != count as usize {
        return Err(Error::class_format_error("wide constant overruns the constant pool"));
    }

    Ok(ConstantPool::from_slots(slots))
}

fn read_attributes(buffer: &mut ClassBuffer<'_>) -> Result<Vec<AttributeInfo>> {
    let count = buffer.read_u16()?;
    let mut attributes = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let name_index = buffer.read_u16()?;
        let length = buffer.read_u32()? as usize;
        let info = buffer.read_bytes(length)?.to_vec();
        attributes.push(AttributeInfo::new(name_index, info));
    }
    Ok(attributes)
}

/// Decode the payload of a `Code` attribute
pub fn parse_code_attribute(info: &[u8]) -> Result<CodeAttribute> {
    let mut buffer = ClassBuffer::new(info);
    let max_stack = buffer.read_u16()?;
    let max_locals = buffer.read_u16()?;
    let code_length = buffer.read_u32()? as usize;
    let mut code = CodeAttribute::new(max_stack, max_locals, buffer.read_bytes(code_length)?.to_vec());

    let exception_count = buffer.read_u16()?;
    for _ in 0..exception_count {
        code.exception_table.push(ExceptionTableEntry::new(
            buffer.read_u16()?,
            buffer.read_u16()?,
            buffer.read_u16()?,
            buffer.read_u16()?,
        ));
    }
    code.attributes = read_attributes(&mut buffer)?;
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::writer::ClassfileWritable;

    fn minimal_class() -> ClassFile {
        let mut class = ClassFile::new();
        class.this_class = class.constant_pool.try_add_class("com/example/Foo").unwrap();
        class.super_class = class.constant_pool.try_add_class("java/lang/Object").unwrap();
        class.constant_pool.try_add_double(2.5).unwrap();
        class.access_flags = 0x0021;
        class
    }

    #[test]
    fn test_parse_written_class() {
        let bytes = minimal_class().to_classfile_bytes();
        let parsed = parse_class(&bytes).unwrap();
        assert_eq!(parsed.name().unwrap(), "com/example/Foo");
        assert_eq!(parsed.super_name().unwrap(), Some("java/lang/Object"));
        assert_eq!(parsed.access_flags, 0x0021);
        assert_eq!(parsed.to_classfile_bytes(), bytes);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = minimal_class().to_classfile_bytes();
        bytes[0] = 0;
        assert!(matches!(parse_class(&bytes), Err(Error::ClassFormat { .. })));
    }

    #[test]
    fn test_truncated_class() {
        let bytes = minimal_class().to_classfile_bytes();
        assert!(matches!(parse_class(&bytes[..bytes.len() - 3]), Err(Error::ClassFormat { .. })));
    }

    #[test]
    fn test_parse_code_attribute() {
        let mut code = CodeAttribute::new(1, 1, vec![0x2a, 0xb0]);
        code.exception_table.push(ExceptionTableEntry::new(0, 1, 1, 0));
        let parsed = parse_code_attribute(&code.to_bytes()).unwrap();
        assert_eq!(parsed, code);
    }
}

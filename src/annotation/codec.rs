//! Binary form of `RuntimeVisibleAnnotations` / `RuntimeInvisibleAnnotations`

use super::{AnnotationSpec, AnnotationValue};
use crate::codegen::attribute::AttributeInfo;
use crate::codegen::constpool::{Constant, ConstantPool};
use crate::codegen::defs::attribute_names;
use crate::codegen::descriptor::Type;
use crate::codegen::error::{ConstPoolError, ConstPoolResult};
use crate::codegen::reader::ClassBuffer;
use crate::common::error::{Error, Result};

const MAX_NESTING: u16 = 32;

/// All annotations declared through either annotation attribute, visible first
pub fn read_annotations(constant_pool: &ConstantPool, attributes: &[AttributeInfo]) -> Result<Vec<AnnotationSpec>> {
    let mut annotations = Vec::new();
    for wanted in [attribute_names::RUNTIME_VISIBLE_ANNOTATIONS, attribute_names::RUNTIME_INVISIBLE_ANNOTATIONS] {
        for attribute in attributes {
            if attribute.name(constant_pool)? == wanted {
                annotations.extend(decode_annotations(constant_pool, &attribute.info)?);
            }
        }
    }
    Ok(annotations)
}

/// Decode the payload of an annotations attribute
pub fn decode_annotations(constant_pool: &ConstantPool, info: &[u8]) -> Result<Vec<AnnotationSpec>> {
    let mut buffer = ClassBuffer::new(info);
    let count = buffer.read_u16()?;
    let mut annotations = Vec::with_capacity(count as usize);
    for _ in 0..count {
        annotations.push(read_annotation(constant_pool, &mut buffer, 0)?);
    }
    Ok(annotations)
}

fn read_annotation(constant_pool: &ConstantPool, buffer: &mut ClassBuffer<'_>, depth: u16) -> Result<AnnotationSpec> {
    if depth > MAX_NESTING {
        return Err(Error::class_format_error("annotation nesting is too deep"));
    }

    let annotation_type = Type::parse(constant_pool.utf8(buffer.read_u16()?)?)?;
    let pairs = buffer.read_u16()?;
    let mut annotation = AnnotationSpec::new(annotation_type);
    for _ in 0..pairs {
        let name = constant_pool.utf8(buffer.read_u16()?)?.to_string();
        let value = read_value(constant_pool, buffer, depth)?;
        annotation.values.push((name, value));
    }
    Ok(annotation)
}

fn read_value(constant_pool: &ConstantPool, buffer: &mut ClassBuffer<'_>, depth: u16) -> Result<AnnotationValue> {
    let tag = buffer.read_u8()?;
    let value = match tag {
        b'B' => AnnotationValue::Byte(integer(constant_pool, buffer.read_u16()?)? as i8),
        b'C' => AnnotationValue::Char(integer(constant_pool, buffer.read_u16()?)? as u16),
        b'I' => AnnotationValue::Int(integer(constant_pool, buffer.read_u16()?)?),
        b'S' => AnnotationValue::Short(integer(constant_pool, buffer.read_u16()?)? as i16),
        b'Z' => AnnotationValue::Boolean(integer(constant_pool, buffer.read_u16()?)? != 0),
        b'D' => {
            let index = buffer.read_u16()?;
            match constant_pool.get(index)? {
                Constant::Double(value) => AnnotationValue::Double(*value),
                _ => return Err(unexpected(index, "Double")),
            }
        }
        b'F' => {
            let index = buffer.read_u16()?;
            match constant_pool.get(index)? {
                Constant::Float(value) => AnnotationValue::Float(*value),
                _ => return Err(unexpected(index, "Float")),
            }
        }
        b'J' => {
            let index = buffer.read_u16()?;
            match constant_pool.get(index)? {
                Constant::Long(value) => AnnotationValue::Long(*value),
                _ => return Err(unexpected(index, "Long")),
            }
        }
        b's' => AnnotationValue::String(constant_pool.utf8(buffer.read_u16()?)?.to_string()),
        b'e' => {
            let enum_type = Type::parse(constant_pool.utf8(buffer.read_u16()?)?)?;
            let constant = constant_pool.utf8(buffer.read_u16()?)?.to_string();
            AnnotationValue::Enum { enum_type, constant }
        }
        b'c' => AnnotationValue::Class(Type::parse(constant_pool.utf8(buffer.read_u16()?)?)?),
        b'@' => AnnotationValue::Annotation(read_annotation(constant_pool, buffer, depth + 1)?),
        b'[' => {
            if depth > MAX_NESTING {
                return Err(Error::class_format_error("annotation nesting is too deep"));
            }
            let count = buffer.read_u16()?;
            let mut values = Vec::with_capacity(count as usize);
            for _ in 0..count {
                values.push(read_value(constant_pool, buffer, depth + 1)?);
            }
            AnnotationValue::Array(values)
        }
        _ => {
            return Err(Error::class_format_error(format!(
                "unknown annotation element tag '{}'",
                tag as char
            )))
        }
    };
    Ok(value)
}

fn integer(constant_pool: &ConstantPool, index: u16) -> Result<i32> {
    match constant_pool.get(index)? {
        Constant::Integer(value) => Ok(*value),
        _ => Err(unexpected(index, "Integer")),
    }
}

fn unexpected(index: u16, expected: &'static str) -> Error {
    Error::ConstPool(ConstPoolError::UnexpectedEntry { index, expected })
}

/// Encode annotations into the payload of an annotations attribute
pub fn encode_annotations(constant_pool: &mut ConstantPool, annotations: &[AnnotationSpec]) -> ConstPoolResult<Vec<u8>> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&(annotations.len() as u16).to_be_bytes());
    for annotation in annotations {
        write_annotation(constant_pool, annotation, &mut bytes)?;
    }
    Ok(bytes)
}

fn write_annotation(constant_pool: &mut ConstantPool, annotation: &AnnotationSpec, bytes: &mut Vec<u8>) -> ConstPoolResult<()> {
    let type_index = constant_pool.try_add_utf8(&annotation.annotation_type.descriptor())?;
    bytes.extend_from_slice(&type_index.to_be_bytes());
    bytes.extend_from_slice(&(annotation.values.len() as u16).to_be_bytes());
    for (name, value) in &annotation.values {
        let name_index = constant_pool.try_add_utf8(name)?;
        bytes.extend_from_slice(&name_index.to_be_bytes());
        write_value(constant_pool, value, bytes)?;
    }
    Ok(())
}

fn write_value(constant_pool: &mut ConstantPool, value: &AnnotationValue, bytes: &mut Vec<u8>) -> ConstPoolResult<()> {
    let (tag, index) = match value {
        AnnotationValue::Byte(value) => (b'B', constant_pool.try_add_integer(*value as i32)?),
        AnnotationValue::Char(value) => (b'C', constant_pool.try_add_integer(*value as i32)?),
        AnnotationValue::Int(value) => (b'I', constant_pool.try_add_integer(*value)?),
        AnnotationValue::Short(value) => (b'S', constant_pool.try_add_integer(*value as i32)?),
        AnnotationValue::Boolean(value) => (b'Z', constant_pool.try_add_integer(*value as i32)?),
        AnnotationValue::Double(value) => (b'D', constant_pool.try_add_double(*value)?),
        AnnotationValue::Float(value) => (b'F', constant_pool.try_add_float(*value)?),
        AnnotationValue::Long(value) => (b'J', constant_pool.try_add_long(*value)?),
        AnnotationValue::String(value) => (b's', constant_pool.try_add_utf8(value)?),
        AnnotationValue::Class(ty) => (b'c', constant_pool.try_add_utf8(&ty.descriptor())?),
        AnnotationValue::Enum { enum_type, constant } => {
            let type_index = constant_pool.try_add_utf8(&enum_type.descriptor())?;
            let constant_index = constant_pool.try_add_utf8(constant)?;
            bytes.push(b'e');
            bytes.extend_from_slice(&type_index.to_be_bytes());
            bytes.extend_from_slice(&constant_index.to_be_bytes());
            return Ok(());
        }
        AnnotationValue::Annotation(annotation) => {
            bytes.push(b'@');
            return write_annotation(constant_pool, annotation, bytes);
        }
        AnnotationValue::Array(values) => {
            bytes.push(b'[');
            bytes.extend_from_slice(&(values.len() as u16).to_be_bytes());
            for value in values {
                write_value(constant_pool, value, bytes)?;
            }
            return Ok(());
        }
    };
    bytes.push(tag);
    bytes.extend_from_slice(&index.to_be_bytes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_annotation_survives_encoding() {
        let binding = AnnotationSpec::new(Type::object("io/sento/annotations/ListenerBinding"))
            .with("owner", AnnotationValue::String("android.view.View".into()))
            .with("setter", AnnotationValue::String("setOnClickListener".into()));
        let annotation = AnnotationSpec::new(Type::object("com/example/Marker"))
            .with("binding", AnnotationValue::Annotation(binding))
            .with("ids", AnnotationValue::Array(vec![AnnotationValue::Int(10), AnnotationValue::Int(20)]))
            .with("weight", AnnotationValue::Double(0.5))
            .with("mode", AnnotationValue::Enum {
                enum_type: Type::object("com/example/Mode"),
                constant: "FAST".into(),
            })
            .with("target", AnnotationValue::Class(Type::Void));

        let mut pool = ConstantPool::new();
        let bytes = encode_annotations(&mut pool, &[annotation.clone()]).unwrap();
        let decoded = decode_annotations(&pool, &bytes).unwrap();
        assert_eq!(decoded, vec![annotation]);
    }

    #[test]
    fn test_read_collects_visible_and_invisible() {
        let mut pool = ConstantPool::new();
        let visible = AnnotationSpec::new(Type::object("a/Visible"));
        let invisible = AnnotationSpec::new(Type::object("a/Invisible"));
        let invisible_bytes = encode_annotations(&mut pool, &[invisible.clone()]).unwrap();
        let visible_bytes = encode_annotations(&mut pool, &[visible.clone()]).unwrap();
        let attributes = vec![
            AttributeInfo::named(&mut pool, attribute_names::RUNTIME_INVISIBLE_ANNOTATIONS, invisible_bytes).unwrap(),
            AttributeInfo::named(&mut pool, attribute_names::RUNTIME_VISIBLE_ANNOTATIONS, visible_bytes).unwrap(),
        ];
        assert_eq!(read_annotations(&pool, &attributes).unwrap(), vec![visible, invisible]);
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        let mut pool = ConstantPool::new();
        let type_index = pool.try_add_utf8("La/B;").unwrap();
        let name_index = pool.try_add_utf8("value").unwrap();
        let mut bytes = vec![0, 1];
        bytes.extend_from_slice(&type_index.to_be_bytes());
        bytes.extend_from_slice(&[0, 1]);
        bytes.extend_from_slice(&name_index.to_be_bytes());
        bytes.extend_from_slice(&[b'x', 0, 0]);
        assert!(matches!(decode_annotations(&pool, &bytes), Err(Error::ClassFormat { .. })));
    }
}

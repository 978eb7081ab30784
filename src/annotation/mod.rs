//! Annotation occurrences read off compiled classes
//!
//! An [`AnnotationSpec`] is a plain tagged record: the annotation type plus its
//! attribute values in declaration order. Generators never poke at the raw
//! values directly; they ask for a typed view through [`FromAnnotation`] (see
//! [`kinds`]) or pull single attributes through [`FromAnnotationValue`].

pub mod codec;
pub mod kinds;

use std::fmt;

use crate::codegen::descriptor::Type;
use crate::common::error::{Error, Result};

pub use codec::{decode_annotations, encode_annotations, read_annotations};
pub use kinds::{
    ListenerAnnotation, ListenerBindingAnnotation, ResourceAnnotation, ResourceBindingAnnotation, ResourceBindingsAnnotation,
    ViewAnnotation,
};

/// A single `element_value`
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationValue {
    Byte(i8),
    Char(u16),
    Double(f64),
    Float(f32),
    Int(i32),
    Long(i64),
    Short(i16),
    Boolean(bool),
    String(String),
    Enum { enum_type: Type, constant: String },
    Class(Type),
    Annotation(AnnotationSpec),
    Array(Vec<AnnotationValue>),
}

impl AnnotationValue {
    /// Name of the variant, used in conversion errors
    pub fn kind(&self) -> &'static str {
        match self {
            AnnotationValue::Byte(_) => "byte",
            AnnotationValue::Char(_) => "char",
            AnnotationValue::Double(_) => "double",
            AnnotationValue::Float(_) => "float",
            AnnotationValue::Int(_) => "int",
            AnnotationValue::Long(_) => "long",
            AnnotationValue::Short(_) => "short",
            AnnotationValue::Boolean(_) => "boolean",
            AnnotationValue::String(_) => "string",
            AnnotationValue::Enum { .. } => "enum",
            AnnotationValue::Class(_) => "class",
            AnnotationValue::Annotation(_) => "annotation",
            AnnotationValue::Array(_) => "array",
        }
    }
}

impl fmt::Display for AnnotationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnotationValue::Byte(value) => write!(f, "{}", value),
            AnnotationValue::Char(value) => match char::from_u32(*value as u32) {
                Some(c) => write!(f, "'{}'", c),
                None => write!(f, "'\\u{:04x}'", value),
            },
            AnnotationValue::Double(value) => write!(f, "{}", value),
            AnnotationValue::Float(value) => write!(f, "{}f", value),
            AnnotationValue::Int(value) => write!(f, "{}", value),
            AnnotationValue::Long(value) => write!(f, "{}L", value),
            AnnotationValue::Short(value) => write!(f, "{}", value),
            AnnotationValue::Boolean(value) => write!(f, "{}", value),
            AnnotationValue::String(value) => write!(f, "{:?}", value),
            AnnotationValue::Enum { enum_type, constant } => write!(f, "{}.{}", enum_type, constant),
            AnnotationValue::Class(ty) => write!(f, "{}.class", ty),
            AnnotationValue::Annotation(annotation) => write!(f, "{}", annotation),
            AnnotationValue::Array(values) => {
                f.write_str("{")?;
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                f.write_str("}")
            }
        }
    }
}

/// One annotation occurrence
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationSpec {
    pub annotation_type: Type,
    pub values: Vec<(String, AnnotationValue)>,
}

impl AnnotationSpec {
    pub fn new(annotation_type: Type) -> Self {
        Self { annotation_type, values: Vec::new() }
    }

    /// Builder-style attribute setter; replaces an attribute of the same name
    pub fn with(mut self, name: impl Into<String>, value: AnnotationValue) -> Self {
        let name = name.into();
        match self.values.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.values.push((name, value)),
        }
        self
    }

    /// Internal name of the annotation type
    pub fn type_name(&self) -> String {
        self.annotation_type.internal_name()
    }

    pub fn simple_name(&self) -> String {
        self.annotation_type.simple_name()
    }

    pub fn is(&self, internal_name: &str) -> bool {
        matches!(&self.annotation_type, Type::Object(name) if name == internal_name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.iter().any(|(key, _)| key == name)
    }

    /// Raw attribute value; absent attributes are an internal error
    pub fn get(&self, name: &str) -> Result<&AnnotationValue> {
        self.values
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
            .ok_or_else(|| {
                Error::no_such_element(format!("attribute '{}' is not present on {}", name, self))
            })
    }

    pub fn get_as<T: FromAnnotationValue>(&self, name: &str) -> Result<T> {
        T::from_annotation_value(self.get(name)?).map_err(|error| match error {
            Error::NoSuchElement { message } => {
                Error::no_such_element(format!("attribute '{}' of {}: {}", name, self, message))
            }
            other => other,
        })
    }

    /// Like [`get_as`](Self::get_as) but `None` when the attribute was left at its default
    pub fn get_optional<T: FromAnnotationValue>(&self, name: &str) -> Result<Option<T>> {
        if self.contains(name) {
            self.get_as(name).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Materialize a typed view of this annotation
    pub fn resolve<T: FromAnnotation>(&self) -> Result<T> {
        T::from_annotation(self)
    }
}

impl fmt::Display for AnnotationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.annotation_type)?;
        if self.values.is_empty() {
            return Ok(());
        }
        f.write_str("(")?;
        for (index, (name, value)) in self.values.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        f.write_str(")")
    }
}

/// Conversion of a single attribute value into a Rust value
pub trait FromAnnotationValue: Sized {
    fn from_annotation_value(value: &AnnotationValue) -> Result<Self>;
}

/// Typed view over a whole annotation
pub trait FromAnnotation: Sized {
    fn from_annotation(annotation: &AnnotationSpec) -> Result<Self>;
}

fn mismatch(expected: &str, value: &AnnotationValue) -> Error {
    Error::no_such_element(format!("expected {} value, found {} {}", expected, value.kind(), value))
}

impl FromAnnotationValue for i32 {
    fn from_annotation_value(value: &AnnotationValue) -> Result<Self> {
        match value {
            AnnotationValue::Int(value) => Ok(*value),
            AnnotationValue::Short(value) => Ok(*value as i32),
            AnnotationValue::Byte(value) => Ok(*value as i32),
            AnnotationValue::Char(value) => Ok(*value as i32),
            other => Err(mismatch("int", other)),
        }
    }
}

impl FromAnnotationValue for bool {
    fn from_annotation_value(value: &AnnotationValue) -> Result<Self> {
        match value {
            AnnotationValue::Boolean(value) => Ok(*value),
            other => Err(mismatch("boolean", other)),
        }
    }
}

impl FromAnnotationValue for String {
    fn from_annotation_value(value: &AnnotationValue) -> Result<Self> {
        match value {
            AnnotationValue::String(value) => Ok(value.clone()),
            other => Err(mismatch("string", other)),
        }
    }
}

/// Class literals, or dotted class names given as strings
impl FromAnnotationValue for Type {
    fn from_annotation_value(value: &AnnotationValue) -> Result<Self> {
        match value {
            AnnotationValue::Class(ty) => Ok(ty.clone()),
            AnnotationValue::String(name) if !name.is_empty() => Ok(Type::from_class_name(name)),
            other => Err(mismatch("class", other)),
        }
    }
}

impl FromAnnotationValue for AnnotationSpec {
    fn from_annotation_value(value: &AnnotationValue) -> Result<Self> {
        match value {
            AnnotationValue::Annotation(annotation) => Ok(annotation.clone()),
            other => Err(mismatch("annotation", other)),
        }
    }
}

/// A scalar where an array is expected reads as a one-element array.
impl<T: FromAnnotationValue> FromAnnotationValue for Vec<T> {
    fn from_annotation_value(value: &AnnotationValue) -> Result<Self> {
        match value {
            AnnotationValue::Array(values) => values.iter().map(T::from_annotation_value).collect(),
            scalar => Ok(vec![T::from_annotation_value(scalar)?]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn on_click(ids: Vec<i32>) -> AnnotationSpec {
        AnnotationSpec::new(Type::object("io/sento/annotations/OnClick"))
            .with("value", AnnotationValue::Array(ids.into_iter().map(AnnotationValue::Int).collect()))
    }

    #[test]
    fn test_missing_attribute_is_no_such_element() {
        let annotation = AnnotationSpec::new(Type::object("io/sento/annotations/Bind"));
        assert!(matches!(annotation.get("value"), Err(Error::NoSuchElement { .. })));
        assert_eq!(annotation.get_optional::<i32>("value").unwrap(), None);
    }

    #[test]
    fn test_scalar_reads_as_single_element_array() {
        let annotation = AnnotationSpec::new(Type::object("io/sento/annotations/OnClick"))
            .with("value", AnnotationValue::Int(10));
        assert_eq!(annotation.get_as::<Vec<i32>>("value").unwrap(), vec![10]);
        assert_eq!(on_click(vec![10, 20]).get_as::<Vec<i32>>("value").unwrap(), vec![10, 20]);
    }

    #[test]
    fn test_type_from_string_and_class() {
        let annotation = AnnotationSpec::new(Type::object("a/B"))
            .with("owner", AnnotationValue::String("android.view.View".into()))
            .with("listener", AnnotationValue::Class(Type::object("android/view/View$OnClickListener")));
        assert_eq!(annotation.get_as::<Type>("owner").unwrap(), Type::object("android/view/View"));
        assert_eq!(
            annotation.get_as::<Type>("listener").unwrap(),
            Type::object("android/view/View$OnClickListener")
        );
        assert!(annotation.get_as::<bool>("owner").is_err());
    }

    #[test]
    fn test_value_equality_and_display() {
        assert_eq!(on_click(vec![1, 2]), on_click(vec![1, 2]));
        assert_ne!(on_click(vec![1, 2]), on_click(vec![2, 1]));
        assert_eq!(on_click(vec![1, 2]).to_string(), "@io.sento.annotations.OnClick(value={1, 2})");
    }

    #[test]
    fn test_with_replaces_existing() {
        let annotation = AnnotationSpec::new(Type::object("a/B"))
            .with("value", AnnotationValue::Int(1))
            .with("value", AnnotationValue::Int(2));
        assert_eq!(annotation.values.len(), 1);
        assert_eq!(annotation.get_as::<i32>("value").unwrap(), 2);
    }
}

//! JVM types and descriptors

use std::fmt;

use super::error::{DescriptorError, DescriptorResult};

/// A JVM field type, or `Void` for method returns
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Type {
    Void,
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Float,
    Long,
    Double,
    /// Internal name, e.g. `android/view/View`
    Object(String),
    Array(Box<Type>),
}

impl Type {
    pub fn object(internal_name: impl Into<String>) -> Self {
        Type::Object(internal_name.into())
    }

    pub fn array_of(element: Type) -> Self {
        Type::Array(Box::new(element))
    }

    /// Parse a single field descriptor such as `[Ljava/lang/String;`
    pub fn parse(descriptor: &str) -> DescriptorResult<Type> {
        match parse_type(descriptor.as_bytes(), 0) {
            Some((ty, end)) if end == descriptor.len() => Ok(ty),
            _ => Err(DescriptorError::InvalidTypeDescriptor { descriptor: descriptor.to_string() }),
        }
    }

    /// Resolve a dotted Java name (`android.view.View`, `int`, `String[]`)
    pub fn from_class_name(name: &str) -> Type {
        if let Some(element) = name.strip_suffix("[]") {
            return Type::array_of(Type::from_class_name(element));
        }
        match name {
            "void" => Type::Void,
            "boolean" => Type::Boolean,
            "byte" => Type::Byte,
            "char" => Type::Char,
            "short" => Type::Short,
            "int" => Type::Int,
            "float" => Type::Float,
            "long" => Type::Long,
            "double" => Type::Double,
            _ => Type::object(name.replace('.', "/")),
        }
    }

    pub fn descriptor(&self) -> String {
        match self {
            Type::Void => "V".to_string(),
            Type::Boolean => "Z".to_string(),
            Type::Byte => "B".to_string(),
            Type::Char => "C".to_string(),
            Type::Short => "S".to_string(),
            Type::Int => "I".to_string(),
            Type::Float => "F".to_string(),
            Type::Long => "J".to_string(),
            Type::Double => "D".to_string(),
            Type::Object(name) => format!("L{};", name),
            Type::Array(element) => format!("[{}", element.descriptor()),
        }
    }

    /// Name used in `CONSTANT_Class` entries
    pub fn internal_name(&self) -> String {
        match self {
            Type::Object(name) => name.clone(),
            _ => self.descriptor(),
        }
    }

    /// Dotted source-level name, e.g. `android.view.View` or `int[]`
    pub fn class_name(&self) -> String {
        match self {
            Type::Void => "void".to_string(),
            Type::Boolean => "boolean".to_string(),
            Type::Byte => "byte".to_string(),
            Type::Char => "char".to_string(),
            Type::Short => "short".to_string(),
            Type::Int => "int".to_string(),
            Type::Float => "float".to_string(),
            Type::Long => "long".to_string(),
            Type::Double => "double".to_string(),
            Type::Object(name) => name.replace('/', "."),
            Type::Array(element) => format!("{}[]", element.class_name()),
        }
    }

    /// Class name without its package
    pub fn simple_name(&self) -> String {
        let name = self.class_name();
        match name.rfind('.') {
            Some(index) => name[index + 1..].to_string(),
            None => name,
        }
    }

    pub fn is_primitive(&self) -> bool {
        !matches!(self, Type::Object(_) | Type::Array(_) | Type::Void)
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Type::Object(_) | Type::Array(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array(_))
    }

    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Type::Array(element) => Some(element),
            _ => None,
        }
    }

    /// Number of local variable / operand stack slots
    pub fn size(&self) -> u16 {
        match self {
            Type::Void => 0,
            Type::Long | Type::Double => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.class_name())
    }
}

/// A parsed method descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodType {
    pub arguments: Vec<Type>,
    pub returns: Type,
}

impl MethodType {
    pub fn new(returns: Type, arguments: Vec<Type>) -> Self {
        Self { arguments, returns }
    }

    pub fn parse(descriptor: &str) -> DescriptorResult<MethodType> {
        let invalid = || DescriptorError::InvalidMethodDescriptor { descriptor: descriptor.to_string() };
        let bytes = descriptor.as_bytes();
        if bytes.first() != Some(&b'(') {
            return Err(invalid());
        }

        let mut arguments = Vec::new();
        let mut pos = 1;
        while bytes.get(pos) != Some(&b')') {
            let (ty, end) = parse_type(bytes, pos).ok_or_else(invalid)?;
            if ty == Type::Void {
                return Err(invalid());
            }
            arguments.push(ty);
            pos = end;
        }

        match parse_type(bytes, pos + 1) {
            Some((returns, end)) if end == bytes.len() => Ok(MethodType { arguments, returns }),
            _ => Err(invalid()),
        }
    }

    pub fn descriptor(&self) -> String {
        let mut d = String::from("(");
        for argument in &self.arguments {
            d.push_str(&argument.descriptor());
        }
        d.push(')');
        d.push_str(&self.returns.descriptor());
        d
    }

    /// Slots taken by the arguments, not counting `this`
    pub fn argument_slots(&self) -> u16 {
        self.arguments.iter().map(Type::size).sum()
    }
}

impl fmt::Display for MethodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.descriptor())
    }
}

/// Build a method descriptor string from parts
pub fn method_descriptor(returns: &Type, arguments: &[Type]) -> String {
    MethodType::new(returns.clone(), arguments.to_vec()).descriptor()
}

fn parse_type(bytes: &[u8], pos: usize) -> Option<(Type, usize)> {
    let tag = *bytes.get(pos)?;
    let ty = match tag {
        b'V' => Type::Void,
        b'Z' => Type::Boolean,
        b'B' => Type::Byte,
        b'C' => Type::Char,
        b'S' => Type::Short,
        b'I' => Type::Int,
        b'F' => Type::Float,
        b'J' => Type::Long,
        b'D' => Type::Double,
        b'L' => {
            let end = pos + bytes[pos..].iter().position(|b| *b == b';')?;
            if end == pos + 1 {
                return None;
            }
            let name = std::str::from_utf8(&bytes[pos + 1..end]).ok()?;
            return Some((Type::object(name), end + 1));
        }
        b'[' => {
            let (element, end) = parse_type(bytes, pos + 1)?;
            if element == Type::Void {
                return None;
            }
            return Some((Type::array_of(element), end));
        }
        _ => return None,
    };
    Some((ty, pos + 1))
}

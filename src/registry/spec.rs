//! Resolved class metadata
//!
//! A [`ClassReference`] is what a provider knows about a class without parsing
//! its members: the header plus a way to get the bytes again. Parsing the bytes
//! yields a [`ClassSpec`] with fields, methods and annotations.

use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

use crate::annotation::{read_annotations, AnnotationSpec};
use crate::codegen::class::ClassFile;
use crate::codegen::defs::CONSTRUCTOR_METHOD_NAME;
use crate::codegen::descriptor::{MethodType, Type};
use crate::codegen::flag::Access;
use crate::codegen::reader::parse_class;
use crate::common::error::{Error, Result};

type Opener = Rc<dyn Fn() -> Result<Rc<[u8]>>>;

/// Header of a discovered class and a lazy opener for its bytes
#[derive(Clone)]
pub struct ClassReference {
    pub access: u16,
    pub name: String,
    pub parent: Option<String>,
    pub interfaces: Vec<String>,
    opener: Opener,
}

impl ClassReference {
    pub fn new(
        access: u16,
        name: impl Into<String>,
        parent: Option<String>,
        interfaces: Vec<String>,
        opener: impl Fn() -> Result<Rc<[u8]>> + 'static,
    ) -> Self {
        Self { access, name: name.into(), parent, interfaces, opener: Rc::new(opener) }
    }

    /// Reference backed by an in-memory class file
    pub fn from_bytes(bytes: impl Into<Rc<[u8]>>) -> Result<Self> {
        let bytes: Rc<[u8]> = bytes.into();
        let class_file = parse_class(&bytes)?;
        let (access, name, parent, interfaces) = header(&class_file)?;
        Ok(Self::new(access, name, parent, interfaces, move || Ok(bytes.clone())))
    }

    /// Reference backed by a `.class` file; only the header is kept in memory
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let class_file = parse_class(&std::fs::read(&path)?)?;
        let (access, name, parent, interfaces) = header(&class_file)?;
        Ok(Self::new(access, name, parent, interfaces, move || {
            let bytes = std::fs::read(&path)?;
            Ok(Rc::from(bytes))
        }))
    }

    pub fn ty(&self) -> Type {
        Type::object(self.name.clone())
    }

    pub fn open(&self) -> Result<Rc<[u8]>> {
        (self.opener)()
    }

    /// Parse the members of the referenced class
    pub fn resolve(&self) -> Result<ClassSpec> {
        let bytes = self.open()?;
        let spec = ClassSpec::parse(&bytes)?;
        if spec.name != self.name {
            return Err(Error::class_format_error(format!(
                "expected class '{}' but the bytes define '{}'",
                self.name, spec.name
            )));
        }
        Ok(spec)
    }
}

impl fmt::Debug for ClassReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassReference")
            .field("access", &self.access)
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("interfaces", &self.interfaces)
            .finish()
    }
}

fn header(class_file: &ClassFile) -> Result<(u16, String, Option<String>, Vec<String>)> {
    Ok((
        class_file.access_flags,
        class_file.name()?.to_string(),
        class_file.super_name()?.map(str::to_string),
        class_file.interface_names()?.into_iter().map(str::to_string).collect(),
    ))
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub access: u16,
    pub name: String,
    pub ty: Type,
    pub annotations: Vec<AnnotationSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodSpec {
    pub access: u16,
    pub name: String,
    pub descriptor: String,
    pub method_type: MethodType,
    pub annotations: Vec<AnnotationSpec>,
}

impl MethodSpec {
    pub fn arguments(&self) -> &[Type] {
        &self.method_type.arguments
    }

    pub fn returns(&self) -> &Type {
        &self.method_type.returns
    }

    /// Java-like rendering for diagnostics, e.g. `void onClick(android.view.View)`
    pub fn java_declaration(&self) -> String {
        let arguments: Vec<String> = self.arguments().iter().map(Type::class_name).collect();
        format!("{} {}({})", self.returns().class_name(), self.name, arguments.join(", "))
    }
}

/// Member-level view of a class
#[derive(Debug, Clone, PartialEq)]
pub struct ClassSpec {
    pub access: u16,
    pub name: String,
    pub parent: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<FieldSpec>,
    pub methods: Vec<MethodSpec>,
    pub annotations: Vec<AnnotationSpec>,
}

impl ClassSpec {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        Self::from_class_file(&parse_class(bytes)?)
    }

    pub fn from_class_file(class_file: &ClassFile) -> Result<Self> {
        let pool = &class_file.constant_pool;
        let (access, name, parent, interfaces) = header(class_file)?;

        let mut fields = Vec::with_capacity(class_file.fields.len());
        for field in &class_file.fields {
            fields.push(FieldSpec {
                access: field.access_flags,
                name: field.name(pool)?.to_string(),
                ty: Type::parse(field.descriptor(pool)?)?,
                annotations: read_annotations(pool, &field.attributes)?,
            });
        }

        let mut methods = Vec::with_capacity(class_file.methods.len());
        for method in &class_file.methods {
            let descriptor = method.descriptor(pool)?.to_string();
            methods.push(MethodSpec {
                access: method.access_flags,
                name: method.name(pool)?.to_string(),
                method_type: MethodType::parse(&descriptor)?,
                descriptor,
                annotations: read_annotations(pool, &method.attributes)?,
            });
        }

        Ok(Self {
            access,
            name,
            parent,
            interfaces,
            fields,
            methods,
            annotations: read_annotations(pool, &class_file.attributes)?,
        })
    }

    pub fn ty(&self) -> Type {
        Type::object(self.name.clone())
    }

    pub fn annotation(&self, internal_name: &str) -> Option<&AnnotationSpec> {
        self.annotations.iter().find(|annotation| annotation.is(internal_name))
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn method(&self, name: &str, descriptor: &str) -> Option<&MethodSpec> {
        self.methods.iter().find(|method| method.name == name && method.descriptor == descriptor)
    }

    /// The no-arg constructor, if declared
    pub fn default_constructor(&self) -> Option<&MethodSpec> {
        self.method(CONSTRUCTOR_METHOD_NAME, "()V")
    }

    pub fn is_interface(&self) -> bool {
        self.access.is_interface()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotationValue;
    use crate::codegen::class_writer::ClassBuilder;
    use crate::codegen::flag::access_flags::*;

    fn target_bytes() -> Vec<u8> {
        let mut class = ClassBuilder::new(ACC_PUBLIC | ACC_SUPER, "com/example/Target", "android/app/Activity", &[]).unwrap();
        let field = class.field(ACC_PRIVATE, "title", &Type::object("android/widget/TextView")).unwrap();
        let bind = AnnotationSpec::new(Type::object("io/sento/annotations/Bind")).with("value", AnnotationValue::Int(42));
        class.annotate_field(field, &[bind], false).unwrap();
        class.declare_method(ACC_PUBLIC | ACC_ABSTRACT, "onClick", "(Landroid/view/View;)Z").unwrap();
        class.to_bytes()
    }

    #[test]
    fn test_reference_from_bytes() {
        let reference = ClassReference::from_bytes(target_bytes()).unwrap();
        assert_eq!(reference.name, "com/example/Target");
        assert_eq!(reference.parent.as_deref(), Some("android/app/Activity"));
        assert!(reference.interfaces.is_empty());
    }

    #[test]
    fn test_resolve_members() {
        let spec = ClassReference::from_bytes(target_bytes()).unwrap().resolve().unwrap();
        let field = spec.field("title").unwrap();
        assert_eq!(field.ty, Type::object("android/widget/TextView"));
        assert_eq!(field.annotations.len(), 1);

        let method = spec.method("onClick", "(Landroid/view/View;)Z").unwrap();
        assert_eq!(method.returns(), &Type::Boolean);
        assert_eq!(method.java_declaration(), "boolean onClick(android.view.View)");
        assert!(spec.default_constructor().is_none());
    }

    #[test]
    fn test_mismatched_name_is_rejected() {
        let bytes: Rc<[u8]> = Rc::from(target_bytes());
        let reference = ClassReference::new(ACC_PUBLIC, "com/example/Other", None, Vec::new(), move || Ok(bytes.clone()));
        assert!(matches!(reference.resolve(), Err(Error::ClassFormat { .. })));
    }
}

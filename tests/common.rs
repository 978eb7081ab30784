// Common test utilities: fixture classes built with the crate's own writer

#![allow(dead_code)]

use sentoc::annotation::{AnnotationSpec, AnnotationValue};
use sentoc::codegen::attribute::{AttributeInfo, InnerClassEntry, InnerClassesAttribute};
use sentoc::codegen::class::ClassFile;
use sentoc::codegen::class_writer::ClassBuilder;
use sentoc::codegen::defs::attribute_names;
use sentoc::codegen::descriptor::{MethodType, Type};
use sentoc::codegen::flag::access_flags::*;
use sentoc::codegen::instruction::disassemble;
use sentoc::codegen::reader::parse_class;
use sentoc::{generate, Config, GenerationReport, MemoryClassProvider, MemorySink};

pub const INTERFACE: u16 = ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT;
pub const ANNOTATION: u16 = ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT | ACC_ANNOTATION;

pub const TARGET: &str = "com/example/MainActivity";
pub const BINDING: &str = "com/example/MainActivity$$SentoBinding";

pub const BIND_DESCRIPTOR: &str = "(Ljava/lang/Object;Ljava/lang/Object;Lio/sento/Finder;)V";
pub const UNBIND_DESCRIPTOR: &str = "(Ljava/lang/Object;)V";

pub const FIND: &str = "invokeinterface io/sento/Finder.find(ILjava/lang/Object;Z)Landroid/view/View;";
pub const REQUIRE: &str =
    "invokeinterface io/sento/Finder.require(ILandroid/view/View;Ljava/lang/Object;Ljava/lang/String;)V";

/// A class with trivial bodies for every method that isn't abstract
pub fn class(access: u16, name: &str, parent: &str, interfaces: &[&str], methods: &[(u16, &str, &str)]) -> Vec<u8> {
    let mut builder = ClassBuilder::new(access, name, parent, interfaces).unwrap();
    if name == "java/lang/Object" {
        builder.class_file_mut().super_class = 0;
    }
    for (access, method, descriptor) in methods {
        add_method(&mut builder, *access, method, descriptor);
    }
    builder.to_bytes()
}

fn add_method(builder: &mut ClassBuilder, access: u16, name: &str, descriptor: &str) -> usize {
    if access & ACC_ABSTRACT != 0 {
        return builder.declare_method(access, name, descriptor).unwrap();
    }
    let returns = MethodType::parse(descriptor).unwrap().returns;
    let mut method = builder.method(access, name, descriptor).unwrap();
    match returns {
        Type::Void => {}
        Type::Boolean | Type::Byte | Type::Char | Type::Short | Type::Int => method.push_int(0).unwrap(),
        Type::Object(_) | Type::Array(_) => method.push_null(),
        other => panic!("fixture methods can't return {:?}", other),
    }
    method.return_value().unwrap();
    method.end_method().unwrap()
}

/// Annotation class carrying `@ListenerBinding`
pub fn listener_annotation(
    name: &str,
    owner: &str,
    listener: &str,
    setter: &str,
    unsetter: Option<&str>,
    callback: Option<&str>,
) -> Vec<u8> {
    let mut binding = AnnotationSpec::new(Type::object("io/sento/annotations/ListenerBinding"))
        .with("owner", AnnotationValue::String(owner.replace('/', ".")))
        .with("listener", AnnotationValue::Class(Type::object(listener)))
        .with("setter", AnnotationValue::String(setter.to_string()));
    if let Some(unsetter) = unsetter {
        binding = binding.with("unsetter", AnnotationValue::String(unsetter.to_string()));
    }
    if let Some(callback) = callback {
        binding = binding.with("callback", AnnotationValue::String(callback.to_string()));
    }

    let mut builder = ClassBuilder::new(ANNOTATION, name, "java/lang/Object", &["java/lang/annotation/Annotation"]).unwrap();
    builder.declare_method(ACC_PUBLIC | ACC_ABSTRACT, "value", "()[I").unwrap();
    builder.annotate_class(&[binding], true).unwrap();
    builder.to_bytes()
}

/// Annotation class carrying `@ResourceBindings` with one entry per `(type, getter)`
pub fn resource_annotation(name: &str, entries: &[(&str, &str)]) -> Vec<u8> {
    let entries = entries
        .iter()
        .map(|(ty, getter)| {
            AnnotationValue::Annotation(
                AnnotationSpec::new(Type::object("io/sento/annotations/ResourceBinding"))
                    .with("type", AnnotationValue::String(ty.to_string()))
                    .with("getter", AnnotationValue::String(getter.to_string())),
            )
        })
        .collect();
    let bindings = AnnotationSpec::new(Type::object("io/sento/annotations/ResourceBindings"))
        .with("value", AnnotationValue::Array(entries));

    let mut builder = ClassBuilder::new(ANNOTATION, name, "java/lang/Object", &["java/lang/annotation/Annotation"]).unwrap();
    builder.declare_method(ACC_PUBLIC | ACC_ABSTRACT, "value", "()I").unwrap();
    builder.annotate_class(&[bindings], false).unwrap();
    builder.to_bytes()
}

/// Android stubs, listener types and the built-in listener annotations
pub fn references() -> MemoryClassProvider {
    MemoryClassProvider::new()
        .with_class(class(ACC_PUBLIC, "java/lang/Object", "java/lang/Object", &[], &[(ACC_PUBLIC, "<init>", "()V")]))
        .with_class(class(ACC_PUBLIC | ACC_FINAL, "java/lang/String", "java/lang/Object", &["java/lang/CharSequence"], &[]))
        .with_class(class(INTERFACE, "java/lang/CharSequence", "java/lang/Object", &[], &[]))
        .with_class(class(ACC_PUBLIC, "android/view/View", "java/lang/Object", &[], &[
            (ACC_PUBLIC, "setOnClickListener", "(Landroid/view/View$OnClickListener;)V"),
            (ACC_PUBLIC, "setOnLongClickListener", "(Landroid/view/View$OnLongClickListener;)V"),
        ]))
        .with_class(class(ACC_PUBLIC, "android/widget/TextView", "android/view/View", &[], &[]))
        .with_class(class(ACC_PUBLIC, "android/widget/Button", "android/widget/TextView", &[], &[]))
        .with_class(class(ACC_PUBLIC, "android/widget/CompoundButton", "android/widget/Button", &[], &[
            (ACC_PUBLIC, "setOnCheckedChangeListener", "(Landroid/widget/CompoundButton$OnCheckedChangeListener;)V"),
        ]))
        .with_class(class(INTERFACE, "android/view/View$OnClickListener", "java/lang/Object", &[], &[
            (ACC_PUBLIC | ACC_ABSTRACT, "onClick", "(Landroid/view/View;)V"),
        ]))
        .with_class(class(INTERFACE, "android/view/View$OnLongClickListener", "java/lang/Object", &[], &[
            (ACC_PUBLIC | ACC_ABSTRACT, "onLongClick", "(Landroid/view/View;)Z"),
        ]))
        .with_class(class(INTERFACE, "android/widget/CompoundButton$OnCheckedChangeListener", "java/lang/Object", &[], &[
            (ACC_PUBLIC | ACC_ABSTRACT, "onCheckedChanged", "(Landroid/widget/CompoundButton;Z)V"),
        ]))
        .with_class(class(ACC_PUBLIC, "android/content/res/Resources", "java/lang/Object", &[], &[
            (ACC_PUBLIC, "getText", "(I)Ljava/lang/CharSequence;"),
            (ACC_PUBLIC, "getString", "(I)Ljava/lang/String;"),
            (ACC_PUBLIC, "getDrawable", "(I)Landroid/graphics/drawable/Drawable;"),
        ]))
        .with_class(class(ACC_PUBLIC | ACC_ABSTRACT, "android/graphics/drawable/Drawable", "java/lang/Object", &[], &[]))
        .with_class(class(ACC_PUBLIC, "android/graphics/drawable/ColorDrawable", "android/graphics/drawable/Drawable", &[], &[]))
        .with_class(listener_annotation(
            "io/sento/annotations/OnClick",
            "android/view/View",
            "android/view/View$OnClickListener",
            "setOnClickListener",
            None,
            None,
        ))
        .with_class(listener_annotation(
            "io/sento/annotations/OnLongClick",
            "android/view/View",
            "android/view/View$OnLongClickListener",
            "setOnLongClickListener",
            None,
            None,
        ))
        .with_class(listener_annotation(
            "io/sento/annotations/OnCheckedChanged",
            "android/widget/CompoundButton",
            "android/widget/CompoundButton$OnCheckedChangeListener",
            "setOnCheckedChangeListener",
            None,
            None,
        ))
}

/// Builds an annotated target class
pub struct TargetBuilder {
    builder: ClassBuilder,
}

impl TargetBuilder {
    pub fn new(name: &str) -> Self {
        Self::with_access(name, ACC_PUBLIC | ACC_SUPER)
    }

    pub fn with_access(name: &str, access: u16) -> Self {
        let mut builder = ClassBuilder::new(access, name, "java/lang/Object", &[]).unwrap();
        add_method(&mut builder, ACC_PUBLIC, "<init>", "()V");
        Self { builder }
    }

    pub fn field(mut self, access: u16, name: &str, ty: Type, annotations: Vec<AnnotationSpec>) -> Self {
        let index = self.builder.field(access, name, &ty).unwrap();
        if !annotations.is_empty() {
            self.builder.annotate_field(index, &annotations, false).unwrap();
        }
        self
    }

    /// `@Bind(id)` on a view field, `@Optional` too when asked
    pub fn view(self, name: &str, ty: &str, id: i32, optional: bool) -> Self {
        let mut annotations = vec![annotation("io/sento/annotations/Bind", id)];
        if optional {
            annotations.push(AnnotationSpec::new(Type::object("io/sento/annotations/Optional")));
        }
        self.field(ACC_PRIVATE, name, Type::object(ty), annotations)
    }

    pub fn method(mut self, access: u16, name: &str, descriptor: &str, annotations: Vec<AnnotationSpec>) -> Self {
        let index = add_method(&mut self.builder, access, name, descriptor);
        if !annotations.is_empty() {
            self.builder.annotate_method(index, &annotations, false).unwrap();
        }
        self
    }

    /// Mark the class as a member of `outer`, as javac does for nested classes
    pub fn nested_in(mut self, outer: &str, simple_name: &str, access: u16) -> Self {
        let class_file = self.builder.class_file_mut();
        let name = class_file.name().unwrap().to_string();
        let pool = &mut class_file.constant_pool;
        let entry = InnerClassEntry {
            inner_class_info_index: pool.try_add_class(&name).unwrap(),
            outer_class_info_index: pool.try_add_class(outer).unwrap(),
            inner_name_index: pool.try_add_utf8(simple_name).unwrap(),
            inner_class_access_flags: access,
        };
        let attribute = InnerClassesAttribute { classes: vec![entry] };
        let attribute = AttributeInfo::named(pool, attribute_names::INNER_CLASSES, attribute.to_bytes()).unwrap();
        class_file.attributes.push(attribute);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.builder.to_bytes()
    }
}

/// `@<name>(value = id)`
pub fn annotation(name: &str, id: i32) -> AnnotationSpec {
    AnnotationSpec::new(Type::object(name)).with("value", AnnotationValue::Int(id))
}

/// `@<name>({ids})`
pub fn listener(name: &str, ids: &[i32]) -> AnnotationSpec {
    AnnotationSpec::new(Type::object(name))
        .with("value", AnnotationValue::Array(ids.iter().copied().map(AnnotationValue::Int).collect()))
}

pub fn optional() -> AnnotationSpec {
    AnnotationSpec::new(Type::object("io/sento/annotations/Optional"))
}

pub fn run(inputs: Vec<Vec<u8>>) -> sentoc::Result<(MemorySink, GenerationReport)> {
    run_with(inputs, references())
}

pub fn run_with(inputs: Vec<Vec<u8>>, references: MemoryClassProvider) -> sentoc::Result<(MemorySink, GenerationReport)> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut provider = MemoryClassProvider::new();
    for input in inputs {
        provider.add(input);
    }
    let mut sink = MemorySink::new();
    let report = generate(&Config::default(), &provider, &references, &mut sink)?;
    Ok((sink, report))
}

pub fn error_message(result: sentoc::Result<(MemorySink, GenerationReport)>) -> String {
    match result {
        Err(error) => error.to_string(),
        Ok((sink, _)) => panic!("expected an error, got {} artifacts", sink.len()),
    }
}

/// Parse a generated class by internal name
pub fn output(sink: &MemorySink, name: &str) -> ClassFile {
    let content = sink
        .get(&format!("{}.class", name))
        .unwrap_or_else(|| panic!("{} was not generated", name));
    parse_class(&content.bytes).unwrap()
}

pub fn code(sink: &MemorySink, class: &str, method: &str, descriptor: &str) -> Vec<String> {
    disassemble(&output(sink, class), method, descriptor).unwrap()
}

pub fn bind_code(sink: &MemorySink) -> Vec<String> {
    code(sink, BINDING, "bind", BIND_DESCRIPTOR)
}

pub fn unbind_code(sink: &MemorySink) -> Vec<String> {
    code(sink, BINDING, "unbind", UNBIND_DESCRIPTOR)
}

pub fn count(lines: &[String], needle: &str) -> usize {
    lines.iter().filter(|line| line.as_str() == needle).count()
}

pub fn position(lines: &[String], needle: &str) -> usize {
    lines
        .iter()
        .position(|line| line.as_str() == needle)
        .unwrap_or_else(|| panic!("'{}' not found in {:#?}", needle, lines))
}

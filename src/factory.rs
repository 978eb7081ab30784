//! `io.sento.SentoFactory`
//!
//! The runtime asks the factory for the binding of a class instead of
//! reflecting on generated names. Every binding generated in a run is
//! registered in a static identity map keyed by the target's class literal.

use crate::binding::naming::class_file_path;
use crate::codegen::class_writer::ClassBuilder;
use crate::codegen::defs::{CONSTRUCTOR_METHOD_NAME, STATIC_INITIALIZER_METHOD_NAME};
use crate::codegen::descriptor::Type;
use crate::codegen::flag::access_flags::*;
use crate::common::config::Config;
use crate::common::error::Result;
use crate::consts::*;
use crate::content::GeneratedContent;

const MAP_GET_DESCRIPTOR: &str = "(Ljava/lang/Object;)Ljava/lang/Object;";
const MAP_PUT_DESCRIPTOR: &str = "(Ljava/lang/Object;Ljava/lang/Object;)Ljava/lang/Object;";

/// A target class and the binding generated for it, both internal names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactoryEntry {
    pub target: String,
    pub binding: String,
}

impl FactoryEntry {
    pub fn new(target: impl Into<String>, binding: impl Into<String>) -> Self {
        Self { target: target.into(), binding: binding.into() }
    }
}

pub fn generate_factory(config: &Config, entries: &[FactoryEntry]) -> Result<GeneratedContent> {
    let factory = config.factory_name.as_str();
    let map = MAP.internal_name();

    let mut builder = ClassBuilder::new(ACC_PUBLIC | ACC_FINAL | ACC_SUPER, factory, OBJECT_NAME, &[])?.configure(config);
    builder.field_with_signature(
        ACC_PRIVATE | ACC_STATIC | ACC_FINAL,
        FACTORY_BINDINGS_FIELD,
        &MAP,
        FACTORY_BINDINGS_SIGNATURE,
    )?;

    let mut constructor = builder.method(ACC_PRIVATE, CONSTRUCTOR_METHOD_NAME, "()V")?;
    constructor.load_this()?;
    constructor.invoke_constructor(OBJECT_NAME, "()V")?;
    constructor.return_value()?;
    constructor.end_method()?;

    let mut initializer = builder.method(ACC_STATIC, STATIC_INITIALIZER_METHOD_NAME, "()V")?;
    initializer.new_instance(&IDENTITY_MAP.internal_name())?;
    initializer.dup()?;
    initializer.invoke_constructor(&IDENTITY_MAP.internal_name(), "()V")?;
    initializer.put_static(factory, FACTORY_BINDINGS_FIELD, &MAP)?;
    for entry in entries {
        initializer.get_static(factory, FACTORY_BINDINGS_FIELD, &MAP)?;
        initializer.push_type(&Type::object(entry.target.as_str()))?;
        initializer.new_instance(&entry.binding)?;
        initializer.dup()?;
        initializer.invoke_constructor(&entry.binding, "()V")?;
        initializer.invoke_interface(&map, "put", MAP_PUT_DESCRIPTOR)?;
        initializer.pop()?;
    }
    initializer.return_value()?;
    initializer.end_method()?;

    let mut create = builder.method(ACC_PUBLIC | ACC_STATIC, CREATE_BINDING_METHOD, CREATE_BINDING_DESCRIPTOR)?;
    create.get_static(factory, FACTORY_BINDINGS_FIELD, &MAP)?;
    create.load_arg(0)?;
    create.invoke_interface(&map, "get", MAP_GET_DESCRIPTOR)?;
    create.check_cast(&BINDING)?;
    create.return_value()?;
    create.end_method()?;

    log::info!("generated {} with {} binding(s)", factory, entries.len());
    Ok(GeneratedContent::new(class_file_path(factory), builder.to_bytes())
        .with_extra(extras::KIND, extras::KIND_FACTORY)
        .with_extra(extras::ORIGINAL, factory))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::instruction::disassemble;
    use crate::codegen::reader::parse_class;

    #[test]
    fn test_factory_registers_every_binding() {
        let config = Config::default();
        let entries = vec![
            FactoryEntry::new("com/example/MainActivity", "com/example/MainActivity$$SentoBinding"),
            FactoryEntry::new("com/example/Holder", "com/example/Holder$$SentoBinding"),
        ];
        let content = generate_factory(&config, &entries).unwrap();
        assert_eq!(content.path, "io/sento/SentoFactory.class");
        assert_eq!(content.kind(), Some("factory"));

        let class = parse_class(&content.bytes).unwrap();
        assert_eq!(class.name().unwrap(), "io/sento/SentoFactory");
        assert!(class.find_field(FACTORY_BINDINGS_FIELD).is_some());

        let clinit = disassemble(&class, "<clinit>", "()V").unwrap();
        assert_eq!(clinit.iter().filter(|line| line.starts_with("invokeinterface java/util/Map.put")).count(), 2);
        assert!(clinit.contains(&"ldc class com/example/Holder".to_string()));
        assert!(clinit.contains(&"new com/example/MainActivity$$SentoBinding".to_string()));

        let create = disassemble(&class, CREATE_BINDING_METHOD, CREATE_BINDING_DESCRIPTOR).unwrap();
        assert_eq!(create.last().map(String::as_str), Some("areturn"));
        assert!(create.contains(&"checkcast io/sento/Binding".to_string()));
    }

    #[test]
    fn test_empty_factory() {
        let content = generate_factory(&Config::default(), &[]).unwrap();
        let class = parse_class(&content.bytes).unwrap();
        let clinit = disassemble(&class, "<clinit>", "()V").unwrap();
        assert!(!clinit.iter().any(|line| line.contains("Map.put")));
    }
}

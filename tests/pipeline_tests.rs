mod common;

use std::fs;
use std::path::Path;

use common::*;
use sentoc::codegen::descriptor::Type;
use sentoc::codegen::flag::access_flags::*;
use sentoc::codegen::reader::parse_class;
use sentoc::consts::extras;
use sentoc::{generate, ClassProvider, Config, MemoryClassProvider, MemorySink};

const FACTORY: &str = "io/sento/SentoFactory";

fn write_classes(root: &Path, provider: &MemoryClassProvider) {
    for reference in provider.references().unwrap() {
        let path = root.join(format!("{}.class", reference.name));
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, reference.open().unwrap()).unwrap();
    }
}

#[test]
fn test_factory_registers_every_binding() {
    let first = TargetBuilder::new(TARGET).view("title", "android/widget/TextView", 1, false).build();
    let second = TargetBuilder::new("com/example/DetailFragment").view("image", "android/view/View", 2, false).build();
    let (sink, report) = run(vec![first, second]).unwrap();
    assert_eq!(report.bindings, 2);

    let content = sink.get(&format!("{}.class", FACTORY)).unwrap();
    assert_eq!(content.kind(), Some(extras::KIND_FACTORY));
    // Written last
    assert_eq!(sink.contents.last().unwrap().path, content.path);

    let factory = output(&sink, FACTORY);
    assert_eq!(factory.access_flags, ACC_PUBLIC | ACC_FINAL | ACC_SUPER);
    let bindings = factory.find_field("BINDINGS").unwrap();
    assert_eq!(bindings.access_flags, ACC_PRIVATE | ACC_STATIC | ACC_FINAL);
    assert_eq!(bindings.descriptor(&factory.constant_pool).unwrap(), "Ljava/util/Map;");

    let initializer = code(&sink, FACTORY, "<clinit>", "()V");
    assert_eq!(
        &initializer[..4],
        [
            "new java/util/IdentityHashMap",
            "dup",
            "invokespecial java/util/IdentityHashMap.<init>()V",
            "putstatic io/sento/SentoFactory.BINDINGS:Ljava/util/Map;",
        ]
    );
    for (target, binding) in [
        (TARGET, BINDING),
        ("com/example/DetailFragment", "com/example/DetailFragment$$SentoBinding"),
    ] {
        let literal = position(&initializer, &format!("ldc class {}", target));
        assert_eq!(initializer[literal + 1], format!("new {}", binding));
        assert_eq!(initializer[literal + 3], format!("invokespecial {}.<init>()V", binding));
    }
    assert_eq!(
        count(&initializer, "invokeinterface java/util/Map.put(Ljava/lang/Object;Ljava/lang/Object;)Ljava/lang/Object;"),
        2
    );

    assert_eq!(
        code(&sink, FACTORY, "createBinding", "(Ljava/lang/Class;)Lio/sento/Binding;"),
        vec![
            "getstatic io/sento/SentoFactory.BINDINGS:Ljava/util/Map;",
            "aload_0",
            "invokeinterface java/util/Map.get(Ljava/lang/Object;)Ljava/lang/Object;",
            "checkcast io/sento/Binding",
            "areturn",
        ]
    );
}

#[test]
fn test_empty_run_still_writes_factory() {
    let (sink, report) = run(Vec::new()).unwrap();
    assert_eq!(report.to_string(), "0 binding(s), 0 patched class(es), 0 listener adapter(s)");
    assert_eq!(code(&sink, FACTORY, "<clinit>", "()V").len(), 5);
}

#[test]
fn test_configured_names_are_used() {
    let config = Config::new()
        .with_binding_suffix("$Bound")
        .with_factory_name("com/example/Bindings")
        .with_major_version(50);
    let target = TargetBuilder::new(TARGET).view("title", "android/widget/TextView", 1, false).build();

    let inputs = MemoryClassProvider::new().with_class(target);
    let mut sink = MemorySink::new();
    generate(&config, &inputs, &references(), &mut sink).unwrap();

    let binding = output(&sink, "com/example/MainActivity$Bound");
    assert_eq!(binding.major_version, 50);
    let initializer = code(&sink, "com/example/Bindings", "<clinit>", "()V");
    assert!(initializer.contains(&"new com/example/MainActivity$Bound".to_string()));
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = Config::new().with_major_version(49);
    let mut sink = MemorySink::new();
    let error = generate(&config, &MemoryClassProvider::new(), &references(), &mut sink).unwrap_err();
    assert_eq!(error.to_string(), "Configuration error: class file version 49 is not supported, the minimum is 50");
    assert!(sink.is_empty());
}

#[test]
fn test_configured_packages_are_skipped() {
    let config = Config::new().with_skip_package("com/example/generated/");
    let skipped = TargetBuilder::new("com/example/generated/Holder")
        .view("title", "android/widget/TextView", 1, false)
        .build();

    let inputs = MemoryClassProvider::new().with_class(skipped);
    let mut sink = MemorySink::new();
    let report = generate(&config, &inputs, &references(), &mut sink).unwrap();
    assert_eq!(report.bindings, 0);
    assert_eq!(sink.len(), 1);
}

#[test]
fn test_directories_end_to_end() {
    let workspace = tempfile::tempdir().unwrap();
    let input = workspace.path().join("classes");
    let platform = workspace.path().join("platform");
    let output_dir = workspace.path().join("out");

    let target = TargetBuilder::new(TARGET)
        .view("title", "android/widget/TextView", 42, false)
        .method(ACC_PRIVATE, "onClick", "()V", vec![listener("io/sento/annotations/OnClick", &[42])])
        .build();
    write_classes(&input, &MemoryClassProvider::new().with_class(target));
    write_classes(&platform, &references());

    let report =
        sentoc::generate_directory(&input, &output_dir, &[platform], &Config::default()).unwrap();
    assert_eq!(report.bindings, 1);
    assert_eq!(report.patched, 1);
    assert_eq!(report.listeners, 1);

    for name in [TARGET, BINDING, "com/example/MainActivity$$SentoBinding$0", FACTORY] {
        let path = output_dir.join(format!("{}.class", name));
        let class = parse_class(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(class.name().unwrap(), name);
    }

    // The input directory is left alone
    let original = parse_class(&fs::read(input.join(format!("{}.class", TARGET))).unwrap()).unwrap();
    assert!(original.find_field("sento$view$id_42").is_none());
}

#[test]
fn test_unresolved_listener_annotation_fails() {
    let target = TargetBuilder::new(TARGET)
        .method(ACC_PUBLIC, "onClick", "()V", vec![listener("io/sento/annotations/OnClick", &[1])])
        .build();
    // Without references the annotation class can't be resolved
    let message = error_message(run_with(vec![target], MemoryClassProvider::new()));
    assert_eq!(
        message,
        "Unable to process @OnClick annotation - annotation class 'io.sento.annotations.OnClick' wasn't found on the classpath."
    );
}

#[test]
fn test_foreign_annotations_are_ignored() {
    let target = TargetBuilder::new(TARGET)
        .field(ACC_PRIVATE, "title", Type::object("java/lang/String"), vec![annotation("javax/annotation/Nullable", 0)])
        .method(ACC_PUBLIC, "onClick", "()V", vec![listener("com/example/Tracked", &[1])])
        .build();
    let (sink, report) = run(vec![target]).unwrap();
    assert_eq!(report, sentoc::GenerationReport::default());
    assert_eq!(sink.len(), 1);
}

#[test]
fn test_missing_classpath_is_an_error() {
    let workspace = tempfile::tempdir().unwrap();
    let input = workspace.path().join("classes");
    let output_dir = workspace.path().join("out");
    let target = TargetBuilder::new(TARGET)
        .method(ACC_PUBLIC, "onClick", "()V", vec![listener("io/sento/annotations/OnClick", &[1])])
        .build();
    write_classes(&input, &MemoryClassProvider::new().with_class(target));

    let missing = workspace.path().join("does/not/exist");
    let error = sentoc::generate_with_classpath(&input, &output_dir, missing.to_str(), &Config::default()).unwrap_err();
    assert_eq!(error.to_string(), format!("Configuration error: classpath entry {} doesn't exist", missing.display()));
    assert!(!output_dir.exists());

    // A missing root handed straight to the directory provider fails too
    let error = sentoc::generate_directory(&input, &output_dir, &[missing], &Config::default()).unwrap_err();
    assert!(matches!(error, sentoc::Error::Walk(_)), "{}", error);
    assert!(!output_dir.exists());
}

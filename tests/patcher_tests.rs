mod common;

use common::*;
use sentoc::codegen::attribute::InnerClassesAttribute;
use sentoc::codegen::defs::attribute_names;
use sentoc::codegen::descriptor::Type;
use sentoc::codegen::flag::access_flags::*;
use sentoc::consts::extras;

#[test]
fn test_bound_fields_become_public_and_mutable() {
    let target = TargetBuilder::new(TARGET)
        .field(
            ACC_PRIVATE | ACC_FINAL,
            "title",
            Type::object("android/widget/TextView"),
            vec![annotation("io/sento/annotations/Bind", 1)],
        )
        .field(ACC_PROTECTED, "label", Type::object("android/widget/TextView"), vec![annotation("io/sento/annotations/Bind", 2)])
        .field(ACC_PRIVATE | ACC_FINAL, "untouched", Type::Int, vec![])
        .build();
    let (sink, _) = run(vec![target]).unwrap();

    let content = sink.get(&format!("{}.class", TARGET)).unwrap();
    assert_eq!(content.kind(), Some(extras::KIND_PATCHED));
    assert_eq!(content.original(), Some(TARGET));

    let patched = output(&sink, TARGET);
    assert_eq!(patched.find_field("title").unwrap().access_flags, ACC_PUBLIC);
    assert_eq!(patched.find_field("label").unwrap().access_flags, ACC_PUBLIC);
    assert_eq!(patched.find_field("untouched").unwrap().access_flags, ACC_PRIVATE | ACC_FINAL);
}

#[test]
fn test_package_private_class_becomes_public() {
    let target = TargetBuilder::with_access(TARGET, ACC_SUPER)
        .view("title", "android/widget/TextView", 1, false)
        .build();
    let (sink, _) = run(vec![target]).unwrap();

    let patched = output(&sink, TARGET);
    assert_eq!(patched.access_flags, ACC_PUBLIC | ACC_SUPER);
}

#[test]
fn test_nested_class_entry_is_widened() {
    let name = "com/example/MainActivity$Holder";
    let target = TargetBuilder::with_access(name, ACC_SUPER)
        .view("title", "android/widget/TextView", 1, false)
        .nested_in(TARGET, "Holder", ACC_PRIVATE | ACC_STATIC)
        .build();
    let (sink, _) = run(vec![target]).unwrap();
    assert!(sink.get("com/example/MainActivity$Holder$$SentoBinding.class").is_some());

    let patched = output(&sink, name);
    let attribute = patched.attribute(attribute_names::INNER_CLASSES).unwrap();
    let inner_classes = InnerClassesAttribute::parse(&attribute.info).unwrap();
    assert_eq!(inner_classes.classes.len(), 1);
    assert_eq!(inner_classes.classes[0].inner_class_access_flags, ACC_PUBLIC | ACC_STATIC);
}

#[test]
fn test_listener_views_get_cache_fields() {
    let target = TargetBuilder::new(TARGET)
        .method(ACC_PUBLIC, "onClick", "()V", vec![listener("io/sento/annotations/OnClick", &[10, 20])])
        .method(ACC_PUBLIC, "onLong", "()Z", vec![listener("io/sento/annotations/OnLongClick", &[20])])
        .build();
    let (sink, _) = run(vec![target]).unwrap();

    let patched = output(&sink, TARGET);
    for id in [10, 20] {
        let field = patched.find_field(&format!("sento$view$id_{}", id)).unwrap();
        assert_eq!(field.access_flags, ACC_PUBLIC | ACC_SYNTHETIC);
        assert_eq!(field.descriptor(&patched.constant_pool).unwrap(), "Landroid/view/View;");
    }
    let cached = patched
        .fields
        .iter()
        .filter(|field| field.name(&patched.constant_pool).unwrap().starts_with("sento$view$"))
        .count();
    assert_eq!(cached, 2);
    // Neither listener has a distinct unsetter
    assert!(!patched
        .fields
        .iter()
        .any(|field| field.name(&patched.constant_pool).unwrap().starts_with("sento$listener$")));
}

#[test]
fn test_existing_members_are_preserved() {
    let target = TargetBuilder::new(TARGET)
        .view("title", "android/widget/TextView", 1, false)
        .method(ACC_PUBLIC, "describe", "()Ljava/lang/String;", vec![])
        .method(ACC_PRIVATE, "count", "()I", vec![])
        .build();
    let (sink, _) = run(vec![target]).unwrap();

    let patched = output(&sink, TARGET);
    assert_eq!(patched.methods.len(), 3);
    assert_eq!(code(&sink, TARGET, "<init>", "()V"), vec!["return"]);
    assert_eq!(code(&sink, TARGET, "describe", "()Ljava/lang/String;"), vec!["aconst_null", "areturn"]);
    assert_eq!(patched.find_method("count", "()I").unwrap().access_flags, ACC_PRIVATE);
    // Public listener methods need no accessor
    assert!(!patched
        .methods
        .iter()
        .any(|method| method.name(&patched.constant_pool).unwrap().starts_with("sento$accessor$")));
}

#[test]
fn test_package_private_listener_uses_virtual_accessor() {
    let target = TargetBuilder::new(TARGET)
        .method(0, "onLong", "(Landroid/view/View;)Z", vec![listener("io/sento/annotations/OnLongClick", &[3])])
        .build();
    let (sink, _) = run(vec![target]).unwrap();

    let descriptor = "(Lcom/example/MainActivity;Landroid/view/View;)Z";
    assert_eq!(
        code(&sink, TARGET, "sento$accessor$onLong", descriptor),
        vec![
            "aload_0",
            "aload_1",
            "invokevirtual com/example/MainActivity.onLong(Landroid/view/View;)Z",
            "ireturn",
        ]
    );
}

#[test]
fn test_one_accessor_per_method() {
    let target = TargetBuilder::new(TARGET)
        .method(
            ACC_PRIVATE,
            "onAny",
            "()V",
            vec![
                listener("io/sento/annotations/OnClick", &[1]),
                listener("io/sento/annotations/OnCheckedChanged", &[2]),
            ],
        )
        .build();
    let (sink, report) = run(vec![target]).unwrap();
    assert_eq!(report.listeners, 2);

    let patched = output(&sink, TARGET);
    let accessors = patched
        .methods
        .iter()
        .filter(|method| method.name(&patched.constant_pool).unwrap() == "sento$accessor$onAny")
        .count();
    assert_eq!(accessors, 1);
}

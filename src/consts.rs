// Well-known types referenced by generated code and by the binding rules

use once_cell::sync::Lazy;

use crate::codegen::descriptor::Type;

pub const OBJECT_NAME: &str = "java/lang/Object";
pub const ANNOTATIONS_PACKAGE: &str = "io/sento/annotations/";

pub static OBJECT: Lazy<Type> = Lazy::new(|| Type::object(OBJECT_NAME));
pub static STRING: Lazy<Type> = Lazy::new(|| Type::object("java/lang/String"));
pub static CHAR_SEQUENCE: Lazy<Type> = Lazy::new(|| Type::object("java/lang/CharSequence"));
pub static CLASS: Lazy<Type> = Lazy::new(|| Type::object("java/lang/Class"));
pub static MAP: Lazy<Type> = Lazy::new(|| Type::object("java/util/Map"));
pub static IDENTITY_MAP: Lazy<Type> = Lazy::new(|| Type::object("java/util/IdentityHashMap"));

pub static VIEW: Lazy<Type> = Lazy::new(|| Type::object("android/view/View"));
pub static RESOURCES: Lazy<Type> = Lazy::new(|| Type::object("android/content/res/Resources"));
pub static DRAWABLE: Lazy<Type> = Lazy::new(|| Type::object("android/graphics/drawable/Drawable"));

pub static BINDING: Lazy<Type> = Lazy::new(|| Type::object("io/sento/Binding"));
pub static FINDER: Lazy<Type> = Lazy::new(|| Type::object("io/sento/Finder"));

// Annotation types, by internal name
pub const BIND: &str = "io/sento/annotations/Bind";
pub const BIND_ARRAY: &str = "io/sento/annotations/BindArray";
pub const BIND_BOOL: &str = "io/sento/annotations/BindBool";
pub const BIND_COLOR: &str = "io/sento/annotations/BindColor";
pub const BIND_DIMEN: &str = "io/sento/annotations/BindDimen";
pub const BIND_DRAWABLE: &str = "io/sento/annotations/BindDrawable";
pub const BIND_INTEGER: &str = "io/sento/annotations/BindInteger";
pub const BIND_STRING: &str = "io/sento/annotations/BindString";
pub const OPTIONAL: &str = "io/sento/annotations/Optional";
pub const LISTENER_BINDING: &str = "io/sento/annotations/ListenerBinding";
pub const RESOURCE_BINDINGS: &str = "io/sento/annotations/ResourceBindings";

// Runtime contract
pub const FINDER_FIND: &str = "find";
pub const FINDER_FIND_DESCRIPTOR: &str = "(ILjava/lang/Object;Z)Landroid/view/View;";
pub const FINDER_REQUIRE: &str = "require";
pub const FINDER_REQUIRE_DESCRIPTOR: &str = "(ILandroid/view/View;Ljava/lang/Object;Ljava/lang/String;)V";
pub const FINDER_RESOURCES: &str = "resources";
pub const FINDER_RESOURCES_DESCRIPTOR: &str = "(Ljava/lang/Object;)Landroid/content/res/Resources;";

pub const BIND_METHOD: &str = "bind";
pub const BIND_METHOD_DESCRIPTOR: &str = "(Ljava/lang/Object;Ljava/lang/Object;Lio/sento/Finder;)V";
pub const UNBIND_METHOD: &str = "unbind";
pub const UNBIND_METHOD_DESCRIPTOR: &str = "(Ljava/lang/Object;)V";

pub const CREATE_BINDING_METHOD: &str = "createBinding";
pub const CREATE_BINDING_DESCRIPTOR: &str = "(Ljava/lang/Class;)Lio/sento/Binding;";
pub const FACTORY_BINDINGS_FIELD: &str = "BINDINGS";
pub const FACTORY_BINDINGS_SIGNATURE: &str = "Ljava/util/Map<Ljava/lang/Class;Lio/sento/Binding;>;";

/// Keys of `GeneratedContent::extras`
pub mod extras {
    pub const KIND: &str = "sento.binding.kind";
    pub const ORIGINAL: &str = "sento.binding.original";

    pub const KIND_BINDING: &str = "binding";
    pub const KIND_PATCHED: &str = "patched";
    pub const KIND_LISTENER: &str = "listener";
    pub const KIND_FACTORY: &str = "factory";
}

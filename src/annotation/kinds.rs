//! Typed views of the binding annotations

use super::{AnnotationSpec, FromAnnotation};
use crate::codegen::descriptor::Type;
use crate::common::error::Result;

/// `@Bind(id)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewAnnotation {
    pub id: i32,
}

impl FromAnnotation for ViewAnnotation {
    fn from_annotation(annotation: &AnnotationSpec) -> Result<Self> {
        Ok(Self { id: annotation.get_as("value")? })
    }
}

/// `@BindString(id)`, `@BindColor(id)` and the other resource annotations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceAnnotation {
    pub id: i32,
}

impl FromAnnotation for ResourceAnnotation {
    fn from_annotation(annotation: &AnnotationSpec) -> Result<Self> {
        Ok(Self { id: annotation.get_as("value")? })
    }
}

/// `@OnClick({ids})` and every other annotation meta-annotated with `@ListenerBinding`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerAnnotation {
    pub ids: Vec<i32>,
}

impl FromAnnotation for ListenerAnnotation {
    fn from_annotation(annotation: &AnnotationSpec) -> Result<Self> {
        Ok(Self { ids: annotation.get_as("value")? })
    }
}

/// `@ListenerBinding` placed on a listener annotation class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerBindingAnnotation {
    pub owner: Type,
    pub listener: Type,
    pub setter: String,
    /// `None` when detaching goes through `setter(null)`
    pub unsetter: Option<String>,
    /// `None` when the listener has a single abstract method
    pub callback: Option<String>,
}

impl FromAnnotation for ListenerBindingAnnotation {
    fn from_annotation(annotation: &AnnotationSpec) -> Result<Self> {
        let non_empty = |value: Option<String>| value.filter(|name| !name.is_empty());
        Ok(Self {
            owner: annotation.get_as("owner")?,
            listener: annotation.get_as("listener")?,
            setter: annotation.get_as("setter")?,
            unsetter: non_empty(annotation.get_optional("unsetter")?),
            callback: non_empty(annotation.get_optional("callback")?),
        })
    }
}

/// One `@ResourceBinding(type = "int", getter = "getInteger")` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceBindingAnnotation {
    /// Field type the getter serves, given as a Java type name
    pub ty: Type,
    pub getter: String,
}

impl FromAnnotation for ResourceBindingAnnotation {
    fn from_annotation(annotation: &AnnotationSpec) -> Result<Self> {
        Ok(Self { ty: annotation.get_as("type")?, getter: annotation.get_as("getter")? })
    }
}

/// `@ResourceBindings` placed on a resource annotation class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceBindingsAnnotation {
    pub bindings: Vec<ResourceBindingAnnotation>,
}

impl FromAnnotation for ResourceBindingsAnnotation {
    fn from_annotation(annotation: &AnnotationSpec) -> Result<Self> {
        let entries: Vec<AnnotationSpec> = annotation.get_as("value")?;
        let bindings = entries.iter().map(AnnotationSpec::resolve).collect::<Result<_>>()?;
        Ok(Self { bindings })
    }
}

impl ListenerBindingAnnotation {
    /// Method used to detach the listener
    pub fn unsetter(&self) -> &str {
        self.unsetter.as_deref().unwrap_or(&self.setter)
    }

    pub fn has_distinct_unsetter(&self) -> bool {
        self.unsetter() != self.setter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotationValue;
    use crate::common::error::Error;

    fn listener_binding() -> AnnotationSpec {
        AnnotationSpec::new(Type::object("io/sento/annotations/ListenerBinding"))
            .with("owner", AnnotationValue::String("android.widget.CompoundButton".into()))
            .with(
                "listener",
                AnnotationValue::String("android.widget.CompoundButton$OnCheckedChangeListener".into()),
            )
            .with("setter", AnnotationValue::String("setOnCheckedChangeListener".into()))
            .with("unsetter", AnnotationValue::String("".into()))
    }

    #[test]
    fn test_listener_binding_defaults() {
        let binding = listener_binding().resolve::<ListenerBindingAnnotation>().unwrap();
        assert_eq!(binding.owner, Type::object("android/widget/CompoundButton"));
        assert_eq!(binding.listener, Type::object("android/widget/CompoundButton$OnCheckedChangeListener"));
        assert_eq!(binding.unsetter, None);
        assert_eq!(binding.callback, None);
        assert_eq!(binding.unsetter(), "setOnCheckedChangeListener");
        assert!(!binding.has_distinct_unsetter());
    }

    #[test]
    fn test_listener_binding_requires_setter() {
        let annotation = AnnotationSpec::new(Type::object("io/sento/annotations/ListenerBinding"))
            .with("owner", AnnotationValue::String("android.view.View".into()))
            .with("listener", AnnotationValue::String("android.view.View$OnClickListener".into()));
        assert!(matches!(
            annotation.resolve::<ListenerBindingAnnotation>(),
            Err(Error::NoSuchElement { .. })
        ));
    }

    #[test]
    fn test_resource_bindings() {
        let entry = |ty: &str, getter: &str| {
            AnnotationValue::Annotation(
                AnnotationSpec::new(Type::object("io/sento/annotations/ResourceBinding"))
                    .with("type", AnnotationValue::String(ty.into()))
                    .with("getter", AnnotationValue::String(getter.into())),
            )
        };
        let bindings = AnnotationSpec::new(Type::object("io/sento/annotations/ResourceBindings"))
            .with("value", AnnotationValue::Array(vec![entry("int", "getDimensionPixelSize"), entry("float", "getDimension")]))
            .resolve::<ResourceBindingsAnnotation>()
            .unwrap();
        assert_eq!(bindings.bindings.len(), 2);
        assert_eq!(bindings.bindings[0], ResourceBindingAnnotation { ty: Type::Int, getter: "getDimensionPixelSize".into() });
        assert_eq!(bindings.bindings[1].ty, Type::Float);

        // A lone entry reads as a one-element list
        let single = AnnotationSpec::new(Type::object("io/sento/annotations/ResourceBindings"))
            .with("value", entry("java.lang.String[]", "getStringArray"))
            .resolve::<ResourceBindingsAnnotation>()
            .unwrap();
        assert_eq!(single.bindings[0].ty, Type::array_of(Type::object("java/lang/String")));
    }

    #[test]
    fn test_view_and_listener_ids() {
        let bind = AnnotationSpec::new(Type::object("io/sento/annotations/Bind")).with("value", AnnotationValue::Int(42));
        assert_eq!(bind.resolve::<ViewAnnotation>().unwrap(), ViewAnnotation { id: 42 });

        let click = AnnotationSpec::new(Type::object("io/sento/annotations/OnClick"))
            .with("value", AnnotationValue::Array(vec![AnnotationValue::Int(10), AnnotationValue::Int(20)]));
        assert_eq!(click.resolve::<ListenerAnnotation>().unwrap().ids, vec![10, 20]);
    }
}

//! Per-class binding specification
//!
//! [`BindingSpecBuilder`] walks the fields and methods of one class and turns
//! their binding annotations into typed records. Listener and resource
//! annotation classes are validated the first time they are seen and shared
//! afterwards. An annotation from the Sento package whose class can't be
//! resolved is an error rather than a skipped member.

use std::collections::HashMap;
use std::rc::Rc;

use super::listener::ListenerClassSpec;
use super::resource::ResourceClassSpec;
use crate::annotation::{
    AnnotationSpec, ListenerAnnotation, ListenerBindingAnnotation, ResourceBindingsAnnotation, ViewAnnotation,
};
use crate::codegen::flag::Access;
use crate::common::error::{Error, Result};
use crate::consts::{ANNOTATIONS_PACKAGE, BIND, LISTENER_BINDING, OPTIONAL, RESOURCE_BINDINGS};
use crate::generator::{BindingKind, ResourceKind};
use crate::registry::{ClassRegistry, ClassSpec, FieldSpec, MethodSpec};

/// Member a view lookup is done for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewOwner {
    Field(String),
    Method(String),
}

impl ViewOwner {
    /// Passed to `Finder.require` so a missing view can be reported
    pub fn description(&self) -> String {
        match self {
            ViewOwner::Field(name) => format!("field '{}'", name),
            ViewOwner::Method(name) => format!("method '{}'", name),
        }
    }

    pub fn is_method(&self) -> bool {
        matches!(self, ViewOwner::Method(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewTarget {
    pub id: i32,
    pub optional: bool,
    pub owner: ViewOwner,
}

#[derive(Debug, Clone)]
pub struct FieldBinding {
    pub field: FieldSpec,
    pub annotation: AnnotationSpec,
    pub kind: BindingKind,
    /// Set for resource annotations that declare their getters
    pub resource: Option<Rc<ResourceClassSpec>>,
}

#[derive(Debug, Clone)]
pub struct ListenerBinding {
    /// Position among the listener bindings of the class; numbers the adapter
    pub index: usize,
    pub method: MethodSpec,
    pub annotation: AnnotationSpec,
    pub listener: Rc<ListenerClassSpec>,
    pub ids: Vec<i32>,
    pub optional: bool,
}

#[derive(Debug, Clone)]
pub struct BindingSpec {
    pub class: Rc<ClassSpec>,
    pub views: Vec<ViewTarget>,
    pub fields: Vec<FieldBinding>,
    pub listeners: Vec<ListenerBinding>,
}

impl BindingSpec {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.listeners.is_empty()
    }

    /// Distinct view ids in order of first reference
    pub fn view_ids(&self) -> Vec<i32> {
        let mut ids = Vec::new();
        for view in &self.views {
            if !ids.contains(&view.id) {
                ids.push(view.id);
            }
        }
        ids
    }

    /// Optional only when every reference to the id is
    pub fn is_optional(&self, id: i32) -> bool {
        self.views.iter().filter(|view| view.id == id).all(|view| view.optional)
    }

    /// Owner of the first required reference to `id`, named when the view is missing
    pub fn first_required_owner(&self, id: i32) -> Option<&ViewOwner> {
        self.views.iter().find(|view| view.id == id && !view.optional).map(|view| &view.owner)
    }

    pub fn required_ids(&self) -> Vec<i32> {
        self.view_ids().into_iter().filter(|id| !self.is_optional(*id)).collect()
    }

    /// Ids a listener is attached to; their views are cached on the target for unbinding
    pub fn listener_view_ids(&self) -> Vec<i32> {
        let mut ids = Vec::new();
        for view in self.views.iter().filter(|view| view.owner.is_method()) {
            if !ids.contains(&view.id) {
                ids.push(view.id);
            }
        }
        ids
    }
}

pub struct BindingSpecBuilder<'a> {
    registry: &'a ClassRegistry,
    /// Validated listener classes by annotation type; `None` for plain annotations
    listeners: HashMap<String, Option<Rc<ListenerClassSpec>>>,
    /// Validated resource classes by annotation type; `None` without `@ResourceBindings`
    resources: HashMap<String, Option<Rc<ResourceClassSpec>>>,
}

impl<'a> BindingSpecBuilder<'a> {
    pub fn new(registry: &'a ClassRegistry) -> Self {
        Self { registry, listeners: HashMap::new(), resources: HashMap::new() }
    }

    pub fn build(&mut self, class: Rc<ClassSpec>) -> Result<BindingSpec> {
        let mut spec = BindingSpec { class: class.clone(), views: Vec::new(), fields: Vec::new(), listeners: Vec::new() };

        for field in class.fields.iter().filter(|field| is_bindable(field.access)) {
            let optional = is_optional(&field.annotations);
            for annotation in &field.annotations {
                let resource = if annotation.is(BIND) { None } else { self.resource_class(annotation)? };
                let kind = match (&resource, BindingKind::for_field_annotation(&annotation.type_name())) {
                    (Some(_), _) => BindingKind::Resource(ResourceKind::Declared),
                    (None, Some(kind)) => kind,
                    (None, None) => {
                        self.check_resolvable(annotation)?;
                        continue;
                    }
                };
                if kind == BindingKind::View {
                    let view = annotation.resolve::<ViewAnnotation>()?;
                    spec.views.push(ViewTarget { id: view.id, optional, owner: ViewOwner::Field(field.name.clone()) });
                }
                log::debug!("{}: {} binding on field '{}'", class.name, kind, field.name);
                spec.fields.push(FieldBinding { field: field.clone(), annotation: annotation.clone(), kind, resource });
            }
        }

        for method in class.methods.iter().filter(|method| is_bindable(method.access)) {
            let optional = is_optional(&method.annotations);
            for annotation in &method.annotations {
                let Some(listener) = self.listener_class(annotation)? else {
                    self.check_resolvable(annotation)?;
                    continue;
                };
                let ids = annotation.resolve::<ListenerAnnotation>()?.ids;
                for id in &ids {
                    spec.views.push(ViewTarget { id: *id, optional, owner: ViewOwner::Method(method.name.clone()) });
                }
                log::debug!("{}: @{} listener on method '{}' for {:?}", class.name, annotation.simple_name(), method.name, ids);
                spec.listeners.push(ListenerBinding {
                    index: spec.listeners.len(),
                    method: method.clone(),
                    annotation: annotation.clone(),
                    listener,
                    ids,
                    optional,
                });
            }
        }

        Ok(spec)
    }

    /// The validated listener class behind a method annotation, if it is a listener annotation
    fn listener_class(&mut self, annotation: &AnnotationSpec) -> Result<Option<Rc<ListenerClassSpec>>> {
        let name = annotation.type_name();
        if let Some(known) = self.listeners.get(&name) {
            return Ok(known.clone());
        }

        let mut listener = None;
        if self.registry.contains(&annotation.annotation_type) {
            let annotation_class = self.registry.resolve(&annotation.annotation_type)?;
            if let Some(binding) = annotation_class.annotation(LISTENER_BINDING) {
                let binding = binding.resolve::<ListenerBindingAnnotation>()?;
                let spec = ListenerClassSpec::create(&annotation.annotation_type, &binding, self.registry)?;
                listener = Some(Rc::new(spec));
            }
        }
        self.listeners.insert(name, listener.clone());
        Ok(listener)
    }

    /// The validated resource class behind a field annotation, if it declares `@ResourceBindings`
    fn resource_class(&mut self, annotation: &AnnotationSpec) -> Result<Option<Rc<ResourceClassSpec>>> {
        let name = annotation.type_name();
        if let Some(known) = self.resources.get(&name) {
            return Ok(known.clone());
        }

        let mut resource = None;
        if self.registry.contains(&annotation.annotation_type) {
            let annotation_class = self.registry.resolve(&annotation.annotation_type)?;
            if let Some(bindings) = annotation_class.annotation(RESOURCE_BINDINGS) {
                let bindings = bindings.resolve::<ResourceBindingsAnnotation>()?;
                let spec = ResourceClassSpec::create(&annotation.annotation_type, &bindings, self.registry)?;
                resource = Some(Rc::new(spec));
            }
        }
        self.resources.insert(name, resource.clone());
        Ok(resource)
    }

    /// Annotations outside the Sento package may be anything; inside it every
    /// binding annotation other than the built-in ones needs its class to be known.
    fn check_resolvable(&self, annotation: &AnnotationSpec) -> Result<()> {
        let name = annotation.type_name();
        let builtin = annotation.is(OPTIONAL) || BindingKind::for_field_annotation(&name).is_some();
        if builtin || !name.starts_with(ANNOTATIONS_PACKAGE) || self.registry.contains(&annotation.annotation_type) {
            return Ok(());
        }
        Err(Error::binding_error(format!(
            "Unable to process @{} annotation - annotation class '{}' wasn't found on the classpath.",
            annotation.simple_name(),
            annotation.annotation_type.class_name()
        )))
    }
}

fn is_bindable(access: u16) -> bool {
    !access.is_static() && !access.is_synthetic()
}

fn is_optional(annotations: &[AnnotationSpec]) -> bool {
    annotations.iter().any(|annotation| annotation.is(OPTIONAL))
}

//! Per-binding code generators
//!
//! Every binding annotation maps to exactly one [`BindingKind`]. The kind picks
//! the generator that emits its share of the `bind` and `unbind` bodies;
//! [`binding_class`] drives them in order and assembles the binding class.

pub mod adapter;
pub mod binding_class;
pub mod context;
pub mod listener;
pub mod resource;
pub mod view;

use std::fmt;

use crate::consts::*;
use crate::content::GeneratedContent;
use crate::common::error::Result;

pub use binding_class::generate_binding;
pub use context::{BindingContext, GenerationEnvironment, Member, Variable, Variables};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Array,
    Bool,
    Color,
    Dimen,
    Drawable,
    Integer,
    String,
    /// Getters listed by the annotation's `@ResourceBindings`
    Declared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    View,
    Resource(ResourceKind),
    Listener,
}

impl BindingKind {
    /// Kind of a field annotation, `None` for annotations that are not bindings
    pub fn for_field_annotation(internal_name: &str) -> Option<Self> {
        let kind = match internal_name {
            BIND => BindingKind::View,
            BIND_ARRAY => BindingKind::Resource(ResourceKind::Array),
            BIND_BOOL => BindingKind::Resource(ResourceKind::Bool),
            BIND_COLOR => BindingKind::Resource(ResourceKind::Color),
            BIND_DIMEN => BindingKind::Resource(ResourceKind::Dimen),
            BIND_DRAWABLE => BindingKind::Resource(ResourceKind::Drawable),
            BIND_INTEGER => BindingKind::Resource(ResourceKind::Integer),
            BIND_STRING => BindingKind::Resource(ResourceKind::String),
            _ => return None,
        };
        Some(kind)
    }

    pub fn generator(&self) -> Box<dyn BindingGenerator> {
        match self {
            BindingKind::View => Box::new(view::ViewGenerator),
            BindingKind::Resource(kind) => Box::new(resource::ResourceGenerator::new(*kind)),
            BindingKind::Listener => Box::new(listener::ListenerGenerator),
        }
    }
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingKind::View => write!(f, "view"),
            BindingKind::Resource(kind) => write!(f, "resource {:?}", kind),
            BindingKind::Listener => write!(f, "listener"),
        }
    }
}

/// Emits the code for one binding into the `bind` and `unbind` methods.
/// Returned contents are extra classes the binding needs, such as listener adapters.
pub trait BindingGenerator {
    fn bind(&self, context: &mut BindingContext<'_, '_>) -> Result<Vec<GeneratedContent>>;

    fn unbind(&self, context: &mut BindingContext<'_, '_>) -> Result<Vec<GeneratedContent>>;
}

//! Binding specifications
//!
//! What has to be bound on a class, independent of how the code for it is
//! emitted.

pub mod listener;
pub mod naming;
pub mod resource;
pub mod spec;

pub use listener::ListenerClassSpec;
pub use resource::{Getter, ResourceClassSpec};
pub use spec::{BindingSpec, BindingSpecBuilder, FieldBinding, ListenerBinding, ViewOwner, ViewTarget};

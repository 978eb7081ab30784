//! State shared by the generators of one binding class

use std::collections::HashMap;

use crate::binding::{FieldBinding, ListenerBinding};
use crate::codegen::descriptor::Type;
use crate::codegen::method_writer::MethodBuilder;
use crate::common::config::Config;
use crate::common::error::{Error, Result};
use crate::registry::{ClassRegistry, ClassSpec};

/// Well-known local names
pub const TARGET: &str = "target";
pub const SOURCE: &str = "source";
pub const FINDER: &str = "finder";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub slot: u16,
    pub ty: Type,
}

/// Named locals of the method being generated
#[derive(Debug, Clone, Default)]
pub struct Variables {
    entries: HashMap<String, Variable>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: impl Into<String>, slot: u16, ty: Type) {
        self.entries.insert(name.into(), Variable { slot, ty });
    }

    pub fn get(&self, name: &str) -> Result<&Variable> {
        self.entries
            .get(name)
            .ok_or_else(|| Error::no_such_element(format!("Unknown variable \"{}\"", name)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Emit a load of the named local
    pub fn load(&self, method: &mut MethodBuilder<'_>, name: &str) -> Result<()> {
        let variable = self.get(name)?;
        method.load_local(variable.slot, &variable.ty)
    }
}

pub struct GenerationEnvironment<'a> {
    pub registry: &'a ClassRegistry,
    pub config: &'a Config,
}

impl<'a> GenerationEnvironment<'a> {
    pub fn new(registry: &'a ClassRegistry, config: &'a Config) -> Self {
        Self { registry, config }
    }
}

/// The annotated member a generator works on
#[derive(Debug, Clone, Copy)]
pub enum Member<'a> {
    Field(&'a FieldBinding),
    Listener(&'a ListenerBinding),
}

impl<'a> Member<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            Member::Field(binding) => &binding.field.name,
            Member::Listener(binding) => &binding.method.name,
        }
    }
}

pub struct BindingContext<'a, 'b> {
    /// The target class
    pub class: &'a ClassSpec,
    /// Internal name of the binding class being generated
    pub binding: &'a str,
    pub member: Member<'a>,
    pub variables: &'a Variables,
    pub environment: &'a GenerationEnvironment<'a>,
    pub method: &'a mut MethodBuilder<'b>,
}

impl<'a, 'b> BindingContext<'a, 'b> {
    pub fn field(&self) -> Result<&'a FieldBinding> {
        match self.member {
            Member::Field(binding) => Ok(binding),
            Member::Listener(binding) => {
                Err(Error::no_such_element(format!("'{}' is a method, not a field", binding.method.name)))
            }
        }
    }

    pub fn listener(&self) -> Result<&'a ListenerBinding> {
        match self.member {
            Member::Listener(binding) => Ok(binding),
            Member::Field(binding) => {
                Err(Error::no_such_element(format!("'{}' is a field, not a method", binding.field.name)))
            }
        }
    }

    pub fn variable(&self, name: &str) -> Result<&'a Variable> {
        self.variables.get(name)
    }

    pub fn load(&mut self, name: &str) -> Result<()> {
        self.variables.load(self.method, name)
    }
}

//! Class registry
//!
//! Knows the header of every class on the classpath and parses members on
//! demand. Parsed classes live in an arena that only grows: the first
//! resolution of a name assigns its slot and later lookups share the same
//! `Rc<ClassSpec>`.

pub mod spec;

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use crate::codegen::descriptor::Type;
use crate::codegen::flag::Access;
use crate::common::error::{Error, Result};
use crate::consts::OBJECT_NAME;

pub use spec::{ClassReference, ClassSpec, FieldSpec, MethodSpec};

#[derive(Debug, Default)]
pub struct ClassRegistryBuilder {
    references: Vec<ClassReference>,
    inputs: Vec<ClassReference>,
}

impl ClassRegistryBuilder {
    /// Classpath entries, consulted for type queries only
    pub fn references(mut self, references: impl IntoIterator<Item = ClassReference>) -> Self {
        self.references.extend(references);
        self
    }

    /// Classes to process; they are references too
    pub fn inputs(mut self, inputs: impl IntoIterator<Item = ClassReference>) -> Self {
        self.inputs.extend(inputs);
        self
    }

    pub fn build(self) -> ClassRegistry {
        let mut references = HashMap::with_capacity(self.references.len() + self.inputs.len());
        for reference in self.references {
            references.insert(reference.name.clone(), reference);
        }

        let mut inputs = Vec::with_capacity(self.inputs.len());
        for reference in self.inputs {
            if !inputs.contains(&reference.name) {
                inputs.push(reference.name.clone());
            }
            references.insert(reference.name.clone(), reference);
        }

        ClassRegistry {
            references,
            inputs,
            arena: RefCell::new(Vec::new()),
            index: RefCell::new(HashMap::new()),
        }
    }
}

#[derive(Debug)]
pub struct ClassRegistry {
    references: HashMap<String, ClassReference>,
    inputs: Vec<String>,
    arena: RefCell<Vec<Rc<ClassSpec>>>,
    index: RefCell<HashMap<String, usize>>,
}

impl ClassRegistry {
    pub fn builder() -> ClassRegistryBuilder {
        ClassRegistryBuilder::default()
    }

    pub fn contains(&self, ty: &Type) -> bool {
        match ty {
            Type::Object(name) => self.references.contains_key(name),
            _ => false,
        }
    }

    pub fn reference(&self, name: &str) -> Option<&ClassReference> {
        self.references.get(name)
    }

    /// Classes to process, in the order they were handed to the builder
    pub fn inputs(&self) -> impl Iterator<Item = &ClassReference> + '_ {
        self.inputs.iter().filter_map(move |name| self.references.get(name))
    }

    pub fn resolve(&self, ty: &Type) -> Result<Rc<ClassSpec>> {
        self.resolve_with(ty, true)
    }

    /// Resolve, storing the parsed class only when `cacheable`
    pub fn resolve_with(&self, ty: &Type, cacheable: bool) -> Result<Rc<ClassSpec>> {
        let name = match ty {
            Type::Object(name) => name,
            _ => return Err(Error::UnknownClass { name: ty.class_name() }),
        };

        if let Some(&slot) = self.index.borrow().get(name) {
            return Ok(self.arena.borrow()[slot].clone());
        }

        let reference = self
            .references
            .get(name)
            .ok_or_else(|| Error::UnknownClass { name: ty.class_name() })?;
        log::debug!("registry: resolving {}", name);
        let spec = Rc::new(reference.resolve()?);

        if cacheable {
            let mut arena = self.arena.borrow_mut();
            let mut index = self.index.borrow_mut();
            index.entry(name.clone()).or_insert_with(|| {
                arena.push(spec.clone());
                arena.len() - 1
            });
        }
        Ok(spec)
    }

    /// Number of classes parsed and cached so far
    pub fn resolved_count(&self) -> usize {
        self.arena.borrow().len()
    }

    /// `ty` is `parent` or one of its declared ancestors. Unknown types answer `false`.
    pub fn is_subclass_of(&self, ty: &Type, parent: &Type) -> bool {
        let mut current = match ty {
            Type::Object(name) => name.clone(),
            _ => return ty == parent,
        };
        let parent = match parent {
            Type::Object(name) => name,
            _ => return false,
        };

        loop {
            if current == *parent {
                return true;
            }
            if current == OBJECT_NAME {
                return false;
            }
            match self.references.get(&current).and_then(|reference| reference.parent.clone()) {
                Some(next) => current = next,
                None => return false,
            }
        }
    }

    pub fn is_interface(&self, ty: &Type) -> bool {
        match ty {
            Type::Object(name) => self.references.get(name).map_or(false, |reference| reference.access.is_interface()),
            _ => false,
        }
    }

    /// A value of type `from` can be stored where `to` is expected
    pub fn is_assignable(&self, from: &Type, to: &Type) -> bool {
        if from == to {
            return true;
        }
        match (from, to) {
            (_, _) if from.is_primitive() || to.is_primitive() => false,
            (Type::Void, _) | (_, Type::Void) => false,
            (_, Type::Object(name)) if name == OBJECT_NAME => true,
            (Type::Array(_), Type::Object(name)) => name == "java/lang/Cloneable" || name == "java/io/Serializable",
            (Type::Array(from), Type::Array(to)) => {
                from.is_reference() && to.is_reference() && self.is_assignable(from, to)
            }
            (Type::Object(from), Type::Object(to)) => self.ancestors(from).contains(to.as_str()),
            _ => false,
        }
    }

    /// A value of type `from` can reach `to` through an implicit or a checked cast
    pub fn is_castable(&self, from: &Type, to: &Type) -> bool {
        self.is_assignable(from, to) || (from.is_reference() && to.is_reference() && self.is_assignable(to, from))
    }

    /// Every class and interface `name` can be viewed as, itself included
    fn ancestors(&self, name: &str) -> HashSet<String> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([name.to_string()]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(reference) = self.references.get(&current) {
                queue.extend(reference.parent.iter().cloned());
                queue.extend(reference.interfaces.iter().cloned());
            }
        }
        seen
    }

    /// Abstract methods of `ty` across its class chain and implemented interfaces,
    /// minus the ones some class in the chain implements
    pub fn abstract_methods(&self, ty: &Type) -> Result<Vec<MethodSpec>> {
        let mut concrete = HashSet::new();
        let mut result: Vec<MethodSpec> = Vec::new();
        let mut interfaces = VecDeque::new();

        let mut current = Some(ty.clone());
        while let Some(class) = current.take() {
            if !self.contains(&class) {
                break;
            }
            let spec = self.resolve(&class)?;
            for method in &spec.methods {
                let key = (method.name.clone(), method.descriptor.clone());
                if method.access.is_abstract() {
                    if !concrete.contains(&key) && !result.iter().any(|known| known.name == key.0 && known.descriptor == key.1) {
                        result.push(method.clone());
                    }
                } else if !method.access.is_static() {
                    concrete.insert(key);
                }
            }
            interfaces.extend(spec.interfaces.iter().cloned());
            current = next_class(&spec);
        }

        let mut visited = HashSet::new();
        while let Some(name) = interfaces.pop_front() {
            if !visited.insert(name.clone()) {
                continue;
            }
            let interface = Type::object(name);
            if !self.contains(&interface) {
                continue;
            }
            let spec = self.resolve(&interface)?;
            for method in spec.methods.iter().filter(|method| method.access.is_abstract()) {
                let implemented = concrete.contains(&(method.name.clone(), method.descriptor.clone()));
                let known = result.iter().any(|known| known.name == method.name && known.descriptor == method.descriptor);
                if !implemented && !known {
                    result.push(method.clone());
                }
            }
            interfaces.extend(spec.interfaces.iter().cloned());
        }

        Ok(result)
    }

    /// Methods named `name` visible on `ty`, nearest declaration first; overridden ones are skipped
    pub fn methods_named(&self, ty: &Type, name: &str) -> Result<Vec<MethodSpec>> {
        let mut result: Vec<MethodSpec> = Vec::new();
        let mut current = Some(ty.clone());
        while let Some(class) = current.take() {
            if !self.contains(&class) {
                break;
            }
            let spec = self.resolve(&class)?;
            for method in spec.methods.iter().filter(|method| method.name == name) {
                if !result.iter().any(|known| known.descriptor == method.descriptor) {
                    result.push(method.clone());
                }
            }
            current = next_class(&spec);
        }
        Ok(result)
    }
}

fn next_class(spec: &ClassSpec) -> Option<Type> {
    if spec.name == OBJECT_NAME {
        return None;
    }
    spec.parent.clone().map(Type::object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::class_writer::ClassBuilder;
    use crate::codegen::flag::access_flags::*;

    fn class(access: u16, name: &str, parent: &str, interfaces: &[&str], methods: &[(u16, &str, &str)]) -> ClassReference {
        let mut builder = ClassBuilder::new(access, name, parent, interfaces).unwrap();
        if name == OBJECT_NAME {
            builder.class_file_mut().super_class = 0;
        }
        for (access, name, descriptor) in methods {
            builder.declare_method(*access, name, descriptor).unwrap();
        }
        ClassReference::from_bytes(builder.to_bytes()).unwrap()
    }

    fn registry() -> ClassRegistry {
        let interface = ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT;
        ClassRegistry::builder()
            .references(vec![
                class(ACC_PUBLIC, "java/lang/Object", "java/lang/Object", &[], &[]),
                class(ACC_PUBLIC, "android/view/View", "java/lang/Object", &[], &[
                    (ACC_PUBLIC, "setOnClickListener", "(Landroid/view/View$OnClickListener;)V"),
                ]),
                class(ACC_PUBLIC, "android/widget/Button", "android/view/View", &[], &[]),
                class(interface, "android/view/View$OnClickListener", "java/lang/Object", &[], &[
                    (ACC_PUBLIC | ACC_ABSTRACT, "onClick", "(Landroid/view/View;)V"),
                ]),
                class(interface, "com/example/Watcher", "java/lang/Object", &["android/view/View$OnClickListener"], &[
                    (ACC_PUBLIC | ACC_ABSTRACT, "onChanged", "()V"),
                ]),
                class(ACC_PUBLIC | ACC_ABSTRACT, "com/example/BaseWatcher", "java/lang/Object", &["com/example/Watcher"], &[
                    (ACC_PUBLIC, "<init>", "()V"),
                    (ACC_PUBLIC, "onClick", "(Landroid/view/View;)V"),
                ]),
            ])
            .inputs(vec![class(ACC_PUBLIC, "com/example/Target", "android/widget/Button", &[], &[])])
            .build()
    }

    #[test]
    fn test_inputs_are_references() {
        let registry = registry();
        assert!(registry.contains(&Type::object("com/example/Target")));
        assert!(!registry.contains(&Type::object("com/example/Missing")));
        assert!(!registry.contains(&Type::Int));
        let inputs: Vec<&str> = registry.inputs().map(|reference| reference.name.as_str()).collect();
        assert_eq!(inputs, vec!["com/example/Target"]);
    }

    #[test]
    fn test_resolve_is_cached_once() {
        let registry = registry();
        let view = Type::object("android/view/View");
        let first = registry.resolve(&view).unwrap();
        let second = registry.resolve(&view).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(registry.resolved_count(), 1);

        registry.resolve_with(&Type::object("android/widget/Button"), false).unwrap();
        assert_eq!(registry.resolved_count(), 1);
        assert!(matches!(
            registry.resolve(&Type::object("com/example/Missing")),
            Err(Error::UnknownClass { .. })
        ));
    }

    #[test]
    fn test_subclass_queries() {
        let registry = registry();
        let target = Type::object("com/example/Target");
        assert!(registry.is_subclass_of(&target, &Type::object("android/view/View")));
        assert!(registry.is_subclass_of(&target, &target));
        assert!(!registry.is_subclass_of(&Type::object("android/view/View"), &target));
        assert!(!registry.is_subclass_of(&Type::object("com/example/Missing"), &target));
        assert!(registry.is_interface(&Type::object("android/view/View$OnClickListener")));
        assert!(!registry.is_interface(&Type::object("com/example/Missing")));
    }

    #[test]
    fn test_assignability() {
        let registry = registry();
        let view = Type::object("android/view/View");
        let button = Type::object("android/widget/Button");
        let listener = Type::object("android/view/View$OnClickListener");
        assert!(registry.is_assignable(&button, &view));
        assert!(!registry.is_assignable(&view, &button));
        assert!(registry.is_castable(&view, &button));
        assert!(registry.is_assignable(&Type::object("com/example/BaseWatcher"), &listener));
        assert!(registry.is_assignable(&Type::array_of(button.clone()), &Type::array_of(view.clone())));
        assert!(registry.is_assignable(&Type::array_of(Type::Int), &Type::object("java/lang/Object")));
        assert!(!registry.is_assignable(&Type::array_of(Type::Int), &Type::array_of(Type::Long)));
        assert!(!registry.is_assignable(&Type::Int, &Type::Long));
        assert!(!registry.is_castable(&Type::Int, &view));
    }

    #[test]
    fn test_abstract_methods_skip_implemented() {
        let registry = registry();
        let methods = registry.abstract_methods(&Type::object("com/example/BaseWatcher")).unwrap();
        let names: Vec<&str> = methods.iter().map(|method| method.name.as_str()).collect();
        assert_eq!(names, vec!["onChanged"]);

        let methods = registry.abstract_methods(&Type::object("com/example/Watcher")).unwrap();
        let names: Vec<&str> = methods.iter().map(|method| method.name.as_str()).collect();
        assert_eq!(names, vec!["onChanged", "onClick"]);
    }

    #[test]
    fn test_methods_named_walks_parents() {
        let registry = registry();
        let setters = registry.methods_named(&Type::object("android/widget/Button"), "setOnClickListener").unwrap();
        assert_eq!(setters.len(), 1);
        assert_eq!(setters[0].arguments(), &[Type::object("android/view/View$OnClickListener")]);
    }
}

//! A complete generation run
//!
//! Every input class outside the skipped packages is scanned for bindings.
//! A class with bindings yields its binding class, one adapter per listener
//! method and a patched copy of itself; the factory is emitted once at the
//! end. The first error aborts the run.

use std::fmt;

use crate::binding::naming::binding_class_name;
use crate::binding::BindingSpecBuilder;
use crate::codegen::flag::Access;
use crate::common::config::Config;
use crate::common::error::Result;
use crate::consts::extras;
use crate::content::{ClassProvider, ContentSink, GeneratedContent};
use crate::factory::{generate_factory, FactoryEntry};
use crate::generator::{generate_binding, GenerationEnvironment};
use crate::patcher::patch_class;
use crate::registry::ClassRegistry;

/// Number of artifacts of each kind written by a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub bindings: usize,
    pub patched: usize,
    pub listeners: usize,
}

impl GenerationReport {
    fn record(&mut self, content: &GeneratedContent) {
        match content.kind() {
            Some(extras::KIND_BINDING) => self.bindings += 1,
            Some(extras::KIND_PATCHED) => self.patched += 1,
            Some(extras::KIND_LISTENER) => self.listeners += 1,
            _ => {}
        }
    }
}

impl fmt::Display for GenerationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} binding(s), {} patched class(es), {} listener adapter(s)",
            self.bindings, self.patched, self.listeners
        )
    }
}

/// Run generation over `inputs`, resolving types against `inputs` and `references`
pub fn generate(
    config: &Config,
    inputs: &dyn ClassProvider,
    references: &dyn ClassProvider,
    sink: &mut dyn ContentSink,
) -> Result<GenerationReport> {
    config.validate()?;
    let registry = ClassRegistry::builder()
        .references(references.references()?)
        .inputs(inputs.references()?)
        .build();
    generate_with(config, &registry, sink)
}

/// Same as [`generate`] with a prepared registry
pub fn generate_with(config: &Config, registry: &ClassRegistry, sink: &mut dyn ContentSink) -> Result<GenerationReport> {
    let environment = GenerationEnvironment::new(registry, config);
    let mut specs = BindingSpecBuilder::new(registry);
    let mut report = GenerationReport::default();
    let mut entries = Vec::new();

    for reference in registry.inputs() {
        if config.is_skipped(&reference.name) {
            log::debug!("skipping {}", reference.name);
            continue;
        }
        if reference.access.is_annotation() {
            continue;
        }

        let class = registry.resolve(&reference.ty())?;
        let spec = specs.build(class)?;
        if spec.is_empty() {
            log::debug!("{} has no bindings", reference.name);
            continue;
        }
        log::info!(
            "processing {}: {} field binding(s), {} listener binding(s)",
            reference.name,
            spec.fields.len(),
            spec.listeners.len()
        );

        let mut contents = generate_binding(&spec, &environment)?;
        contents.push(patch_class(&reference.open()?, &spec)?);
        for content in &contents {
            log::info!("writing {}", content.path);
            sink.write(content)?;
            report.record(content);
        }
        entries.push(FactoryEntry::new(reference.name.clone(), binding_class_name(config, &reference.name)));
    }

    let factory = generate_factory(config, &entries)?;
    sink.write(&factory)?;
    log::info!("generated {}", report);
    Ok(report)
}

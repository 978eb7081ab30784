//! Sento binding compiler (sentoc)
//!
//! Reads compiled JVM classes, finds fields and methods carrying Sento binding
//! annotations and writes the classes that perform the binding at runtime.
//!
//! ## Architecture
//!
//! - **codegen**: class file model, reader, writer and the method builder
//! - **annotation**: annotation attributes and their typed views
//! - **registry**: lazily parsed class metadata and type queries
//! - **binding**: per-class binding specifications
//! - **generator**: code generators for each binding kind and the binding class
//! - **patcher**: accessibility rewrite of target classes
//! - **factory**: the `SentoFactory` lookup class
//! - **pipeline**: a full run from a class provider to a content sink
//!
//! ## Generation Flow
//!
//! ```text
//! .class files → Registry → BindingSpec → Generators → Target$$SentoBinding
//!                                   ↓                   Target$$SentoBinding$N
//!                                Patcher → Target (public, cache fields, accessors)
//!                                                      SentoFactory
//! ```

pub mod annotation;
pub mod binding;
pub mod codegen;
pub mod common;
pub mod consts;
pub mod content;
pub mod factory;
pub mod generator;
pub mod patcher;
pub mod pipeline;
pub mod registry;

pub use common::config::Config;
pub use common::error::{Error, Result};
pub use content::{
    ClassProvider, ContentSink, DirectoryClassProvider, DirectorySink, GeneratedContent, MemoryClassProvider, MemorySink,
};
pub use pipeline::{generate, GenerationReport};

use std::path::{Path, PathBuf};

use common::classpath::ClasspathResolver;

/// Generate bindings for every class under `input` into `output`.
/// `classpath` lists extra directories holding reference classes.
pub fn generate_directory(input: &Path, output: &Path, classpath: &[PathBuf], config: &Config) -> Result<GenerationReport> {
    let inputs = DirectoryClassProvider::new(input);
    let references = DirectoryClassProvider::with_roots(classpath.to_vec());
    let mut sink = DirectorySink::new(output);
    generate(config, &inputs, &references, &mut sink)
}

/// Like [`generate_directory`], taking the classpath from `--classpath` or the environment
pub fn generate_with_classpath(input: &Path, output: &Path, classpath_arg: Option<&str>, config: &Config) -> Result<GenerationReport> {
    let classpath = ClasspathResolver::resolve_directories(classpath_arg)?;
    generate_directory(input, output, &classpath, config)
}

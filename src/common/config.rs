//! Generation settings

use crate::codegen::defs::{JAVA_1_7, JAVA_1_6};
use crate::common::error::{Error, Result};

/// Settings shared by every generator in a run
#[derive(Debug, Clone)]
pub struct Config {
    /// Class file major version of every emitted class
    pub major_version: u16,
    pub minor_version: u16,
    /// Appended to the original internal name to form the binding class name
    pub binding_suffix: String,
    /// Internal name of the lookup factory
    pub factory_name: String,
    /// Internal-name prefixes that are never scanned for bindings
    pub skip_packages: Vec<String>,
    /// Emit StackMapTable attributes for generated methods
    pub emit_frames: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            major_version: JAVA_1_7,
            minor_version: 0,
            binding_suffix: "$$SentoBinding".to_string(),
            factory_name: "io/sento/SentoFactory".to_string(),
            skip_packages: ["java/", "javax/", "android/", "kotlin/", "io/sento/"]
                .iter()
                .map(|prefix| prefix.to_string())
                .collect(),
            emit_frames: true,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_major_version(mut self, major_version: u16) -> Self {
        self.major_version = major_version;
        self
    }

    pub fn with_binding_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.binding_suffix = suffix.into();
        self
    }

    pub fn with_factory_name(mut self, name: impl Into<String>) -> Self {
        self.factory_name = name.into();
        self
    }

    pub fn with_skip_package(mut self, prefix: impl Into<String>) -> Self {
        self.skip_packages.push(prefix.into());
        self
    }

    pub fn with_emit_frames(mut self, emit_frames: bool) -> Self {
        self.emit_frames = emit_frames;
        self
    }

    /// Whether classes with this internal name are never scanned
    pub fn is_skipped(&self, internal_name: &str) -> bool {
        self.skip_packages.iter().any(|prefix| internal_name.starts_with(prefix.as_str()))
    }

    /// Reject settings that cannot produce loadable classes
    pub fn validate(&self) -> Result<()> {
        if self.major_version < JAVA_1_6 {
            return Err(Error::config_error(format!(
                "class file version {} is not supported, the minimum is {}",
                self.major_version, JAVA_1_6
            )));
        }
        if self.binding_suffix.is_empty() {
            return Err(Error::config_error("binding suffix must not be empty"));
        }
        if self.factory_name.is_empty() || self.factory_name.contains('.') {
            return Err(Error::config_error(format!(
                "factory name '{}' must be a non-empty internal name",
                self.factory_name
            )));
        }
        Ok(())
    }
}

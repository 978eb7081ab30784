use thiserror::Error;

use crate::codegen::error::{BytecodeError, ConstPoolError, DescriptorError};

/// Result type for sentoc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the binding generator
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Malformed class file: {message}")]
    ClassFormat { message: String },

    #[error("Constant pool error: {0}")]
    ConstPool(#[from] ConstPoolError),

    #[error("Bytecode error: {0}")]
    Bytecode(#[from] BytecodeError),

    #[error("Descriptor error: {0}")]
    Descriptor(#[from] DescriptorError),

    /// A binding annotation is used in a way that cannot be generated.
    #[error("{message}")]
    Binding { message: String },

    /// A generator asked for something that must exist. Always a bug.
    #[error("No such element: {message}")]
    NoSuchElement { message: String },

    #[error("Unknown class: {name}")]
    UnknownClass { name: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl Error {
    /// Create a binding validation error
    pub fn binding_error(message: impl Into<String>) -> Self {
        Self::Binding { message: message.into() }
    }

    /// Create an internal invariant error
    pub fn no_such_element(message: impl Into<String>) -> Self {
        Self::NoSuchElement { message: message.into() }
    }

    /// Create a class format error
    pub fn class_format_error(message: impl Into<String>) -> Self {
        Self::ClassFormat { message: message.into() }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }
}

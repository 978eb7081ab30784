//! Specific error types for class file operations

use thiserror::Error;

/// Errors that can occur during constant pool operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstPoolError {
    #[error("Constant pool is out of space")]
    OutOfSpace,
    #[error("Invalid constant pool index: {0}")]
    InvalidIndex(u16),
    #[error("Constant pool entry {index} is not a {expected}")]
    UnexpectedEntry { index: u16, expected: &'static str },
}

/// Errors that can occur during bytecode generation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BytecodeError {
    #[error("Stack underflow at offset {offset}")]
    StackUnderflow { offset: usize },
    #[error("Local variable index out of bounds: {index}")]
    LocalIndexOutOfBounds { index: u32 },
    #[error("Branch target too far: {offset}")]
    BranchTooFar { offset: i32 },
    #[error("Label {label} was used but never marked")]
    UnmarkedLabel { label: usize },
    #[error("Label {label} was marked twice")]
    LabelAlreadyMarked { label: usize },
    #[error("Inconsistent stack height at offset {offset}: {expected} vs {found}")]
    InconsistentStack { offset: usize, expected: usize, found: usize },
    #[error("Code too large: {size} bytes")]
    CodeTooLarge { size: usize },
}

/// Errors that can occur while parsing descriptors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("Invalid type descriptor: {descriptor}")]
    InvalidTypeDescriptor { descriptor: String },
    #[error("Invalid method descriptor: {descriptor}")]
    InvalidMethodDescriptor { descriptor: String },
}

/// Generic result type for constant pool operations
pub type ConstPoolResult<T> = Result<T, ConstPoolError>;

/// Generic result type for bytecode operations
pub type BytecodeResult<T> = Result<T, BytecodeError>;

/// Generic result type for descriptor parsing
pub type DescriptorResult<T> = Result<T, DescriptorError>;

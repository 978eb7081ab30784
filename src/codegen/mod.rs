//! Class file model and emission
//!
//! Reading and writing of JVM class files, plus the builders used by the
//! generators to emit new classes and methods.

pub mod attribute;
pub mod class;
pub mod class_writer;
pub mod constpool;
pub mod defs;
pub mod descriptor;
pub mod error;
pub mod field;
pub mod flag;
pub mod frame;
pub mod instruction;
pub mod method;
pub mod method_writer;
pub mod opcodes;
pub mod reader;
pub mod writer;

// Re-export commonly used types
pub use class::ClassFile;
pub use class_writer::ClassBuilder;
pub use constpool::{Constant, ConstantPool};
pub use descriptor::{MethodType, Type};
pub use error::{BytecodeError, ConstPoolError, DescriptorError};
pub use method_writer::{Label, MethodBuilder};
pub use reader::parse_class;
pub use writer::ClassfileWritable;

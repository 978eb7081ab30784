//! Common utilities and definitions shared across modules
//!
//! Error types, generation settings and classpath resolution.

pub mod classpath;
pub mod config;
pub mod error;

pub use config::Config;
pub use error::{Error, Result};

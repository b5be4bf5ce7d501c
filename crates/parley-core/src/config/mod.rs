//! Configuration for the assistant engine and its tools.
//!
//! Configuration comes from a YAML file, then environment variables are
//! layered on top by `ConfigLoader`.

pub mod loader;
pub mod types;

pub use loader::*;
pub use types::*;

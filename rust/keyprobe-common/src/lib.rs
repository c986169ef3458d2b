//! Core definitions (error model and argument/data verification helpers), relied upon
//! by all keyprobe-* crates.

pub mod error;
pub mod result;

pub use result::Result;

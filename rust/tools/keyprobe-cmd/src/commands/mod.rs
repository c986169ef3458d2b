//! Command implementations for keyprobe-cmd

pub mod check_keys;
pub mod run;

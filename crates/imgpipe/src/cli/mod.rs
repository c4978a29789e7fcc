//! Command implementations.

pub mod config;
pub mod console;
pub mod prompt;
pub mod run;

//! Core engine: from command-set directories to command descriptors.

pub mod codegen;
pub mod config;
pub mod error;
pub mod executor;
pub mod parser;
pub mod resolver;
pub mod staging;
pub mod types;
pub mod variables;

//! cmdset: templated command orchestration.
//!
//! Directories of YAML templates are rendered with variables, read as
//! declarative command documents, and turned into ordered `kubectl`/`helm`
//! invocations that run one after another.

pub mod cli;
pub mod commands;
pub mod core;
pub mod transport;

//! Transport abstraction: how a built command reaches a process.

pub mod local;

use crate::core::error::Result;
use crate::core::types::CommandDescriptor;

/// Output from executing one command.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs command descriptors. `Err` means the process could not be started;
/// a started process always yields an [`ExecOutput`].
pub trait CommandRunner {
    fn run(&self, command: &CommandDescriptor) -> Result<ExecOutput>;
}

/// Records every command it is handed and reports success without running
/// anything. Backs `apply --dry-run`.
#[derive(Debug, Default)]
pub struct DryRunner {
    seen: std::cell::RefCell<Vec<CommandDescriptor>>,
}

impl DryRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands passed to [`CommandRunner::run`] so far, in order.
    pub fn seen(&self) -> Vec<CommandDescriptor> {
        self.seen.borrow().clone()
    }
}

impl CommandRunner for DryRunner {
    fn run(&self, command: &CommandDescriptor) -> Result<ExecOutput> {
        tracing::info!("[dry-run] {}", command);
        self.seen.borrow_mut().push(command.clone());
        Ok(ExecOutput {
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
        })
    }
}

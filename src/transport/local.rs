//! Local execution transport.

use super::{CommandRunner, ExecOutput};
use crate::core::error::{EngineError, Result};
use crate::core::types::CommandDescriptor;
use std::process::{Command, Stdio};

/// Run argv directly. No shell is involved, so arguments are never
/// re-split or expanded.
pub fn exec_local(argv: &[String]) -> Result<ExecOutput> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| EngineError::InvalidArgument("cannot run an empty argv".to_string()))?;

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| EngineError::Spawn {
            program: program.clone(),
            source: e,
        })?;

    let output = child.wait_with_output().map_err(|e| EngineError::Spawn {
        program: program.clone(),
        source: e,
    })?;

    Ok(ExecOutput {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

/// Runs commands as local subprocesses and logs their output.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalRunner;

impl CommandRunner for LocalRunner {
    fn run(&self, command: &CommandDescriptor) -> Result<ExecOutput> {
        let out = exec_local(command.argv())?;
        for line in out.stdout.lines() {
            tracing::info!("{}", line);
        }
        for line in out.stderr.lines() {
            tracing::warn!("{}", line);
        }
        tracing::debug!("{} exited with {}", command.program(), out.exit_code);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_local_echo() {
        let out = exec_local(&argv(&["echo", "hello"])).unwrap();
        assert!(out.success());
        assert_eq!(out.stdout.trim(), "hello");
    }

    #[test]
    fn test_local_failure() {
        let out = exec_local(&argv(&["false"])).unwrap();
        assert!(!out.success());
        assert_eq!(out.exit_code, 1);
    }

    #[test]
    fn test_local_no_shell_expansion() {
        let out = exec_local(&argv(&["echo", "$HOME", "a  b"])).unwrap();
        assert_eq!(out.stdout.trim_end(), "$HOME a  b");
    }

    #[test]
    fn test_local_stderr_captured() {
        let out = exec_local(&argv(&["ls", "/definitely/not/here"])).unwrap();
        assert!(!out.success());
        assert!(!out.stderr.is_empty());
    }

    #[test]
    fn test_local_missing_program() {
        let result = exec_local(&argv(&["cmdset-no-such-program"]));
        assert!(matches!(result, Err(EngineError::Spawn { .. })));
    }

    #[test]
    fn test_local_empty_argv() {
        assert!(matches!(exec_local(&[]), Err(EngineError::InvalidArgument(_))));
    }

    #[test]
    fn test_local_runner_runs_descriptor() {
        let cmd = CommandDescriptor::new(argv(&["true"]));
        let out = LocalRunner.run(&cmd).unwrap();
        assert!(out.success());
    }
}

//! Result types for command execution

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ExecError;

/// Result of a command execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResult {
    /// Exit status code (0 for success)
    pub status: i32,
    /// stdout output
    pub stdout: String,
    /// stderr output
    pub stderr: String,
    /// Time taken to execute
    pub duration: Duration,
}

impl CommandResult {
    /// Check if command succeeded (exit code 0)
    #[must_use]
    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// Turn a non-zero exit status into an error
    ///
    /// # Errors
    /// Returns `CommandFailed` if the command did not exit with 0
    pub fn into_result(self) -> Result<Self, ExecError> {
        if self.success() {
            Ok(self)
        } else {
            Err(ExecError::CommandFailed {
                status: self.status,
                stderr: self.stderr,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(status: i32, stderr: &str) -> CommandResult {
        CommandResult {
            status,
            stdout: "out".to_string(),
            stderr: stderr.to_string(),
            duration: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_into_result() {
        assert!(result(0, "").into_result().is_ok());

        let err = result(3, "boom").into_result().unwrap_err();
        assert!(matches!(err, ExecError::CommandFailed { status: 3, .. }));
    }
}

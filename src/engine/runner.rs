//! Shell execution of validation commands

use std::process::Stdio;
use tokio::process::Command;

/// Outcome of one validation command run
///
/// A spawn error (shell or binary missing) is reported through `passed:
/// false` with the error in `stderr`: command failure is a workflow outcome,
/// not a fault.
pub struct ValidationOutcome {
    pub passed: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ValidationOutcome {
    /// stdout and stderr combined, as recorded on the failure path
    pub fn combined_output(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

#[cfg(unix)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

/// Run `command` through the platform shell, capturing output and exit status
///
/// No timeout: the run is bounded only by the command itself, and is not
/// cancellable once started.
pub async fn run_shell(command: &str) -> ValidationOutcome {
    let output = shell_command(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await;

    match output {
        Ok(output) => ValidationOutcome {
            passed: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        },
        Err(e) => ValidationOutcome {
            passed: false,
            stdout: String::new(),
            stderr: format!("Failed to execute '{}': {}", command, e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_zero_exit_passes() {
        let outcome = run_shell("printf ok").await;
        assert!(outcome.passed);
        assert_eq!(outcome.stdout, "ok");
    }

    #[tokio::test]
    async fn test_nonzero_exit_fails_with_output() {
        let outcome = run_shell("printf out; printf err >&2; exit 3").await;
        assert!(!outcome.passed);
        assert!(outcome.combined_output().contains("out"));
        assert!(outcome.combined_output().contains("err"));
    }

    #[tokio::test]
    async fn test_missing_binary_fails() {
        let outcome = run_shell("definitely-not-a-real-binary-54321").await;
        assert!(!outcome.passed);
    }
}

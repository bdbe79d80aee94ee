//! Typed error taxonomy for the phase engine
//!
//! Guard violations are recoverable: the caller can advance the workflow or
//! reset. Store corruption is not, and is surfaced without auto-repair.

use crate::models::Phase;
use crate::state::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid phase: current phase is {current}, '{operation}' requires {required}")]
    InvalidPhase {
        operation: &'static str,
        current: Phase,
        required: &'static str,
    },

    #[error("Zero-trust rejection: command '{command}' is a trivial bypass")]
    TrivialBypass { command: String },

    #[error("You are in ANTIFRAGILITY: 'regression_test_path' is required to prove this bug now has a test")]
    MissingEvidence,

    #[error("Regression test path '{path}' is outside the managed root")]
    PathOutsideRoot { path: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Whether the caller can recover by changing its next request
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, EngineError::Store(_))
    }

    /// Remediation hint appended to the protocol-level error text
    pub fn advice(&self) -> &'static str {
        match self {
            EngineError::InvalidPhase { .. } => {
                "Check the current phase via the ipa://status resource, then advance the \
                 workflow in order, or call 'reset_cycle' if you are stuck."
            }
            EngineError::TrivialBypass { .. } => {
                "Provide a command that actually exercises the change, such as a real test \
                 runner invocation."
            }
            EngineError::MissingEvidence => {
                "Create a regression test covering this bug first, then register the failure \
                 with its path."
            }
            EngineError::PathOutsideRoot { .. } => {
                "Use a regression test path inside the managed project root."
            }
            EngineError::Store(StoreError::Corrupt { .. }) => {
                "The state file was edited or corrupted externally. Inspect .ipa/state.json \
                 by hand; the guardian never silently resets it."
            }
            EngineError::Store(StoreError::Io { .. }) => {
                "Check filesystem permissions on the .ipa directory."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_guard_errors_are_recoverable() {
        let err = EngineError::InvalidPhase {
            operation: "define_contract",
            current: Phase::Idle,
            required: "INTENT",
        };
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("IDLE"));
        assert!(err.to_string().contains("INTENT"));
    }

    #[test]
    fn test_corruption_is_not_recoverable() {
        let err = EngineError::Store(StoreError::Corrupt {
            path: PathBuf::from("/tmp/state.json"),
            reason: "bad".into(),
        });
        assert!(!err.is_recoverable());
        assert!(err.advice().contains("state.json"));
    }
}

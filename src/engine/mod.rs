//! Phase Engine - the IPA workflow state machine
//!
//! Legal transitions:
//!
//! ```text
//! IDLE --(register_intent)--> INTENT
//! INTENT --(define_contract)--> IMPLEMENTATION   (CONTRACT is logical-only)
//! IMPLEMENTATION/VALIDATION_PENDING/ANTIFRAGILITY --(run_validation)--> VALIDATION_PENDING
//!     then VALIDATED on exit 0, ANTIFRAGILITY otherwise
//! VALIDATED --(finish_cycle)--> IDLE   (archives into history)
//! any --(reset)--> IDLE                (discards, never archives)
//! ```
//!
//! Every operation is a synchronous load -> guard -> mutate -> save round
//! trip against the state store; only command execution awaits.

mod error;
pub mod runner;

pub use error::EngineError;

use crate::models::{
    ipa::now_millis, ArchivedCycle, Contract, Failure, Intent, IpaState, Phase,
};
use crate::state::IpaStateManager;
use crate::{security, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;

/// Derived read-only metrics over the archived history
#[derive(Debug, Serialize)]
pub struct Metrics {
    pub total_cycles: usize,
    pub cycles_with_failure: usize,
    pub current_phase: Phase,
}

/// The workflow state machine for one managed root
///
/// Constructed once per root and passed by reference into every operation
/// handler. Holds no in-memory state beyond the store handle: the document on
/// disk is the single source of truth.
pub struct PhaseEngine {
    store: IpaStateManager,
}

impl PhaseEngine {
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            store: IpaStateManager::new(root.as_ref())?,
        })
    }

    /// The managed root directory
    pub fn root(&self) -> &Path {
        self.store.root()
    }

    /// Full current state snapshot
    pub fn snapshot(&self) -> std::result::Result<IpaState, EngineError> {
        Ok(self.store.load()?)
    }

    /// Current state as pretty-printed JSON, for the status resource
    pub fn status_json(&self) -> std::result::Result<String, EngineError> {
        let state = self.store.load()?;
        // The document round-trips through serde, so this cannot fail in practice
        serde_json::to_string_pretty(&state).map_err(|e| {
            EngineError::Store(crate::state::StoreError::Corrupt {
                path: self.store.state_path().to_path_buf(),
                reason: e.to_string(),
            })
        })
    }

    /// Derived metrics over the archived history
    pub fn metrics(&self) -> std::result::Result<Metrics, EngineError> {
        let state = self.store.load()?;
        Ok(Metrics {
            total_cycles: state.history.len(),
            cycles_with_failure: state
                .history
                .iter()
                .filter(|cycle| cycle.failure.is_some())
                .count(),
            current_phase: state.current_phase,
        })
    }

    /// Acknowledge a new cycle. Informational: phase stays IDLE.
    pub fn init_cycle(&self, task_description: &str) -> std::result::Result<String, EngineError> {
        let state = self.store.load()?;
        if state.current_phase != Phase::Idle {
            return Err(EngineError::InvalidPhase {
                operation: "init_ipa_cycle",
                current: state.current_phase,
                required: "IDLE",
            });
        }

        Ok(format!(
            "IPA cycle initialized for: \"{}\".\n\
             Current Phase: IDLE.\n\
             Next Step: Call 'register_intent' to declare what will change.",
            task_description
        ))
    }

    /// Step 1: declare what will change. Idempotent while still in INTENT.
    pub fn register_intent(
        &self,
        description: String,
        component: String,
    ) -> std::result::Result<String, EngineError> {
        let mut state = self.store.load()?;
        if !matches!(state.current_phase, Phase::Idle | Phase::Intent) {
            return Err(EngineError::InvalidPhase {
                operation: "register_intent",
                current: state.current_phase,
                required: "IDLE or INTENT",
            });
        }

        state.current_intent = Some(Intent {
            description,
            component,
            timestamp: now_millis(),
        });
        state.current_phase = Phase::Intent;
        self.store.save(&state)?;

        Ok("Intent registered.\n\
            Current Phase: INTENT.\n\
            Next Step: Call 'define_contract' to specify inputs, outputs and invariants."
            .to_string())
    }

    /// Step 2: declare the contract, then go straight to IMPLEMENTATION
    pub fn define_contract(
        &self,
        inputs: Map<String, Value>,
        expected_outputs: Map<String, Value>,
        invariants: Vec<String>,
    ) -> std::result::Result<String, EngineError> {
        let mut state = self.store.load()?;
        if state.current_phase != Phase::Intent {
            return Err(EngineError::InvalidPhase {
                operation: "define_contract",
                current: state.current_phase,
                required: "INTENT",
            });
        }

        state.current_contract = Some(Contract {
            inputs,
            expected_outputs,
            invariants,
            timestamp: now_millis(),
        });
        // CONTRACT is a logical marker only; it is never persisted
        state.current_phase = Phase::Implementation;
        self.store.save(&state)?;

        Ok("Contract defined.\n\
            Current Phase: IMPLEMENTATION.\n\
            Action: You may now generate or modify code.\n\
            Next Step: After coding, call 'run_validation_step'."
            .to_string())
    }

    /// Step 3: run a validation command
    ///
    /// Exit 0 leads to VALIDATED, anything else (including a spawn error)
    /// to ANTIFRAGILITY. The failure path returns `Ok` text: a failing test
    /// is a workflow outcome, not a system error.
    pub async fn run_validation(
        &self,
        command: &str,
        description: &str,
    ) -> std::result::Result<String, EngineError> {
        let mut state = self.store.load()?;
        if !matches!(
            state.current_phase,
            Phase::Implementation | Phase::ValidationPending | Phase::Antifragility
        ) {
            return Err(EngineError::InvalidPhase {
                operation: "run_validation_step",
                current: state.current_phase,
                required: "IMPLEMENTATION, VALIDATION_PENDING or ANTIFRAGILITY",
            });
        }

        if is_trivial_bypass(command) {
            return Err(EngineError::TrivialBypass {
                command: command.to_string(),
            });
        }

        state.current_phase = Phase::ValidationPending;
        self.store.save(&state)?;

        let outcome = runner::run_shell(command).await;

        state.last_validation_command = Some(command.to_string());
        if outcome.passed {
            state.last_validation_output = Some(outcome.stdout.clone());
            state.current_phase = Phase::Validated;
            self.store.save(&state)?;

            Ok(format!(
                "Validation PASSED: {}\n\
                 Command: {}\n\
                 Output:\n{}\n\n\
                 Current Phase: VALIDATED.\n\
                 Next Step: Call 'finish_cycle' to archive this cycle.",
                description, command, outcome.stdout
            ))
        } else {
            let combined = outcome.combined_output();
            state.last_validation_output = Some(combined.clone());
            state.current_phase = Phase::Antifragility;
            self.store.save(&state)?;

            Ok(format!(
                "Validation FAILED: {}\n\
                 Command: {}\n\
                 Error Output:\n{}\n\n\
                 Current Phase: ANTIFRAGILITY.\n\
                 Action: You MUST fix the code and/or the test.\n\
                 Next Step: Call 'register_failure' to document the root cause, \
                 then fix and re-run validation.",
                description, command, combined
            ))
        }
    }

    /// Step 4.1: document a failure. Phase is unchanged; the next validation
    /// run transitions out of ANTIFRAGILITY.
    pub fn register_failure(
        &self,
        error_log: String,
        root_cause: String,
        immunity_plan: String,
        regression_test_path: Option<String>,
    ) -> std::result::Result<String, EngineError> {
        let mut state = self.store.load()?;

        if state.current_phase == Phase::Antifragility && regression_test_path.is_none() {
            return Err(EngineError::MissingEvidence);
        }

        if let Some(ref path) = regression_test_path {
            security::validate_path(self.store.root(), path).map_err(|_| {
                EngineError::PathOutsideRoot { path: path.clone() }
            })?;
        }

        state.current_failure = Some(Failure {
            error_log,
            root_cause,
            immunity_plan,
            regression_test_path,
            timestamp: now_millis(),
        });
        self.store.save(&state)?;

        Ok("Failure registered.\n\
            Action: Implement the immunity plan.\n\
            Next Step: Fix the code and call 'run_validation_step' again."
            .to_string())
    }

    /// Complete the cycle: archive to history and return to IDLE
    pub fn finish_cycle(&self) -> std::result::Result<String, EngineError> {
        let mut state = self.store.load()?;
        if state.current_phase != Phase::Validated {
            return Err(EngineError::InvalidPhase {
                operation: "finish_cycle",
                current: state.current_phase,
                required: "VALIDATED",
            });
        }

        if let Some(intent) = state.current_intent.take() {
            state.history.push(ArchivedCycle {
                intent,
                contract: state.current_contract.take(),
                failure: state.current_failure.take(),
                completed_at: now_millis(),
            });
        }
        state.current_contract = None;
        state.current_failure = None;
        state.last_validation_output = None;
        state.last_validation_command = None;
        state.current_phase = Phase::Idle;
        self.store.save(&state)?;

        Ok("Cycle completed. Archived to history and state reset to IDLE.".to_string())
    }

    /// Unconditional escape hatch: discard the current cycle, keep history
    pub fn reset(&self) -> std::result::Result<String, EngineError> {
        let mut state = self.store.load()?;
        state.current_phase = Phase::Idle;
        state.current_intent = None;
        state.current_contract = None;
        state.current_failure = None;
        self.store.save(&state)?;

        Ok("State reset to IDLE. Nothing was archived.".to_string())
    }
}

/// Known no-op patterns an agent could use to fake a passing validation
fn is_trivial_bypass(command: &str) -> bool {
    let trimmed = command.trim();
    trimmed == "true"
        || trimmed == "exit 0"
        || trimmed == "echo"
        || trimmed.starts_with("echo ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn engine() -> (TempDir, PhaseEngine) {
        let temp_dir = TempDir::new().unwrap();
        let engine = PhaseEngine::new(temp_dir.path()).unwrap();
        (temp_dir, engine)
    }

    fn object(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn advance_to_implementation(engine: &PhaseEngine) {
        engine
            .register_intent("add retry".into(), "fetcher".into())
            .unwrap();
        engine
            .define_contract(
                object(&[("x", json!(1))]),
                object(&[("y", json!(2))]),
                vec!["y>0".into()],
            )
            .unwrap();
    }

    #[test]
    fn test_register_intent_from_idle() {
        let (_temp, engine) = engine();

        engine
            .register_intent("add retry".into(), "fetcher".into())
            .unwrap();

        let state = engine.snapshot().unwrap();
        assert_eq!(state.current_phase, Phase::Intent);
        let intent = state.current_intent.unwrap();
        assert_eq!(intent.description, "add retry");
        assert_eq!(intent.component, "fetcher");
        assert!(intent.timestamp > 0);
    }

    #[test]
    fn test_register_intent_is_idempotent_in_intent_phase() {
        let (_temp, engine) = engine();

        engine.register_intent("v1".into(), "a".into()).unwrap();
        engine.register_intent("v2".into(), "b".into()).unwrap();

        let state = engine.snapshot().unwrap();
        assert_eq!(state.current_phase, Phase::Intent);
        assert_eq!(state.current_intent.unwrap().description, "v2");
    }

    #[test]
    fn test_register_intent_rejected_mid_cycle() {
        let (_temp, engine) = engine();
        advance_to_implementation(&engine);

        let err = engine
            .register_intent("again".into(), "x".into())
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidPhase { .. }));
    }

    #[test]
    fn test_define_contract_requires_intent_phase() {
        let (_temp, engine) = engine();

        let err = engine
            .define_contract(Map::new(), Map::new(), vec![])
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidPhase {
                current: Phase::Idle,
                ..
            }
        ));

        // State untouched by the rejected operation
        let state = engine.snapshot().unwrap();
        assert_eq!(state.current_phase, Phase::Idle);
        assert!(state.current_contract.is_none());
    }

    #[test]
    fn test_define_contract_skips_contract_marker() {
        let (_temp, engine) = engine();
        advance_to_implementation(&engine);

        let state = engine.snapshot().unwrap();
        assert_eq!(state.current_phase, Phase::Implementation);
        let contract = state.current_contract.unwrap();
        assert_eq!(contract.inputs.get("x"), Some(&json!(1)));
        assert_eq!(contract.invariants, vec!["y>0".to_string()]);
    }

    #[tokio::test]
    async fn test_trivial_bypass_rejected_before_execution() {
        let (_temp, engine) = engine();
        advance_to_implementation(&engine);

        for command in ["echo ok", "  true ", "exit 0"] {
            let err = engine.run_validation(command, "fake").await.unwrap_err();
            assert!(matches!(err, EngineError::TrivialBypass { .. }), "{command}");
        }

        // Phase unchanged: the commands never ran
        let state = engine.snapshot().unwrap();
        assert_eq!(state.current_phase, Phase::Implementation);
    }

    #[tokio::test]
    async fn test_validation_requires_implementation_phase() {
        let (_temp, engine) = engine();

        let err = engine.run_validation("printf ok", "too early").await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidPhase { .. }));
    }

    #[tokio::test]
    async fn test_passing_validation_records_stdout() {
        let (_temp, engine) = engine();
        advance_to_implementation(&engine);

        let text = engine
            .run_validation("printf passing-output", "unit tests")
            .await
            .unwrap();
        assert!(text.contains("Validation PASSED"));

        let state = engine.snapshot().unwrap();
        assert_eq!(state.current_phase, Phase::Validated);
        assert_eq!(
            state.last_validation_output.as_deref(),
            Some("passing-output")
        );
        assert_eq!(
            state.last_validation_command.as_deref(),
            Some("printf passing-output")
        );
    }

    #[tokio::test]
    async fn test_failing_validation_enters_antifragility() {
        let (_temp, engine) = engine();
        advance_to_implementation(&engine);

        let text = engine
            .run_validation("printf boom >&2; exit 1", "unit tests")
            .await
            .unwrap();
        assert!(text.contains("Validation FAILED"));

        let state = engine.snapshot().unwrap();
        assert_eq!(state.current_phase, Phase::Antifragility);
        assert!(state.last_validation_output.unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn test_antifragility_self_loop_on_repeat_failure() {
        let (_temp, engine) = engine();
        advance_to_implementation(&engine);

        engine.run_validation("exit 1", "first").await.unwrap();
        engine.run_validation("exit 1", "second").await.unwrap();

        let state = engine.snapshot().unwrap();
        assert_eq!(state.current_phase, Phase::Antifragility);
    }

    #[tokio::test]
    async fn test_register_failure_requires_evidence_in_antifragility() {
        let (_temp, engine) = engine();
        advance_to_implementation(&engine);
        engine.run_validation("exit 1", "fail").await.unwrap();

        let err = engine
            .register_failure("log".into(), "cause".into(), "plan".into(), None)
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingEvidence));

        engine
            .register_failure(
                "log".into(),
                "cause".into(),
                "plan".into(),
                Some("tests/regression.rs".into()),
            )
            .unwrap();

        let state = engine.snapshot().unwrap();
        // Registration does not itself transition phase
        assert_eq!(state.current_phase, Phase::Antifragility);
        assert_eq!(
            state
                .current_failure
                .unwrap()
                .regression_test_path
                .as_deref(),
            Some("tests/regression.rs")
        );
    }

    #[tokio::test]
    async fn test_register_failure_rejects_escaping_path() {
        let (_temp, engine) = engine();
        advance_to_implementation(&engine);
        engine.run_validation("exit 1", "fail").await.unwrap();

        let err = engine
            .register_failure(
                "log".into(),
                "cause".into(),
                "plan".into(),
                Some("../../outside.rs".into()),
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::PathOutsideRoot { .. }));
    }

    #[test]
    fn test_register_failure_outside_antifragility_needs_no_evidence() {
        let (_temp, engine) = engine();
        advance_to_implementation(&engine);

        engine
            .register_failure("log".into(), "cause".into(), "plan".into(), None)
            .unwrap();

        let state = engine.snapshot().unwrap();
        assert_eq!(state.current_phase, Phase::Implementation);
        assert!(state.current_failure.is_some());
    }

    #[tokio::test]
    async fn test_finish_cycle_archives_and_resets() {
        let (_temp, engine) = engine();
        advance_to_implementation(&engine);
        engine.run_validation("printf ok2", "tests").await.unwrap();

        engine.finish_cycle().unwrap();

        let state = engine.snapshot().unwrap();
        assert_eq!(state.current_phase, Phase::Idle);
        assert!(state.current_intent.is_none());
        assert!(state.current_contract.is_none());
        assert!(state.current_failure.is_none());
        assert!(state.last_validation_output.is_none());
        assert_eq!(state.history.len(), 1);
        assert_eq!(state.history[0].intent.description, "add retry");
        assert!(state.history[0].contract.is_some());
    }

    #[test]
    fn test_finish_cycle_requires_validated() {
        let (_temp, engine) = engine();
        advance_to_implementation(&engine);

        let err = engine.finish_cycle().unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidPhase {
                current: Phase::Implementation,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_reset_discards_without_archiving() {
        let (_temp, engine) = engine();

        // Complete one cycle so history is non-empty
        advance_to_implementation(&engine);
        engine.run_validation("printf ok", "tests").await.unwrap();
        engine.finish_cycle().unwrap();

        // Start and abandon a second one
        engine.register_intent("abandoned".into(), "x".into()).unwrap();
        engine.reset().unwrap();

        let state = engine.snapshot().unwrap();
        assert_eq!(state.current_phase, Phase::Idle);
        assert!(state.current_intent.is_none());
        assert_eq!(state.history.len(), 1, "reset must not archive");
    }

    #[test]
    fn test_init_cycle_requires_idle() {
        let (_temp, engine) = engine();

        let text = engine.init_cycle("improve the parser").unwrap();
        assert!(text.contains("improve the parser"));

        engine.register_intent("d".into(), "c".into()).unwrap();
        let err = engine.init_cycle("another").unwrap_err();
        assert!(matches!(err, EngineError::InvalidPhase { .. }));
    }

    #[tokio::test]
    async fn test_metrics_counts_failed_cycles() {
        let (_temp, engine) = engine();

        // Cycle 1: clean pass
        advance_to_implementation(&engine);
        engine.run_validation("printf ok", "tests").await.unwrap();
        engine.finish_cycle().unwrap();

        // Cycle 2: fails once, gets a failure record, then passes
        engine.register_intent("fix bug".into(), "parser".into()).unwrap();
        engine
            .define_contract(Map::new(), Map::new(), vec![])
            .unwrap();
        engine.run_validation("exit 1", "tests").await.unwrap();
        engine
            .register_failure(
                "log".into(),
                "cause".into(),
                "plan".into(),
                Some("tests/t.rs".into()),
            )
            .unwrap();
        engine.run_validation("printf ok", "tests").await.unwrap();
        engine.finish_cycle().unwrap();

        let metrics = engine.metrics().unwrap();
        assert_eq!(metrics.total_cycles, 2);
        assert_eq!(metrics.cycles_with_failure, 1);
        assert_eq!(metrics.current_phase, Phase::Idle);
    }

    #[test]
    fn test_status_json_is_pretty_state() {
        let (_temp, engine) = engine();
        let json = engine.status_json().unwrap();
        assert!(json.contains("\"current_phase\": \"IDLE\""));
    }
}

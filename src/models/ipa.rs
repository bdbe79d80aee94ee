//! IPA state document: phases, records, and the persisted root object

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Workflow phase values
///
/// `Contract` is a logical-only marker: `define_contract` transitions straight
/// to `Implementation`, but the variant stays loadable for older state files.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Idle,
    Intent,
    Contract,
    Implementation,
    ValidationPending,
    Validated,
    Antifragility,
}

impl Phase {
    /// The string persisted in state.json
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "IDLE",
            Phase::Intent => "INTENT",
            Phase::Contract => "CONTRACT",
            Phase::Implementation => "IMPLEMENTATION",
            Phase::ValidationPending => "VALIDATION_PENDING",
            Phase::Validated => "VALIDATED",
            Phase::Antifragility => "ANTIFRAGILITY",
        }
    }

    /// Whether an intent record must be present in this phase
    pub fn requires_intent(&self) -> bool {
        !matches!(self, Phase::Idle)
    }

    /// Whether a contract record must be present in this phase
    pub fn requires_contract(&self) -> bool {
        matches!(
            self,
            Phase::Implementation
                | Phase::ValidationPending
                | Phase::Validated
                | Phase::Antifragility
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared change under way
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Intent {
    pub description: String,
    pub component: String,
    /// Unix epoch milliseconds
    pub timestamp: i64,
}

/// Example inputs/outputs and invariants the change must satisfy
///
/// Inputs and outputs are opaque JSON maps: the engine stores and returns
/// them, it never interprets the values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contract {
    pub inputs: Map<String, Value>,
    pub expected_outputs: Map<String, Value>,
    pub invariants: Vec<String>,
    pub timestamp: i64,
}

/// Diagnosed validation failure and its immunity plan
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Failure {
    pub error_log: String,
    pub root_cause: String,
    pub immunity_plan: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub regression_test_path: Option<String>,
    pub timestamp: i64,
}

/// One archived cycle; immutable once appended to history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArchivedCycle {
    pub intent: Intent,
    pub contract: Option<Contract>,
    pub failure: Option<Failure>,
    pub completed_at: i64,
}

/// The single persisted document per managed root
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IpaState {
    pub current_phase: Phase,
    pub current_intent: Option<Intent>,
    pub current_contract: Option<Contract>,
    pub current_failure: Option<Failure>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub last_validation_output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub last_validation_command: Option<String>,
    pub history: Vec<ArchivedCycle>,
}

impl IpaState {
    /// Fresh IDLE document written on first-use initialization
    pub fn initial() -> Self {
        Self {
            current_phase: Phase::Idle,
            current_intent: None,
            current_contract: None,
            current_failure: None,
            last_validation_output: None,
            last_validation_command: None,
            history: Vec::new(),
        }
    }

    /// Phase/field coherence checks applied on every load
    pub fn validate(&self) -> Result<(), String> {
        if self.current_phase.requires_intent() && self.current_intent.is_none() {
            return Err(format!(
                "current_intent is null but current_phase is {}",
                self.current_phase
            ));
        }
        if self.current_phase.requires_contract() && self.current_contract.is_none() {
            return Err(format!(
                "current_contract is null but current_phase is {}",
                self.current_phase
            ));
        }
        Ok(())
    }
}

/// Current wall-clock time as Unix epoch milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

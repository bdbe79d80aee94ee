//! register_failure MCP Tool

use super::{get_optional_string, get_required_string, ToolDefinition};
use crate::engine::PhaseEngine;
use crate::Result;
use serde_json::{json, Value};

/// Get the tool definition for register_failure
pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "register_failure".to_string(),
        description: "Step 3.1: Register a failure and its immunity plan. REQUIRED after a failed validation."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "required": ["error_log", "root_cause", "immunity_plan"],
            "properties": {
                "error_log": {
                    "type": "string",
                    "description": "The raw failure output"
                },
                "root_cause": {
                    "type": "string",
                    "description": "Diagnosed root cause"
                },
                "immunity_plan": {
                    "type": "string",
                    "description": "How the system becomes immune to this class of bug"
                },
                "regression_test_path": {
                    "type": "string",
                    "description": "Path to the regression test covering this bug (mandatory in ANTIFRAGILITY)"
                }
            }
        }),
    }
}

/// Execute the register_failure tool
pub fn execute(args: &Value, engine: &PhaseEngine) -> Result<String> {
    let error_log = get_required_string(args, "error_log")?;
    let root_cause = get_required_string(args, "root_cause")?;
    let immunity_plan = get_required_string(args, "immunity_plan")?;
    let regression_test_path = get_optional_string(args, "regression_test_path");

    Ok(engine.register_failure(error_log, root_cause, immunity_plan, regression_test_path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_register_failure_via_tool_requires_evidence() {
        let temp_dir = TempDir::new().unwrap();
        let engine = PhaseEngine::new(temp_dir.path()).unwrap();
        engine.register_intent("d".into(), "c".into()).unwrap();
        engine
            .define_contract(Map::new(), Map::new(), vec![])
            .unwrap();
        engine.run_validation("exit 1", "fail").await.unwrap();

        let args = json!({
            "error_log": "boom",
            "root_cause": "off by one",
            "immunity_plan": "pin it with a test"
        });
        let err = execute(&args, &engine).unwrap_err();
        assert!(err.to_string().contains("regression_test_path"));

        let args = json!({
            "error_log": "boom",
            "root_cause": "off by one",
            "immunity_plan": "pin it with a test",
            "regression_test_path": "tests/off_by_one.rs"
        });
        let result = execute(&args, &engine).unwrap();
        assert!(result.contains("Failure registered"));
    }
}

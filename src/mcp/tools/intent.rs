//! register_intent MCP Tool

use super::{get_required_string, ToolDefinition};
use crate::engine::PhaseEngine;
use crate::Result;
use serde_json::{json, Value};

/// Get the tool definition for register_intent
pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "register_intent".to_string(),
        description: "Step 1: Register the intent of the change. Defines what will change."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "required": ["description", "component"],
            "properties": {
                "description": {
                    "type": "string",
                    "description": "What is going to change"
                },
                "component": {
                    "type": "string",
                    "description": "The component being changed"
                }
            }
        }),
    }
}

/// Execute the register_intent tool
pub fn execute(args: &Value, engine: &PhaseEngine) -> Result<String> {
    let description = get_required_string(args, "description")?;
    let component = get_required_string(args, "component")?;
    Ok(engine.register_intent(description, component)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Phase;
    use tempfile::TempDir;

    #[test]
    fn test_register_intent_via_tool() {
        let temp_dir = TempDir::new().unwrap();
        let engine = PhaseEngine::new(temp_dir.path()).unwrap();

        let args = json!({"description": "add retry", "component": "fetcher"});
        let result = execute(&args, &engine).unwrap();

        assert!(result.contains("INTENT"));
        assert_eq!(engine.snapshot().unwrap().current_phase, Phase::Intent);
    }

    #[test]
    fn test_missing_component_is_argument_error() {
        let temp_dir = TempDir::new().unwrap();
        let engine = PhaseEngine::new(temp_dir.path()).unwrap();

        let args = json!({"description": "add retry"});
        let err = execute(&args, &engine).unwrap_err();
        assert!(err.to_string().contains("component"));

        // Rejected before any state change
        assert_eq!(engine.snapshot().unwrap().current_phase, Phase::Idle);
    }
}

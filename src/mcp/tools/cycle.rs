//! Cycle lifecycle tools: init_ipa_cycle, finish_cycle, reset_cycle

use super::{get_required_string, ToolDefinition};
use crate::engine::PhaseEngine;
use crate::{project, Result};
use serde_json::{json, Value};

/// Get the tool definition for init_ipa_cycle
pub fn init_definition() -> ToolDefinition {
    ToolDefinition {
        name: "init_ipa_cycle".to_string(),
        description: "Initialize a new IPA work cycle. Must be in IDLE state.".to_string(),
        input_schema: json!({
            "type": "object",
            "required": ["task_description"],
            "properties": {
                "task_description": {
                    "type": "string",
                    "description": "What this cycle is going to accomplish"
                }
            }
        }),
    }
}

/// Execute the init_ipa_cycle tool
pub fn execute_init(args: &Value, engine: &PhaseEngine) -> Result<String> {
    let task_description = get_required_string(args, "task_description")?;
    let text = engine.init_cycle(&task_description)?;
    Ok(format!(
        "{}\nProject: {}",
        text,
        project::describe(engine.root())
    ))
}

/// Get the tool definition for finish_cycle
pub fn finish_definition() -> ToolDefinition {
    ToolDefinition {
        name: "finish_cycle".to_string(),
        description: "Complete the current cycle successfully. Archives it to history and resets state to IDLE."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {}
        }),
    }
}

/// Execute the finish_cycle tool
pub fn execute_finish(_args: &Value, engine: &PhaseEngine) -> Result<String> {
    Ok(engine.finish_cycle()?)
}

/// Get the tool definition for reset_cycle
pub fn reset_definition() -> ToolDefinition {
    ToolDefinition {
        name: "reset_cycle".to_string(),
        description: "Escape hatch: discard the current cycle and return to IDLE without archiving."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {}
        }),
    }
}

/// Execute the reset_cycle tool
pub fn execute_reset(_args: &Value, engine: &PhaseEngine) -> Result<String> {
    Ok(engine.reset()?)
}

//! run_validation_step MCP Tool

use super::{get_required_string, ToolDefinition};
use crate::engine::PhaseEngine;
use crate::Result;
use serde_json::{json, Value};

/// Get the tool definition for run_validation_step
pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: "run_validation_step".to_string(),
        description: "Step 3: Execute a validation command (test). STRICT: if it fails, you go to ANTIFRAGILITY."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "required": ["command", "description"],
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The command to run (e.g. 'cargo test fetcher')"
                },
                "description": {
                    "type": "string",
                    "description": "What is being validated"
                }
            }
        }),
    }
}

/// Execute the run_validation_step tool
pub async fn execute(args: &Value, engine: &PhaseEngine) -> Result<String> {
    let command = get_required_string(args, "command")?;
    let description = get_required_string(args, "description")?;
    Ok(engine.run_validation(&command, &description).await?)
}

//! MCP Tool Registry and Implementations
//!
//! Each tool wraps one phase-engine operation: JSON schema for the arguments,
//! argument extraction, and the engine call. Guard violations surface as
//! actionable error text at the server boundary, never as crashes.

pub mod contract;
pub mod cycle;
pub mod failure;
pub mod intent;
pub mod validation;

use crate::engine::PhaseEngine;
use crate::Result;
use serde_json::{json, Map, Value};

/// Registry of available MCP tools
pub struct ToolRegistry {
    tools: Vec<ToolDefinition>,
}

/// Tool definition for MCP protocol
#[derive(Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl ToolRegistry {
    /// Create a new tool registry with all available tools
    pub fn new() -> Self {
        Self {
            tools: vec![
                cycle::init_definition(),
                intent::definition(),
                contract::definition(),
                contract::generate_test_definition(),
                validation::definition(),
                failure::definition(),
                cycle::finish_definition(),
                cycle::reset_definition(),
            ],
        }
    }

    /// List all available tools in MCP format
    pub fn list_tools(&self) -> Vec<Value> {
        self.tools
            .iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "description": t.description,
                    "inputSchema": t.input_schema
                })
            })
            .collect()
    }

    /// Call a tool by name with the given arguments
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: &Value,
        engine: &PhaseEngine,
    ) -> Result<String> {
        match name {
            "init_ipa_cycle" => cycle::execute_init(arguments, engine),
            "register_intent" => intent::execute(arguments, engine),
            "define_contract" => contract::execute(arguments, engine),
            "generate_contract_test" => contract::execute_generate_test(arguments, engine),
            "run_validation_step" => validation::execute(arguments, engine).await,
            "register_failure" => failure::execute(arguments, engine),
            "finish_cycle" => cycle::execute_finish(arguments, engine),
            "reset_cycle" => cycle::execute_reset(arguments, engine),
            _ => anyhow::bail!("Unknown tool: {}", name),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper to extract a required string field from JSON
pub fn get_required_string(args: &Value, field: &str) -> Result<String> {
    args.get(field)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow::anyhow!("Missing required field: {}", field))
}

/// Helper to extract an optional string field from JSON
pub fn get_optional_string(args: &Value, field: &str) -> Option<String> {
    args.get(field).and_then(|v| v.as_str()).map(|s| s.to_string())
}

/// Helper to extract a required object field as a JSON map
pub fn get_required_object(args: &Value, field: &str) -> Result<Map<String, Value>> {
    args.get(field)
        .and_then(|v| v.as_object())
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("Missing required object field: {}", field))
}

/// Helper to extract a required array of strings
pub fn get_required_string_array(args: &Value, field: &str) -> Result<Vec<String>> {
    let array = args
        .get(field)
        .and_then(|v| v.as_array())
        .ok_or_else(|| anyhow::anyhow!("Missing required array field: {}", field))?;

    array
        .iter()
        .map(|v| {
            v.as_str()
                .map(|s| s.to_string())
                .ok_or_else(|| anyhow::anyhow!("Field '{}' must contain only strings", field))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lists_all_tools() {
        let registry = ToolRegistry::new();
        let tools = registry.list_tools();

        let names: Vec<&str> = tools
            .iter()
            .map(|t| t.get("name").unwrap().as_str().unwrap())
            .collect();

        for expected in [
            "init_ipa_cycle",
            "register_intent",
            "define_contract",
            "generate_contract_test",
            "run_validation_step",
            "register_failure",
            "finish_cycle",
            "reset_cycle",
        ] {
            assert!(names.contains(&expected), "missing tool {expected}");
        }

        for tool in &tools {
            assert!(tool.get("inputSchema").is_some());
            assert!(tool.get("description").is_some());
        }
    }

    #[test]
    fn test_get_required_string() {
        let args = json!({"name": "value"});
        assert_eq!(get_required_string(&args, "name").unwrap(), "value");
        assert!(get_required_string(&args, "missing").is_err());
    }

    #[test]
    fn test_get_required_string_array_rejects_non_strings() {
        let args = json!({"invariants": ["a", 1]});
        assert!(get_required_string_array(&args, "invariants").is_err());

        let args = json!({"invariants": ["a", "b"]});
        assert_eq!(
            get_required_string_array(&args, "invariants").unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[tokio::test]
    async fn test_unknown_tool_errors() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let engine = PhaseEngine::new(temp_dir.path()).unwrap();
        let registry = ToolRegistry::new();

        let result = registry.call_tool("no_such_tool", &json!({}), &engine).await;
        assert!(result.unwrap_err().to_string().contains("Unknown tool"));
    }
}

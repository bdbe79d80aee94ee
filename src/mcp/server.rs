//! MCP Server implementation using JSON-RPC 2.0 over stdio
//!
//! Implements the minimal MCP protocol:
//! - `initialize` - Return server info and capabilities
//! - `tools/list` / `tools/call` - Tool discovery and execution
//! - `resources/list` / `resources/read` - Read-only status surfaces
//!
//! All logging goes to stderr; stdout carries only protocol frames.

use crate::engine::{EngineError, PhaseEngine};
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use super::resources;
use super::tools::ToolRegistry;

/// MCP Server for handling JSON-RPC requests over stdio
pub struct McpServer {
    engine: PhaseEngine,
    tool_registry: ToolRegistry,
}

/// JSON-RPC 2.0 Request
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Option<Value>,
}

/// JSON-RPC 2.0 Response
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: String,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 Error
#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

// JSON-RPC error codes
const PARSE_ERROR: i32 = -32700;
const INVALID_REQUEST: i32 = -32600;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;

impl McpServer {
    /// Create a new MCP server guarding `root`
    pub fn new(root: &Path) -> Result<Self> {
        Ok(Self {
            engine: PhaseEngine::new(root)?,
            tool_registry: ToolRegistry::new(),
        })
    }

    /// Run the MCP server, reading from stdin and writing to stdout
    pub async fn run(&self) -> Result<()> {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        let reader = BufReader::new(stdin.lock());

        eprintln!(
            "[ipa-guardian] Guarding {}, waiting for requests...",
            self.engine.root().display()
        );

        for line in reader.lines() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    eprintln!("[ipa-guardian] Read error: {}", e);
                    break;
                }
            };

            // Skip empty lines
            if line.trim().is_empty() {
                continue;
            }

            let response = self.handle_request(&line).await;

            let response_json = serde_json::to_string(&response)?;
            writeln!(stdout, "{}", response_json)?;
            stdout.flush()?;
        }

        eprintln!("[ipa-guardian] Server stopped");
        Ok(())
    }

    /// Handle a single JSON-RPC request
    async fn handle_request(&self, line: &str) -> JsonRpcResponse {
        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => {
                return JsonRpcResponse {
                    jsonrpc: "2.0".to_string(),
                    id: Value::Null,
                    result: None,
                    error: Some(JsonRpcError {
                        code: PARSE_ERROR,
                        message: format!("Parse error: {}", e),
                        data: None,
                    }),
                };
            }
        };

        if request.jsonrpc != "2.0" {
            return JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                id: request.id.unwrap_or(Value::Null),
                result: None,
                error: Some(JsonRpcError {
                    code: INVALID_REQUEST,
                    message: "Invalid JSON-RPC version".to_string(),
                    data: None,
                }),
            };
        }

        let id = request.id.clone().unwrap_or(Value::Null);

        let result = match request.method.as_str() {
            "initialize" => self.handle_initialize(&request.params),
            "initialized" => Ok(json!({})), // Notification, no response needed
            "tools/list" => self.handle_tools_list(),
            "tools/call" => self.handle_tools_call(&request.params).await,
            "resources/list" => self.handle_resources_list(),
            "resources/read" => self.handle_resources_read(&request.params),
            "shutdown" => {
                eprintln!("[ipa-guardian] Shutdown requested");
                Ok(json!({}))
            }
            _ => Err((
                METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            )),
        };

        match result {
            Ok(value) => JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                id,
                result: Some(value),
                error: None,
            },
            Err((code, message)) => JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                id,
                result: None,
                error: Some(JsonRpcError {
                    code,
                    message,
                    data: None,
                }),
            },
        }
    }

    /// Handle `initialize` request
    fn handle_initialize(
        &self,
        _params: &Option<Value>,
    ) -> std::result::Result<Value, (i32, String)> {
        Ok(json!({
            "protocolVersion": "2024-11-05",
            "serverInfo": {
                "name": "ipa-guardian",
                "version": env!("CARGO_PKG_VERSION")
            },
            "capabilities": {
                "tools": {},
                "resources": {}
            }
        }))
    }

    /// Handle `tools/list` request
    fn handle_tools_list(&self) -> std::result::Result<Value, (i32, String)> {
        let tools = self.tool_registry.list_tools();
        Ok(json!({ "tools": tools }))
    }

    /// Handle `tools/call` request
    ///
    /// Guard violations and argument errors come back as `isError` content
    /// with a remediation hint, never as a process-level failure.
    async fn handle_tools_call(
        &self,
        params: &Option<Value>,
    ) -> std::result::Result<Value, (i32, String)> {
        let params = params
            .as_ref()
            .ok_or((INVALID_PARAMS, "Missing params".to_string()))?;

        let name = params
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or((INVALID_PARAMS, "Missing tool name".to_string()))?;

        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        eprintln!("[ipa-guardian] Calling tool: {}", name);

        match self
            .tool_registry
            .call_tool(name, &arguments, &self.engine)
            .await
        {
            Ok(result) => Ok(json!({
                "content": [{
                    "type": "text",
                    "text": result
                }]
            })),
            Err(e) => {
                let hint = e
                    .downcast_ref::<EngineError>()
                    .map(EngineError::advice)
                    .unwrap_or("Verify your arguments and try again.");
                Ok(json!({
                    "content": [{
                        "type": "text",
                        "text": format!("Error: {}\n\nHint: {}", e, hint)
                    }],
                    "isError": true
                }))
            }
        }
    }

    /// Handle `resources/list` request
    fn handle_resources_list(&self) -> std::result::Result<Value, (i32, String)> {
        Ok(json!({ "resources": resources::list_resources() }))
    }

    /// Handle `resources/read` request
    fn handle_resources_read(
        &self,
        params: &Option<Value>,
    ) -> std::result::Result<Value, (i32, String)> {
        let uri = params
            .as_ref()
            .and_then(|p| p.get("uri"))
            .and_then(|v| v.as_str())
            .ok_or((INVALID_PARAMS, "Missing resource uri".to_string()))?;

        resources::read_resource(uri, &self.engine)
            .map_err(|e| (INVALID_PARAMS, e.to_string()))
    }
}

//! Read-only MCP resources
//!
//! - `ipa://status` - full current state snapshot (JSON)
//! - `ipa://principles` - the IPA manifesto
//! - `ipa://metrics` - derived metrics over the archived history

use crate::engine::PhaseEngine;
use crate::Result;
use serde_json::{json, Value};

const STATUS_URI: &str = "ipa://status";
const PRINCIPLES_URI: &str = "ipa://principles";
const METRICS_URI: &str = "ipa://metrics";

const PRINCIPLES: &str = "\
# The Tao of IPA

1. **Incremental:**
   Nothing is tested as a whole system. Everything is validated as a delta (a change).

2. **Procedural:**
   AI creativity demands human discipline. All new code follows an explicit ritual:
   **Intent -> Contract -> Generation -> Validation**.

3. **Antifragile:**
   Errors are not merely fixed; they must generate systemic immunity. No bug is
   closed without becoming a regression test or a structural change.
";

/// List all resources in MCP format
pub fn list_resources() -> Vec<Value> {
    vec![
        json!({
            "uri": STATUS_URI,
            "name": "ipa-status",
            "description": "Full current workflow state",
            "mimeType": "application/json"
        }),
        json!({
            "uri": PRINCIPLES_URI,
            "name": "ipa-principles",
            "description": "The principles the guardian enforces",
            "mimeType": "text/markdown"
        }),
        json!({
            "uri": METRICS_URI,
            "name": "ipa-metrics",
            "description": "Derived metrics over archived cycles",
            "mimeType": "application/json"
        }),
    ]
}

/// Read a resource by URI
pub fn read_resource(uri: &str, engine: &PhaseEngine) -> Result<Value> {
    let (mime_type, text) = match uri {
        STATUS_URI => ("application/json", engine.status_json()?),
        PRINCIPLES_URI => ("text/markdown", PRINCIPLES.to_string()),
        METRICS_URI => (
            "application/json",
            serde_json::to_string_pretty(&engine.metrics()?)?,
        ),
        _ => anyhow::bail!("Unknown resource: {}", uri),
    };

    Ok(json!({
        "contents": [{
            "uri": uri,
            "mimeType": mime_type,
            "text": text
        }]
    }))
}

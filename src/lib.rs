// IPA Guardian - Workflow Guardian MCP Server
// Enforces the Intent -> Contract -> Implementation -> Validation -> Antifragility ritual

pub mod engine;
pub mod mcp;
pub mod models;
pub mod project;
pub mod security;
pub mod state;

pub use anyhow::{Context, Result};
pub use colored::Colorize;

// Re-export commonly used types
pub use engine::{EngineError, PhaseEngine};
pub use models::{Contract, Failure, Intent, IpaState, Phase};
pub use state::{IpaStateManager, StoreError};

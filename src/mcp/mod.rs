//! MCP (Model Context Protocol) Server for the IPA Guardian
//!
//! Thin protocol glue around the phase engine: a JSON-RPC 2.0 stdio server,
//! one tool per workflow operation, and read-only status resources.
//!
//! ## Tools
//! - `init_ipa_cycle` / `finish_cycle` / `reset_cycle` - cycle lifecycle
//! - `register_intent` - declare what will change
//! - `define_contract` / `generate_contract_test` - contract before code
//! - `run_validation_step` - execute a real validation command
//! - `register_failure` - document a failure and its immunity plan

pub mod resources;
pub mod server;
pub mod tools;

pub use server::McpServer;

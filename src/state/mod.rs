//! State persistence module
//!
//! Handles durable storage of the single `IpaState` document per managed
//! root, including first-use initialization and corruption detection on load.

mod manager;

pub use manager::{IpaStateManager, StoreError};

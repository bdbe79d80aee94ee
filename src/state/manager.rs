//! IpaStateManager - durable read/write of `.ipa/state.json`

use crate::models::IpaState;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const IPA_DIR: &str = ".ipa";
const STATE_FILE: &str = "state.json";

/// Errors surfaced by the state store
///
/// Corruption is never auto-repaired: the caller decides whether to inspect
/// the file by hand. Only a distinct kind so callers can tell a guard
/// violation from a broken store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("state file {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("failed to access state file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// State store for a single managed root
///
/// Exactly one `IpaState` document exists per root, at `<root>/.ipa/state.json`.
/// All mutation goes through load-mutate-save in the phase engine; the store
/// itself only moves bytes.
pub struct IpaStateManager {
    root: PathBuf,
    state_path: PathBuf,
}

impl IpaStateManager {
    /// Create a manager for `root`, initializing the backing file if absent
    ///
    /// Initialization failure (cannot create the directory or write the
    /// initial document) is the one fatal error in the system.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let state_path = root.join(IPA_DIR).join(STATE_FILE);
        let manager = Self { root, state_path };
        manager.ensure_initialized()?;
        Ok(manager)
    }

    /// The managed root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to the backing state file
    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    /// Create `.ipa/` and an IDLE document if missing. Idempotent.
    fn ensure_initialized(&self) -> Result<()> {
        let dir = self.root.join(IPA_DIR);
        if !dir.exists() {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create state directory {}", dir.display()))?;
        }
        if !self.state_path.exists() {
            let content = serde_json::to_string_pretty(&IpaState::initial())
                .context("Failed to serialize initial state")?;
            std::fs::write(&self.state_path, content).with_context(|| {
                format!("Failed to write initial state {}", self.state_path.display())
            })?;
        }
        Ok(())
    }

    /// Read, parse and schema-validate the document
    pub fn load(&self) -> Result<IpaState, StoreError> {
        let content = match std::fs::read_to_string(&self.state_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Initialization should have created it; treat removal as corruption
                return Err(StoreError::Corrupt {
                    path: self.state_path.clone(),
                    reason: "file missing after initialization".to_string(),
                });
            }
            Err(e) => {
                return Err(StoreError::Io {
                    path: self.state_path.clone(),
                    source: e,
                })
            }
        };

        let state: IpaState =
            serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
                path: self.state_path.clone(),
                reason: e.to_string(),
            })?;

        state.validate().map_err(|reason| StoreError::Corrupt {
            path: self.state_path.clone(),
            reason,
        })?;

        Ok(state)
    }

    /// Serialize the full document, pretty-printed, overwriting in place
    ///
    /// Single writer, whole-document overwrite. A crash mid-write can corrupt
    /// the file; `load` will report it instead of silently resetting.
    pub fn save(&self, state: &IpaState) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(state).map_err(|e| StoreError::Corrupt {
            path: self.state_path.clone(),
            reason: e.to_string(),
        })?;
        std::fs::write(&self.state_path, content).map_err(|e| StoreError::Io {
            path: self.state_path.clone(),
            source: e,
        })
    }
}

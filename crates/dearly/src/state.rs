//! Persistent client-local state: the active session id.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// The single persisted client value: which session the user is currently
/// in. Survives restarts; not synced across devices.
#[derive(Debug, Clone)]
pub struct SessionState {
    path: PathBuf,
}

impl SessionState {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location under the platform data directory.
    pub fn default_path() -> Result<PathBuf> {
        let base = dirs::data_dir().context("no data directory available")?;
        Ok(base.join("dearly").join("session"))
    }

    /// Currently stored session id, if any.
    pub fn load(&self) -> Option<String> {
        let contents = fs::read_to_string(&self.path).ok()?;
        let id = contents.trim();
        if id.is_empty() {
            None
        } else {
            Some(id.to_string())
        }
    }

    /// Persist the active session id.
    pub fn store(&self, session_id: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        fs::write(&self.path, session_id)
            .with_context(|| format!("writing {}", self.path.display()))
    }
}

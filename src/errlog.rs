use anyhow::{Context, Result};
use chrono::Utc;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One recorded failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub timestamp: String,
    pub error: String,
}

/// Append-only JSON error log, small and human-readable. Hosts that bring
/// their own error storage can ignore this entirely.
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> Result<PathBuf> {
        let proj = ProjectDirs::from("dev", "copydesk", "copydesk")
            .context("unable to determine data directory")?;
        Ok(proj.data_dir().join("error_log.json"))
    }

    fn read_all(&self) -> Vec<ErrorEntry> {
        std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    pub fn log_error(&self, message: &str) -> Result<()> {
        let mut entries = self.read_all();
        entries.push(ErrorEntry {
            timestamp: Utc::now().to_rfc3339(),
            error: message.to_string(),
        });
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&entries)?)?;
        Ok(())
    }

    /// Most recent entries, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<ErrorEntry> {
        let entries = self.read_all();
        let start = entries.len().saturating_sub(limit);
        entries[start..].to_vec()
    }
}

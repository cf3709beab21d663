use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use anyhow::Result;

/// Pre-mutation snapshot of one remote item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupEntry {
    pub endpoint: String,
    pub item_id: String,
    pub snapshot: Value,
}

/// Most-recent-first stack of pre-mutation snapshots. Owned by the session;
/// the executor pushes, rollback pops.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BackupLedger {
    entries: Vec<BackupEntry>,
}

impl BackupLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: BackupEntry) {
        self.entries.push(entry);
    }

    pub fn pop(&mut self) -> Option<BackupEntry> {
        self.entries.pop()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Persist as JSON so apply and rollback can run in separate processes.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(&self.entries)?)?;
        Ok(())
    }

    /// A missing or corrupt ledger file reads as empty.
    pub fn load(path: &Path) -> Self {
        let entries = std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default();
        Self { entries }
    }
}

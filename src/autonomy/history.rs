//! Append-only decision history, persisted as one JSON array.

use std::path::{Path, PathBuf};

use panini_collectors::write_atomically;
use panini_core::{Error, Result};
use tokio::fs;

use super::types::HistoryEntry;

pub const HISTORY_FILE: &str = "autonomous_decision_history.json";

/// In-memory copy of the history file. The file is the source of truth;
/// the copy is rebuilt from it on open.
#[derive(Debug)]
pub struct DecisionHistory {
    path: PathBuf,
    entries: Vec<HistoryEntry>,
}

impl DecisionHistory {
    /// Open the history in `dir`. A missing file is an empty history; an
    /// unreadable one is an error so it never gets overwritten.
    pub async fn open(dir: &Path) -> Result<Self> {
        let path = dir.join(HISTORY_FILE);
        let entries = match fs::read_to_string(&path).await {
            Ok(text) => serde_json::from_str(&text)
                .map_err(|e| Error::parse(path.clone(), e.to_string()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append one entry and rewrite the file through a temp name.
    pub async fn append(&mut self, entry: HistoryEntry) -> Result<()> {
        self.entries.push(entry);
        let text = serde_json::to_string_pretty(&self.entries)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&path, &text))
            .await
            .map_err(|e| Error::Internal(format!("history write task: {e}")))??;
        Ok(())
    }
}

//! Settlement Journal - Append-only JSONL Settlement Records
//!
//! Persists settlements to daily JSONL files named
//! `settlements/YYYY-MM-DD.jsonl`. Each line is a self-contained JSON
//! record, so the journal can be streamed and survives partial writes.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument, warn};

use crate::domain::offer::Settlement;

/// Append-only JSONL settlement journal with daily file rotation.
pub struct SettlementJournal {
    dir: PathBuf,
}

impl SettlementJournal {
    /// Create a new journal under `<data_dir>/settlements`.
    pub async fn new(data_dir: &str) -> Result<Self> {
        let dir = Path::new(data_dir).join("settlements");
        fs::create_dir_all(&dir)
            .await
            .context("Failed to create settlements directory")?;
        Ok(Self { dir })
    }

    /// Append a settlement to the file for its settlement date.
    #[instrument(skip(self, settlement), fields(settlement_id = %settlement.id))]
    pub async fn append(&self, settlement: &Settlement) -> Result<()> {
        let date = settlement.settled_at.format("%Y-%m-%d").to_string();
        let path = self.dir.join(format!("{date}.jsonl"));

        let mut json = serde_json::to_string(settlement)
            .context("Failed to serialize settlement")?;
        json.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .context("Failed to open settlement journal")?;

        file.write_all(json.as_bytes())
            .await
            .context("Failed to write settlement")?;
        file.flush().await.context("Failed to flush settlement journal")?;

        Ok(())
    }

    /// Load every settlement from every daily file, oldest first.
    #[instrument(skip(self))]
    pub async fn load_all(&self) -> Result<Vec<Settlement>> {
        let mut settlements = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "jsonl") {
                continue;
            }
            let content = fs::read_to_string(&path).await?;
            for line in content.lines().filter(|l| !l.trim().is_empty()) {
                match serde_json::from_str::<Settlement>(line) {
                    Ok(settlement) => settlements.push(settlement),
                    Err(e) => warn!(
                        file = %path.display(),
                        error = %e,
                        "Skipping malformed settlement record"
                    ),
                }
            }
        }

        settlements.sort_by_key(|s| s.settled_at);
        info!(count = settlements.len(), "Loaded settlements");
        Ok(settlements)
    }

    /// Check if the journal directory is writable.
    pub async fn is_healthy(&self) -> bool {
        let marker = self.dir.join(".health_check");
        let result = fs::write(&marker, b"ok").await;
        let _ = fs::remove_file(&marker).await;
        result.is_ok()
    }
}

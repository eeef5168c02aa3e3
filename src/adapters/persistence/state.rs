//! Book Store - Offer Book Snapshot File
//!
//! Keeps one `offers.json` per data directory. Writes go to a sibling
//! tmp file that is renamed over the snapshot, so readers only ever see
//! a complete book.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{debug, warn};

use crate::ports::repository::BookSnapshot;

const BOOK_FILE: &str = "offers.json";

/// Snapshot file for the offer book.
pub struct BookStore {
    path: PathBuf,
}

impl BookStore {
    pub async fn new(data_dir: &str) -> Result<Self> {
        fs::create_dir_all(data_dir)
            .await
            .with_context(|| format!("Failed to create data directory {data_dir}"))?;
        Ok(Self {
            path: Path::new(data_dir).join(BOOK_FILE),
        })
    }

    pub async fn save(&self, snapshot: &BookSnapshot) -> Result<()> {
        let bytes = serde_json::to_vec(snapshot).context("Failed to serialize offer book")?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, bytes)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        debug!(offers = snapshot.offers.len(), "Offer book saved");
        Ok(())
    }

    /// The stored snapshot, or `None` before the first save.
    pub async fn load(&self) -> Result<Option<BookSnapshot>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", self.path.display()));
            }
        };
        let snapshot: BookSnapshot =
            serde_json::from_slice(&bytes).context("Failed to parse offer book")?;
        if snapshot.version != BookSnapshot::VERSION {
            warn!(found = %snapshot.version, "Unexpected offer book version");
        }
        Ok(Some(snapshot))
    }
}

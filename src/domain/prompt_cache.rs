//! Per-wallet cache of submitted prompts.
//!
//! Holds every submission a wallet made through this gateway, keyed by
//! author, so clients can list them across reloads. Optionally mirrored
//! to a JSON file under the [`STORAGE_KEY`] top-level key.
//!
//! All read-modify-write cycles run under a single write guard, so two
//! tabs submitting at once cannot lose each other's entries.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::{CachedPrompt, WalletAddress};
use crate::error::GatewayError;

/// Key the submissions are stored under in the snapshot file.
pub const STORAGE_KEY: &str = "promptpool-submissions";

type Entries = HashMap<WalletAddress, Vec<CachedPrompt>>;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(rename = "promptpool-submissions", default)]
    submissions: Entries,
}

/// In-memory prompt cache with optional JSON snapshotting.
#[derive(Debug, Default)]
pub struct PromptCache {
    entries: RwLock<Entries>,
    snapshot_path: Option<PathBuf>,
}

impl PromptCache {
    /// Creates an empty, memory-only cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a cache mirrored to `path`, loading existing entries.
    ///
    /// A missing file yields an empty cache.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] if the file exists but
    /// cannot be read or parsed.
    pub async fn open(path: PathBuf) -> Result<Self, GatewayError> {
        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let snapshot: Snapshot = serde_json::from_slice(&bytes).map_err(|e| {
                    GatewayError::PersistenceError(format!("{}: {e}", path.display()))
                })?;
                snapshot.submissions
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Entries::new(),
            Err(e) => {
                return Err(GatewayError::PersistenceError(format!(
                    "{}: {e}",
                    path.display()
                )));
            }
        };
        let count: usize = entries.values().map(Vec::len).sum();
        tracing::info!(path = %path.display(), count, "prompt cache loaded");
        Ok(Self {
            entries: RwLock::new(entries),
            snapshot_path: Some(path),
        })
    }

    /// Adds a submission under its author.
    pub async fn insert(&self, prompt: CachedPrompt) {
        let mut entries = self.entries.write().await;
        entries.entry(prompt.author.clone()).or_default().push(prompt);
        self.persist(&entries).await;
    }

    /// Returns the wallet's submissions, newest first.
    pub async fn list(&self, wallet: &WalletAddress) -> Vec<CachedPrompt> {
        let entries = self.entries.read().await;
        let mut prompts = entries.get(wallet).cloned().unwrap_or_default();
        prompts.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        prompts
    }

    /// Looks a submission up by id.
    pub async fn get(&self, id: uuid::Uuid) -> Option<CachedPrompt> {
        let entries = self.entries.read().await;
        entries.values().flatten().find(|p| p.id == id).cloned()
    }

    /// Looks a submission up by its transaction hash.
    pub async fn find_by_tx(&self, tx_hash: &str) -> Option<CachedPrompt> {
        let entries = self.entries.read().await;
        entries
            .values()
            .flatten()
            .find(|p| p.tx_hash.as_deref().is_some_and(|h| h.eq_ignore_ascii_case(tx_hash)))
            .cloned()
    }

    /// Applies `mutate` to the submission with the given id and returns
    /// the updated copy.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PromptNotFound`] if no submission matches.
    pub async fn update<F>(&self, id: uuid::Uuid, mutate: F) -> Result<CachedPrompt, GatewayError>
    where
        F: FnOnce(&mut CachedPrompt),
    {
        let mut entries = self.entries.write().await;
        let prompt = entries
            .values_mut()
            .flatten()
            .find(|p| p.id == id)
            .ok_or(GatewayError::PromptNotFound(id))?;
        mutate(prompt);
        let updated = prompt.clone();
        self.persist(&entries).await;
        Ok(updated)
    }

    /// Drops every submission cached for `wallet`.
    pub async fn clear_wallet(&self, wallet: &WalletAddress) -> usize {
        let mut entries = self.entries.write().await;
        let removed = entries.remove(wallet).map_or(0, |v| v.len());
        if removed > 0 {
            self.persist(&entries).await;
        }
        removed
    }

    /// Total number of cached submissions.
    pub async fn len(&self) -> usize {
        self.entries.read().await.values().map(Vec::len).sum()
    }

    /// Returns `true` if nothing is cached.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Writes the snapshot file. Failures are logged; the in-memory state
    /// stays authoritative.
    async fn persist(&self, entries: &Entries) {
        let Some(path) = &self.snapshot_path else {
            return;
        };
        let snapshot = SnapshotRef {
            submissions: entries,
        };
        match serde_json::to_vec_pretty(&snapshot) {
            Ok(bytes) => {
                if let Err(e) = write_atomic(path, &bytes).await {
                    tracing::warn!(path = %path.display(), error = %e, "prompt cache snapshot failed");
                }
            }
            Err(e) => tracing::warn!(error = %e, "prompt cache serialization failed"),
        }
    }
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    #[serde(rename = "promptpool-submissions")]
    submissions: &'a Entries,
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await
}

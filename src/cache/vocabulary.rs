use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::OnceCell;

use crate::models::VocabularyEntry;

#[derive(Debug, Deserialize)]
struct VocabularyFile {
    #[serde(default)]
    vibes: Vec<VocabularyEntry>,
}

/// Read-only linked-vibes vocabulary, loaded on first use
///
/// The `OnceCell` guarantees a single load even when the first requests arrive
/// together. A missing or unreadable file leaves the vocabulary empty for the
/// lifetime of the process.
pub struct VocabularyStore {
    path: Option<PathBuf>,
    entries: OnceCell<Arc<Vec<VocabularyEntry>>>,
}

impl VocabularyStore {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            entries: OnceCell::new(),
        }
    }

    /// Store that is already populated, mainly for tests
    pub fn from_entries(entries: Vec<VocabularyEntry>) -> Self {
        Self {
            path: None,
            entries: OnceCell::new_with(Some(Arc::new(entries))),
        }
    }

    pub fn empty() -> Self {
        Self::from_entries(Vec::new())
    }

    /// Current vocabulary snapshot
    pub async fn snapshot(&self) -> Arc<Vec<VocabularyEntry>> {
        self.entries
            .get_or_init(|| async { Arc::new(self.load().await) })
            .await
            .clone()
    }

    async fn load(&self) -> Vec<VocabularyEntry> {
        let Some(path) = &self.path else {
            return Vec::new();
        };

        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Vocabulary file unavailable; intent tags disabled");
                return Vec::new();
            }
        };

        match serde_json::from_str::<VocabularyFile>(&raw) {
            Ok(file) => {
                tracing::info!(path = %path.display(), entries = file.vibes.len(), "Loaded vibe vocabulary");
                file.vibes
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Vocabulary file is malformed; intent tags disabled");
                Vec::new()
            }
        }
    }
}

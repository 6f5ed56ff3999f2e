use std::sync::Arc;

use crate::cache::VocabularyStore;
use crate::models::VocabularyEntry;
use crate::services::keywords::dedup_terms;

/// Tags and categories implied by a vibe/event-type pair
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedIntent {
    pub tags: Vec<String>,
    pub categories: Vec<String>,
}

/// Expands free-text intent through the linked-vibes vocabulary
#[derive(Clone)]
pub struct IntentNormalizer {
    vocabulary: Arc<VocabularyStore>,
}

impl IntentNormalizer {
    pub fn new(vocabulary: Arc<VocabularyStore>) -> Self {
        Self { vocabulary }
    }

    pub async fn normalize(&self, vibe: &str, event_type: &str) -> NormalizedIntent {
        let entries = self.vocabulary.snapshot().await;
        normalize_intent(&entries, vibe, event_type)
    }
}

/// Unions the tags and categories of every entry whose label occurs in either string.
pub fn normalize_intent(
    entries: &[VocabularyEntry],
    vibe: &str,
    event_type: &str,
) -> NormalizedIntent {
    let vibe = vibe.to_lowercase();
    let event_type = event_type.to_lowercase();

    let matched: Vec<&VocabularyEntry> = entries
        .iter()
        .filter(|entry| {
            let label = entry.label.trim().to_lowercase();
            !label.is_empty() && (vibe.contains(&label) || event_type.contains(&label))
        })
        .collect();

    NormalizedIntent {
        tags: dedup_terms(matched.iter().flat_map(|e| e.tags.iter())),
        categories: dedup_terms(matched.iter().flat_map(|e| e.categories.iter())),
    }
}

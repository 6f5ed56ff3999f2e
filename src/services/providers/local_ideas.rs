//! Static idea list read from a local JSON file
//!
//! Expects `{"events": [{"name", "category", "budget", "description", "ideal_time"}]}`.
//! The file is read once, on first search; an unreadable file yields no ideas.

use std::cmp::Reverse;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::OnceCell;

use crate::{
    error::ProviderError,
    models::{Candidate, CandidateKind, ExternalRef, Location},
    services::providers::{ProviderQuery, VenueProvider},
};

const SOURCE: &str = "local_metadata";
const MAX_IDEAS: usize = 5;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventIdea {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub budget: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub ideal_time: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct IdeasFile {
    #[serde(default)]
    events: Vec<EventIdea>,
}

pub struct LocalIdeasProvider {
    path: Option<PathBuf>,
    ideas: OnceCell<Arc<Vec<EventIdea>>>,
}

impl LocalIdeasProvider {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ideas: OnceCell::new(),
        }
    }

    pub fn from_ideas(ideas: Vec<EventIdea>) -> Self {
        Self {
            path: None,
            ideas: OnceCell::new_with(Some(Arc::new(ideas))),
        }
    }

    async fn ideas(&self) -> Arc<Vec<EventIdea>> {
        self.ideas
            .get_or_init(|| async {
                let Some(path) = &self.path else {
                    return Arc::new(Vec::new());
                };
                let parsed = match tokio::fs::read(path).await {
                    Ok(bytes) => serde_json::from_slice::<IdeasFile>(&bytes)
                        .map_err(|e| e.to_string()),
                    Err(e) => Err(e.to_string()),
                };
                match parsed {
                    Ok(file) => {
                        tracing::info!(count = file.events.len(), path = %path.display(), "Loaded event ideas");
                        Arc::new(file.events)
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Could not load event ideas");
                        Arc::new(Vec::new())
                    }
                }
            })
            .await
            .clone()
    }
}

/// Relevance of an idea to the vibe and event type; zero means unrelated.
fn score(idea: &EventIdea, vibe: &str, event_type: &str) -> u32 {
    let name = idea.name.as_deref().unwrap_or_default().to_lowercase();
    let category = idea.category.as_deref().unwrap_or_default().to_lowercase();
    let mut score = 0;

    if !name.is_empty() && vibe.split_whitespace().any(|word| name.contains(word)) {
        score += 2;
    }
    if !category.is_empty() && vibe.contains(&category) {
        score += 2;
    }
    if !category.is_empty() && event_type.contains(&category) {
        score += 1;
    }
    if !event_type.is_empty() && name.contains(event_type) {
        score += 1;
    }
    score
}

/// Best-scoring ideas, or the first few when nothing scores.
fn select_ideas<'a>(ideas: &'a [EventIdea], vibe: &str, event_type: &str) -> Vec<&'a EventIdea> {
    let vibe = vibe.to_lowercase();
    let event_type = event_type.trim().to_lowercase();

    let mut scored: Vec<(u32, &EventIdea)> = ideas
        .iter()
        .map(|idea| (score(idea, &vibe, &event_type), idea))
        .collect();
    // Stable: equal scores keep file order
    scored.sort_by_key(|(score, _)| Reverse(*score));

    let relevant: Vec<&EventIdea> = scored
        .iter()
        .filter(|(score, _)| *score > 0)
        .take(MAX_IDEAS)
        .map(|(_, idea)| *idea)
        .collect();

    if relevant.is_empty() {
        ideas.iter().take(MAX_IDEAS).collect()
    } else {
        relevant
    }
}

#[async_trait::async_trait]
impl VenueProvider for LocalIdeasProvider {
    async fn search(&self, query: &ProviderQuery) -> Result<Vec<Candidate>, ProviderError> {
        let ideas = self.ideas().await;

        Ok(select_ideas(&ideas, &query.vibe, &query.event_type)
            .into_iter()
            .enumerate()
            .map(|(index, idea)| {
                let name = idea.name.as_deref().unwrap_or("idea");
                Candidate {
                    id: format!("local-{}-{}", index, name),
                    title: idea
                        .name
                        .clone()
                        .unwrap_or_else(|| "Suggested idea".to_string()),
                    category: idea.category.clone(),
                    kind: CandidateKind::Event,
                    location: Location {
                        name: Some(query.location.clone()),
                        address: Some(query.location.clone()),
                        lat: None,
                        lng: None,
                    },
                    external: ExternalRef {
                        source: Some(SOURCE.to_string()),
                        url: None,
                        source_id: None,
                    },
                    rough_price: idea.budget.clone(),
                    rating: None,
                    description: idea.description.clone().or_else(|| idea.ideal_time.clone()),
                }
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        SOURCE
    }
}

//! Concurrent fan-out over the configured providers
//!
//! Every provider runs in its own task against the same request-scoped query.
//! Results are merged in provider registration order, so the output is stable
//! regardless of which provider answers first.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    error::{AppError, AppResult, ProviderError},
    models::{Candidate, Preferences},
    services::{
        date_window::resolve_date_window,
        intent::IntentNormalizer,
        providers::{ProviderQuery, VenueProvider},
        relevance::RelevanceFilter,
    },
};

/// Upper bound on candidates handed to ranking
pub const MAX_CANDIDATES: usize = 10;
const RETRY_BACKOFF: Duration = Duration::from_millis(250);
const MAX_ATTEMPTS: usize = 2;

/// What a single provider call produced
#[derive(Debug)]
pub enum ProviderOutcome {
    Found(Vec<Candidate>),
    Empty,
    Failed(ProviderError),
}

impl ProviderOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, ProviderOutcome::Failed(_))
    }
}

/// Runs one provider search, retrying once after a transient failure.
pub async fn search_with_retry(provider: &dyn VenueProvider, query: &ProviderQuery) -> ProviderOutcome {
    let mut attempt = 1;
    loop {
        match provider.search(query).await {
            Ok(candidates) if candidates.is_empty() => return ProviderOutcome::Empty,
            Ok(candidates) => return ProviderOutcome::Found(candidates),
            Err(e) if e.is_transient() && attempt < MAX_ATTEMPTS => {
                tracing::warn!(
                    provider = provider.name(),
                    attempt,
                    error = %e,
                    "Provider call failed, retrying"
                );
                attempt += 1;
                tokio::time::sleep(RETRY_BACKOFF).await;
            }
            Err(e) => return ProviderOutcome::Failed(e),
        }
    }
}

/// Filters, deduplicates (first occurrence wins) and caps candidate batches.
pub fn merge_candidates<I>(batches: I, filter: &RelevanceFilter) -> Vec<Candidate>
where
    I: IntoIterator<Item = Vec<Candidate>>,
{
    let mut seen = HashSet::new();
    batches
        .into_iter()
        .flatten()
        .filter(|candidate| filter.keeps(candidate))
        .filter(|candidate| seen.insert(candidate.dedup_key()))
        .take(MAX_CANDIDATES)
        .collect()
}

#[derive(Clone)]
pub struct ProviderAggregator {
    providers: Vec<Arc<dyn VenueProvider>>,
    normalizer: IntentNormalizer,
}

impl ProviderAggregator {
    pub fn new(providers: Vec<Arc<dyn VenueProvider>>, normalizer: IntentNormalizer) -> Self {
        Self {
            providers,
            normalizer,
        }
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Resolves everything providers share for one request.
    pub async fn build_query(&self, prefs: &Preferences) -> ProviderQuery {
        let intent = self.normalizer.normalize(&prefs.vibe, &prefs.event_type).await;
        let window = resolve_date_window(&prefs.date_range);
        ProviderQuery::build(prefs, &intent, window)
    }

    /// Collects up to [`MAX_CANDIDATES`] relevant, distinct candidates.
    ///
    /// Individual provider failures are tolerated; only when every configured
    /// provider failed is the request reported as failed.
    pub async fn aggregate(&self, prefs: &Preferences) -> AppResult<Vec<Candidate>> {
        if self.providers.is_empty() {
            tracing::info!("No providers configured");
            return Ok(Vec::new());
        }

        let query = Arc::new(self.build_query(prefs).await);
        let filter = RelevanceFilter::for_intent(&prefs.vibe, &prefs.event_type);

        let handles: Vec<_> = self
            .providers
            .iter()
            .map(|provider| {
                let provider = Arc::clone(provider);
                let query = Arc::clone(&query);
                tokio::spawn(async move { search_with_retry(provider.as_ref(), &query).await })
            })
            .collect();

        let mut failed = 0;
        let mut batches = Vec::with_capacity(handles.len());
        for (provider, handle) in self.providers.iter().zip(handles) {
            let outcome = handle
                .await
                .unwrap_or_else(|e| ProviderOutcome::Failed(ProviderError::Task(e.to_string())));

            match outcome {
                ProviderOutcome::Found(candidates) => {
                    tracing::info!(provider = provider.name(), count = candidates.len(), "Provider results");
                    batches.push(candidates);
                }
                ProviderOutcome::Empty => {
                    tracing::info!(provider = provider.name(), "Provider returned no results");
                }
                ProviderOutcome::Failed(e) => {
                    tracing::warn!(provider = provider.name(), error = %e, "Provider failed");
                    failed += 1;
                }
            }
        }

        if failed == self.providers.len() {
            return Err(AppError::AllProvidersFailed { failed });
        }

        let candidates = merge_candidates(batches, &filter);
        tracing::info!(
            count = candidates.len(),
            failed,
            art_intent = filter.art_intent(),
            "Aggregated candidates"
        );
        Ok(candidates)
    }
}

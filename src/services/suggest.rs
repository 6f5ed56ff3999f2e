use std::path::PathBuf;
use std::sync::Arc;

use crate::{
    cache::VocabularyStore,
    config::Config,
    error::AppResult,
    models::{Preferences, Suggestion},
    services::{
        aggregator::ProviderAggregator,
        fallback::{self, FallbackTier},
        geocode::Geocoder,
        intent::IntentNormalizer,
        providers::build_providers,
        ranker::{build_backend, Ranker},
    },
};

/// End-to-end suggestion pipeline: aggregate, rank, degrade
#[derive(Clone)]
pub struct SuggestionService {
    aggregator: ProviderAggregator,
    ranker: Ranker,
}

impl SuggestionService {
    pub fn new(aggregator: ProviderAggregator, ranker: Ranker) -> Self {
        Self { aggregator, ranker }
    }

    /// Wires providers, vocabulary and ranking backend from configuration.
    pub fn from_config(config: &Config) -> Self {
        let vocabulary = Arc::new(VocabularyStore::from_path(PathBuf::from(
            &config.vocabulary_path,
        )));
        let geocoder = Geocoder::new(config.geocode_api_key(), config.google_maps_api_url.clone());
        let aggregator = ProviderAggregator::new(
            build_providers(config, &geocoder),
            IntentNormalizer::new(vocabulary),
        );
        let ranker = Ranker::new(build_backend(config));

        tracing::info!(
            providers = aggregator.provider_count(),
            ranker = ranker.backend_name().unwrap_or("none"),
            "Suggestion pipeline configured"
        );
        Self::new(aggregator, ranker)
    }

    /// Up to five suggestions for the given preferences.
    ///
    /// Only fails when every configured provider failed; ranking problems fall
    /// back to raw candidates and then to the built-in catalog.
    pub async fn suggest(&self, prefs: &Preferences) -> AppResult<Vec<Suggestion>> {
        let candidates = self.aggregator.aggregate(prefs).await?;
        let ranked = self.ranker.rank(prefs, &candidates).await;
        let (tier, suggestions) = fallback::resolve(prefs, ranked, &candidates);

        if tier == FallbackTier::Ranked {
            tracing::info!(count = suggestions.len(), "Returning ranked suggestions");
        } else {
            tracing::info!(
                tier = ?tier,
                candidates = candidates.len(),
                count = suggestions.len(),
                "Using fallback suggestions"
            );
        }

        Ok(suggestions)
    }
}

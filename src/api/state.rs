use std::sync::Arc;

use crate::{config::Config, services::SuggestionService};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub suggestions: Arc<SuggestionService>,
}

impl AppState {
    pub fn new(suggestions: SuggestionService) -> Self {
        Self {
            suggestions: Arc::new(suggestions),
        }
    }

    /// Builds providers, caches and the ranking backend once for the process.
    pub fn from_config(config: &Config) -> Self {
        Self::new(SuggestionService::from_config(config))
    }
}

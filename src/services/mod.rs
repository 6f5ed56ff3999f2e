pub mod aggregator;
pub mod date_window;
pub mod fallback;
pub mod geocode;
pub mod intent;
pub mod keywords;
pub mod providers;
pub mod ranker;
pub mod relevance;
pub mod suggest;

pub use aggregator::ProviderAggregator;
pub use geocode::Geocoder;
pub use intent::IntentNormalizer;
pub use ranker::Ranker;
pub use suggest::SuggestionService;

//! Venue and event provider abstraction
//!
//! Each adapter translates the shared [`ProviderQuery`] into one third-party search
//! API's wire parameters and maps that API's result shape onto [`Candidate`].
//! Adapters only exist for providers whose credential is configured.

use std::sync::Arc;

use reqwest::Response;

use crate::{
    config::{non_blank, Config},
    error::ProviderError,
    models::{Candidate, Preferences, MAX_REFRESH_LEVEL},
    services::{
        date_window::DateWindow, geocode::Geocoder, intent::NormalizedIntent,
        keywords::{dedup_terms, expand_keywords},
    },
};

pub mod eventbrite;
pub mod facebook;
pub mod google_places;
pub mod local_ideas;
pub mod meetup;

pub use eventbrite::EventbriteProvider;
pub use facebook::FacebookEventsProvider;
pub use google_places::GooglePlacesProvider;
pub use local_ideas::LocalIdeasProvider;
pub use meetup::MeetupProvider;

/// Added to the search terms once the user starts refreshing
const FALLBACK_TERMS: &[&str] = &[
    "group friendly",
    "fun venue",
    "things to do",
    "events near",
    "popular spots",
];

const BASE_QUERY_VARIANTS: usize = 3;
const BASE_RADIUS_KM: u32 = 50;
const RADIUS_STEP_KM: u32 = 20;
const MAX_PAGE: u32 = 4;

/// How widely providers search, derived from the refresh level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBreadth {
    pub level: u8,
    /// Number of text-search phrases issued
    pub query_variants: usize,
    /// Search radius around the location, rendered per provider in its own unit
    pub radius_km: u32,
    /// Result page to request, only once refreshing
    pub page: Option<u32>,
    pub include_fallback_terms: bool,
}

impl SearchBreadth {
    pub fn for_level(level: u8) -> Self {
        let level = level.min(MAX_REFRESH_LEVEL);
        Self {
            level,
            query_variants: BASE_QUERY_VARIANTS + level as usize,
            radius_km: BASE_RADIUS_KM + RADIUS_STEP_KM * level as u32,
            page: (level > 0).then(|| (level as u32 + 1).min(MAX_PAGE)),
            include_fallback_terms: level > 0,
        }
    }
}

/// Request-scoped search parameters shared by every provider
#[derive(Debug, Clone)]
pub struct ProviderQuery {
    pub location: String,
    pub vibe: String,
    pub event_type: String,
    pub window: Option<DateWindow>,
    pub breadth: SearchBreadth,
    /// Expanded keywords, then vocabulary tags, then fallback terms when refreshing
    pub search_terms: Vec<String>,
    pub tags: Vec<String>,
}

impl ProviderQuery {
    pub fn build(prefs: &Preferences, intent: &NormalizedIntent, window: Option<DateWindow>) -> Self {
        let breadth = SearchBreadth::for_level(prefs.refresh_level());

        let mut terms = expand_keywords(&prefs.vibe, &prefs.event_type);
        terms.extend(intent.tags.iter().cloned());
        if breadth.include_fallback_terms {
            terms.extend(FALLBACK_TERMS.iter().map(|t| t.to_string()));
        }

        Self {
            location: prefs.location.trim().to_string(),
            vibe: prefs.vibe.trim().to_string(),
            event_type: prefs.event_type.trim().to_string(),
            window,
            breadth,
            search_terms: dedup_terms(terms),
            tags: intent.tags.clone(),
        }
    }

    /// Text-search phrases, capped by the search breadth
    pub fn query_phrases(&self) -> Vec<String> {
        if self.search_terms.is_empty() {
            return vec![format!("{} group venue", self.location)];
        }
        self.search_terms
            .iter()
            .take(self.breadth.query_variants)
            .map(|term| format!("{} {}", term, self.location))
            .collect()
    }

    /// Keyword string for event searches: vibe, event type unless already in the vibe, tags
    pub fn keyword_text(&self) -> String {
        let mut keywords = vec![self.vibe.clone()];
        if !self
            .vibe
            .to_lowercase()
            .contains(&self.event_type.to_lowercase())
        {
            keywords.push(self.event_type.clone());
        }
        keywords.extend(self.tags.iter().cloned());
        dedup_terms(keywords).join(" ")
    }
}

/// Trait for venue/event search providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait VenueProvider: Send + Sync {
    /// Search the provider for candidates matching the query
    ///
    /// An empty list is a legitimate answer; errors are reserved for calls that failed.
    async fn search(&self, query: &ProviderQuery) -> Result<Vec<Candidate>, ProviderError>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Turns a non-2xx response into a [`ProviderError::Status`].
pub(crate) async fn ensure_success(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Status {
        status: status.as_u16(),
        body: body.chars().take(200).collect(),
    })
}

/// Comma-joins the non-empty address parts.
pub(crate) fn join_address(parts: &[Option<&str>]) -> Option<String> {
    let joined = parts
        .iter()
        .flatten()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(", ");
    (!joined.is_empty()).then_some(joined)
}

/// Builds the configured provider set. Providers without a credential are left out.
pub fn build_providers(config: &Config, geocoder: &Geocoder) -> Vec<Arc<dyn VenueProvider>> {
    let mut providers: Vec<Arc<dyn VenueProvider>> = Vec::new();

    match non_blank(&config.google_places_api_key) {
        Some(key) => providers.push(Arc::new(GooglePlacesProvider::new(
            key,
            config.google_maps_api_url.clone(),
        ))),
        None => tracing::info!("GOOGLE_PLACES_API_KEY not set; Google Places provider disabled"),
    }

    match non_blank(&config.eventbrite_api_key) {
        Some(key) => providers.push(Arc::new(EventbriteProvider::new(
            key,
            config.eventbrite_api_url.clone(),
        ))),
        None => tracing::info!("EVENTBRITE_API_KEY not set; Eventbrite provider disabled"),
    }

    match non_blank(&config.meetup_api_key) {
        Some(key) => providers.push(Arc::new(MeetupProvider::new(
            key,
            config.meetup_api_url.clone(),
            geocoder.clone(),
        ))),
        None => tracing::info!("MEETUP_API_KEY not set; Meetup provider disabled"),
    }

    match config.facebook_token() {
        Some(token) => providers.push(Arc::new(FacebookEventsProvider::new(
            token,
            config.facebook_graph_api_url.clone(),
            geocoder.clone(),
        ))),
        None => {
            tracing::info!("FACEBOOK_GRAPH_API_TOKEN not set; Facebook Events provider disabled")
        }
    }

    if let Some(path) = non_blank(&config.event_ideas_path) {
        providers.push(Arc::new(LocalIdeasProvider::from_path(path)));
    }

    tracing::info!(
        providers = ?providers.iter().map(|p| p.name()).collect::<Vec<_>>(),
        "Providers enabled"
    );

    providers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Accessibility, DateRange, RefreshToken};

    fn prefs(vibe: &str, event_type: &str, refresh: Option<i64>) -> Preferences {
        Preferences {
            group_size: 6,
            location: "Leeds".to_string(),
            date_range: DateRange::relative("this week"),
            vibe: vibe.to_string(),
            event_type: event_type.to_string(),
            budget_level: None,
            accessibility: Accessibility::default(),
            age_range_hint: None,
            refresh_token: refresh.map(RefreshToken::Number),
        }
    }

    #[test]
    fn test_breadth_is_monotonic_in_refresh_level() {
        for a in 0..=MAX_REFRESH_LEVEL {
            for b in a..=MAX_REFRESH_LEVEL {
                let (low, high) = (SearchBreadth::for_level(a), SearchBreadth::for_level(b));
                assert!(high.query_variants >= low.query_variants);
                assert!(high.radius_km >= low.radius_km);
                assert!(high.page.unwrap_or(1) >= low.page.unwrap_or(1));
            }
        }
    }

    #[test]
    fn test_breadth_values() {
        assert_eq!(
            SearchBreadth::for_level(0),
            SearchBreadth {
                level: 0,
                query_variants: 3,
                radius_km: 50,
                page: None,
                include_fallback_terms: false,
            }
        );
        let widest = SearchBreadth::for_level(9);
        assert_eq!(widest.level, 3);
        assert_eq!(widest.query_variants, 6);
        assert_eq!(widest.radius_km, 110);
        assert_eq!(widest.page, Some(4));
    }

    #[test]
    fn test_query_phrases_grow_with_refresh() {
        let intent = NormalizedIntent::default();
        let mut previous = 0;
        for level in 0..=3 {
            let query = ProviderQuery::build(&prefs("karaoke", "evening", Some(level)), &intent, None);
            let phrases = query.query_phrases();
            assert!(phrases.len() >= previous);
            previous = phrases.len();
        }

        let first = ProviderQuery::build(&prefs("karaoke", "evening", None), &intent, None);
        assert_eq!(first.query_phrases(), vec!["karaoke bar Leeds"]);

        let refreshed = ProviderQuery::build(&prefs("karaoke", "evening", Some(2)), &intent, None);
        assert_eq!(
            refreshed.query_phrases(),
            vec![
                "karaoke bar Leeds",
                "group friendly Leeds",
                "fun venue Leeds",
                "things to do Leeds",
                "events near Leeds",
            ]
        );
    }

    #[test]
    fn test_tags_follow_keywords() {
        let intent = NormalizedIntent {
            tags: vec!["craft beer".to_string(), "karaoke bar".to_string()],
            categories: vec!["bar".to_string()],
        };
        let query = ProviderQuery::build(&prefs("karaoke", "evening", None), &intent, None);
        assert_eq!(query.search_terms, vec!["karaoke bar", "craft beer"]);
    }

    #[test]
    fn test_keyword_text_skips_repeated_event_type() {
        let intent = NormalizedIntent {
            tags: vec!["tapas".to_string()],
            categories: vec![],
        };
        let query = ProviderQuery::build(&prefs("night out dancing", "night out", None), &intent, None);
        assert_eq!(query.keyword_text(), "night out dancing tapas");

        let query = ProviderQuery::build(&prefs("chilled", "meal", None), &intent, None);
        assert_eq!(query.keyword_text(), "chilled meal tapas");
    }

    #[test]
    fn test_no_credentials_means_no_providers() {
        let config = envy::from_iter::<_, Config>(Vec::<(String, String)>::new()).unwrap();
        let geocoder = Geocoder::new(None, config.google_maps_api_url.clone());
        assert!(build_providers(&config, &geocoder).is_empty());
    }

    #[test]
    fn test_configured_credentials_enable_providers() {
        let config = envy::from_iter::<_, Config>(vec![
            ("GOOGLE_PLACES_API_KEY".to_string(), "g".to_string()),
            ("EVENTBRITE_API_KEY".to_string(), "e".to_string()),
            ("FACEBOOK_EVENTS_API_TOKEN".to_string(), "f".to_string()),
        ])
        .unwrap();
        let geocoder = Geocoder::new(config.geocode_api_key(), config.google_maps_api_url.clone());
        let names: Vec<_> = build_providers(&config, &geocoder)
            .iter()
            .map(|p| p.name())
            .collect();
        assert_eq!(names, vec!["google_places", "eventbrite", "facebook"]);
    }
}

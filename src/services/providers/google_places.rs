//! Google Places text search provider
//!
//! Issues one text search per query phrase ("<term> <location>"). A phrase that
//! fails is logged and skipped; the call only fails when every phrase failed.
//! When nothing came back for a creative or class-seeking vibe, one broader
//! "<location> art class" search runs before giving up.

use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::{
    error::ProviderError,
    models::{Candidate, CandidateKind, ExternalRef, Location},
    services::{
        geocode::Geometry,
        keywords::TokenSet,
        providers::{ensure_success, ProviderQuery, VenueProvider},
        relevance::has_art_intent,
    },
};

const SOURCE: &str = "google_places";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);
const MAPS_SEARCH_URL: &str = "https://www.google.com/maps/search/";

static CLASS_TOKENS: LazyLock<TokenSet> =
    LazyLock::new(|| TokenSet::new(&["class", "lesson", "course"]));

/// Whether an empty phrase search deserves the broader art-class pass
fn wants_class_pass(query: &ProviderQuery) -> bool {
    has_art_intent(&query.vibe, &query.event_type) || CLASS_TOKENS.matches(&query.vibe)
}

/// Google Maps search link for a free-text query, pinned to a place when its id is known.
pub fn map_search_url(query: &str, place_id: Option<&str>) -> String {
    let mut params = vec![("api", "1"), ("query", query)];
    if let Some(id) = place_id {
        params.push(("query_place_id", id));
    }
    match reqwest::Url::parse_with_params(MAPS_SEARCH_URL, &params) {
        Ok(url) => url.to_string(),
        Err(_) => MAPS_SEARCH_URL.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct TextSearchResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<PlaceResult>,
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    #[serde(default)]
    place_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    types: Vec<String>,
    #[serde(default)]
    vicinity: Option<String>,
    #[serde(default)]
    formatted_address: Option<String>,
    #[serde(default)]
    geometry: Option<Geometry>,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default)]
    business_status: Option<String>,
}

#[derive(Clone)]
pub struct GooglePlacesProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl GooglePlacesProvider {
    pub fn new(api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
        }
    }

    async fn text_search(&self, phrase: &str) -> Result<Vec<PlaceResult>, ProviderError> {
        let url = format!("{}/place/textsearch/json", self.api_url);

        let response = self
            .http_client
            .get(&url)
            .query(&[("query", phrase), ("key", self.api_key.as_str())])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let body: TextSearchResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        match body.status.as_deref() {
            None | Some("OK") | Some("ZERO_RESULTS") => Ok(body.results),
            Some(status) => Err(ProviderError::Upstream(match body.error_message {
                Some(message) => format!("{}: {}", status, message),
                None => status.to_string(),
            })),
        }
    }

    /// Broader "<location> art class" search; a failure here only means no extra results.
    async fn class_pass(&self, query: &ProviderQuery) -> Vec<Candidate> {
        let phrase = format!("{} art class", query.location);
        let places = match self.text_search(&phrase).await {
            Ok(places) => places,
            Err(e) => {
                tracing::warn!(phrase = %phrase, error = %e, "Google Places class search failed");
                return Vec::new();
            }
        };

        let mut seen = HashSet::new();
        let candidates: Vec<Candidate> = places
            .into_iter()
            .enumerate()
            .map(|(index, place)| Self::to_candidate(place, &phrase, index, &query.location))
            .filter(|candidate| seen.insert(candidate.id.clone()))
            .collect();
        tracing::debug!(phrase = %phrase, count = candidates.len(), "Google Places class search results");
        candidates
    }

    fn to_candidate(place: PlaceResult, phrase: &str, index: usize, location: &str) -> Candidate {
        let title = place
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| "Suggested venue".to_string());
        let id = place
            .place_id
            .clone()
            .unwrap_or_else(|| format!("google-{}-{}", phrase, index));
        let coords = place.geometry.and_then(|g| g.location);
        let url_query = format!(
            "{} {}",
            title,
            place.formatted_address.as_deref().unwrap_or(location)
        );

        Candidate {
            id,
            category: place.types.into_iter().next(),
            kind: CandidateKind::Venue,
            location: Location {
                name: Some(place.vicinity.unwrap_or_else(|| location.to_string())),
                address: place.formatted_address,
                lat: coords.as_ref().map(|c| c.lat),
                lng: coords.as_ref().map(|c| c.lng),
            },
            external: ExternalRef {
                source: Some(SOURCE.to_string()),
                url: Some(map_search_url(&url_query, place.place_id.as_deref())),
                source_id: place.place_id,
            },
            rough_price: None,
            rating: place.rating,
            description: place.business_status,
            title,
        }
    }
}

#[async_trait::async_trait]
impl VenueProvider for GooglePlacesProvider {
    async fn search(&self, query: &ProviderQuery) -> Result<Vec<Candidate>, ProviderError> {
        let phrases = query.query_phrases();
        let mut candidates = Vec::new();
        let mut failures = 0;
        let mut last_error = None;

        for phrase in &phrases {
            match self.text_search(phrase).await {
                Ok(places) => {
                    tracing::debug!(phrase = %phrase, count = places.len(), "Google Places results");
                    candidates.extend(places.into_iter().enumerate().map(|(index, place)| {
                        Self::to_candidate(place, phrase, index, &query.location)
                    }));
                }
                Err(e) => {
                    tracing::warn!(phrase = %phrase, error = %e, "Google Places phrase failed");
                    failures += 1;
                    last_error = Some(e);
                }
            }
        }

        if candidates.is_empty() && wants_class_pass(query) {
            candidates = self.class_pass(query).await;
        }

        match last_error {
            Some(e) if failures == phrases.len() && candidates.is_empty() => Err(e),
            _ => Ok(candidates),
        }
    }

    fn name(&self) -> &'static str {
        SOURCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_search_url_encodes_query() {
        assert_eq!(
            map_search_url("Board Game Cafe Leeds", None),
            "https://www.google.com/maps/search/?api=1&query=Board+Game+Cafe+Leeds"
        );
        assert_eq!(
            map_search_url("The Crown", Some("abc123")),
            "https://www.google.com/maps/search/?api=1&query=The+Crown&query_place_id=abc123"
        );
    }

    #[test]
    fn test_place_maps_to_candidate() {
        let place: PlaceResult = serde_json::from_value(serde_json::json!({
            "place_id": "p1",
            "name": "Dice Tavern",
            "types": ["bar", "point_of_interest"],
            "formatted_address": "1 Call Lane, Leeds",
            "geometry": {"location": {"lat": 53.79, "lng": -1.54}},
            "rating": 4.6
        }))
        .unwrap();

        let candidate = GooglePlacesProvider::to_candidate(place, "board games Leeds", 0, "Leeds");
        assert_eq!(candidate.id, "p1");
        assert_eq!(candidate.category.as_deref(), Some("bar"));
        assert_eq!(candidate.location.name.as_deref(), Some("Leeds"));
        assert_eq!(candidate.location.lat, Some(53.79));
        assert_eq!(candidate.external.source_id.as_deref(), Some("p1"));
        assert_eq!(
            candidate.external.url.as_deref(),
            Some("https://www.google.com/maps/search/?api=1&query=Dice+Tavern+1+Call+Lane%2C+Leeds&query_place_id=p1")
        );
    }

    fn query_for(vibe: &str) -> ProviderQuery {
        use crate::models::{Accessibility, DateRange, Preferences};
        use crate::services::intent::NormalizedIntent;

        let prefs = Preferences {
            group_size: 4,
            location: "Leeds".to_string(),
            date_range: DateRange::relative("this week"),
            vibe: vibe.to_string(),
            event_type: "afternoon".to_string(),
            budget_level: None,
            accessibility: Accessibility::default(),
            age_range_hint: None,
            refresh_token: None,
        };
        ProviderQuery::build(&prefs, &NormalizedIntent::default(), None)
    }

    #[test]
    fn test_class_pass_triggers() {
        assert!(wants_class_pass(&query_for("painting")));
        assert!(wants_class_pass(&query_for("salsa lesson")));
        assert!(wants_class_pass(&query_for("short course")));
        assert!(!wants_class_pass(&query_for("classic pub")));
        assert!(!wants_class_pass(&query_for("martial arts")));
    }

    #[test]
    fn test_nameless_place_gets_placeholder_id() {
        let place: PlaceResult = serde_json::from_value(serde_json::json!({})).unwrap();
        let candidate = GooglePlacesProvider::to_candidate(place, "pub Leeds", 3, "Leeds");
        assert_eq!(candidate.id, "google-pub Leeds-3");
        assert_eq!(candidate.title, "Suggested venue");
        assert!(candidate.external.source_id.is_none());
    }
}

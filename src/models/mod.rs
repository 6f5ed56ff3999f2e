use serde::{Deserialize, Serialize};

mod preferences;

pub use preferences::{
    Accessibility, DateMode, DateRange, Preferences, RefreshToken, MAX_REFRESH_LEVEL,
};

/// Upper bound on suggestions returned to the client
pub const MAX_SUGGESTIONS: usize = 5;

/// Whether a result is a place to go or a dated happening
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CandidateKind {
    #[default]
    Venue,
    Event,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Location {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

/// Geocoded point for a free-text location
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Pointer back to the provider a result came from
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExternalRef {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub source_id: Option<String>,
}

/// Raw venue or event record produced by a single provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: String,
    pub title: String,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub kind: CandidateKind,
    pub location: Location,
    pub external: ExternalRef,
    pub rough_price: Option<String>,
    pub rating: Option<f64>,
    pub description: Option<String>,
}

impl Candidate {
    /// Key used to collapse duplicates: the provider-native id, else the lowercased title.
    pub fn dedup_key(&self) -> String {
        match self.external.source_id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => self.title.to_lowercase(),
        }
    }
}

/// Coarse routing hint for the client UI
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedFlow {
    MealsDrinks,
    Trip,
    #[default]
    General,
}

impl RecommendedFlow {
    /// Flow implied by the event type when nothing better is known
    pub fn for_event_type(event_type: &str) -> Self {
        let event_type = event_type.to_lowercase();
        if event_type.contains("meal") || event_type.contains("drink") {
            RecommendedFlow::MealsDrinks
        } else if ["trip", "weekend", "holiday"]
            .iter()
            .any(|t| event_type.contains(t))
        {
            RecommendedFlow::Trip
        } else {
            RecommendedFlow::General
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "meals_drinks" => Some(RecommendedFlow::MealsDrinks),
            "trip" => Some(RecommendedFlow::Trip),
            "general" => Some(RecommendedFlow::General),
            _ => None,
        }
    }
}

/// Ranked, user-facing suggestion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub id: String,
    pub title: String,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub kind: CandidateKind,
    pub recommended_flow: RecommendedFlow,
    pub location: Location,
    pub external: ExternalRef,
    pub date_fit_summary: Option<String>,
    pub group_fit_summary: Option<String>,
    pub why_suitable: Option<String>,
    pub rough_price: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuggestEventsResponse {
    pub suggestions: Vec<Suggestion>,
}

/// One entry of the linked-vibes vocabulary
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VocabularyEntry {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
}

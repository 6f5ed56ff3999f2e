//! Facebook Graph event search provider
//!
//! The Graph search endpoint needs a centre point, so this provider returns no
//! results (rather than failing) when the location cannot be geocoded.

use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::{
    error::ProviderError,
    models::{Candidate, CandidateKind, Coordinates, ExternalRef, Location},
    services::{
        geocode::Geocoder,
        providers::{ensure_success, join_address, ProviderQuery, VenueProvider},
    },
};

const SOURCE: &str = "facebook";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(12);
/// Graph API rejects larger search distances
const MAX_DISTANCE_M: u32 = 120_000;
const EVENT_FIELDS: &str = "id,name,description,start_time,end_time,place,category,is_online";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<GraphEvent>,
}

#[derive(Debug, Deserialize)]
struct GraphEvent {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    place: Option<GraphPlace>,
}

#[derive(Debug, Deserialize)]
struct GraphPlace {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    location: Option<GraphLocation>,
}

#[derive(Debug, Deserialize)]
struct GraphLocation {
    #[serde(default)]
    street: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
}

#[derive(Clone)]
pub struct FacebookEventsProvider {
    http_client: HttpClient,
    access_token: String,
    api_url: String,
    geocoder: Geocoder,
}

impl FacebookEventsProvider {
    pub fn new(access_token: String, api_url: String, geocoder: Geocoder) -> Self {
        Self {
            http_client: HttpClient::new(),
            access_token,
            api_url,
            geocoder,
        }
    }

    fn search_params(&self, query: &ProviderQuery, center: Coordinates) -> Vec<(&'static str, String)> {
        let q = match query.keyword_text() {
            text if text.is_empty() => "events near me".to_string(),
            text => text,
        };
        let distance = (query.breadth.radius_km * 1000).min(MAX_DISTANCE_M);

        let mut params = vec![
            ("type", "event".to_string()),
            ("q", q),
            ("center", format!("{},{}", center.lat, center.lng)),
            ("distance", distance.to_string()),
            ("fields", EVENT_FIELDS.to_string()),
            ("limit", "30".to_string()),
            ("access_token", self.access_token.clone()),
        ];
        if let Some(window) = &query.window {
            params.push(("since", window.start.timestamp().to_string()));
            params.push(("until", window.end.timestamp().to_string()));
        }
        params
    }

    fn to_candidate(event: GraphEvent, index: usize, location: &str) -> Candidate {
        let id = event
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| format!("{}-{}", SOURCE, index));
        let (place_name, place_location) = match event.place {
            Some(place) => (place.name, place.location),
            None => (None, None),
        };
        let address = place_location.as_ref().and_then(|l| {
            join_address(&[l.street.as_deref(), l.city.as_deref(), l.country.as_deref()])
        });

        Candidate {
            title: event
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| "Facebook event".to_string()),
            category: Some(event.category.unwrap_or_else(|| "event".to_string())),
            kind: CandidateKind::Event,
            location: Location {
                name: Some(place_name.unwrap_or_else(|| location.to_string())),
                address,
                lat: place_location.as_ref().and_then(|l| l.latitude),
                lng: place_location.as_ref().and_then(|l| l.longitude),
            },
            external: ExternalRef {
                source: Some(SOURCE.to_string()),
                url: Some(format!("https://www.facebook.com/events/{}", id)),
                source_id: Some(id.clone()),
            },
            rough_price: None,
            rating: None,
            description: event.description,
            id,
        }
    }
}

#[async_trait::async_trait]
impl VenueProvider for FacebookEventsProvider {
    async fn search(&self, query: &ProviderQuery) -> Result<Vec<Candidate>, ProviderError> {
        let Some(center) = self.geocoder.locate(&query.location).await else {
            tracing::info!(location = %query.location, "Facebook events skipped: no coordinates");
            return Ok(Vec::new());
        };

        let url = format!("{}/search", self.api_url);
        let params = self.search_params(query, center);

        let response = self
            .http_client
            .get(&url)
            .query(&params)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let body: SearchResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        tracing::info!(
            count = body.data.len(),
            location = %query.location,
            "Facebook returned events"
        );

        Ok(body
            .data
            .into_iter()
            .enumerate()
            .map(|(index, event)| Self::to_candidate(event, index, &query.location))
            .collect())
    }

    fn name(&self) -> &'static str {
        SOURCE
    }
}

//! Meetup upcoming-events provider
//!
//! Coordinates are optional: without a geocode the search is text-only.

use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::ProviderError,
    models::{Candidate, CandidateKind, Coordinates, ExternalRef, Location},
    services::{
        geocode::Geocoder,
        providers::{ensure_success, join_address, ProviderQuery, VenueProvider},
    },
};

const SOURCE: &str = "meetup";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(12);
const PAGE_SIZE: &str = "30";

#[derive(Debug, Deserialize)]
struct UpcomingEventsResponse {
    #[serde(default)]
    events: Vec<MeetupEvent>,
}

#[derive(Debug, Deserialize)]
struct MeetupEvent {
    /// Numeric or string depending on API version
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    event_url: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    plain_text_no_images_description: Option<String>,
    #[serde(default)]
    venue: Option<MeetupVenue>,
    #[serde(default)]
    group: Option<MeetupGroup>,
    #[serde(default)]
    fee: Option<MeetupFee>,
}

#[derive(Debug, Deserialize)]
struct MeetupVenue {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    address_1: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct MeetupGroup {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MeetupFee {
    #[serde(default)]
    amount: Option<f64>,
}

fn id_text(id: Option<Value>) -> Option<String> {
    match id? {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Clone)]
pub struct MeetupProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    geocoder: Geocoder,
}

impl MeetupProvider {
    pub fn new(api_key: String, api_url: String, geocoder: Geocoder) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            geocoder,
        }
    }

    fn search_params(
        &self,
        query: &ProviderQuery,
        coords: Option<Coordinates>,
    ) -> Vec<(&'static str, String)> {
        let text = match query.keyword_text() {
            text if text.is_empty() => query.location.clone(),
            text => text,
        };
        let mut params = vec![
            ("key", self.api_key.clone()),
            ("text", text),
            ("page", PAGE_SIZE.to_string()),
            ("sign", "true".to_string()),
            ("photo-host", "public".to_string()),
            ("fields", "plain_text_no_images_description".to_string()),
            ("order", "time".to_string()),
        ];
        if let Some(coords) = coords {
            params.push(("lat", coords.lat.to_string()));
            params.push(("lon", coords.lng.to_string()));
            params.push(("radius", query.breadth.radius_km.to_string()));
        }
        if let Some(window) = &query.window {
            params.push(("start_date_range", window.start_iso()));
            params.push(("end_date_range", window.end_iso()));
        }
        params
    }

    fn to_candidate(event: MeetupEvent, index: usize, location: &str) -> Candidate {
        let id = id_text(event.id).unwrap_or_else(|| format!("{}-{}", SOURCE, index));
        let venue = event.venue;
        let address = venue.as_ref().and_then(|v| {
            join_address(&[
                v.address_1.as_deref(),
                v.city.as_deref(),
                v.country.as_deref(),
            ])
        });
        let rough_price = match event.fee.and_then(|f| f.amount) {
            Some(amount) if amount == 0.0 => Some("Free".to_string()),
            _ => None,
        };
        let group_name = event.group.and_then(|g| g.name);
        let (venue_name, lat, lng) = match venue {
            Some(v) => (v.name, v.lat, v.lon),
            None => (None, None, None),
        };

        Candidate {
            id: id.clone(),
            title: event
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| "Meetup event".to_string()),
            category: Some("event".to_string()),
            kind: CandidateKind::Event,
            location: Location {
                name: Some(
                    venue_name
                        .or(group_name)
                        .unwrap_or_else(|| location.to_string()),
                ),
                address,
                lat,
                lng,
            },
            external: ExternalRef {
                source: Some(SOURCE.to_string()),
                url: event.link.or(event.event_url),
                source_id: Some(id),
            },
            rough_price,
            rating: None,
            description: event.plain_text_no_images_description.or(event.description),
        }
    }
}

#[async_trait::async_trait]
impl VenueProvider for MeetupProvider {
    async fn search(&self, query: &ProviderQuery) -> Result<Vec<Candidate>, ProviderError> {
        let coords = self.geocoder.locate(&query.location).await;
        let url = format!("{}/find/upcoming_events", self.api_url);
        let params = self.search_params(query, coords);

        let response = self
            .http_client
            .get(&url)
            .query(&params)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let body: UpcomingEventsResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        tracing::info!(
            count = body.events.len(),
            location = %query.location,
            geocoded = coords.is_some(),
            "Meetup returned events"
        );

        Ok(body
            .events
            .into_iter()
            .enumerate()
            .map(|(index, event)| Self::to_candidate(event, index, &query.location))
            .collect())
    }

    fn name(&self) -> &'static str {
        SOURCE
    }
}

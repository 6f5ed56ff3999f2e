//! Eventbrite event search provider

use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::{
    error::ProviderError,
    models::{Candidate, CandidateKind, ExternalRef, Location},
    services::providers::{ensure_success, ProviderQuery, VenueProvider},
};

const SOURCE: &str = "eventbrite";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(12);
const PAGE_SIZE: &str = "20";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    events: Vec<EventbriteEvent>,
}

#[derive(Debug, Deserialize)]
struct TextField {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventbriteEvent {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<TextField>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    is_free: Option<bool>,
    #[serde(default)]
    venue: Option<EventbriteVenue>,
}

#[derive(Debug, Deserialize)]
struct EventbriteVenue {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    address: Option<EventbriteAddress>,
    /// Eventbrite sends coordinates as strings
    #[serde(default)]
    latitude: Option<String>,
    #[serde(default)]
    longitude: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventbriteAddress {
    #[serde(default)]
    localized_address_display: Option<String>,
    #[serde(default)]
    localized_multi_line_address_display: Option<Vec<String>>,
}

impl EventbriteAddress {
    fn display(self) -> Option<String> {
        match self.localized_multi_line_address_display {
            Some(lines) => lines.into_iter().next(),
            None => self.localized_address_display,
        }
    }
}

#[derive(Clone)]
pub struct EventbriteProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl EventbriteProvider {
    pub fn new(api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
        }
    }

    fn search_params(&self, query: &ProviderQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("location.address", query.location.clone()),
            ("location.within", format!("{}km", query.breadth.radius_km)),
            ("expand", "venue".to_string()),
            ("sort_by", "date".to_string()),
            ("page_size", PAGE_SIZE.to_string()),
            // Also sent as a query parameter; some proxies strip the auth header
            ("token", self.api_key.clone()),
        ];
        if let Some(page) = query.breadth.page {
            params.push(("page", page.to_string()));
        }
        if let Some(window) = &query.window {
            params.push(("start_date.range_start", window.start_iso()));
            params.push(("start_date.range_end", window.end_iso()));
        }
        let keywords = query.keyword_text();
        if !keywords.is_empty() {
            params.push(("q", keywords));
        }
        params
    }

    fn to_candidate(event: EventbriteEvent, index: usize, location: &str) -> Candidate {
        let title = event
            .name
            .and_then(|n| n.text)
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "Event".to_string());
        let venue = event.venue;
        let parse_coord = |value: Option<&String>| value.and_then(|v| v.parse::<f64>().ok());
        let (lat, lng) = match &venue {
            Some(v) => (parse_coord(v.latitude.as_ref()), parse_coord(v.longitude.as_ref())),
            None => (None, None),
        };
        let (venue_name, address) = match venue {
            Some(v) => (v.name, v.address.and_then(EventbriteAddress::display)),
            None => (None, None),
        };

        Candidate {
            id: event
                .id
                .clone()
                .unwrap_or_else(|| format!("{}-{}", SOURCE, index)),
            title,
            category: Some("event".to_string()),
            kind: CandidateKind::Event,
            location: Location {
                name: Some(venue_name.unwrap_or_else(|| location.to_string())),
                address,
                lat,
                lng,
            },
            external: ExternalRef {
                source: Some(SOURCE.to_string()),
                url: event.url,
                source_id: event.id,
            },
            rough_price: event.is_free.filter(|free| *free).map(|_| "Free".to_string()),
            rating: None,
            description: event.summary,
        }
    }
}

#[async_trait::async_trait]
impl VenueProvider for EventbriteProvider {
    async fn search(&self, query: &ProviderQuery) -> Result<Vec<Candidate>, ProviderError> {
        let url = format!("{}/events/search/", self.api_url);
        let params = self.search_params(query);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.api_key)
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
            count = body.events.len(),
            location = %query.location,
            "Eventbrite returned events"
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

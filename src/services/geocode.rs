//! Google Geocoding lookups for free-text locations
//!
//! Results are shared process-wide through [`GeocodeCache`]; a location is
//! looked up at most once per TTL even when many requests miss at the same time.

use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::{
    cache::{CacheKey, GeocodeCache},
    error::ProviderError,
    models::Coordinates,
    services::providers::ensure_success,
};

const GEOCODE_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Debug, Deserialize)]
pub(crate) struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Geometry {
    #[serde(default)]
    pub location: Option<LatLng>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    #[serde(default)]
    geometry: Option<Geometry>,
}

#[derive(Clone)]
pub struct Geocoder {
    http_client: HttpClient,
    api_key: Option<String>,
    api_url: String,
    cache: GeocodeCache,
}

impl Geocoder {
    pub fn new(api_key: Option<String>, api_url: String) -> Self {
        Self::with_cache(api_key, api_url, GeocodeCache::default())
    }

    pub fn with_cache(api_key: Option<String>, api_url: String, cache: GeocodeCache) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            cache,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// Coordinates for `location`, or `None` when geocoding is unavailable or fails.
    pub async fn locate(&self, location: &str) -> Option<Coordinates> {
        let api_key = self.api_key.as_deref()?;
        if location.trim().is_empty() {
            return None;
        }

        let key = CacheKey::geocode(location);
        match self
            .cache
            .get_or_try_insert_with(&key, self.fetch(api_key, location))
            .await
        {
            Ok(coords) => Some(coords),
            Err(e) => {
                tracing::warn!(location = %location, error = %e, "Geocoding failed");
                None
            }
        }
    }

    async fn fetch(&self, api_key: &str, location: &str) -> Result<Coordinates, ProviderError> {
        let url = format!("{}/geocode/json", self.api_url);

        tracing::debug!(location = %location, "Geocoding location");

        let response = self
            .http_client
            .get(&url)
            .query(&[("address", location), ("key", api_key)])
            .timeout(GEOCODE_TIMEOUT)
            .send()
            .await?;

        let body: GeocodeResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        body.results
            .into_iter()
            .find_map(|r| r.geometry.and_then(|g| g.location))
            .map(|loc| Coordinates {
                lat: loc.lat,
                lng: loc.lng,
            })
            .ok_or_else(|| {
                ProviderError::Upstream(body.status.unwrap_or_else(|| "ZERO_RESULTS".to_string()))
            })
    }
}

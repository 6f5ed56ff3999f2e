use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::models::Coordinates;

pub mod vocabulary;

pub use vocabulary::VocabularyStore;

const GEOCODE_CACHE_CAPACITY: u64 = 10_000;
const GEOCODE_CACHE_TTL: Duration = Duration::from_secs(86_400); // 1 day

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Geocode(String),
}

impl CacheKey {
    /// Geocode key for a free-text location, normalised so "Leeds " and "leeds" share an entry
    pub fn geocode(location: &str) -> Self {
        CacheKey::Geocode(location.trim().to_lowercase())
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Geocode(location) => write!(f, "geocode:{}", location),
        }
    }
}

/// Process-wide geocode results, keyed by normalised location text
///
/// Population goes through moka's single-flight initialisation: concurrent
/// misses on the same key wait for one lookup instead of each issuing their own.
/// Failed lookups are never stored.
#[derive(Clone)]
pub struct GeocodeCache {
    entries: moka::future::Cache<String, Coordinates>,
}

impl Default for GeocodeCache {
    fn default() -> Self {
        Self::new(GEOCODE_CACHE_CAPACITY, GEOCODE_CACHE_TTL)
    }
}

impl GeocodeCache {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        let entries = moka::future::CacheBuilder::new(capacity)
            .time_to_live(ttl)
            .build();
        Self { entries }
    }

    pub async fn get(&self, key: &CacheKey) -> Option<Coordinates> {
        self.entries.get(&key.to_string()).await
    }

    /// Returns the cached coordinates or runs `lookup` once to fill the entry.
    pub async fn get_or_try_insert_with<F, E>(
        &self,
        key: &CacheKey,
        lookup: F,
    ) -> Result<Coordinates, Arc<E>>
    where
        F: Future<Output = Result<Coordinates, E>>,
        E: Send + Sync + 'static,
    {
        self.entries.try_get_with(key.to_string(), lookup).await
    }

    pub async fn insert(&self, key: &CacheKey, value: Coordinates) {
        self.entries.insert(key.to_string(), value).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_cache_key_display_geocode() {
        let key = CacheKey::geocode("  Leeds ");
        assert_eq!(format!("{}", key), "geocode:leeds");
    }

    #[test]
    fn test_cache_key_normalises_case() {
        assert_eq!(CacheKey::geocode("LEEDS"), CacheKey::geocode("leeds"));
    }

    #[tokio::test]
    async fn test_cache_miss() {
        let cache = GeocodeCache::default();
        assert_eq!(cache.get(&CacheKey::geocode("nowhere")).await, None);
    }

    #[tokio::test]
    async fn test_concurrent_population_runs_lookup_once() {
        let cache = GeocodeCache::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = CacheKey::geocode("Leeds");

        let lookups = (0..8).map(|_| {
            let cache = cache.clone();
            let calls = calls.clone();
            let key = key.clone();
            tokio::spawn(async move {
                cache
                    .get_or_try_insert_with(&key, async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok::<_, std::io::Error>(Coordinates {
                            lat: 53.8,
                            lng: -1.55,
                        })
                    })
                    .await
            })
        });

        for handle in lookups.collect::<Vec<_>>() {
            let coords = handle.await.unwrap().unwrap();
            assert_eq!(coords.lat, 53.8);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_lookup_is_not_cached() {
        let cache = GeocodeCache::default();
        let key = CacheKey::geocode("Atlantis");

        let first = cache
            .get_or_try_insert_with(&key, async {
                Err::<Coordinates, _>(std::io::Error::other("no results"))
            })
            .await;
        assert!(first.is_err());
        assert_eq!(cache.get(&key).await, None);

        cache.insert(&key, Coordinates { lat: 1.0, lng: 2.0 }).await;
        assert_eq!(
            cache.get(&key).await,
            Some(Coordinates { lat: 1.0, lng: 2.0 })
        );
    }
}

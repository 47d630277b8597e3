//! Forward geocoding: convert a free-text place name to coordinates.
//!
//! Uses Nominatim (OpenStreetMap), which needs no API key but requires a
//! descriptive User-Agent and at most one request per second.

mod cache;
mod fallback;

pub use cache::{GeocodeCache, MemoryGeocodeCache};
pub use fallback::known_city_keys;

use crate::config::GeocodingSettings;
use crate::error::{Result, RiggingError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// A resolved place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
    /// Best locality name (city, town, village, ...).
    pub name: String,
    pub state: Option<String>,
    pub country: String,
    /// Upper-case ISO code, empty when the provider gave none.
    pub country_code: String,
    pub display_name: Option<String>,
}

impl Location {
    /// Short label such as "Charleston, SC, US".
    pub fn label(&self) -> String {
        let mut label = self.name.clone();
        if let Some(state) = self.state.as_deref().filter(|s| !s.is_empty()) {
            label.push_str(", ");
            label.push_str(state);
        }
        if !self.country_code.is_empty() {
            label.push_str(", ");
            label.push_str(&self.country_code);
        } else if !self.country.is_empty() {
            label.push_str(", ");
            label.push_str(&self.country);
        }
        label
    }
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: Option<String>,
    #[serde(default)]
    address: NominatimAddress,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    hamlet: Option<String>,
    state: Option<String>,
    province: Option<String>,
    country: Option<String>,
    country_code: Option<String>,
}

impl NominatimPlace {
    fn into_location(self) -> Result<Location> {
        let lat: f64 = self
            .lat
            .trim()
            .parse()
            .map_err(|_| RiggingError::Provider(format!("Invalid latitude: {}", self.lat)))?;
        let lon: f64 = self
            .lon
            .trim()
            .parse()
            .map_err(|_| RiggingError::Provider(format!("Invalid longitude: {}", self.lon)))?;

        let addr = self.address;

        // Prefer city > town > village > hamlet, then the head of display_name
        let name = addr
            .city
            .or(addr.town)
            .or(addr.village)
            .or(addr.hamlet)
            .filter(|n| !n.is_empty())
            .or_else(|| {
                self.display_name
                    .as_deref()
                    .and_then(|d| d.split(',').next())
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
            })
            .unwrap_or_else(|| "Unknown".to_string());

        Ok(Location {
            lat,
            lon,
            name,
            state: addr.state.or(addr.province),
            country: addr.country.unwrap_or_else(|| "Unknown".to_string()),
            country_code: addr.country_code.unwrap_or_default().to_uppercase(),
            display_name: self.display_name,
        })
    }
}

/// Resolves place names, consulting a cache before the provider.
pub struct Geocoder {
    client: Client,
    base_url: String,
    pacing: Duration,
    cache: Arc<dyn GeocodeCache>,
}

impl Geocoder {
    /// Create a geocoder from settings with an in-memory cache.
    pub fn new(settings: &GeocodingSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(settings.user_agent.as_str())
            .build()?;

        let cache = MemoryGeocodeCache::new(
            settings.cache_capacity,
            settings.cache_ttl_seconds.map(Duration::from_secs),
        );

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            pacing: Duration::from_millis(settings.pacing_millis),
            cache: Arc::new(cache),
        })
    }

    /// Replace the cache, e.g. to share one between geocoders.
    pub fn with_cache(mut self, cache: Arc<dyn GeocodeCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &Arc<dyn GeocodeCache> {
        &self.cache
    }

    fn cache_key(city_name: &str) -> String {
        city_name.trim().to_lowercase()
    }

    /// Resolve a place name to a location.
    ///
    /// Returns `None` when the provider has no match or answers with an error
    /// status. A transport or parse failure falls back to the static table.
    /// Only provider answers are cached.
    #[instrument(skip(self))]
    pub async fn resolve(&self, city_name: &str) -> Option<Location> {
        let key = Self::cache_key(city_name);
        if let Some(hit) = self.cache.get(&key) {
            debug!("Using cached geocoding for '{}'", city_name);
            return Some(hit);
        }

        match self.query_provider(city_name.trim()).await {
            Ok(Some(location)) => {
                info!(
                    "Geocoded '{}' to ({}, {}) [{}]",
                    city_name.trim(),
                    location.lat,
                    location.lon,
                    location.label()
                );
                self.cache.insert(key, location.clone());
                Some(location)
            }
            Ok(None) => {
                warn!("No geocoding results for '{}'", city_name.trim());
                None
            }
            Err(e) => {
                warn!("Geocoding failed for '{}': {}", city_name.trim(), e);
                let fallback = fallback::lookup(city_name);
                if let Some(loc) = &fallback {
                    debug!("Using fallback coordinates for '{}' ({})", city_name, loc.name);
                }
                fallback
            }
        }
    }

    async fn query_provider(&self, query: &str) -> Result<Option<Location>> {
        let url = format!("{}/search", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("limit", "1"),
                ("addressdetails", "1"),
            ])
            .send()
            .await;

        // Provider policy: at most one request per second
        if !self.pacing.is_zero() {
            tokio::time::sleep(self.pacing).await;
        }

        let response = response?;
        // Error status counts as not found
        if !response.status().is_success() {
            warn!("Geocoding API returned status {}", response.status());
            return Ok(None);
        }

        let places: Vec<NominatimPlace> = response.json().await?;
        match places.into_iter().next() {
            Some(place) => Ok(Some(place.into_location()?)),
            None => Ok(None),
        }
    }
}

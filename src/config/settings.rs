//! Configuration settings for Rigging.

use crate::error::{Result, RiggingError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub geocoding: GeocodingSettings,
    pub weather: WeatherSettings,
    pub search: SearchSettings,
    pub store: StoreSettings,
    pub agent: AgentSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Geocoding provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingSettings {
    /// Base URL of the Nominatim-compatible search endpoint.
    pub base_url: String,
    /// User-Agent sent with every request (required by the provider's policy).
    pub user_agent: String,
    /// Courtesy delay after each outbound request, in milliseconds.
    pub pacing_millis: u64,
    /// Maximum number of cached resolutions.
    pub cache_capacity: usize,
    /// Drop cached resolutions older than this. None = never expire.
    pub cache_ttl_seconds: Option<u64>,
}

impl Default for GeocodingSettings {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: format!("Rigging-Weather-Tool/{}", env!("CARGO_PKG_VERSION")),
            pacing_millis: 1000,
            cache_capacity: 1024,
            cache_ttl_seconds: None,
        }
    }
}

/// Current-weather provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherSettings {
    /// Base URL of the OpenWeatherMap-compatible API.
    pub base_url: String,
    /// API key (usually supplied via OPENWEATHERMAP_API_KEY).
    pub api_key: Option<String>,
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openweathermap.org".to_string(),
            api_key: None,
        }
    }
}

/// Web search provider type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchProvider {
    /// SerpAPI (default).
    #[default]
    SerpApi,
    /// Serper.dev.
    Serper,
}

impl std::str::FromStr for SearchProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "serpapi" => Ok(SearchProvider::SerpApi),
            "serper" => Ok(SearchProvider::Serper),
            _ => Err(format!("Unknown search provider: {}", s)),
        }
    }
}

impl std::fmt::Display for SearchProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchProvider::SerpApi => write!(f, "serpapi"),
            SearchProvider::Serper => write!(f, "serper"),
        }
    }
}

/// Web search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Which provider to call.
    pub provider: SearchProvider,
    /// SerpAPI base URL.
    pub base_url: String,
    /// SerpAPI key (usually supplied via SERPAPI_KEY).
    pub api_key: Option<String>,
    /// Serper base URL.
    pub serper_base_url: String,
    /// Serper key (usually supplied via SERPER_API_KEY).
    pub serper_api_key: Option<String>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            provider: SearchProvider::SerpApi,
            base_url: "https://serpapi.com".to_string(),
            api_key: None,
            serper_base_url: "https://google.serper.dev".to_string(),
            serper_api_key: None,
        }
    }
}

/// SQLite tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Database used when the session has not configured one.
    pub default_path: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            default_path: "sqlite_db.db".to_string(),
        }
    }
}

/// Identity reported to the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    pub app_name: String,
    pub user_id: String,
    /// Fixed session id. None = generate one per server run.
    pub session_id: Option<String>,
    /// Model the dispatcher should use for agents backed by these tools.
    pub model: String,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            app_name: "rigging".to_string(),
            user_id: "user".to_string(),
            session_id: None,
            model: "openai/gpt-4o-mini".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    ///
    /// Environment overrides are applied on top of the file contents.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) if !p.exists() => {
                return Err(RiggingError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )))
            }
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_env(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Apply environment overrides using the given lookup.
    ///
    /// Empty values are ignored so that an exported-but-blank variable does
    /// not wipe a key from the config file.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("OPENWEATHERMAP_API_KEY") {
            self.weather.api_key = Some(key);
        }
        if let Some(key) = get("SERPAPI_KEY") {
            self.search.api_key = Some(key);
        }
        if let Some(key) = get("SERPER_API_KEY") {
            self.search.serper_api_key = Some(key);
        }
        if let Some(provider) = get("RIGGING_SEARCH_PROVIDER") {
            match provider.parse() {
                Ok(p) => self.search.provider = p,
                Err(e) => tracing::warn!("Ignoring RIGGING_SEARCH_PROVIDER: {}", e),
            }
        }
        if let Some(name) = get("RIGGING_APP_NAME") {
            self.agent.app_name = name;
        }
        if let Some(user) = get("RIGGING_USER_ID") {
            self.agent.user_id = user;
        }
        if let Some(session) = get("RIGGING_SESSION_ID") {
            self.agent.session_id = Some(session);
        }
        if let Some(model) = get("RIGGING_MODEL") {
            self.agent.model = model;
        }
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rigging")
            .join("config.toml")
    }
}

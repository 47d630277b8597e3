//! Configuration module for Rigging.
//!
//! Settings come from a TOML file with environment overrides for API keys
//! and agent identity.

mod settings;

pub use settings::{
    AgentSettings, GeneralSettings, GeocodingSettings, SearchProvider, SearchSettings,
    Settings, StoreSettings, WeatherSettings,
};

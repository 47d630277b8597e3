//! Conversation-scoped state threaded through tool calls.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Preferred temperature unit for weather reports.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Unit system name understood by the weather provider.
    pub fn api_units(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "metric",
            TemperatureUnit::Fahrenheit => "imperial",
        }
    }

    pub fn temperature_symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }

    pub fn wind_speed_unit(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "m/s",
            TemperatureUnit::Fahrenheit => "mph",
        }
    }
}

impl std::str::FromStr for TemperatureUnit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "celsius" => Ok(TemperatureUnit::Celsius),
            "fahrenheit" => Ok(TemperatureUnit::Fahrenheit),
            _ => Err(format!(
                "Invalid temperature unit: '{}'. Please use 'Celsius' or 'Fahrenheit'.",
                s
            )),
        }
    }
}

impl std::fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemperatureUnit::Celsius => write!(f, "Celsius"),
            TemperatureUnit::Fahrenheit => write!(f, "Fahrenheit"),
        }
    }
}

/// Mutable state for one conversation.
///
/// Created by whoever owns the conversation and passed by `&mut` into every
/// stateful tool. Nothing here is persisted by Rigging.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionState {
    pub user_preference_temperature_unit: TemperatureUnit,
    pub last_city_checked_stateful: Option<String>,
    /// Absolute path of the database the SQLite tools operate on.
    pub sqlite_db_path: Option<PathBuf>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }
}

//! Current-weather lookup honoring the session's unit preference.
//!
//! Resolves the place with the [`Geocoder`], then asks an
//! OpenWeatherMap-compatible endpoint for current conditions at those
//! coordinates. One attempt per call; failures come back as [`ToolError`]s.

use crate::config::WeatherSettings;
use crate::error::{Result, ToolError, ToolResult};
use crate::geocoding::Geocoder;
use crate::session::{SessionState, TemperatureUnit};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Structured weather observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherData {
    pub city: String,
    pub coordinates: Coordinates,
    pub temperature: f64,
    pub temperature_unit: String,
    pub condition: String,
    pub humidity: f64,
    pub wind_speed: f64,
}

/// Human-readable report plus the data it was built from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    pub report: String,
    pub data: WeatherData,
}

/// Fields pulled out of the provider payload.
#[derive(Debug)]
struct Observation {
    temperature: f64,
    condition: String,
    humidity: f64,
    wind_speed: f64,
}

impl Observation {
    fn from_payload(payload: &Value) -> ToolResult<Self> {
        Ok(Self {
            temperature: number(&payload["main"]["temp"], "main.temp")?,
            condition: payload["weather"][0]["description"]
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| missing_field("weather[0].description"))?,
            humidity: number(&payload["main"]["humidity"], "main.humidity")?,
            wind_speed: number(&payload["wind"]["speed"], "wind.speed")?,
        })
    }
}

fn number(value: &Value, path: &str) -> ToolResult<f64> {
    value.as_f64().ok_or_else(|| missing_field(path))
}

fn missing_field(path: &str) -> ToolError {
    ToolError::data_shape(format!(
        "Data format error: Missing expected field '{}' in weather data.",
        path
    ))
}

/// Weather lookups against the configured provider.
pub struct WeatherService {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    geocoder: Arc<Geocoder>,
}

impl WeatherService {
    pub fn new(settings: &WeatherSettings, geocoder: Arc<Geocoder>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone().filter(|k| !k.trim().is_empty()),
            geocoder,
        })
    }

    /// Replace the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    /// Look up current weather for a city.
    ///
    /// On success the resolved place label is recorded in
    /// `state.last_city_checked_stateful`.
    #[instrument(skip(self, state))]
    pub async fn lookup(&self, city: &str, state: &mut SessionState) -> ToolResult<WeatherReport> {
        let unit = state.user_preference_temperature_unit;
        debug!("Preferred temperature unit: {}", unit);

        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ToolError::configuration(
                "OpenWeatherMap API key not found. Please set the OPENWEATHERMAP_API_KEY environment variable.",
            )
        })?;

        let location = self.geocoder.resolve(city).await.ok_or_else(|| {
            ToolError::not_found(format!(
                "Could not find coordinates for location: '{}'. Please check the spelling and try again.",
                city
            ))
        })?;

        let url = format!("{}/data/2.5/weather", self.base_url);
        debug!(
            "Requesting {} for ({}, {}) units={}",
            url,
            location.lat,
            location.lon,
            unit.api_units()
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", location.lat.to_string()),
                ("lon", location.lon.to_string()),
                ("appid", api_key.to_string()),
                ("units", unit.api_units().to_string()),
            ])
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = api_error(status, &body, city, location.lat, location.lon);
            warn!("Weather API error: {}", err);
            return Err(err);
        }

        let payload: Value = response.json().await.map_err(|e| {
            ToolError::data_shape(format!(
                "Data format error: could not decode weather data: {}",
                e.without_url()
            ))
        })?;
        let observation = Observation::from_payload(&payload)?;

        let label = location.label();
        let report = format_report(&label, &observation, unit);

        state.last_city_checked_stateful = Some(label.clone());
        info!("Generated weather report for {}", label);

        Ok(WeatherReport {
            report,
            data: WeatherData {
                city: label,
                coordinates: Coordinates {
                    lat: location.lat,
                    lon: location.lon,
                },
                temperature: observation.temperature,
                temperature_unit: unit.temperature_symbol().to_string(),
                condition: observation.condition,
                humidity: observation.humidity,
                wind_speed: observation.wind_speed,
            },
        })
    }
}

fn format_report(label: &str, obs: &Observation, unit: TemperatureUnit) -> String {
    format!(
        "The weather in {} is {} with a temperature of {:.1}{}.\nHumidity: {}%\nWind Speed: {} {}",
        label,
        obs.condition,
        obs.temperature,
        unit.temperature_symbol(),
        obs.humidity,
        obs.wind_speed,
        unit.wind_speed_unit()
    )
}

/// The request URL carries the API key, so it is stripped from the message.
fn request_error(e: reqwest::Error) -> ToolError {
    let e = e.without_url();
    if e.is_timeout() {
        ToolError::transient("Request timed out. The weather service might be slow or unavailable.")
    } else if e.is_connect() {
        ToolError::transient("Connection error. Please check your internet connection.")
    } else {
        ToolError::transient(format!("Error connecting to weather service: {}", e))
    }
}

/// Map a non-2xx response to a user-facing error.
///
/// OpenWeatherMap repeats the code in the body's `cod` field, sometimes as a
/// string; that value wins over the HTTP status when present.
fn api_error(status: StatusCode, body: &str, city: &str, lat: f64, lon: f64) -> ToolError {
    let Ok(payload) = serde_json::from_str::<Value>(body) else {
        return ToolError::transient(format!("HTTP Error: {}", status.as_u16()));
    };

    let code = match &payload["cod"] {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .unwrap_or(u64::from(status.as_u16()));

    match code {
        401 => ToolError::configuration(
            "Authentication failed: Invalid API key. Please check your OpenWeatherMap API key.",
        ),
        404 => ToolError::not_found(format!(
            "Weather data not available for '{}' at the coordinates ({}, {}).",
            city, lat, lon
        )),
        429 => ToolError::transient("API rate limit exceeded. Too many requests have been made."),
        other => {
            let message = payload["message"].as_str().unwrap_or("Unknown error");
            ToolError::transient(format!("API Error {}: {}", other, message))
        }
    }
}

/// Update the session's preferred temperature unit.
///
/// Accepts "Celsius" or "Fahrenheit" in any case, surrounding whitespace
/// ignored. Anything else leaves the state untouched.
pub fn set_temperature_unit(unit: &str, state: &mut SessionState) -> ToolResult<String> {
    let parsed: TemperatureUnit = unit.parse().map_err(ToolError::validation)?;
    state.user_preference_temperature_unit = parsed;
    Ok(format!(
        "Your temperature unit preference has been updated to {}.",
        parsed
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeocodingSettings;
    use crate::error::ToolErrorKind;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_geocoder(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
                "lat": "32.7765",
                "lon": "-79.9311",
                "display_name": "Charleston, Charleston County, South Carolina, United States",
                "address": {
                    "city": "Charleston",
                    "state": "South Carolina",
                    "country": "United States",
                    "country_code": "us"
                }
            }])))
            .mount(server)
            .await;
    }

    fn service(server: &MockServer, api_key: Option<&str>) -> WeatherService {
        let geocoder = Geocoder::new(&GeocodingSettings {
            base_url: server.uri(),
            pacing_millis: 0,
            ..GeocodingSettings::default()
        })
        .unwrap();

        WeatherService::new(
            &WeatherSettings {
                base_url: server.uri(),
                api_key: api_key.map(str::to_string),
            },
            Arc::new(geocoder),
        )
        .unwrap()
    }

    fn weather_body() -> serde_json::Value {
        serde_json::json!({
            "weather": [{ "main": "Clouds", "description": "broken clouds" }],
            "main": { "temp": 24.36, "humidity": 78 },
            "wind": { "speed": 3.6 },
            "cod": 200
        })
    }

    #[tokio::test]
    async fn test_missing_api_key_makes_no_calls() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let weather = service(&server, None);
        let mut state = SessionState::new();
        let err = weather.lookup("Charleston", &mut state).await.unwrap_err();

        assert_eq!(err.kind, ToolErrorKind::Configuration);
        assert!(err.message.contains("OPENWEATHERMAP_API_KEY"));
        assert!(state.last_city_checked_stateful.is_none());
    }

    #[tokio::test]
    async fn test_lookup_metric_report() {
        let server = MockServer::start().await;
        mount_geocoder(&server).await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("units", "metric"))
            .and(query_param("appid", "test-key"))
            .and(query_param("lat", "32.7765"))
            .and(query_param("lon", "-79.9311"))
            .respond_with(ResponseTemplate::new(200).set_body_json(weather_body()))
            .expect(1)
            .mount(&server)
            .await;

        let weather = service(&server, Some("test-key"));
        let mut state = SessionState::new();
        let result = weather.lookup("Charleston", &mut state).await.unwrap();

        assert_eq!(
            result.report,
            "The weather in Charleston, South Carolina, US is broken clouds with a temperature of 24.4°C.\nHumidity: 78%\nWind Speed: 3.6 m/s"
        );
        assert_eq!(result.data.temperature_unit, "°C");
        assert_eq!(result.data.humidity, 78.0);
        assert_eq!(
            state.last_city_checked_stateful.as_deref(),
            Some("Charleston, South Carolina, US")
        );
    }

    #[tokio::test]
    async fn test_lookup_uses_imperial_for_fahrenheit() {
        let server = MockServer::start().await;
        mount_geocoder(&server).await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("units", "imperial"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "weather": [{ "description": "clear sky" }],
                "main": { "temp": 75.9, "humidity": 40 },
                "wind": { "speed": 8.05 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let weather = service(&server, Some("test-key"));
        let mut state = SessionState::new();
        set_temperature_unit("fahrenheit", &mut state).unwrap();

        let result = weather.lookup("Charleston", &mut state).await.unwrap();
        assert!(result.report.contains("75.9°F"));
        assert!(result.report.ends_with("Wind Speed: 8.05 mph"));
        assert_eq!(result.data.temperature_unit, "°F");
    }

    #[tokio::test]
    async fn test_http_error_mapping() {
        let cases = [
            (
                401,
                serde_json::json!({"cod": 401, "message": "Invalid API key"}),
                ToolErrorKind::Configuration,
                "Authentication failed",
            ),
            (
                404,
                serde_json::json!({"cod": "404", "message": "city not found"}),
                ToolErrorKind::NotFound,
                "Weather data not available",
            ),
            (
                429,
                serde_json::json!({"cod": 429}),
                ToolErrorKind::Transient,
                "rate limit",
            ),
            (
                500,
                serde_json::json!({"cod": 500, "message": "boom"}),
                ToolErrorKind::Transient,
                "API Error 500: boom",
            ),
        ];

        for (status, body, kind, needle) in cases {
            let server = MockServer::start().await;
            mount_geocoder(&server).await;

            Mock::given(method("GET"))
                .and(path("/data/2.5/weather"))
                .respond_with(ResponseTemplate::new(status).set_body_json(body))
                .expect(1)
                .mount(&server)
                .await;

            let weather = service(&server, Some("test-key"));
            let mut state = SessionState::new();
            let err = weather.lookup("Charleston", &mut state).await.unwrap_err();

            assert_eq!(err.kind, kind, "status {}", status);
            assert!(
                err.message.contains(needle),
                "{} did not contain {}",
                err.message,
                needle
            );
            assert!(state.last_city_checked_stateful.is_none());
        }
    }

    #[tokio::test]
    async fn test_non_json_error_body() {
        let server = MockServer::start().await;
        mount_geocoder(&server).await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let weather = service(&server, Some("test-key"));
        let err = weather.lookup("Charleston", &mut SessionState::new()).await.unwrap_err();
        assert_eq!(err.message, "HTTP Error: 502");
    }

    #[tokio::test]
    async fn test_timeout_is_reported_without_key() {
        let server = MockServer::start().await;
        mount_geocoder(&server).await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(weather_body())
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let weather = service(&server, Some("SECRET-OWM-KEY"))
            .with_timeout(Duration::from_millis(100))
            .unwrap();
        let mut state = SessionState::new();
        let err = weather.lookup("Charleston", &mut state).await.unwrap_err();

        assert_eq!(err.kind, ToolErrorKind::Transient);
        assert!(err.message.starts_with("Request timed out"), "{}", err.message);
        assert!(!err.message.contains("SECRET-OWM-KEY"));
        assert!(state.last_city_checked_stateful.is_none());
    }

    #[tokio::test]
    async fn test_connection_error_is_reported_without_key() {
        let uri = {
            let server = MockServer::start().await;
            server.uri()
        };

        // Geocoding is unreachable too, so "London" comes from the static table
        let geocoder = Geocoder::new(&GeocodingSettings {
            base_url: uri.clone(),
            pacing_millis: 0,
            ..GeocodingSettings::default()
        })
        .unwrap();
        let weather = WeatherService::new(
            &WeatherSettings {
                base_url: uri,
                api_key: Some("SECRET-OWM-KEY".to_string()),
            },
            Arc::new(geocoder),
        )
        .unwrap();

        let err = weather.lookup("London", &mut SessionState::new()).await.unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::Transient);
        assert!(err.message.starts_with("Connection error"), "{}", err.message);
        assert!(!err.message.contains("SECRET-OWM-KEY"));
    }

    #[tokio::test]
    async fn test_missing_field_is_data_shape_error() {
        let server = MockServer::start().await;
        mount_geocoder(&server).await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "weather": [{ "description": "mist" }],
                "main": { "temp": 10.0, "humidity": 90 }
            })))
            .mount(&server)
            .await;

        let weather = service(&server, Some("test-key"));
        let err = weather.lookup("Charleston", &mut SessionState::new()).await.unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::DataShape);
        assert!(err.message.contains("'wind.speed'"));
    }

    #[tokio::test]
    async fn test_unknown_location() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(weather_body()))
            .expect(0)
            .mount(&server)
            .await;

        let weather = service(&server, Some("test-key"));
        let err = weather.lookup("Atlantis", &mut SessionState::new()).await.unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::NotFound);
        assert!(err.message.contains("'Atlantis'"));
    }

    #[test]
    fn test_set_temperature_unit() {
        let mut state = SessionState::new();

        let msg = set_temperature_unit("  FAHRENHEIT ", &mut state).unwrap();
        assert_eq!(msg, "Your temperature unit preference has been updated to Fahrenheit.");
        assert_eq!(state.user_preference_temperature_unit, TemperatureUnit::Fahrenheit);

        for bad in ["kelvin", "", "F", "celsius degrees"] {
            let err = set_temperature_unit(bad, &mut state).unwrap_err();
            assert_eq!(err.kind, crate::error::ToolErrorKind::Validation);
            assert_eq!(state.user_preference_temperature_unit, TemperatureUnit::Fahrenheit);
        }
    }
}

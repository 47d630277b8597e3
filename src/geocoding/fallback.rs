//! Static coordinates for a handful of well-known cities.
//!
//! Consulted only when the geocoding provider cannot be reached or returns
//! something unusable. The table is fixed data and never changes at runtime.

use super::Location;

struct KnownCity {
    key: &'static str,
    lat: f64,
    lon: f64,
    name: &'static str,
    state: Option<&'static str>,
    country: &'static str,
    country_code: &'static str,
}

const KNOWN_CITIES: &[KnownCity] = &[
    KnownCity {
        key: "new york",
        lat: 40.7128,
        lon: -74.0060,
        name: "New York",
        state: Some("NY"),
        country: "United States",
        country_code: "US",
    },
    KnownCity {
        key: "london",
        lat: 51.5074,
        lon: -0.1278,
        name: "London",
        state: None,
        country: "United Kingdom",
        country_code: "GB",
    },
    KnownCity {
        key: "paris",
        lat: 48.8566,
        lon: 2.3522,
        name: "Paris",
        state: None,
        country: "France",
        country_code: "FR",
    },
    KnownCity {
        key: "tokyo",
        lat: 35.6762,
        lon: 139.6503,
        name: "Tokyo",
        state: None,
        country: "Japan",
        country_code: "JP",
    },
    KnownCity {
        key: "los angeles",
        lat: 34.0522,
        lon: -118.2437,
        name: "Los Angeles",
        state: Some("CA"),
        country: "United States",
        country_code: "US",
    },
    KnownCity {
        key: "charleston",
        lat: 32.7765,
        lon: -79.9311,
        name: "Charleston",
        state: Some("SC"),
        country: "United States",
        country_code: "US",
    },
];

/// Keys of every city in the table, in lookup order.
pub fn known_city_keys() -> impl Iterator<Item = &'static str> {
    KNOWN_CITIES.iter().map(|c| c.key)
}

/// Find the first known city whose key appears anywhere in the input.
pub fn lookup(city_name: &str) -> Option<Location> {
    let needle = city_name.to_lowercase();
    KNOWN_CITIES
        .iter()
        .find(|c| needle.contains(c.key))
        .map(|c| Location {
            lat: c.lat,
            lon: c.lon,
            name: c.name.to_string(),
            state: c.state.map(str::to_string),
            country: c.country.to_string(),
            country_code: c.country_code.to_string(),
            display_name: None,
        })
}

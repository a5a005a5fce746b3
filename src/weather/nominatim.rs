//! Reverse geocoding: turn device coordinates into a place name for the
//! search form. Uses Nominatim (OpenStreetMap), no API key required.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::config::WeatherConfig;

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    address: Option<NominatimAddress>,
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
}

impl NominatimResponse {
    fn place_name(self) -> Option<String> {
        self.address
            .and_then(|a| a.city.or(a.town).or(a.village).or(a.municipality))
            .or(self.display_name)
            .filter(|name| !name.trim().is_empty())
    }
}

/// What the search form shows when no name can be found
fn coordinate_fallback(latitude: f64, longitude: f64) -> String {
    format!("{latitude},{longitude}")
}

/// Name of the place at the given coordinates.
/// Never fails: any lookup problem yields `"lat,lon"` instead.
pub async fn reverse_geocode(config: &WeatherConfig, latitude: f64, longitude: f64) -> String {
    let client = match Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds.into()))
        .user_agent(concat!("weather-journal/", env!("CARGO_PKG_VERSION")))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Failed to create geocoding client: {}", e);
            return coordinate_fallback(latitude, longitude);
        }
    };

    let url = format!(
        "{}?lat={}&lon={}&format=json&addressdetails=1&zoom=10",
        config.reverse_geocode_url, latitude, longitude
    );

    let response = match client.get(&url).send().await {
        Ok(r) if r.status().is_success() => r,
        Ok(r) => {
            tracing::debug!("Reverse geocode returned status {}", r.status());
            return coordinate_fallback(latitude, longitude);
        }
        Err(e) => {
            tracing::debug!("Reverse geocode request failed: {}", e);
            return coordinate_fallback(latitude, longitude);
        }
    };

    match response.json::<NominatimResponse>().await {
        Ok(body) => body
            .place_name()
            .unwrap_or_else(|| coordinate_fallback(latitude, longitude)),
        Err(e) => {
            tracing::debug!("Reverse geocode parse error: {}", e);
            coordinate_fallback(latitude, longitude)
        }
    }
}

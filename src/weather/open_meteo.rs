//! `OpenMeteo` geocoding and daily forecast client

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::WeatherSource;
use crate::JournalError;
use crate::config::WeatherConfig;
use crate::models::Location;

const DAILY_FIELDS: &str =
    "temperature_2m_max,temperature_2m_min,precipitation_probability_max,wind_speed_10m_max";

/// Forecast response; only the parts the summary needs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub current_weather: Option<CurrentWeather>,
    #[serde(default)]
    pub daily: Option<DailyForecast>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurrentWeather {
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub windspeed: Option<f64>,
}

/// Daily series, index-aligned with `time`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailyForecast {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(rename = "temperature_2m_max", default)]
    pub temperature_max: Vec<Option<f64>>,
    #[serde(rename = "temperature_2m_min", default)]
    pub temperature_min: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation_probability_max: Vec<Option<f64>>,
    #[serde(rename = "wind_speed_10m_max", default)]
    pub wind_speed_max: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    results: Option<Vec<GeocodingResult>>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    name: String,
    latitude: f64,
    longitude: f64,
    country: Option<String>,
}

impl From<GeocodingResult> for Location {
    fn from(result: GeocodingResult) -> Self {
        Location {
            latitude: result.latitude,
            longitude: result.longitude,
            name: result.name,
            country: result.country,
        }
    }
}

/// HTTP client for the `OpenMeteo` geocoding and forecast endpoints
pub struct OpenMeteoClient {
    client: Client,
    geocode_url: String,
    forecast_url: String,
}

impl OpenMeteoClient {
    pub fn new(config: &WeatherConfig) -> crate::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(concat!("weather-journal/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| JournalError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            geocode_url: config.geocode_url.clone(),
            forecast_url: config.forecast_url.clone(),
        })
    }

    fn geocode_request_url(&self, name: &str) -> String {
        format!(
            "{}?name={}&count=1&language=en&format=json",
            self.geocode_url,
            urlencoding::encode(name)
        )
    }

    fn forecast_request_url(&self, location: &Location, start: NaiveDate, end: NaiveDate) -> String {
        format!(
            "{}?latitude={}&longitude={}&current_weather=true&daily={}&timezone=auto&start_date={}&end_date={}",
            self.forecast_url,
            location.latitude,
            location.longitude,
            DAILY_FIELDS,
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d"),
        )
    }

    async fn make_request(&self, url: &str) -> crate::Result<Response> {
        let started = Instant::now();
        let response = self.client.get(url).send().await?;
        let status = response.status();

        debug!(
            "HTTP response received: {} in {:.3}s",
            status,
            started.elapsed().as_secs_f64()
        );

        if status.is_success() {
            Ok(response)
        } else {
            warn!("OpenMeteo request failed with status {}", status);
            Err(JournalError::api(format!(
                "Weather service returned {} - {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown error")
            )))
        }
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoClient {
    #[instrument(skip(self))]
    async fn geocode(&self, name: &str) -> crate::Result<Option<Location>> {
        let response = self.make_request(&self.geocode_request_url(name)).await?;
        let body: GeocodingResponse = response.json().await.map_err(|e| {
            JournalError::api(format!("Invalid geocoding data from OpenMeteo: {e}"))
        })?;

        let location = body
            .results
            .and_then(|results| results.into_iter().next())
            .map(Location::from);

        match &location {
            Some(found) => info!(
                "Geocoded '{}' to {} ({})",
                name,
                found.display_name(),
                found.format_coordinates()
            ),
            None => warn!("No geocoding results for '{}'", name),
        }

        Ok(location)
    }

    #[instrument(skip(self, location), fields(location = %location.name))]
    async fn forecast(
        &self,
        location: &Location,
        start: NaiveDate,
        end: NaiveDate,
    ) -> crate::Result<ForecastResponse> {
        let started = Instant::now();
        let response = self
            .make_request(&self.forecast_request_url(location, start, end))
            .await?;
        let forecast: ForecastResponse = response.json().await.map_err(|e| {
            JournalError::api(format!("Invalid forecast data from OpenMeteo: {e}"))
        })?;

        info!(
            "Retrieved {} forecast days in {:.3}s",
            forecast.daily.as_ref().map_or(0, |d| d.time.len()),
            started.elapsed().as_secs_f64()
        );

        Ok(forecast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OpenMeteoClient {
        OpenMeteoClient::new(&WeatherConfig::default()).unwrap()
    }

    #[test]
    fn test_geocode_url_is_encoded() {
        let url = client().geocode_request_url("São Paulo");
        assert!(url.starts_with("https://geocoding-api.open-meteo.com/v1/search?name=S%C3%A3o%20Paulo"));
        assert!(url.contains("count=1"));
    }

    #[test]
    fn test_forecast_url() {
        let location = Location::new(48.85, 2.35, "Paris".into());
        let start = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 5, 3).unwrap();
        let url = client().forecast_request_url(&location, start, end);

        assert!(url.starts_with("https://api.open-meteo.com/v1/forecast?latitude=48.85&longitude=2.35"));
        assert!(url.contains("current_weather=true"));
        assert!(url.contains(DAILY_FIELDS));
        assert!(url.ends_with("start_date=2025-05-01&end_date=2025-05-03"));
    }

    #[test]
    fn test_parse_forecast_payload() {
        let payload = r#"{
            "latitude": 48.86, "longitude": 2.34, "timezone": "Europe/Paris",
            "current_weather": {"temperature": 12.5, "windspeed": 7.2, "winddirection": 200, "weathercode": 3},
            "daily": {
                "time": ["2025-05-01", "2025-05-02"],
                "temperature_2m_max": [18.1, null],
                "temperature_2m_min": [9.4, 8.0],
                "precipitation_probability_max": [40, 10],
                "wind_speed_10m_max": [20.5, 15.0]
            }
        }"#;
        let forecast: ForecastResponse = serde_json::from_str(payload).unwrap();
        let daily = forecast.daily.unwrap();
        assert_eq!(daily.time.len(), 2);
        assert_eq!(daily.temperature_max, vec![Some(18.1), None]);
        assert_eq!(daily.precipitation_probability_max[0], Some(40.0));
        assert_eq!(forecast.current_weather.unwrap().windspeed, Some(7.2));
    }

    #[test]
    fn test_geocoding_result_to_location() {
        let body: GeocodingResponse = serde_json::from_str(
            r#"{"results": [{"name": "Interlaken", "latitude": 46.68, "longitude": 7.86, "country": "Switzerland", "admin1": "Bern"}]}"#,
        )
        .unwrap();
        let location: Location = body.results.unwrap().remove(0).into();
        assert_eq!(location.display_name(), "Interlaken, Switzerland");
        assert_eq!(location.latitude, 46.68);
    }
}

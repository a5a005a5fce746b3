//! Weather lookups behind the journal API
//!
//! A [`WeatherSource`] resolves a place name and fetches a daily forecast;
//! [`summarize`] flattens that forecast into the text stored on a record.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::Location;

pub mod nominatim;
pub mod open_meteo;

pub use nominatim::reverse_geocode;
pub use open_meteo::{CurrentWeather, DailyForecast, ForecastResponse, OpenMeteoClient};

/// Days included in a summary, counted from the start date
const SUMMARY_DAYS: usize = 5;

const NO_SUMMARY: &str = "No summary available.";

#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Best match for a free-text place name, `None` when nothing matches
    async fn geocode(&self, name: &str) -> crate::Result<Option<Location>>;

    /// Daily forecast for the given coordinates and inclusive date range
    async fn forecast(
        &self,
        location: &Location,
        start: NaiveDate,
        end: NaiveDate,
    ) -> crate::Result<ForecastResponse>;
}

fn value_or_na(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| v.to_string())
}

fn daily_value(values: &[Option<f64>], i: usize) -> Option<f64> {
    values.get(i).copied().flatten()
}

/// Text form of a forecast, one line for current conditions and one per day
#[must_use]
pub fn summarize(payload: &ForecastResponse) -> String {
    let mut lines = Vec::new();

    if let Some(current) = &payload.current_weather {
        lines.push(format!(
            "Current: {}°C, wind {} km/h",
            value_or_na(current.temperature),
            value_or_na(current.windspeed)
        ));
    }

    if let Some(daily) = &payload.daily {
        for (i, day) in daily.time.iter().take(SUMMARY_DAYS).enumerate() {
            lines.push(format!(
                "{}: min {}°C / max {}°C, precip% {}, wind {} km/h",
                day,
                value_or_na(daily_value(&daily.temperature_min, i)),
                value_or_na(daily_value(&daily.temperature_max, i)),
                value_or_na(daily_value(&daily.precipitation_probability_max, i)),
                value_or_na(daily_value(&daily.wind_speed_max, i)),
            ));
        }
    }

    if lines.is_empty() {
        NO_SUMMARY.to_string()
    } else {
        lines.join("\n")
    }
}

//! Journal records as exchanged with the query API

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::JournalError;

/// A stored weather query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub id: u64,
    pub location: String,
    /// Decimal degrees, sent as a string on the wire
    #[serde(default, with = "coordinate")]
    pub latitude: Option<f64>,
    #[serde(default, with = "coordinate")]
    pub longitude: Option<f64>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub weather_summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl WeatherRecord {
    /// Both coordinates, when the record carries usable ones
    #[must_use]
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }

    /// `2025-06-01 → 2025-06-03`
    #[must_use]
    pub fn date_range(&self) -> String {
        format!("{} → {}", self.start_date, self.end_date)
    }
}

impl fmt::Display for WeatherRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "#{} {}", self.id, self.location)?;
        writeln!(f, "   📅 {}", self.date_range())?;
        for line in self.weather_summary.lines() {
            writeln!(f, "   {line}")?;
        }
        Ok(())
    }
}

/// Body of `POST /queries`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewQuery {
    pub location: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl NewQuery {
    pub fn validate(&self) -> crate::Result<()> {
        if self.location.trim().is_empty() {
            return Err(JournalError::validation("location must not be empty"));
        }
        if self.end_date < self.start_date {
            return Err(JournalError::validation(
                "end_date must be on/after start_date",
            ));
        }
        Ok(())
    }
}

/// Body of `PUT /queries/{id}`; absent fields keep their stored value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

impl QueryUpdate {
    /// The new location, ignoring blank input
    #[must_use]
    pub fn new_location(&self) -> Option<&str> {
        self.location
            .as_deref()
            .map(str::trim)
            .filter(|loc| !loc.is_empty())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.new_location().is_none() && self.start_date.is_none() && self.end_date.is_none()
    }
}

/// Coordinates arrive as strings, numbers, `null`, garbage or not at all.
/// Anything that is not a finite number reads as absent.
mod coordinate {
    use serde::de::IgnoredAny;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
        Other(IgnoredAny),
    }

    pub fn serialize<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.collect_str(v),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        let raw = Option::<Raw>::deserialize(deserializer)?;
        Ok(match raw {
            Some(Raw::Number(v)) => Some(v),
            Some(Raw::Text(s)) => s.trim().parse::<f64>().ok(),
            Some(Raw::Other(_)) | None => None,
        }
        .filter(|v| v.is_finite()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn record_json(latitude: serde_json::Value) -> serde_json::Value {
        json!({
            "id": 3,
            "location": "Oslo, Norway",
            "latitude": latitude,
            "longitude": "10.74",
            "start_date": "2025-01-02",
            "end_date": "2025-01-04",
            "weather_summary": "min -3°C / max 1°C",
        })
    }

    #[test]
    fn test_coordinates_accept_strings_and_numbers() {
        let from_text: WeatherRecord = serde_json::from_value(record_json(json!("59.91"))).unwrap();
        assert_eq!(from_text.coordinates(), Some((59.91, 10.74)));

        let from_number: WeatherRecord = serde_json::from_value(record_json(json!(59.91))).unwrap();
        assert_eq!(from_number.latitude, Some(59.91));
    }

    #[test]
    fn test_bad_coordinates_are_tolerated() {
        for bad in [json!("north-ish"), json!(null), json!(true), json!("NaN")] {
            let record: WeatherRecord = serde_json::from_value(record_json(bad)).unwrap();
            assert_eq!(record.latitude, None);
            assert_eq!(record.coordinates(), None);
        }

        let mut missing = record_json(json!(null));
        missing.as_object_mut().unwrap().remove("latitude");
        let record: WeatherRecord = serde_json::from_value(missing).unwrap();
        assert_eq!(record.latitude, None);
        assert!(record.created_at.is_none());
    }

    #[test]
    fn test_coordinates_serialize_as_strings() {
        let record: WeatherRecord = serde_json::from_value(record_json(json!(59.91))).unwrap();
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["latitude"], json!("59.91"));
        assert_eq!(value["start_date"], json!("2025-01-02"));
    }

    #[test]
    fn test_new_query_validation() {
        let ok = NewQuery {
            location: "Oslo".into(),
            start_date: date("2025-01-02"),
            end_date: date("2025-01-02"),
        };
        assert!(ok.validate().is_ok());

        let reversed = NewQuery {
            end_date: date("2025-01-01"),
            ..ok.clone()
        };
        assert!(matches!(
            reversed.validate(),
            Err(JournalError::Validation { .. })
        ));

        let blank = NewQuery {
            location: "  ".into(),
            ..ok
        };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_update_ignores_blank_location() {
        let update = QueryUpdate {
            location: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(update.new_location(), None);
        assert!(update.is_empty());

        let update = QueryUpdate {
            location: Some(" Bergen ".into()),
            ..Default::default()
        };
        assert_eq!(update.new_location(), Some("Bergen"));
    }

    #[test]
    fn test_record_display() {
        let record: WeatherRecord = serde_json::from_value(record_json(json!(59.91))).unwrap();
        let text = record.to_string();
        assert!(text.starts_with("#3 Oslo, Norway"));
        assert!(text.contains("2025-01-02 → 2025-01-04"));
        assert!(text.contains("min -3°C / max 1°C"));
    }
}

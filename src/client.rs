//! Client for the journal API, used by the command line front end

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::JournalError;
use crate::config::ClientConfig;
use crate::export::ExportFormat;
use crate::models::{NewQuery, QueryUpdate, WeatherRecord};

const MISSING_SEARCH_FIELDS: &str = "Please fill location, start, and end dates";

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Value,
}

#[derive(Debug, Deserialize)]
struct HealthBody {
    ok: bool,
}

#[derive(Debug, Deserialize)]
struct DeletedBody {
    deleted: u64,
}

pub struct JournalClient {
    client: Client,
    base_url: String,
}

impl JournalClient {
    pub fn new(config: &ClientConfig) -> crate::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .build()
            .map_err(|e| JournalError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> crate::Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        debug!("Journal API answered {}", status);
        if status.is_success() {
            return Ok(response);
        }

        let reason = status.canonical_reason().unwrap_or("Request failed");
        let detail = match response.json::<ErrorBody>().await {
            Ok(ErrorBody {
                detail: Value::String(text),
            }) => text,
            Ok(ErrorBody { detail }) => detail.to_string(),
            Err(_) => reason.to_string(),
        };
        Err(JournalError::api(detail))
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> crate::Result<T> {
        self.send(request)
            .await?
            .json()
            .await
            .map_err(|e| JournalError::api(format!("Unexpected response from journal API: {e}")))
    }

    pub async fn health(&self) -> crate::Result<bool> {
        let body: HealthBody = self.json(self.client.get(self.url("/health"))).await?;
        Ok(body.ok)
    }

    /// Look up the weather for a place and date range and store the result
    #[instrument(skip(self))]
    pub async fn create_query(
        &self,
        location: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> crate::Result<WeatherRecord> {
        let location = location.trim();
        let (Some(start_date), Some(end_date)) = (start_date, end_date) else {
            return Err(JournalError::validation(MISSING_SEARCH_FIELDS));
        };
        if location.is_empty() {
            return Err(JournalError::validation(MISSING_SEARCH_FIELDS));
        }

        let body = NewQuery {
            location: location.to_string(),
            start_date,
            end_date,
        };
        self.json(self.client.post(self.url("/queries")).json(&body))
            .await
    }

    pub async fn list_queries(&self) -> crate::Result<Vec<WeatherRecord>> {
        self.json(self.client.get(self.url("/queries"))).await
    }

    pub async fn get_query(&self, id: u64) -> crate::Result<WeatherRecord> {
        self.json(self.client.get(self.url(&format!("/queries/{id}"))))
            .await
    }

    pub async fn update_query(&self, id: u64, update: &QueryUpdate) -> crate::Result<WeatherRecord> {
        if update.is_empty() {
            return Err(JournalError::validation("nothing to update"));
        }
        self.json(
            self.client
                .put(self.url(&format!("/queries/{id}")))
                .json(update),
        )
        .await
    }

    pub async fn delete_query(&self, id: u64) -> crate::Result<u64> {
        let body: DeletedBody = self
            .json(self.client.delete(self.url(&format!("/queries/{id}"))))
            .await?;
        Ok(body.deleted)
    }

    /// Export body exactly as the server rendered it
    pub async fn export(&self, format: ExportFormat) -> crate::Result<String> {
        let request = self
            .client
            .get(self.url(&format!("/export?format={}", format.as_str())));
        self.send(request)
            .await?
            .text()
            .await
            .map_err(JournalError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> JournalClient {
        JournalClient::new(&ClientConfig {
            api_base: "http://127.0.0.1:9/".into(),
            timeout_seconds: 1,
        })
        .unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash() {
        assert_eq!(client().url("/queries"), "http://127.0.0.1:9/queries");
    }

    #[tokio::test]
    async fn test_search_requires_all_fields() {
        let client = client();
        let start = NaiveDate::from_ymd_opt(2025, 6, 1);

        for (location, start, end) in [("  ", start, start), ("Paris", None, start), ("Paris", start, None)] {
            let err = client.create_query(location, start, end).await.unwrap_err();
            assert!(matches!(err, JournalError::Validation { ref message } if message == MISSING_SEARCH_FIELDS));
        }
    }

    #[tokio::test]
    async fn test_unreachable_server_is_api_error() {
        assert!(matches!(client().health().await, Err(JournalError::Api { .. })));
    }

    #[tokio::test]
    async fn test_empty_update_is_rejected() {
        let err = client().update_query(1, &QueryUpdate::default()).await.unwrap_err();
        assert!(matches!(err, JournalError::Validation { .. }));
    }
}

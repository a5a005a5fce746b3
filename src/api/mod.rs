use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::JournalError;
use crate::export::{self, ExportFormat};
use crate::store::QueryStore;
use crate::weather::WeatherSource;

mod queries;

/// Shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub store: QueryStore,
    pub weather: Arc<dyn WeatherSource>,
}

impl AppState {
    pub fn new(store: QueryStore, weather: Arc<dyn WeatherSource>) -> Self {
        Self { store, weather }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/queries",
            get(queries::list_queries).post(queries::create_query),
        )
        .route(
            "/queries/{id}",
            get(queries::get_query)
                .put(queries::update_query)
                .delete(queries::delete_query),
        )
        .route("/export", get(export_queries))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

#[derive(Debug, Deserialize)]
struct ExportParams {
    format: Option<String>,
}

async fn export_queries(
    State(state): State<AppState>,
    Query(params): Query<ExportParams>,
) -> Result<Response, JournalError> {
    let format = params
        .format
        .as_deref()
        .map(ExportFormat::parse_lenient)
        .unwrap_or_default();
    let records = state.store.all().await?;
    let body = export::render(&records, format)?;
    tracing::debug!("Exported {} records as {}", records.len(), format.as_str());

    Ok(([(header::CONTENT_TYPE, format.content_type())], body).into_response())
}


#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::test_support::app;

    async fn get(router: axum::Router, uri: &str) -> (StatusCode, String, String) {
        let response = router
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get("content-type")
            .map(|v| v.to_str().unwrap().to_string())
            .unwrap_or_default();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (router, _dir, _store) = app();
        let (status, _, body) = get(router, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"ok":true}"#);
    }

    #[tokio::test]
    async fn test_export_formats() {
        let (router, _dir, _store) = app();

        let (status, content_type, body) = get(router.clone(), "/export?format=md").await;
        assert_eq!(status, StatusCode::OK);
        assert!(content_type.starts_with("text/markdown"));
        assert_eq!(body, "# Export\n\n_No rows_");

        let (_, content_type, body) = get(router.clone(), "/export?format=csv").await;
        assert!(content_type.starts_with("text/csv"));
        assert!(body.starts_with("id,location,"));

        let (_, content_type, body) = get(router, "/export?format=toml").await;
        assert_eq!(content_type, "application/json");
        assert_eq!(body, r#"{"data":[]}"#);
    }
}

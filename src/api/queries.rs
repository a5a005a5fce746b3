//! `/queries` handlers

use axum::{
    extract::{Path, State, rejection::JsonRejection},
    response::Json,
};
use serde_json::{Value, json};
use tracing::{info, instrument};

use super::AppState;
use crate::JournalError;
use crate::models::{Location, NewQuery, QueryUpdate, WeatherRecord};
use crate::store::QueryDraft;
use crate::weather;

const LOCATION_NOT_FOUND: &str = "Location not found (try a different spelling)";
const UPDATE_LOCATION_NOT_FOUND: &str = "Location not found for update";
const RECORD_NOT_FOUND: &str = "Not found";

async fn geocode_or(state: &AppState, name: &str, missing: &str) -> crate::Result<Location> {
    state
        .weather
        .geocode(name)
        .await?
        .ok_or_else(|| JournalError::not_found(missing))
}

async fn load(state: &AppState, id: u64) -> crate::Result<WeatherRecord> {
    state
        .store
        .get(id)
        .await?
        .ok_or_else(|| JournalError::not_found(RECORD_NOT_FOUND))
}

#[instrument(skip(state, body))]
pub(super) async fn create_query(
    State(state): State<AppState>,
    body: Result<Json<NewQuery>, JsonRejection>,
) -> Result<Json<WeatherRecord>, JournalError> {
    let Json(body) = body?;
    body.validate()?;

    let location = geocode_or(&state, body.location.trim(), LOCATION_NOT_FOUND).await?;
    let forecast = state
        .weather
        .forecast(&location, body.start_date, body.end_date)
        .await?;

    let record = state
        .store
        .create(QueryDraft {
            location,
            start_date: body.start_date,
            end_date: body.end_date,
            weather_summary: weather::summarize(&forecast),
        })
        .await?;

    info!("Created query #{} for {}", record.id, record.location);
    Ok(Json(record))
}

pub(super) async fn list_queries(
    State(state): State<AppState>,
) -> Result<Json<Vec<WeatherRecord>>, JournalError> {
    Ok(Json(state.store.list().await?))
}

pub(super) async fn get_query(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<WeatherRecord>, JournalError> {
    Ok(Json(load(&state, id).await?))
}

/// Merge the changes into the stored record, then refetch its forecast
#[instrument(skip(state, update))]
pub(super) async fn update_query(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    update: Result<Json<QueryUpdate>, JsonRejection>,
) -> Result<Json<WeatherRecord>, JournalError> {
    let Json(update) = update?;
    let mut record = load(&state, id).await?;

    // Location first: an unknown place wins over reversed dates.
    let location = match (update.new_location(), record.coordinates()) {
        (Some(name), _) => geocode_or(&state, name, UPDATE_LOCATION_NOT_FOUND).await?,
        (None, Some((latitude, longitude))) => {
            Location::new(latitude, longitude, record.location.clone())
        }
        // Stored without usable coordinates; look the name up again.
        (None, None) => geocode_or(&state, &record.location, UPDATE_LOCATION_NOT_FOUND).await?,
    };

    let start_date = update.start_date.unwrap_or(record.start_date);
    let end_date = update.end_date.unwrap_or(record.end_date);
    if end_date < start_date {
        return Err(JournalError::validation(
            "end_date must be after start_date",
        ));
    }

    let forecast = state
        .weather
        .forecast(&location, start_date, end_date)
        .await?;

    if update.new_location().is_some() {
        record.location = location.display_name();
    }
    record.latitude = Some(location.latitude);
    record.longitude = Some(location.longitude);
    record.start_date = start_date;
    record.end_date = end_date;
    record.weather_summary = weather::summarize(&forecast);

    let record = state.store.replace(record).await?;
    info!("Updated query #{}", record.id);
    Ok(Json(record))
}

pub(super) async fn delete_query(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, JournalError> {
    if !state.store.delete(id).await? {
        return Err(JournalError::not_found(RECORD_NOT_FOUND));
    }
    info!("Deleted query #{id}");
    Ok(Json(json!({ "deleted": id })))
}

//! Boat resource handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use super::AppState;
use crate::{
    config::ApiVersion,
    errors::BoatsApiError,
    models::{Boat, BoatKey, RecordId},
    validation::{new_boat_from_json, patch_from_json},
};

/// Confirmation body for deletes.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Interpret a path segment as a lookup key
///
/// v1 addresses boats by their custom `id`, v2 by record id. A v2 segment
/// that is not a valid record id yields [`BoatsApiError::InvalidRecordId`].
pub fn lookup_key(version: ApiVersion, segment: &str) -> Result<BoatKey, BoatsApiError> {
    match version {
        ApiVersion::V1 => Ok(BoatKey::CustomId(segment.to_string())),
        ApiVersion::V2 => Ok(BoatKey::RecordId(RecordId::try_from(segment)?)),
    }
}

/// v1 reports store failures on writes as bad requests; reads and v2 keep
/// them as server errors.
pub fn write_failure(version: ApiVersion, error: BoatsApiError) -> BoatsApiError {
    match version {
        ApiVersion::V1 if error.is_store_failure() => {
            BoatsApiError::RejectedWrite(error.to_string())
        }
        _ => error,
    }
}

/// List all boats in storage order.
pub async fn list_boats(State(state): State<AppState>) -> Result<Json<Vec<Boat>>, BoatsApiError> {
    let boats = state.store.list().await?;
    Ok(Json(boats))
}

/// Fetch a single boat.
pub async fn get_boat(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Boat>, BoatsApiError> {
    let key = lookup_key(state.version, &id)?;
    let boat = state.store.get(&key).await?.ok_or(BoatsApiError::NotFound)?;
    Ok(Json(boat))
}

/// Create a boat from a JSON body.
pub async fn create_boat(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Boat>), BoatsApiError> {
    let Json(body) = payload?;
    let new_boat = new_boat_from_json(&body, state.version.requires_custom_id())?;
    let boat = state
        .store
        .insert(new_boat)
        .await
        .map_err(|e| write_failure(state.version, e))?;

    info!("Created boat {} ({})", boat.record_id, boat.name);
    Ok((StatusCode::CREATED, Json(boat)))
}

/// Replace the fields given in the JSON body.
pub async fn update_boat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Boat>, BoatsApiError> {
    let key = lookup_key(state.version, &id)?;
    let Json(body) = payload?;
    let patch = patch_from_json(&body)?;

    let boat = state
        .store
        .update(&key, &patch)
        .await
        .map_err(|e| write_failure(state.version, e))?
        .ok_or(BoatsApiError::NotFound)?;
    Ok(Json(boat))
}

/// Remove a boat.
pub async fn delete_boat(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, BoatsApiError> {
    let key = lookup_key(state.version, &id)?;
    let boat = state
        .store
        .delete(&key)
        .await
        .map_err(|e| write_failure(state.version, e))?
        .ok_or(BoatsApiError::NotFound)?;

    info!("Deleted boat {}", boat.record_id);
    Ok(Json(MessageResponse { message: "Deleted" }))
}

use crate::AppState;
use crate::error::{AppError, Result};
use crate::store::Service;
use axum::{Json, body::Bytes, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

/// Every stored record, unchanged and in on-disk order
pub async fn list_services(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Value>>> {
    let records = state.store.read_all().await?;
    tracing::debug!("Listing {} services", records.len());
    Ok(Json(records))
}

pub async fn add_service(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>)> {
    // Decode by hand so every rejection shares the `{"error"}` body shape
    let record: Value =
        serde_json::from_slice(&body).map_err(|e| AppError::InvalidService(e.to_string()))?;
    if !record.is_object() {
        return Err(AppError::InvalidService(
            "Service must be a JSON object".to_string(),
        ));
    }
    let service = Service::deserialize(&record)
        .map_err(|e| AppError::InvalidService(e.to_string()))?;
    service.validate().map_err(AppError::InvalidService)?;

    // The submitted object is stored as sent, explicit nulls included
    state.store.append(record).await?;
    tracing::info!("Added service '{}'", service.name);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Service added successfully" })),
    ))
}

//! Manager PIN API Handlers

use axum::{Json, extract::State};

use crate::core::ServerState;
use crate::db::repository::manager_pin;
use crate::utils::AppResult;
use shared::models::{ManagerPinConfig, SetManagerPinRequest, SetManagerPinResponse};

const RESOURCE: &str = "manager_pin";

/// GET /api/manager-pin - Read the manager PIN
///
/// Creates the default configuration on first access. The manager screen
/// compares the entered PIN against this value client-side.
pub async fn get(State(state): State<ServerState>) -> AppResult<Json<ManagerPinConfig>> {
    let config = manager_pin::get_or_create(&state.pool).await?;
    Ok(Json(config))
}

/// PUT /api/manager-pin - Set the manager PIN
///
/// Rejects anything but an exactly-4-character string with a validation
/// error before any write happens.
pub async fn set(
    State(state): State<ServerState>,
    Json(payload): Json<SetManagerPinRequest>,
) -> AppResult<Json<SetManagerPinResponse>> {
    let config = manager_pin::set(&state.pool, &payload.pin).await?;
    tracing::info!("Manager PIN updated");

    state.broadcast_sync(RESOURCE, "updated", "main", Some(&config));
    Ok(Json(SetManagerPinResponse {
        success: true,
        message: "Manager PIN updated.".to_string(),
    }))
}

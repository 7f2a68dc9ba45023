//! Orders API Handlers
//!
//! Thin CRUD over the order store. Every successful mutation broadcasts a
//! sync payload, and every update feeds its before/after snapshots into
//! the lifecycle engine's write-triggered path, where the pending → ready
//! flank picks up its initial notification.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::db::repository::order as order_repo;
use crate::utils::{AppError, AppResult};
use shared::models::{Order, OrderCreate, OrderStatus, OrderUpdate};

const RESOURCE: &str = "orders";

/// Query params for listing orders
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Filter by status (optional)
    pub status: Option<OrderStatus>,
}

/// GET /api/orders - List orders in preparation-queue order
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Order>>> {
    let orders = order_repo::find_all(&state.pool, query.status).await?;
    Ok(Json(orders))
}

/// POST /api/orders - Create a ticket with a server-generated PIN
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<OrderCreate>,
) -> AppResult<Json<Order>> {
    let order = order_repo::create(&state.pool, payload).await?;
    tracing::info!(pin = %order.pin, status = %order.status, "Order created");

    state.broadcast_sync(RESOURCE, "created", &order.id.to_string(), Some(&order));
    Ok(Json(order))
}

/// GET /api/orders/{id} - Get a single order
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Order>> {
    let order = order_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {id} not found")))?;
    Ok(Json(order))
}

/// GET /api/orders/by-pin/{pin} - Latest active order for a PIN
///
/// Guest reload flow: the device only remembers its PINs.
pub async fn get_by_pin(
    State(state): State<ServerState>,
    Path(pin): Path<String>,
) -> AppResult<Json<Order>> {
    let order = order_repo::find_active_by_pin(&state.pool, &pin)
        .await?
        .ok_or_else(|| AppError::not_found(format!("No active order for PIN {pin}")))?;
    Ok(Json(order))
}

/// PUT /api/orders/{id} - Partial update
///
/// Runs the write-triggered lifecycle path after the patch lands; the
/// response carries the pre-engine snapshot, engine patches arrive on the
/// sync bus.
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<OrderUpdate>,
) -> AppResult<Json<Order>> {
    let (before, after) = order_repo::update(&state.pool, id, payload).await?;
    if before.status != after.status {
        tracing::info!(
            pin = %after.pin,
            from = %before.status,
            to = %after.status,
            "Order status changed"
        );
    }

    state.broadcast_sync(RESOURCE, "updated", &after.id.to_string(), Some(&after));
    state
        .engine
        .handle_update(&before, &after, shared::util::now_millis())
        .await;

    Ok(Json(after))
}

/// POST /api/orders/{id}/validate - Guest draft validation
pub async fn validate(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Order>> {
    let (before, after) = order_repo::validate_draft(&state.pool, id).await?;
    tracing::info!(pin = %after.pin, "Order validated by guest");

    state.broadcast_sync(RESOURCE, "updated", &after.id.to_string(), Some(&after));
    state
        .engine
        .handle_update(&before, &after, shared::util::now_millis())
        .await;

    Ok(Json(after))
}

/// DELETE /api/orders/{id} - Remove a ticket
pub async fn remove(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let deleted = order_repo::delete(&state.pool, id).await?;
    if !deleted {
        return Err(AppError::not_found(format!("Order {id} not found")));
    }

    state.broadcast_sync::<Order>(RESOURCE, "deleted", &id.to_string(), None);
    Ok(Json(true))
}

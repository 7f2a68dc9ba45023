//! Order Repository
//!
//! CRUD over the `orders` table plus the lifecycle engine's conditional
//! patches. The engine never overwrites whole rows: its three mutations
//! (ready stamp, reminder increment, lost-turn reset) are partial-field
//! UPDATEs guarded on the state they observed, so racing evaluations
//! apply at most one effect.

use super::{RepoError, RepoResult};
use shared::models::{Order, OrderCreate, OrderStatus, OrderUpdate};
use shared::util::{TICKET_PIN_ALPHABET, TICKET_PIN_LEN, generate_ticket_pin};
use sqlx::SqlitePool;

const COLUMNS: &str = "id, pin, status, cooking_type, client_name, fcm_token, created_at, notification_sent_at, notification_count, updated_at";

/// PIN generation retries before giving up with a conflict
const MAX_PIN_ATTEMPTS: usize = 5;

fn validate_pin(pin: &str) -> RepoResult<()> {
    if pin.len() != TICKET_PIN_LEN || !pin.bytes().all(|b| TICKET_PIN_ALPHABET.contains(&b)) {
        return Err(RepoError::Validation(format!(
            "Ticket PIN must be {TICKET_PIN_LEN} characters (A-Z, 0-9): {pin}"
        )));
    }
    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!("SELECT {COLUMNS} FROM orders WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(order)
}

/// List orders, optionally filtered by status, in preparation-queue order
/// (oldest `created_at` first; a recycled lost turn re-enters at the back).
pub async fn find_all(pool: &SqlitePool, status: Option<OrderStatus>) -> RepoResult<Vec<Order>> {
    let orders = match status {
        Some(status) => {
            sqlx::query_as::<_, Order>(&format!(
                "SELECT {COLUMNS} FROM orders WHERE status = ? ORDER BY created_at"
            ))
            .bind(status)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, Order>(&format!("SELECT {COLUMNS} FROM orders ORDER BY created_at"))
                .fetch_all(pool)
                .await?
        }
    };
    Ok(orders)
}

/// Latest non-delivered order holding a PIN (guest reload flow).
pub async fn find_active_by_pin(pool: &SqlitePool, pin: &str) -> RepoResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {COLUMNS} FROM orders WHERE pin = ? AND status != 'delivered' ORDER BY created_at DESC LIMIT 1"
    ))
    .bind(pin)
    .fetch_optional(pool)
    .await?;
    Ok(order)
}

/// Whether a PIN is held by any non-delivered order.
pub async fn pin_in_use(pool: &SqlitePool, pin: &str) -> RepoResult<bool> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM orders WHERE pin = ? AND status != 'delivered'",
    )
    .bind(pin)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

/// Create a ticket with a server-generated PIN.
///
/// The uniqueness check is check-then-insert, not atomic: two concurrent
/// creates could in principle draw the same PIN. Accepted at buvette
/// scale; the PIN is a convenience handle, not a key.
pub async fn create(pool: &SqlitePool, data: OrderCreate) -> RepoResult<Order> {
    let status = data.status.unwrap_or(OrderStatus::ClientDraft);
    if !matches!(status, OrderStatus::ClientDraft | OrderStatus::Pending) {
        return Err(RepoError::Validation(format!(
            "New orders must start as client_draft or pending, got {status}"
        )));
    }

    let mut pin = generate_ticket_pin();
    let mut attempts = 1;
    while pin_in_use(pool, &pin).await? {
        if attempts >= MAX_PIN_ATTEMPTS {
            return Err(RepoError::Duplicate(
                "Could not allocate a free ticket PIN".into(),
            ));
        }
        pin = generate_ticket_pin();
        attempts += 1;
    }

    let id = shared::util::snowflake_id();
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO orders (id, pin, status, cooking_type, client_name, fcm_token, created_at, notification_sent_at, notification_count, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL, 0, ?7)",
    )
    .bind(id)
    .bind(&pin)
    .bind(status)
    .bind(data.cooking_type.unwrap_or_default())
    .bind(&data.client_name)
    .bind(&data.fcm_token)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create order".into()))
}

/// Partial update from the guest/manager surfaces.
///
/// Returns the (before, after) snapshots so the caller can feed the
/// write-triggered lifecycle path. Re-entering `pending` clears the
/// reminder bookkeeping entirely; re-entering `ready` resets the counter.
pub async fn update(pool: &SqlitePool, id: i64, data: OrderUpdate) -> RepoResult<(Order, Order)> {
    let before = find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Order {id} not found")))?;

    let pin = match data.pin {
        Some(pin) => {
            validate_pin(&pin)?;
            if pin != before.pin && pin_in_use(pool, &pin).await? {
                return Err(RepoError::Duplicate(format!(
                    "Ticket PIN {pin} is already in use"
                )));
            }
            pin
        }
        None => before.pin.clone(),
    };

    let status = data.status.unwrap_or(before.status);
    let (notification_sent_at, notification_count) = if status != before.status {
        match status {
            OrderStatus::Pending => (None, 0),
            OrderStatus::Ready => (before.notification_sent_at, 0),
            _ => (before.notification_sent_at, before.notification_count),
        }
    } else {
        (before.notification_sent_at, before.notification_count)
    };

    let now = shared::util::now_millis();
    sqlx::query(
        "UPDATE orders SET pin = ?1, status = ?2, cooking_type = ?3, client_name = COALESCE(?4, client_name), fcm_token = COALESCE(?5, fcm_token), notification_sent_at = ?6, notification_count = ?7, updated_at = ?8 WHERE id = ?9",
    )
    .bind(&pin)
    .bind(status)
    .bind(data.cooking_type.unwrap_or(before.cooking_type))
    .bind(&data.client_name)
    .bind(&data.fcm_token)
    .bind(notification_sent_at)
    .bind(notification_count)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    let after = find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Order {id} not found")))?;
    Ok((before, after))
}

/// Guest draft validation: client_draft → pending.
pub async fn validate_draft(pool: &SqlitePool, id: i64) -> RepoResult<(Order, Order)> {
    let before = find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Order {id} not found")))?;
    if before.status != OrderStatus::ClientDraft {
        return Err(RepoError::Validation(format!(
            "Only draft orders can be validated, order {id} is {}",
            before.status
        )));
    }

    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE orders SET status = 'pending', updated_at = ? WHERE id = ? AND status = 'client_draft'",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::Validation(format!(
            "Order {id} left draft state concurrently"
        )));
    }

    let after = find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Order {id} not found")))?;
    Ok((before, after))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM orders WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

// ============ Lifecycle engine patches ============

/// Stamp the initial "dish ready" notification time and zero the reminder
/// counter. Guarded on the order still being `ready`; returns `None` when
/// the guard fails (e.g. delivered while the push was in flight).
pub async fn stamp_ready_notification(
    pool: &SqlitePool,
    id: i64,
    now: i64,
) -> RepoResult<Option<Order>> {
    let rows = sqlx::query(
        "UPDATE orders SET notification_sent_at = ?1, notification_count = 0, updated_at = ?1 WHERE id = ?2 AND status = 'ready'",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Ok(None);
    }
    find_by_id(pool, id).await
}

/// Compare-and-swap reminder increment: only applies if the counter still
/// holds the value the evaluation observed.
pub async fn increment_reminder_count(
    pool: &SqlitePool,
    id: i64,
    observed_count: i32,
    now: i64,
) -> RepoResult<Option<Order>> {
    let rows = sqlx::query(
        "UPDATE orders SET notification_count = notification_count + 1, updated_at = ?1 WHERE id = ?2 AND status = 'ready' AND notification_count = ?3",
    )
    .bind(now)
    .bind(id)
    .bind(observed_count)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Ok(None);
    }
    find_by_id(pool, id).await
}

/// Lost-turn reset: back to pending with cleared bookkeeping and a fresh
/// `created_at` (back of the preparation queue). Same CAS guard as the
/// reminder increment.
pub async fn reset_after_lost_turn(
    pool: &SqlitePool,
    id: i64,
    observed_count: i32,
    now: i64,
) -> RepoResult<Option<Order>> {
    let rows = sqlx::query(
        "UPDATE orders SET status = 'pending', notification_sent_at = NULL, notification_count = 0, created_at = ?1, updated_at = ?1 WHERE id = ?2 AND status = 'ready' AND notification_count = ?3",
    )
    .bind(now)
    .bind(id)
    .bind(observed_count)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Ok(None);
    }
    find_by_id(pool, id).await
}

/// Ready orders with a stamped notification time still below the reminder
/// cap: the escalation scheduler's scan set.
pub async fn find_ready_with_stamp(pool: &SqlitePool, max_count: i32) -> RepoResult<Vec<Order>> {
    let orders = sqlx::query_as::<_, Order>(&format!(
        "SELECT {COLUMNS} FROM orders WHERE status = 'ready' AND notification_sent_at IS NOT NULL AND notification_count < ? ORDER BY created_at"
    ))
    .bind(max_count)
    .fetch_all(pool)
    .await?;
    Ok(orders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::test_pool;
    use shared::models::CookingType;

    #[tokio::test]
    async fn create_assigns_pin_and_defaults() {
        let pool = test_pool().await;
        let order = create(&pool, OrderCreate::default()).await.unwrap();

        assert_eq!(order.pin.len(), 4);
        assert_eq!(order.status, OrderStatus::ClientDraft);
        assert_eq!(order.cooking_type, CookingType::Ap);
        assert_eq!(order.notification_count, 0);
        assert!(order.notification_sent_at.is_none());
        assert!(pin_in_use(&pool, &order.pin).await.unwrap());
    }

    #[tokio::test]
    async fn create_rejects_advanced_statuses() {
        let pool = test_pool().await;
        let err = create(
            &pool,
            OrderCreate {
                status: Some(OrderStatus::Ready),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }

    #[tokio::test]
    async fn delivered_orders_release_their_pin() {
        let pool = test_pool().await;
        let order = create(&pool, OrderCreate::default()).await.unwrap();

        update(
            &pool,
            order.id,
            OrderUpdate {
                status: Some(OrderStatus::Delivered),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert!(!pin_in_use(&pool, &order.pin).await.unwrap());
        assert!(
            find_active_by_pin(&pool, &order.pin)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn update_reentering_pending_clears_bookkeeping() {
        let pool = test_pool().await;
        let order = create(
            &pool,
            OrderCreate {
                status: Some(OrderStatus::Pending),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        // Manager marks ready, engine stamps, one reminder went out
        update(
            &pool,
            order.id,
            OrderUpdate {
                status: Some(OrderStatus::Ready),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        stamp_ready_notification(&pool, order.id, 1_000).await.unwrap();
        increment_reminder_count(&pool, order.id, 0, 31_000)
            .await
            .unwrap();

        let (_, after) = update(
            &pool,
            order.id,
            OrderUpdate {
                status: Some(OrderStatus::Pending),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(after.status, OrderStatus::Pending);
        assert!(after.notification_sent_at.is_none());
        assert_eq!(after.notification_count, 0);
    }

    #[tokio::test]
    async fn update_rejects_malformed_pin() {
        let pool = test_pool().await;
        let order = create(&pool, OrderCreate::default()).await.unwrap();

        for bad in ["12", "12345", "ab1!"] {
            let err = update(
                &pool,
                order.id,
                OrderUpdate {
                    pin: Some(bad.to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
            assert!(matches!(err, RepoError::Validation(_)), "pin {bad:?}");
        }
    }

    #[tokio::test]
    async fn validate_draft_moves_to_pending_once() {
        let pool = test_pool().await;
        let order = create(&pool, OrderCreate::default()).await.unwrap();

        let (before, after) = validate_draft(&pool, order.id).await.unwrap();
        assert_eq!(before.status, OrderStatus::ClientDraft);
        assert_eq!(after.status, OrderStatus::Pending);

        let err = validate_draft(&pool, order.id).await.unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }

    #[tokio::test]
    async fn stamp_requires_ready_status() {
        let pool = test_pool().await;
        let order = create(
            &pool,
            OrderCreate {
                status: Some(OrderStatus::Pending),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        // Not ready yet: guard refuses
        assert!(
            stamp_ready_notification(&pool, order.id, 1_000)
                .await
                .unwrap()
                .is_none()
        );

        update(
            &pool,
            order.id,
            OrderUpdate {
                status: Some(OrderStatus::Ready),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let stamped = stamp_ready_notification(&pool, order.id, 1_000)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stamped.notification_sent_at, Some(1_000));
        assert_eq!(stamped.notification_count, 0);
    }

    #[tokio::test]
    async fn reminder_increment_is_compare_and_swap() {
        let pool = test_pool().await;
        let order = create(
            &pool,
            OrderCreate {
                status: Some(OrderStatus::Pending),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        update(
            &pool,
            order.id,
            OrderUpdate {
                status: Some(OrderStatus::Ready),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        stamp_ready_notification(&pool, order.id, 1_000).await.unwrap();

        // First evaluation lands
        let updated = increment_reminder_count(&pool, order.id, 0, 31_000)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.notification_count, 1);

        // A racing evaluation that observed count=0 must not land
        assert!(
            increment_reminder_count(&pool, order.id, 0, 31_000)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn lost_turn_reset_recycles_to_queue_back() {
        let pool = test_pool().await;
        let order = create(
            &pool,
            OrderCreate {
                status: Some(OrderStatus::Pending),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        update(
            &pool,
            order.id,
            OrderUpdate {
                status: Some(OrderStatus::Ready),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        stamp_ready_notification(&pool, order.id, 1_000).await.unwrap();
        increment_reminder_count(&pool, order.id, 0, 31_000)
            .await
            .unwrap();
        increment_reminder_count(&pool, order.id, 1, 61_000)
            .await
            .unwrap();

        let reset = reset_after_lost_turn(&pool, order.id, 2, 95_000)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reset.status, OrderStatus::Pending);
        assert!(reset.notification_sent_at.is_none());
        assert_eq!(reset.notification_count, 0);
        assert_eq!(reset.created_at, 95_000);
    }

    #[tokio::test]
    async fn scan_only_returns_stamped_ready_orders() {
        let pool = test_pool().await;

        let stamped = create(
            &pool,
            OrderCreate {
                status: Some(OrderStatus::Pending),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        update(
            &pool,
            stamped.id,
            OrderUpdate {
                status: Some(OrderStatus::Ready),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        stamp_ready_notification(&pool, stamped.id, 1_000).await.unwrap();

        // Ready but never stamped (initial send failed): not scanned
        let unstamped = create(
            &pool,
            OrderCreate {
                status: Some(OrderStatus::Pending),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        update(
            &pool,
            unstamped.id,
            OrderUpdate {
                status: Some(OrderStatus::Ready),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let due = find_ready_with_stamp(&pool, 3).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, stamped.id);
    }
}

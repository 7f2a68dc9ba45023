//! Lifecycle engine - transition rules and side effects
//!
//! # Evaluation model
//!
//! ```text
//! handle_update(before, after)            [write-triggered, edge]
//!     └─ pending → ready: send "dish ready", stamp notification time
//!
//! run_escalations(now)                    [scheduler-triggered, level]
//!     └─ for each ready order with a stamped time:
//!        elapsed >= 30s * (count + 1), count < 3
//!            ├─ count+1 < 3: send reminder, count += 1 (CAS)
//!            └─ count+1 == 3: send lost turn, reset to pending (CAS)
//! ```
//!
//! Side-effect policy per firing: one push send, then one conditional
//! patch only if the send succeeded. A failed send is logged and nothing
//! else happens; for the initial notification that means the transition
//! is dropped until an actor re-triggers pending → ready, for escalations
//! the next tick retries naturally.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::db::repository::order as order_repo;
use crate::message::MessageBus;
use crate::push::PushSender;
use shared::models::{Order, OrderPhase, OrderStatus};
use shared::push::PushMessage;

/// Interval between reminders (milliseconds), counted from the initial
/// notification.
pub const REMINDER_INTERVAL_MS: i64 = 30_000;

/// Total notifications after the initial one; the last is the lost turn.
pub const MAX_REMINDERS: i32 = 3;

/// A due escalation step for one ready order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escalation {
    /// Send a reminder and move the counter to `next_count`
    Reminder { next_count: i32 },
    /// Send the lost-turn notification and recycle the order to pending
    LostTurn,
}

/// Edge trigger for the initial notification: exactly the
/// pending → ready flank, nothing else.
pub fn is_ready_transition(before: &Order, after: &Order) -> bool {
    before.status == OrderStatus::Pending && after.status == OrderStatus::Ready
}

/// Level trigger for reminders/lost turn.
///
/// Fires when `elapsed >= REMINDER_INTERVAL * (count + 1)` and the
/// counter is below [`MAX_REMINDERS`]; the boundary itself fires
/// (elapsed of exactly 30s counts, 29.9s does not).
pub fn due_escalation(order: &Order, now_millis: i64) -> Option<Escalation> {
    let OrderPhase::Ready {
        since: Some(sent_at),
        reminders_sent,
    } = order.phase()
    else {
        return None;
    };

    if reminders_sent >= MAX_REMINDERS {
        return None;
    }

    let elapsed = now_millis - sent_at;
    if elapsed < REMINDER_INTERVAL_MS * (i64::from(reminders_sent) + 1) {
        return None;
    }

    if reminders_sent + 1 < MAX_REMINDERS {
        Some(Escalation::Reminder {
            next_count: reminders_sent + 1,
        })
    } else {
        Some(Escalation::LostTurn)
    }
}

/// Side-effect executor: pushes notifications and applies the matching
/// conditional patches. Stateless between invocations; cheap to clone.
#[derive(Clone)]
pub struct LifecycleEngine {
    pool: SqlitePool,
    notifier: Arc<dyn PushSender>,
    bus: MessageBus,
}

impl LifecycleEngine {
    pub fn new(pool: SqlitePool, notifier: Arc<dyn PushSender>, bus: MessageBus) -> Self {
        Self {
            pool,
            notifier,
            bus,
        }
    }

    /// Write-triggered path, invoked once per order update with the
    /// before/after snapshots. Only the pending → ready edge has a side
    /// effect; every other update is ignored here.
    pub async fn handle_update(&self, before: &Order, after: &Order, now: i64) {
        if !is_ready_transition(before, after) {
            return;
        }

        let Some(token) = after.fcm_token.as_deref() else {
            tracing::info!(
                pin = %after.pin,
                "No FCM token for order, initial notification skipped"
            );
            return;
        };

        let message = PushMessage::initial_ready(token, &after.pin);
        if let Err(e) = self.notifier.send(&message).await {
            // No patch: the edge will not re-fire on its own, so this
            // order stays un-stamped until someone re-triggers it
            tracing::error!(
                pin = %after.pin,
                error = %e,
                "Failed to send initial ready notification"
            );
            return;
        }
        tracing::info!(pin = %after.pin, "Initial 'dish ready' notification sent");

        match order_repo::stamp_ready_notification(&self.pool, after.id, now).await {
            Ok(Some(updated)) => self.broadcast(&updated),
            Ok(None) => {
                tracing::warn!(
                    pin = %after.pin,
                    "Order left ready state before stamping, notification time not recorded"
                );
            }
            Err(e) => {
                tracing::error!(pin = %after.pin, error = %e, "Failed to stamp notification time");
            }
        }
    }

    /// Scheduler path: scan every stamped ready order and fire whatever
    /// escalation is due. Returns the number of escalations applied.
    pub async fn run_escalations(&self, now: i64) -> usize {
        let due = match order_repo::find_ready_with_stamp(&self.pool, MAX_REMINDERS).await {
            Ok(orders) => orders,
            Err(e) => {
                tracing::error!(error = %e, "Failed to scan ready orders for escalation");
                return 0;
            }
        };

        let mut fired = 0;
        for order in due {
            if self.escalate(&order, now).await {
                fired += 1;
            }
        }
        fired
    }

    async fn escalate(&self, order: &Order, now: i64) -> bool {
        let Some(step) = due_escalation(order, now) else {
            return false;
        };

        let Some(token) = order.fcm_token.as_deref() else {
            tracing::info!(pin = %order.pin, "No FCM token, escalation skipped");
            return false;
        };

        match step {
            Escalation::Reminder { next_count } => {
                let message = PushMessage::reminder(token, &order.pin);
                if let Err(e) = self.notifier.send(&message).await {
                    tracing::error!(pin = %order.pin, error = %e, "Failed to send reminder");
                    return false;
                }

                match order_repo::increment_reminder_count(
                    &self.pool,
                    order.id,
                    order.notification_count,
                    now,
                )
                .await
                {
                    Ok(Some(updated)) => {
                        tracing::info!(pin = %order.pin, count = next_count, "Reminder sent");
                        self.broadcast(&updated);
                        true
                    }
                    Ok(None) => {
                        // Counter moved under us: a concurrent evaluation
                        // won the CAS, this firing is void
                        tracing::warn!(pin = %order.pin, "Reminder patch lost the race, skipped");
                        false
                    }
                    Err(e) => {
                        tracing::error!(pin = %order.pin, error = %e, "Failed to record reminder");
                        false
                    }
                }
            }
            Escalation::LostTurn => {
                let message = PushMessage::lost_turn(token, &order.pin);
                if let Err(e) = self.notifier.send(&message).await {
                    tracing::error!(pin = %order.pin, error = %e, "Failed to send lost-turn notification");
                    return false;
                }

                match order_repo::reset_after_lost_turn(
                    &self.pool,
                    order.id,
                    order.notification_count,
                    now,
                )
                .await
                {
                    Ok(Some(updated)) => {
                        tracing::info!(pin = %order.pin, "Lost turn, order recycled to pending");
                        self.broadcast(&updated);
                        true
                    }
                    Ok(None) => {
                        tracing::warn!(pin = %order.pin, "Lost-turn patch lost the race, skipped");
                        false
                    }
                    Err(e) => {
                        tracing::error!(pin = %order.pin, error = %e, "Failed to reset lost-turn order");
                        false
                    }
                }
            }
        }
    }

    fn broadcast(&self, order: &Order) {
        self.bus
            .publish_sync("orders", "updated", &order.id.to_string(), Some(order));
    }
}

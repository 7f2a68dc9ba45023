//! Order (guest ticket) model
//!
//! One row per guest ticket. The lifecycle engine interprets the
//! (`status`, `notification_sent_at`, `notification_count`) triple in
//! exactly one place, [`Order::phase`]; everything else treats the fields
//! as opaque storage.

use serde::{Deserialize, Serialize};

/// Order lifecycle status, as persisted.
///
/// "relance" is intentionally NOT a status: a relanced order is a `ready`
/// order with `notification_count > 0` (see [`Order::is_relance`]).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum OrderStatus {
    /// Guest is still editing; not yet queued for preparation
    #[default]
    ClientDraft,
    /// Queued for preparation
    Pending,
    /// Prepared; pager should alert the guest
    Ready,
    /// Picked up (terminal)
    Delivered,
    /// Forfeited after exhausting reminders (transient; the engine writes
    /// `pending` directly when recycling, but clients and push payloads
    /// name this state)
    LostTurn,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::ClientDraft => "client_draft",
            OrderStatus::Pending => "pending",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivered => "delivered",
            OrderStatus::LostTurn => "lost_turn",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cooking type attribute; opaque to the lifecycle engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "UPPERCASE"))]
pub enum CookingType {
    Bc,
    #[default]
    Ap,
    S,
    B,
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    /// 4-character guest ticket code (A-Z, 0-9)
    pub pin: String,
    pub status: OrderStatus,
    pub cooking_type: CookingType,
    pub client_name: Option<String>,
    /// Push destination; absence disables all notification side effects
    pub fcm_token: Option<String>,
    /// Unix millis; reset when the order is recycled out of a lost turn
    pub created_at: i64,
    /// Unix millis of the moment the order entered `ready`; anchors the
    /// reminder-interval math. Null until the initial notification lands.
    pub notification_sent_at: Option<i64>,
    /// Reminders already sent since the order became ready
    pub notification_count: i32,
    pub updated_at: i64,
}

/// Explicit lifecycle phase, derived from the stored fields.
///
/// The flat (`status`, `notification_sent_at`, `notification_count`)
/// triple is interpreted here and nowhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderPhase {
    Draft,
    Pending,
    Ready {
        /// When the initial "dish ready" notification landed (Unix
        /// millis); `None` until the engine stamps it
        since: Option<i64>,
        reminders_sent: i32,
    },
    Delivered,
    LostTurn,
}

impl Order {
    /// Derive the explicit lifecycle phase from the stored fields.
    pub fn phase(&self) -> OrderPhase {
        match self.status {
            OrderStatus::ClientDraft => OrderPhase::Draft,
            OrderStatus::Pending => OrderPhase::Pending,
            OrderStatus::Ready => OrderPhase::Ready {
                since: self.notification_sent_at,
                reminders_sent: self.notification_count,
            },
            OrderStatus::Delivered => OrderPhase::Delivered,
            OrderStatus::LostTurn => OrderPhase::LostTurn,
        }
    }

    /// "Relance" display state: ready and already reminded at least once.
    pub fn is_relance(&self) -> bool {
        self.status == OrderStatus::Ready && self.notification_count > 0
    }

    /// Active = still owns its PIN (anything but delivered).
    pub fn is_active(&self) -> bool {
        self.status != OrderStatus::Delivered
    }
}

/// Create order payload
///
/// The PIN is always generated server-side; `status` may only be
/// `client_draft` (default) or `pending`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OrderCreate {
    pub status: Option<OrderStatus>,
    pub cooking_type: Option<CookingType>,
    pub client_name: Option<String>,
    pub fcm_token: Option<String>,
}

/// Update order payload (partial; absent fields keep their value)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OrderUpdate {
    pub status: Option<OrderStatus>,
    pub cooking_type: Option<CookingType>,
    pub client_name: Option<String>,
    pub pin: Option<String>,
    pub fcm_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(status: OrderStatus, sent_at: Option<i64>, count: i32) -> Order {
        Order {
            id: 1,
            pin: "Z9Q1".into(),
            status,
            cooking_type: CookingType::Ap,
            client_name: None,
            fcm_token: Some("T".into()),
            created_at: 0,
            notification_sent_at: sent_at,
            notification_count: count,
            updated_at: 0,
        }
    }

    #[test]
    fn phase_maps_statuses() {
        assert_eq!(
            order(OrderStatus::ClientDraft, None, 0).phase(),
            OrderPhase::Draft
        );
        assert_eq!(
            order(OrderStatus::Pending, None, 0).phase(),
            OrderPhase::Pending
        );
        assert_eq!(
            order(OrderStatus::Ready, Some(42), 2).phase(),
            OrderPhase::Ready {
                since: Some(42),
                reminders_sent: 2
            }
        );
        assert_eq!(
            order(OrderStatus::Delivered, None, 0).phase(),
            OrderPhase::Delivered
        );
        assert_eq!(
            order(OrderStatus::LostTurn, None, 0).phase(),
            OrderPhase::LostTurn
        );
    }

    #[test]
    fn relance_is_derived_not_stored() {
        assert!(!order(OrderStatus::Ready, Some(1), 0).is_relance());
        assert!(order(OrderStatus::Ready, Some(1), 1).is_relance());
        assert!(order(OrderStatus::Ready, Some(1), 2).is_relance());
        // Only ready orders can be in relance
        assert!(!order(OrderStatus::Pending, Some(1), 2).is_relance());
    }

    #[test]
    fn delivered_is_the_only_inactive_status() {
        assert!(order(OrderStatus::ClientDraft, None, 0).is_active());
        assert!(order(OrderStatus::Pending, None, 0).is_active());
        assert!(order(OrderStatus::Ready, None, 0).is_active());
        assert!(order(OrderStatus::LostTurn, None, 0).is_active());
        assert!(!order(OrderStatus::Delivered, None, 0).is_active());
    }
}

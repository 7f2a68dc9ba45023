//! Push message payloads
//!
//! The wire contract between the pager backend and the guest device: a
//! visible notification (title + body) plus a data payload the client
//! uses to re-render (`pin`, `status`, `type`). Shapes follow the FCM
//! send API.

use serde::{Deserialize, Serialize};

use crate::models::OrderStatus;

/// Notification kind, carried as `data.type` on the device.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PushKind {
    /// First "dish ready" alert when the order enters `ready`
    InitialReady,
    /// Follow-up alert while the order sits unclaimed
    Reminder,
    /// Forfeiture alert; the ticket recycles to the back of the queue
    LostTurn,
}

/// Visible part of a push notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PushNotification {
    pub title: String,
    pub body: String,
}

/// Data payload delivered alongside the notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PushData {
    pub pin: String,
    /// Status the client should display after this notification
    pub status: OrderStatus,
    #[serde(rename = "type")]
    pub kind: PushKind,
}

/// One push send: destination token + notification + data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PushMessage {
    pub token: String,
    pub notification: PushNotification,
    pub data: PushData,
}

impl PushMessage {
    /// Initial "dish ready" notification (pending → ready edge).
    pub fn initial_ready(token: &str, pin: &str) -> Self {
        Self {
            token: token.to_string(),
            notification: PushNotification {
                title: "Votre plat est PRÊT !".to_string(),
                body: format!("Votre commande (PIN: {pin}) est prête. Venez la récupérer !"),
            },
            data: PushData {
                pin: pin.to_string(),
                status: OrderStatus::Ready,
                kind: PushKind::InitialReady,
            },
        }
    }

    /// Reminder notification while the order sits unclaimed in `ready`.
    pub fn reminder(token: &str, pin: &str) -> Self {
        Self {
            token: token.to_string(),
            notification: PushNotification {
                title: "Dépêchez-vous ça refroidit !".to_string(),
                body: format!("Votre commande (PIN: {pin}) est toujours prête. Venez vite !"),
            },
            data: PushData {
                pin: pin.to_string(),
                status: OrderStatus::Ready,
                kind: PushKind::Reminder,
            },
        }
    }

    /// "Lost turn" notification: the order is forfeited and recycles to
    /// pending, so the client displays `pending` again.
    pub fn lost_turn(token: &str, pin: &str) -> Self {
        Self {
            token: token.to_string(),
            notification: PushNotification {
                title: "Attention ! Commande annulée.".to_string(),
                body: format!(
                    "Votre commande (PIN: {pin}) a été livrée à une autre personne. Veuillez repasser une commande."
                ),
            },
            data: PushData {
                pin: pin.to_string(),
                status: OrderStatus::Pending,
                kind: PushKind::LostTurn,
            },
        }
    }
}

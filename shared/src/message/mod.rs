//! 同步总线消息类型定义
//!
//! Shared between the pager server and its clients: the server publishes
//! one [`BusMessage`] per resource change and clients re-render from the
//! embedded [`SyncPayload`] (live-query replacement).

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Bus event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// 系统通知
    Notification = 1,
    /// 同步信号
    Sync = 4,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::Notification => write!(f, "notification"),
            EventType::Sync => write!(f, "sync"),
        }
    }
}

/// Resource-change payload broadcast after every mutation.
///
/// `version` increases monotonically per resource so clients can discard
/// stale updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncPayload {
    /// Resource type ("orders", "manager_pin")
    pub resource: String,
    pub version: u64,
    /// Change kind ("created", "updated", "deleted")
    pub action: String,
    /// Resource ID
    pub id: String,
    /// Resource data (None for deletions)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Message envelope carried on the sync bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusMessage {
    pub event_type: EventType,
    pub data: serde_json::Value,
    /// 用于消息追踪
    pub request_id: Uuid,
}

impl BusMessage {
    pub fn new(event_type: EventType, data: serde_json::Value) -> Self {
        Self {
            event_type,
            data,
            request_id: Uuid::new_v4(),
        }
    }

    /// Wrap a sync payload in a bus envelope.
    pub fn sync(payload: &SyncPayload) -> Self {
        Self::new(
            EventType::Sync,
            serde_json::to_value(payload).unwrap_or(serde_json::Value::Null),
        )
    }
}

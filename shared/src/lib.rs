//! Shared types for the Buvette pager system
//!
//! Common types used by the pager server and its clients: order and
//! configuration models, push message payloads, sync bus envelopes, and
//! small utilities (timestamps, ID/PIN generation).

pub mod message;
pub mod models;
pub mod push;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

// Message bus re-exports (for convenient access)
pub use message::{BusMessage, EventType, SyncPayload};

// Push payload re-exports
pub use push::{PushKind, PushMessage};

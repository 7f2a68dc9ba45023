//! Manager PIN Config Model (Singleton)

use serde::{Deserialize, Serialize};

/// Manager access PIN configuration (singleton row)
///
/// The PIN is a plaintext shared secret; comparison happens client-side
/// on the manager screen. No hashing by design of the source system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ManagerPinConfig {
    pub id: i64,
    pub pin: String,
    /// Unix millis of the last update
    pub last_updated: i64,
}

/// Set manager PIN payload (the `setManagerPin` callable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetManagerPinRequest {
    pub pin: String,
}

/// Set manager PIN acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetManagerPinResponse {
    pub success: bool,
    pub message: String,
}

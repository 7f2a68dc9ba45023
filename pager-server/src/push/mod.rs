//! Push sending abstraction
//!
//! The lifecycle engine talks to the guest's device through this trait.
//! Delivery is best-effort: one send per firing, no retry, no queueing.
//! A failure aborts the invocation's remaining side effects (the engine
//! withholds the corresponding document patch).

pub mod fcm;
pub mod mock;

use async_trait::async_trait;
use shared::push::PushMessage;
use thiserror::Error;

pub use fcm::FcmSender;
pub use mock::MockPushSender;

/// Push send errors
#[derive(Debug, Error)]
pub enum PushError {
    /// Could not reach the push service at all
    #[error("Push transport error: {0}")]
    Transport(String),

    /// The push service rejected the send
    #[error("Push delivery rejected: {0}")]
    Delivery(String),
}

/// External capability to deliver one message to one device token.
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, message: &PushMessage) -> Result<(), PushError>;
}

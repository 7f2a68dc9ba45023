//! Recording push sender for tests
//!
//! Stands in for FCM: records every send and can be switched into a
//! failing mode to exercise the no-patch-on-failure path.

use async_trait::async_trait;
use shared::push::PushMessage;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{PushError, PushSender};

#[derive(Clone, Default)]
pub struct MockPushSender {
    sent: Arc<Mutex<Vec<PushMessage>>>,
    failing: Arc<AtomicBool>,
}

impl MockPushSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages accepted so far, in send order.
    pub fn sent(&self) -> Vec<PushMessage> {
        self.sent.lock().expect("mock sender poisoned").clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().expect("mock sender poisoned").len()
    }

    /// Make every subsequent send fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl PushSender for MockPushSender {
    async fn send(&self, message: &PushMessage) -> Result<(), PushError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PushError::Delivery("mock sender set to fail".into()));
        }
        self.sent
            .lock()
            .expect("mock sender poisoned")
            .push(message.clone());
        Ok(())
    }
}

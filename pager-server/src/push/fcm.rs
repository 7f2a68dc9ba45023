//! FCM push sender
//!
//! Posts the legacy FCM send payload (`{to, notification, data}`) with a
//! server key. The service is a black box here: any non-2xx response or
//! transport error is reported as a failed send and left to the engine's
//! no-retry policy.

use async_trait::async_trait;
use http::header::AUTHORIZATION;
use serde_json::json;
use shared::push::PushMessage;

use super::{PushError, PushSender};

pub struct FcmSender {
    client: reqwest::Client,
    endpoint: String,
    server_key: String,
}

impl FcmSender {
    pub fn new(endpoint: impl Into<String>, server_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            server_key: server_key.into(),
        }
    }
}

#[async_trait]
impl PushSender for FcmSender {
    async fn send(&self, message: &PushMessage) -> Result<(), PushError> {
        let body = json!({
            "to": message.token,
            "notification": message.notification,
            "data": message.data,
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, format!("key={}", self.server_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| PushError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(PushError::Delivery(format!("{status}: {detail}")));
        }

        tracing::debug!(pin = %message.data.pin, kind = ?message.data.kind, "Push accepted by FCM");
        Ok(())
    }
}

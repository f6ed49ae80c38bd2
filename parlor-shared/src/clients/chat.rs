use std::time::Duration;

use reqwest::Client;
use serde::Serialize;

use crate::types::OutboundMessage;

/// Thin client for the chat platform's send API.
///
/// The wire protocol itself is out of scope; the bot only ever needs
/// "send this content with these buttons to this user".
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    user_id: i64,
    #[serde(flatten)]
    message: &'a OutboundMessage,
}

impl ChatClient {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("failed to build chat http client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn send(&self, user_id: i64, message: &OutboundMessage) -> Result<(), String> {
        let request = SendRequest { user_id, message };
        let response = self
            .client
            .post(format!("{}/send", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("chat send failed: {e}"))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("chat API error: {body}"));
        }
        Ok(())
    }

    /// Best-effort delivery for notifications to third parties (match
    /// alerts, gift arrivals). Failures are logged, never propagated.
    pub async fn notify(&self, user_id: i64, message: &OutboundMessage) {
        if let Err(err) = self.send(user_id, message).await {
            tracing::warn!(user_id, error = %err, "notification dropped");
        }
    }
}

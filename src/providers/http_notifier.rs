use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, instrument};

use crate::email_provider::EmailSender;

/// Sends email through an HTTP notification API. The API accepts a template
/// id, a variables object, and a recipient address and replies with a
/// delivery status.
pub struct HttpNotifier {
    base_url: String,
}

impl HttpNotifier {
    pub fn new(base_url: &str) -> Self {
        HttpNotifier {
            base_url: base_url.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct NotifyResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
}

#[async_trait]
impl EmailSender for HttpNotifier {
    #[instrument(
        name = "NotifySend",
        skip(self, variables),
        fields(template = %template_id, recipient = %recipient)
    )]
    async fn send(
        &self,
        template_id: &str,
        variables: &Map<String, Value>,
        recipient: &str,
    ) -> Result<()> {
        let url = format!("{}/v1/notifications/email", self.base_url);
        debug!("Posting notification to {}", url);

        let body = json!({
            "template_id": template_id,
            "variables": variables,
            "recipient": recipient,
        });

        let client = reqwest::Client::builder()
            .user_agent("flowdesk/1.0")
            .build()?;
        let response = client.post(&url).json(&body).send().await.map_err(|e| {
            anyhow!(
                "Request error: {} for template: {} recipient: {}",
                e,
                template_id,
                recipient
            )
        })?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for template: {} recipient: {}",
                response.status(),
                template_id,
                recipient
            ));
        }

        let text = response.text().await?;
        let data: NotifyResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", recipient, e))?;

        if data.status != "accepted" {
            return Err(anyhow!(
                "Notification rejected for {}: {}",
                recipient,
                data.message.unwrap_or_else(|| data.status.clone())
            ));
        }

        debug!("Notification accepted for {}", recipient);
        Ok(())
    }
}

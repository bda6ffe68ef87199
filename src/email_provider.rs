//! Provides email delivery for the application.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Sends one email rendered from `template_id` with the trigger payload
    /// as template variables. The backend may be slow and may fail; callers
    /// are expected to catch failures per recipient.
    async fn send(
        &self,
        template_id: &str,
        variables: &Map<String, Value>,
        recipient: &str,
    ) -> Result<()>;
}

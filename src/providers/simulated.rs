use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

use crate::email_provider::EmailSender;

/// A send recorded by the simulated backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSend {
    pub template_id: String,
    pub recipient: String,
}

/// In-process email backend with a short simulated network delay. Used for
/// dry runs and as the test double; failures can be scripted per recipient.
#[derive(Clone)]
pub struct SimulatedSender {
    delay: Duration,
    failing: Arc<Mutex<HashSet<String>>>,
    sent: Arc<Mutex<Vec<RecordedSend>>>,
}

impl SimulatedSender {
    pub fn new() -> Self {
        SimulatedSender {
            delay: Duration::from_millis(100),
            failing: Arc::new(Mutex::new(HashSet::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_delay(delay: Duration) -> Self {
        SimulatedSender {
            delay,
            ..Self::new()
        }
    }

    /// Scripts a failure for every send addressed to `recipient`.
    pub async fn fail_for(&self, recipient: &str) {
        self.failing.lock().await.insert(recipient.to_string());
    }

    pub async fn sent(&self) -> Vec<RecordedSend> {
        self.sent.lock().await.clone()
    }
}

impl Default for SimulatedSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmailSender for SimulatedSender {
    async fn send(
        &self,
        template_id: &str,
        _variables: &Map<String, Value>,
        recipient: &str,
    ) -> Result<()> {
        tokio::time::sleep(self.delay).await;

        if self.failing.lock().await.contains(recipient) {
            debug!("Simulated delivery failure for {}", recipient);
            return Err(anyhow!("Simulated delivery failure for {}", recipient));
        }

        self.sent.lock().await.push(RecordedSend {
            template_id: template_id.to_string(),
            recipient: recipient.to_string(),
        });
        debug!("Simulated send of {} to {}", template_id, recipient);
        Ok(())
    }
}

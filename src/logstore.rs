//! Append-only email log persisted in a fjall partition.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SendStatus {
    Sent,
    Failed,
    Pending,
}

impl std::fmt::Display for SendStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SendStatus::Sent => "sent",
            SendStatus::Failed => "failed",
            SendStatus::Pending => "pending",
        };
        f.write_str(name)
    }
}

/// Record of one attempted send. Created once by the dispatcher, never
/// updated or deleted.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EmailLog {
    pub id: Uuid,
    pub automation_id: String,
    pub recipient_email: String,
    pub subject: String,
    pub status: SendStatus,
    pub sent_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    #[serde(default)]
    pub invoice_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
}

/// Durable, timestamp-ordered log of send attempts.
pub struct EmailLogStore {
    partition: PartitionHandle,
    _keyspace: Keyspace,
}

impl EmailLogStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create log directory: {}", path.display()))?;
        let keyspace = fjall::Config::new(path)
            .open()
            .with_context(|| format!("Failed to open log store at {}", path.display()))?;
        let partition = keyspace
            .open_partition("email_logs", PartitionCreateOptions::default())
            .context("Failed to open email_logs partition")?;

        Ok(EmailLogStore {
            partition,
            _keyspace: keyspace,
        })
    }

    /// Appends one record. Keys sort by append time so `list` replays the
    /// log in order.
    pub fn append(&self, log: &EmailLog) -> Result<()> {
        let key = format!("{}:{}", Utc::now().format("%Y-%m-%dT%H:%M:%S%.9fZ"), log.id);
        let value = serde_json::to_vec(log)?;
        self.partition.insert(key, value)?;
        debug!("Appended email log {} ({})", log.id, log.status);
        Ok(())
    }

    pub fn append_all(&self, logs: &[EmailLog]) -> Result<()> {
        for log in logs {
            self.append(log)?;
        }
        Ok(())
    }

    /// All records in append order.
    pub fn list(&self) -> Result<Vec<EmailLog>> {
        let mut logs = Vec::new();
        for entry in self.partition.iter() {
            let (_, value) = entry?;
            logs.push(serde_json::from_slice(&value)?);
        }
        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample(recipient: &str, status: SendStatus) -> EmailLog {
        EmailLog {
            id: Uuid::new_v4(),
            automation_id: "overdue_reminder".to_string(),
            recipient_email: recipient.to_string(),
            subject: "Reminder: invoice INV-042 is overdue".to_string(),
            status,
            sent_at: Some(Utc::now()),
            error: None,
            invoice_id: Some("INV-042".to_string()),
            project_id: None,
        }
    }

    #[test]
    fn test_append_and_list_in_order() {
        let dir = tempdir().unwrap();
        let store = EmailLogStore::open(dir.path()).unwrap();

        let first = sample("a@x.com", SendStatus::Sent);
        let second = sample("b@x.com", SendStatus::Failed);
        store.append(&first).unwrap();
        store.append(&second).unwrap();

        let logs = store.list().unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].recipient_email, "a@x.com");
        assert_eq!(logs[1].recipient_email, "b@x.com");
        assert_eq!(logs[1].status, SendStatus::Failed);
    }

    #[test]
    fn test_empty_store_lists_nothing() {
        let dir = tempdir().unwrap();
        let store = EmailLogStore::open(dir.path()).unwrap();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = EmailLogStore::open(dir.path()).unwrap();
            store.append(&sample("a@x.com", SendStatus::Sent)).unwrap();
        }
        let store = EmailLogStore::open(dir.path()).unwrap();
        assert_eq!(store.list().unwrap().len(), 1);
    }
}

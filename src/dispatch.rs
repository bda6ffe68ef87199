//! Automation dispatcher: gates on activity and conditions, resolves
//! recipients, and fans sends out per recipient.

use crate::automation::{EmailAutomation, RecipientRule};
use crate::conditions::evaluate;
use crate::email_provider::EmailSender;
use crate::logstore::{EmailLog, SendStatus};
use crate::template::{EmailTemplate, render};
use anyhow::{Result, anyhow};
use chrono::Utc;
use futures::future::join_all;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Inactive,
    ConditionsNotMet,
}

/// What a dispatch call did. `Attempted` carries one log record per
/// recipient, successes and failures alike.
#[derive(Debug)]
pub enum DispatchOutcome {
    Skipped(SkipReason),
    Attempted(Vec<EmailLog>),
}

impl DispatchOutcome {
    pub fn logs(&self) -> &[EmailLog] {
        match self {
            DispatchOutcome::Skipped(_) => &[],
            DispatchOutcome::Attempted(logs) => logs,
        }
    }
}

pub struct Dispatcher {
    templates: HashMap<String, EmailTemplate>,
    admin_email: String,
    sender: Arc<dyn EmailSender>,
}

impl Dispatcher {
    pub fn new(
        templates: Vec<EmailTemplate>,
        admin_email: &str,
        sender: Arc<dyn EmailSender>,
    ) -> Self {
        Dispatcher {
            templates: templates.into_iter().map(|t| (t.id.clone(), t)).collect(),
            admin_email: admin_email.to_string(),
            sender,
        }
    }

    /// Runs one automation against a trigger payload.
    ///
    /// A dangling `template_id` is an error, not a silent no-op: a
    /// misconfigured automation should be visible to the operator. Send
    /// failures stay per-recipient and never abort the remaining sends.
    pub async fn dispatch(
        &self,
        automation: &EmailAutomation,
        trigger_data: &Map<String, Value>,
    ) -> Result<DispatchOutcome> {
        if !automation.is_active {
            debug!("Automation {} is inactive, skipping", automation.id);
            return Ok(DispatchOutcome::Skipped(SkipReason::Inactive));
        }

        if !evaluate(&automation.conditions, trigger_data) {
            debug!("Conditions not met for automation {}", automation.id);
            return Ok(DispatchOutcome::Skipped(SkipReason::ConditionsNotMet));
        }

        let template = self.templates.get(&automation.template_id).ok_or_else(|| {
            anyhow!(
                "Email template not found: {} (automation: {})",
                automation.template_id,
                automation.id
            )
        })?;

        let recipients = self.resolve_recipients(&automation.recipients, trigger_data);
        if recipients.is_empty() {
            debug!("No recipients resolved for automation {}", automation.id);
            return Ok(DispatchOutcome::Attempted(Vec::new()));
        }

        let subject = render(&template.subject, trigger_data);
        let delayed = automation.delay_hours.is_some_and(|h| h > 0);

        // One unserialized batch; delivery order across recipients is not
        // guaranteed.
        let attempts = recipients.iter().map(|recipient| {
            let subject = subject.clone();
            async move {
                if delayed {
                    // Scheduling belongs to a host system; record intent only.
                    return self.log_entry(
                        automation,
                        recipient,
                        &subject,
                        SendStatus::Pending,
                        None,
                        trigger_data,
                    );
                }

                match self
                    .sender
                    .send(&template.id, trigger_data, recipient)
                    .await
                {
                    Ok(()) => self.log_entry(
                        automation,
                        recipient,
                        &subject,
                        SendStatus::Sent,
                        None,
                        trigger_data,
                    ),
                    Err(e) => {
                        warn!(
                            "Send failed for {} (automation {}): {}",
                            recipient, automation.id, e
                        );
                        self.log_entry(
                            automation,
                            recipient,
                            &subject,
                            SendStatus::Failed,
                            Some(e.to_string()),
                            trigger_data,
                        )
                    }
                }
            }
        });

        let logs = join_all(attempts).await;
        Ok(DispatchOutcome::Attempted(logs))
    }

    fn resolve_recipients(
        &self,
        rule: &RecipientRule,
        trigger_data: &Map<String, Value>,
    ) -> Vec<String> {
        match rule {
            RecipientRule::Client => trigger_data
                .get("client_email")
                .and_then(Value::as_str)
                .map(|email| vec![email.to_string()])
                .unwrap_or_default(),
            RecipientRule::Team => trigger_data
                .get("team_emails")
                .and_then(Value::as_array)
                .map(|emails| {
                    emails
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            RecipientRule::Admin => vec![self.admin_email.clone()],
            RecipientRule::Custom { addresses } => addresses.clone(),
        }
    }

    fn log_entry(
        &self,
        automation: &EmailAutomation,
        recipient: &str,
        subject: &str,
        status: SendStatus,
        error: Option<String>,
        trigger_data: &Map<String, Value>,
    ) -> EmailLog {
        let text_field = |key: &str| {
            trigger_data
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        EmailLog {
            id: Uuid::new_v4(),
            automation_id: automation.id.clone(),
            recipient_email: recipient.to_string(),
            subject: subject.to_string(),
            status,
            sent_at: match status {
                SendStatus::Sent => Some(Utc::now()),
                SendStatus::Failed | SendStatus::Pending => None,
            },
            error,
            invoice_id: text_field("invoice_id"),
            project_id: text_field("project_id"),
        }
    }
}

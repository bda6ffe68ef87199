//! Automation configuration model.

use crate::conditions::Condition;
use serde::{Deserialize, Serialize};

/// Lifecycle events an automation can listen for.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TriggerEvent {
    InvoiceCreated,
    InvoiceOverdue,
    PaymentReceived,
    ProjectCompleted,
    ClientCreated,
}

impl std::fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TriggerEvent::InvoiceCreated => "invoice_created",
            TriggerEvent::InvoiceOverdue => "invoice_overdue",
            TriggerEvent::PaymentReceived => "payment_received",
            TriggerEvent::ProjectCompleted => "project_completed",
            TriggerEvent::ClientCreated => "client_created",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for TriggerEvent {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "invoice_created" => Ok(TriggerEvent::InvoiceCreated),
            "invoice_overdue" => Ok(TriggerEvent::InvoiceOverdue),
            "payment_received" => Ok(TriggerEvent::PaymentReceived),
            "project_completed" => Ok(TriggerEvent::ProjectCompleted),
            "client_created" => Ok(TriggerEvent::ClientCreated),
            other => Err(anyhow::anyhow!("Unknown trigger event: {other}")),
        }
    }
}

/// Who receives the email. Custom carries its address list so recipient
/// resolution is an exhaustive match, not a string comparison plus a
/// side-channel field.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RecipientRule {
    Client,
    Team,
    Admin,
    Custom { addresses: Vec<String> },
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EmailAutomation {
    pub id: String,
    pub name: String,
    pub trigger: TriggerEvent,
    pub template_id: String,
    /// Optional send delay in hours. The engine records intent as a pending
    /// log entry; actual scheduling belongs to a host system.
    #[serde(default)]
    pub delay_hours: Option<u32>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub recipients: RecipientRule,
}

fn default_active() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::Operator;
    use serde_json::json;

    #[test]
    fn test_automation_deserializes_from_yaml() {
        let yaml = r#"
id: overdue_reminder
name: "Overdue invoice reminder"
trigger: invoice_overdue
template_id: invoice_reminder
conditions:
  - field: days_overdue
    operator: greater_than
    value: 3
recipients: client
"#;
        let automation: EmailAutomation = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(automation.trigger, TriggerEvent::InvoiceOverdue);
        assert_eq!(automation.recipients, RecipientRule::Client);
        assert_eq!(automation.conditions[0].operator, Operator::GreaterThan);
        assert_eq!(automation.conditions[0].value, json!(3));
        assert!(automation.is_active);
        assert!(automation.delay_hours.is_none());
    }

    #[test]
    fn test_custom_recipients_carry_addresses() {
        let yaml = r#"
id: escalation
name: "Escalation"
trigger: invoice_overdue
template_id: invoice_reminder
recipients:
  custom:
    addresses:
      - "a@x.com"
      - "b@x.com"
"#;
        let automation: EmailAutomation = serde_yaml::from_str(yaml).unwrap();
        match automation.recipients {
            RecipientRule::Custom { addresses } => {
                assert_eq!(addresses, vec!["a@x.com", "b@x.com"]);
            }
            other => panic!("expected custom recipients, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_trigger_rejected() {
        let yaml = r#"
id: x
name: x
trigger: invoice_shredded
template_id: t
recipients: admin
"#;
        assert!(serde_yaml::from_str::<EmailAutomation>(yaml).is_err());
    }
}

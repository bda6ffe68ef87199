//! Email templates with `{{var}}` placeholder substitution.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    Invoice,
    Reminder,
    Welcome,
    Notification,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EmailTemplate {
    pub id: String,
    pub name: String,
    pub subject: String,
    pub content: String,
    pub kind: TemplateKind,
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Placeholder names in the order they appear in the template.
    #[serde(default)]
    pub variables: Vec<String>,
}

fn default_active() -> bool {
    true
}

/// Substitutes `{{name}}` placeholders from the payload. Placeholders with
/// no matching payload field are left in place so a half-filled template is
/// visible rather than silently blanked.
pub fn render(template: &str, data: &Map<String, Value>) -> String {
    let mut rendered = template.to_string();
    for (key, value) in data {
        let placeholder = format!("{{{{{key}}}}}");
        if rendered.contains(&placeholder) {
            rendered = rendered.replace(&placeholder, &value_text(value));
        }
    }
    rendered
}

/// Strings render bare, everything else uses its JSON form.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_render_substitutes_placeholders() {
        let data = payload(json!({
            "client_name": "Acme Corp",
            "invoice_number": "INV-042",
            "amount": 1250.5
        }));
        let rendered = render(
            "Invoice {{invoice_number}} for {{client_name}}: {{amount}}",
            &data,
        );
        assert_eq!(rendered, "Invoice INV-042 for Acme Corp: 1250.5");
    }

    #[test]
    fn test_render_leaves_unknown_placeholders() {
        let data = payload(json!({"client_name": "Acme"}));
        let rendered = render("Hi {{client_name}}, due {{due_date}}", &data);
        assert_eq!(rendered, "Hi Acme, due {{due_date}}");
    }

    #[test]
    fn test_render_repeated_placeholder() {
        let data = payload(json!({"name": "Sam"}));
        assert_eq!(render("{{name}} {{name}}", &data), "Sam Sam");
    }

    #[test]
    fn test_template_deserializes_from_yaml() {
        let yaml = r#"
id: invoice_reminder
name: "Invoice Reminder"
subject: "Reminder: invoice {{invoice_number}} is overdue"
content: "<p>Hi {{client_name}}, invoice {{invoice_number}} is {{days_overdue}} days overdue.</p>"
kind: reminder
variables:
  - invoice_number
  - client_name
  - days_overdue
"#;
        let template: EmailTemplate = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(template.id, "invoice_reminder");
        assert_eq!(template.kind, TemplateKind::Reminder);
        assert!(template.is_active);
        assert_eq!(template.variables.len(), 3);
    }
}

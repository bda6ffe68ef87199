//! Condition evaluation for automation triggers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Comparison operator for a single condition. The set is closed: an
/// unrecognized operator in configuration is rejected at parse time.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    GreaterThan,
    LessThan,
    Contains,
}

/// A single field test against the trigger payload.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    pub value: Value,
}

/// Evaluates all conditions against the trigger payload with AND semantics.
/// An empty list is vacuously true. A field missing from the payload is
/// treated as JSON null.
pub fn evaluate(conditions: &[Condition], data: &Map<String, Value>) -> bool {
    conditions.iter().all(|condition| {
        let actual = data.get(&condition.field).unwrap_or(&Value::Null);
        let matched = matches(condition.operator, actual, &condition.value);
        if !matched {
            debug!(
                field = %condition.field,
                operator = ?condition.operator,
                "Condition not met"
            );
        }
        matched
    })
}

fn matches(operator: Operator, actual: &Value, expected: &Value) -> bool {
    match operator {
        Operator::Equals => actual == expected,
        // Ordering is defined for numeric operands only; anything else
        // fails closed.
        Operator::GreaterThan => match (as_number(actual), as_number(expected)) {
            (Some(a), Some(b)) => a > b,
            _ => false,
        },
        Operator::LessThan => match (as_number(actual), as_number(expected)) {
            (Some(a), Some(b)) => a < b,
            _ => false,
        },
        Operator::Contains => as_text(actual).contains(&as_text(expected)),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    value.as_f64()
}

/// String-cast used by `contains`; mirrors loose string coercion on both
/// sides of the test.
fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
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

    fn overdue_more_than(days: i64) -> Vec<Condition> {
        vec![Condition {
            field: "days_overdue".to_string(),
            operator: Operator::GreaterThan,
            value: json!(days),
        }]
    }

    #[test]
    fn test_greater_than_numeric() {
        let conditions = overdue_more_than(3);
        assert!(evaluate(&conditions, &payload(json!({"days_overdue": 5}))));
        assert!(!evaluate(&conditions, &payload(json!({"days_overdue": 2}))));
        assert!(!evaluate(&conditions, &payload(json!({"days_overdue": 3}))));
    }

    #[test]
    fn test_empty_conditions_vacuously_true() {
        assert!(evaluate(&[], &payload(json!({"anything": 1}))));
        assert!(evaluate(&[], &Map::new()));
    }

    #[test]
    fn test_and_semantics() {
        let conditions = vec![
            Condition {
                field: "amount".to_string(),
                operator: Operator::GreaterThan,
                value: json!(100),
            },
            Condition {
                field: "status".to_string(),
                operator: Operator::Equals,
                value: json!("overdue"),
            },
        ];

        assert!(evaluate(
            &conditions,
            &payload(json!({"amount": 500, "status": "overdue"}))
        ));
        assert!(!evaluate(
            &conditions,
            &payload(json!({"amount": 500, "status": "paid"}))
        ));
        assert!(!evaluate(
            &conditions,
            &payload(json!({"amount": 50, "status": "overdue"}))
        ));
    }

    #[test]
    fn test_missing_field_is_null() {
        let conditions = vec![Condition {
            field: "missing".to_string(),
            operator: Operator::Equals,
            value: json!(null),
        }];
        assert!(evaluate(&conditions, &payload(json!({"other": 1}))));

        // Ordering against a missing field fails closed.
        let conditions = overdue_more_than(3);
        assert!(!evaluate(&conditions, &payload(json!({"other": 1}))));
    }

    #[test]
    fn test_ordering_guards_non_numeric_operands() {
        let conditions = vec![Condition {
            field: "amount".to_string(),
            operator: Operator::LessThan,
            value: json!(100),
        }];
        assert!(!evaluate(&conditions, &payload(json!({"amount": "cheap"}))));
        assert!(evaluate(&conditions, &payload(json!({"amount": 99.5}))));
    }

    #[test]
    fn test_contains_string_casts_both_sides() {
        let conditions = vec![Condition {
            field: "client_name".to_string(),
            operator: Operator::Contains,
            value: json!("Acme"),
        }];
        assert!(evaluate(
            &conditions,
            &payload(json!({"client_name": "Acme Corporation"}))
        ));
        assert!(!evaluate(
            &conditions,
            &payload(json!({"client_name": "Globex"}))
        ));

        // Numeric payload value is cast to its text form.
        let conditions = vec![Condition {
            field: "invoice_number".to_string(),
            operator: Operator::Contains,
            value: json!(42),
        }];
        assert!(evaluate(
            &conditions,
            &payload(json!({"invoice_number": 14205}))
        ));
    }

    #[test]
    fn test_equals_is_strict() {
        let conditions = vec![Condition {
            field: "count".to_string(),
            operator: Operator::Equals,
            value: json!(5),
        }];
        assert!(evaluate(&conditions, &payload(json!({"count": 5}))));
        // "5" != 5 under strict equality
        assert!(!evaluate(&conditions, &payload(json!({"count": "5"}))));
    }

    #[test]
    fn test_unknown_operator_rejected_at_parse_time() {
        let err = serde_json::from_value::<Condition>(json!({
            "field": "x",
            "operator": "starts_with",
            "value": 1
        }));
        assert!(err.is_err());
    }
}

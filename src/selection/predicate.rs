use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{options::OptionItem, query::OperatorResolver};

/// One guided-mode filter row: `<field> <operator> <value>`.
///
/// `value == None` is an explicit null literal and still counts as active;
/// an empty string, or a row that never had a value, disables it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Predicate {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub operator: String,
    #[serde(default = "unset_value", deserialize_with = "scalar_as_string")]
    pub value: Option<String>,
    /// Operators offered for the field's type; UI only, never enforced
    #[serde(default, skip_serializing)]
    pub valid_operators: Vec<OptionItem>,
}

impl Default for Predicate {
    fn default() -> Self {
        Self::new()
    }
}

impl Predicate {
    /// A blank row as added by the user: no field, `=` operator, empty value.
    pub fn new() -> Self {
        Self {
            id: format!("filter-{}", Uuid::new_v4()),
            field: String::new(),
            operator: "=".to_string(),
            value: Some(String::new()),
            valid_operators: OperatorResolver::operators_for(""),
        }
    }

    pub fn with(field: &str, operator: &str, value: &str) -> Self {
        Self {
            field: field.to_string(),
            operator: operator.to_string(),
            value: Some(value.to_string()),
            ..Self::new()
        }
    }

    /// A row comparing `field` against the null literal.
    pub fn null(field: &str, operator: &str) -> Self {
        Self {
            value: None,
            ..Self::with(field, operator, "")
        }
    }

    pub fn is_active(&self) -> bool {
        !self.field.is_empty() && !self.operator.is_empty() && self.value.as_deref() != Some("")
    }
}

/// Which part of a filter row an edit touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterEdit {
    Field(String),
    Operator(String),
    Value(Option<String>),
}

fn unset_value() -> Option<String> {
    Some(String::new())
}

/// Filter values arrive from the UI as strings, numbers or booleans.
fn scalar_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

use serde::{Deserialize, Serialize};

/// A field as described by the remote metadata service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type", default)]
    pub field_type: String,
    /// Relationship name exposed by a lookup field (`Account` for `AccountId`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_name: Option<String>,
    /// Object the lookup points at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_to: Option<String>,
}

impl FieldDescriptor {
    pub fn new(name: &str, label: &str, field_type: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            field_type: field_type.to_string(),
            relationship_name: None,
            reference_to: None,
        }
    }

    pub fn lookup(name: &str, label: &str, relationship_name: &str, reference_to: &str) -> Self {
        Self {
            relationship_name: Some(relationship_name.to_string()),
            reference_to: Some(reference_to.to_string()),
            ..Self::new(name, label, "Reference")
        }
    }

    /// Label, or the field name when the label is blank.
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() { &self.name } else { &self.label }
    }

    pub fn is_lookup(&self) -> bool {
        self.relationship_name.as_deref().is_some_and(|rel| !rel.is_empty())
    }
}

use serde::{Deserialize, Serialize};

/// A label/value pair as shown by pick lists and dual list boxes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OptionItem {
    pub label: String,
    pub value: String,
}

impl OptionItem {
    pub fn new(label: &str, value: &str) -> Self {
        Self { label: label.to_string(), value: value.to_string() }
    }

    /// Option whose label is its value.
    pub fn same(value: &str) -> Self {
        Self::new(value, value)
    }
}

/// A lookup relationship the user can expand, with the object it points at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipOption {
    pub label: String,
    pub value: String,
    pub reference_to: String,
}

/// Options shown under one heading.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionGroup {
    pub label: String,
    pub options: Vec<OptionItem>,
}

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::selection::FieldDescriptor;

/// Type assumed for any field the map does not know.
pub const DEFAULT_FIELD_TYPE: &str = "String";

/// Audit fields every object carries; their types are filled in when the
/// metadata service leaves them out.
const AUDIT_FIELD_TYPES: [(&str, &str); 4] = [
    ("CreatedDate", "DateTime"),
    ("LastModifiedDate", "DateTime"),
    ("SystemModstamp", "DateTime"),
    ("OwnerId", "Reference"),
];

/// One entry of a field type map as it arrives from the shell.
///
/// The map is filled either with bare type tags (`"Currency"`) or with whole
/// field descriptors (`{"type": "Currency", ...}`); any other shape is kept but
/// resolves to [`DEFAULT_FIELD_TYPE`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldTypeEntry {
    /// Bare type tag
    Tag(String),
    /// Descriptor object carrying a `type` key
    Descriptor {
        #[serde(rename = "type", default)]
        field_type: Option<String>,
    },
    /// Unrecognized shape
    Other(Value),
}

impl FieldTypeEntry {
    /// The declared type tag, if the entry has a recognizable shape.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            FieldTypeEntry::Tag(tag) => Some(tag),
            FieldTypeEntry::Descriptor { field_type } => field_type.as_deref(),
            FieldTypeEntry::Other(_) => None,
        }
    }
}

impl From<&str> for FieldTypeEntry {
    fn from(value: &str) -> Self {
        FieldTypeEntry::Tag(value.to_string())
    }
}

/// Field identifier -> declared scalar type, used when formatting literals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldTypeMap {
    entries: IndexMap<String, FieldTypeEntry>,
}

impl FieldTypeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from the descriptors returned by the metadata service.
    /// Descriptors without a name are skipped.
    pub fn from_descriptors(fields: &[FieldDescriptor]) -> Self {
        let mut map = Self::new();
        for field in fields.iter().filter(|f| !f.name.is_empty()) {
            map.insert(&field.name, &field.field_type);
        }
        map
    }

    pub fn insert(&mut self, field: &str, field_type: &str) {
        self.entries.insert(field.to_string(), FieldTypeEntry::from(field_type));
    }

    pub fn insert_entry(&mut self, field: &str, entry: FieldTypeEntry) {
        self.entries.insert(field.to_string(), entry);
    }

    pub fn get(&self, field: &str) -> Option<&FieldTypeEntry> {
        self.entries.get(field)
    }

    /// Declared type of `field`, falling back to `"String"`.
    pub fn type_of(&self, field: &str) -> &str {
        self.entries
            .get(field)
            .and_then(FieldTypeEntry::type_name)
            .unwrap_or(DEFAULT_FIELD_TYPE)
    }

    /// Fill in the well-known audit fields that are not already present.
    pub fn apply_audit_defaults(&mut self) {
        for (field, field_type) in AUDIT_FIELD_TYPES {
            if !self.entries.contains_key(field) {
                self.insert(field, field_type);
            }
        }
    }

    pub fn with_audit_defaults(mut self) -> Self {
        self.apply_audit_defaults();
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for FieldTypeMap {
    fn from_iter<T: IntoIterator<Item = (&'a str, &'a str)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (field, field_type) in iter {
            map.insert(field, field_type);
        }
        map
    }
}

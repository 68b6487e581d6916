use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for SortDirection {
    /// Anything other than `desc` (any case) sorts ascending.
    fn from(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }
}

/// ORDER BY target; only rendered when `field` is non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn new(field: &str, direction: SortDirection) -> Self {
        Self { field: field.to_string(), direction }
    }

    pub fn asc(field: &str) -> Self {
        Self::new(field, SortDirection::Asc)
    }

    pub fn desc(field: &str) -> Self {
        Self::new(field, SortDirection::Desc)
    }

    pub fn is_set(&self) -> bool {
        !self.field.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_direction_parsing() {
        assert_eq!(SortDirection::from("DESC"), SortDirection::Desc);
        assert_eq!(SortDirection::from(" desc "), SortDirection::Desc);
        assert_eq!(SortDirection::from("asc"), SortDirection::Asc);
        assert_eq!(SortDirection::from(""), SortDirection::Asc);
    }

    #[test]
    fn test_direction_defaults_when_missing() {
        let order: OrderBy = serde_json::from_value(json!({ "field": "Name" })).unwrap();
        assert_eq!(order.direction, SortDirection::Asc);
        assert_eq!(order.direction.to_string(), "ASC");
    }
}

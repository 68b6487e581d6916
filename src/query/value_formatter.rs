/// Literal rendering family of a declared field type.
///
/// Matching is case-sensitive against the type tags the metadata service
/// reports (`Currency`, `DateTime`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Quoted, lower-cased
    Boolean,
    /// Quoted, single quotes escaped
    Text,
    /// Bare date or datetime literal
    Temporal,
    /// Bare number
    Numeric,
    /// Quoted as-is
    Unknown,
}

impl ValueKind {
    pub fn of(field_type: &str) -> ValueKind {
        match field_type {
            "Boolean" | "Checkbox" => ValueKind::Boolean,
            "Picklist" | "String" | "Phone" | "Email" | "Url" | "Text" => ValueKind::Text,
            "Date" | "DateTime" => ValueKind::Temporal,
            "Currency" | "Double" | "Integer" | "Long" | "Percent" | "null" => ValueKind::Numeric,
            _ => ValueKind::Unknown,
        }
    }
}

pub struct ValueFormatter;

impl ValueFormatter {
    /// Render `raw` as a literal for a predicate on a field of `field_type`.
    ///
    /// A missing value renders as the bare `null` token. A value spelling
    /// `null` (any case, surrounding blanks ignored) returns `None`, which the
    /// caller renders as the unquoted keyword as well.
    pub fn format_value(field: &str, field_type: &str, raw: Option<&str>) -> Option<String> {
        let Some(raw) = raw else {
            return Some("null".to_string());
        };

        let clean = raw.trim();
        if clean.eq_ignore_ascii_case("null") {
            return None;
        }

        let formatted = match ValueKind::of(field_type) {
            // Quoted literal, not a bare keyword.
            ValueKind::Boolean => format!("'{}'", clean.to_lowercase()),
            ValueKind::Text => format!("'{}'", clean.replace('\'', "\\'")),
            ValueKind::Temporal | ValueKind::Numeric => clean.to_string(),
            ValueKind::Unknown => format!("'{clean}'"),
        };

        tracing::trace!(field, field_type, formatted = %formatted, "formatted filter value");
        Some(formatted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(field_type: &str, raw: &str) -> Option<String> {
        ValueFormatter::format_value("F", field_type, Some(raw))
    }

    #[test]
    fn test_missing_value_is_null_token() {
        assert_eq!(ValueFormatter::format_value("F", "String", None).as_deref(), Some("null"));
    }

    #[test]
    fn test_typed_null_word_is_null_literal() {
        assert_eq!(fmt("String", "null"), None);
        assert_eq!(fmt("Currency", " NULL "), None);
        assert_eq!(fmt("Date", "Null"), None);
    }

    #[test]
    fn test_boolean_is_lowercased_and_quoted() {
        assert_eq!(fmt("Boolean", "TRUE").as_deref(), Some("'true'"));
        assert_eq!(fmt("Checkbox", " False ").as_deref(), Some("'false'"));
    }

    #[test]
    fn test_text_escapes_single_quotes() {
        assert_eq!(fmt("String", "O'Brien").as_deref(), Some("'O\\'Brien'"));
        assert_eq!(fmt("Picklist", " Won ").as_deref(), Some("'Won'"));
        assert_eq!(fmt("Email", "a@b.co").as_deref(), Some("'a@b.co'"));
    }

    #[test]
    fn test_temporal_and_numeric_pass_through() {
        assert_eq!(fmt("Date", " 2024-01-01 ").as_deref(), Some("2024-01-01"));
        assert_eq!(fmt("DateTime", "LAST_N_DAYS:30").as_deref(), Some("LAST_N_DAYS:30"));
        assert_eq!(fmt("Currency", " 100.5").as_deref(), Some("100.5"));
        assert_eq!(fmt("Percent", "12").as_deref(), Some("12"));
    }

    #[test]
    fn test_type_match_is_case_sensitive() {
        assert_eq!(fmt("currency", "100").as_deref(), Some("'100'"));
        assert_eq!(fmt("Reference", "001xx").as_deref(), Some("'001xx'"));
    }
}

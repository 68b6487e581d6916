use crate::options::OptionItem;

const COMMON: &[&str] = &["=", "!="];
const TEXT: &[&str] = &["=", "!=", "LIKE"];
const EQUALITY: &[&str] = &["="];
const ORDERED: &[&str] = &["=", "!=", ">", "<", ">=", "<="];
const TEMPORAL: &[&str] = &["=", "!=", ">", "<", ">=", "<=", "TODAY", "LAST_N_DAYS:30"];

/// Operators the UI offers per field type. Advisory only: the WHERE compiler
/// renders whatever operator a predicate carries.
pub struct OperatorResolver;

impl OperatorResolver {
    /// Operator tokens for a type tag (case-insensitive); unknown types get `=`/`!=`.
    pub fn operator_values(field_type: &str) -> &'static [&'static str] {
        match field_type.trim().to_ascii_lowercase().as_str() {
            "string" | "textarea" | "email" | "phone" | "url" => TEXT,
            "picklist" | "reference" => COMMON,
            "boolean" | "checkbox" => EQUALITY,
            "int" | "integer" | "long" | "double" | "currency" | "percent" => ORDERED,
            "date" | "datetime" => TEMPORAL,
            _ => COMMON,
        }
    }

    pub fn operators_for(field_type: &str) -> Vec<OptionItem> {
        Self::operator_values(field_type)
            .iter()
            .map(|op| OptionItem::same(op))
            .collect()
    }

    pub fn is_offered(field_type: &str, operator: &str) -> bool {
        Self::operator_values(field_type).contains(&operator)
    }
}

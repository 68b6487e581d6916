use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    query::ValueFormatter,
    selection::{FieldTypeMap, Predicate},
};

/// A double-quoted ISO-8601 date, optionally with a time and zone suffix.
/// Date literals in the query language must be bare.
static QUOTED_DATE_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""(\d{4}-\d{2}-\d{2}(?:T\d{2}:\d{2}(?::\d{2}(?:\.\d+)?)?(?:Z|[+-]\d{2}:?\d{2}))?)""#)
        .expect("date literal pattern is valid")
});

pub struct WhereClauseCompiler;

impl WhereClauseCompiler {
    /// Compile the WHERE fragment for a selection.
    ///
    /// The result is either empty or starts with `" WHERE "`. Raw mode wins when
    /// its text is non-blank; guided mode AND-chains the active predicates in
    /// input order. Operators are rendered verbatim.
    pub fn build_where_clause(
        filters: &[Predicate],
        use_raw_mode: bool,
        raw_text: &str,
        field_types: &FieldTypeMap,
    ) -> String {
        if use_raw_mode && !raw_text.trim().is_empty() {
            return format!(" WHERE {}", Self::normalize_raw(raw_text));
        }

        if !use_raw_mode && !filters.is_empty() {
            let clauses = filters
                .iter()
                .filter(|f| f.is_active())
                .map(|f| Self::render_predicate(f, field_types))
                .collect::<Vec<_>>();

            if !clauses.is_empty() {
                return format!(" WHERE {}", clauses.join(" AND "));
            }
        }

        String::new()
    }

    /// Trim raw text and unquote date literals; nothing else is checked.
    pub fn normalize_raw(raw_text: &str) -> String {
        QUOTED_DATE_LITERAL.replace_all(raw_text.trim(), "$1").into_owned()
    }

    pub fn render_predicate(filter: &Predicate, field_types: &FieldTypeMap) -> String {
        let field_type = field_types.type_of(&filter.field);
        let formatted = ValueFormatter::format_value(&filter.field, field_type, filter.value.as_deref());
        let literal = formatted.as_deref().unwrap_or("null");

        tracing::debug!(
            field = %filter.field,
            field_type,
            raw = ?filter.value,
            formatted = literal,
            "compiled filter"
        );

        format!("{} {} {}", filter.field, filter.operator, literal)
    }
}

use indexmap::{IndexMap, IndexSet};

use crate::{query::WhereClauseCompiler, selection::SelectionState};

/// Turns a selection snapshot into a query string.
pub struct QueryAssembler;

impl QueryAssembler {
    /// Assemble `SELECT .. FROM .. [WHERE ..] [ORDER BY ..] LIMIT n`.
    ///
    /// Returns `None` when there is no target object or no main field; that is
    /// an idle state, not an error. Identifiers are emitted as given.
    pub fn build_query(selection: &SelectionState) -> Option<String> {
        if !selection.can_build() {
            return None;
        }

        let field_list = Self::field_list(selection).join(", ");
        let select_clause = std::iter::once(field_list)
            .chain(Self::build_subqueries(&selection.child_selections))
            .filter(|piece| !piece.is_empty())
            .collect::<Vec<_>>()
            .join(", ");

        let mut query = format!("SELECT {select_clause} FROM {}", selection.target_object);

        query.push_str(&WhereClauseCompiler::build_where_clause(
            &selection.filters,
            selection.use_raw_mode,
            &selection.raw_where_text,
            &selection.field_type_map,
        ));

        if let Some(order_by) = selection.order_by.as_ref().filter(|o| o.is_set()) {
            query.push_str(&format!(" ORDER BY {} {}", order_by.field, order_by.direction));
        }

        query.push_str(&format!(" LIMIT {}", selection.effective_limit()));

        tracing::debug!(object = %selection.target_object, query = %query, "assembled query");
        Some(query)
    }

    /// Main fields, then parent paths, then every filter field (active or not),
    /// keeping the first occurrence of each.
    pub fn field_list(selection: &SelectionState) -> Vec<&str> {
        let fields: IndexSet<&str> = selection
            .main_fields
            .iter()
            .chain(selection.parent_field_paths.iter())
            .chain(selection.filters.iter().map(|f| &f.field))
            .map(String::as_str)
            .filter(|field| !field.is_empty())
            .collect();

        fields.into_iter().collect()
    }

    /// One `(SELECT .. FROM <relationship>)` per relationship with selected fields.
    pub fn build_subqueries(child_selections: &IndexMap<String, Vec<String>>) -> Vec<String> {
        child_selections
            .iter()
            .filter(|(_, fields)| !fields.is_empty())
            .map(|(relationship, fields)| format!("(SELECT {} FROM {relationship})", fields.join(", ")))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::{FieldTypeMap, OrderBy, Predicate};

    #[test]
    fn test_empty_selection_builds_nothing() {
        assert_eq!(QueryAssembler::build_query(&SelectionState::default()), None);
        assert_eq!(QueryAssembler::build_query(&SelectionState::new("Account")), None);
        let no_object = SelectionState::default().with_main_fields(&["Name"]);
        assert_eq!(QueryAssembler::build_query(&no_object), None);
    }

    #[test]
    fn test_minimal_query_always_has_limit() {
        let state = SelectionState::new("Account").with_main_fields(&["Name"]);
        assert_eq!(QueryAssembler::build_query(&state).unwrap(), "SELECT Name FROM Account LIMIT 500");
    }

    #[test]
    fn test_filter_fields_are_projected_once() {
        let state = SelectionState::new("Account")
            .with_main_fields(&["Name", "Industry"])
            .with_filter(Predicate::with("Name", "=", "Acme"))
            .with_filter(Predicate::with("AnnualRevenue", ">", ""));

        let query = QueryAssembler::build_query(&state).unwrap();
        assert_eq!(
            query,
            "SELECT Name, Industry, AnnualRevenue FROM Account WHERE Name = 'Acme' LIMIT 500"
        );
        assert_eq!(query.matches("Name,").count(), 1);
    }

    #[test]
    fn test_subqueries_share_the_select_clause() {
        let state = SelectionState::new("Account")
            .with_main_fields(&["Name"])
            .with_child_fields("Contacts", &["LastName", "Email"])
            .with_child_fields("Opportunities", &[]);

        let query = QueryAssembler::build_query(&state).unwrap();
        assert_eq!(query, "SELECT Name, (SELECT LastName, Email FROM Contacts) FROM Account LIMIT 500");
        assert!(!query.contains("Opportunities"));
    }

    #[test]
    fn test_full_query_shape() {
        let state = SelectionState::new("Opportunity")
            .with_main_fields(&["Name", "Amount"])
            .with_parent_fields(&["Account.Name"])
            .with_filter(Predicate::with("Amount", ">", "100"))
            .with_filter(Predicate::with("StageName", "=", "Won"))
            .with_field_types(FieldTypeMap::from_iter([("Amount", "Currency"), ("StageName", "Picklist")]))
            .with_order_by(OrderBy::desc("Amount"))
            .with_limit(10);

        assert_eq!(
            QueryAssembler::build_query(&state).unwrap(),
            "SELECT Name, Amount, Account.Name, StageName FROM Opportunity \
             WHERE Amount > 100 AND StageName = 'Won' ORDER BY Amount DESC LIMIT 10"
        );
    }

    #[test]
    fn test_blank_order_by_is_skipped() {
        let state = SelectionState::new("Account")
            .with_main_fields(&["Name"])
            .with_order_by(OrderBy::asc(""));
        assert_eq!(QueryAssembler::build_query(&state).unwrap(), "SELECT Name FROM Account LIMIT 500");
    }

    #[test]
    fn test_raw_mode_where() {
        let state = SelectionState::new("Lead")
            .with_main_fields(&["Email"])
            .with_raw_where(r#"CreatedDate >= "2024-06-01""#)
            .with_order_by(OrderBy::asc("Email"));
        assert_eq!(
            QueryAssembler::build_query(&state).unwrap(),
            "SELECT Email FROM Lead WHERE CreatedDate >= 2024-06-01 ORDER BY Email ASC LIMIT 500"
        );
    }

    #[test]
    fn test_build_is_deterministic() {
        let state = SelectionState::new("Account")
            .with_main_fields(&["Name"])
            .with_child_fields("Cases", &["Subject"])
            .with_filter(Predicate::with("Name", "LIKE", "A%"));
        assert_eq!(QueryAssembler::build_query(&state), QueryAssembler::build_query(&state));
    }

    #[test]
    fn filter_row_without_value_stays_out_of_where() {
        let mut state = SelectionState::new("Account").with_main_fields(&["Name"]);
        state.filters = serde_json::from_value(serde_json::json!([
            { "field": "Name", "operator": "=" }
        ]))
        .unwrap();
        assert_eq!(QueryAssembler::build_query(&state).unwrap(), "SELECT Name FROM Account LIMIT 500");

        state.filters = serde_json::from_value(serde_json::json!([
            { "field": "Name", "operator": "=", "value": null }
        ]))
        .unwrap();
        assert_eq!(
            QueryAssembler::build_query(&state).unwrap(),
            "SELECT Name FROM Account WHERE Name = null LIMIT 500"
        );
    }
}

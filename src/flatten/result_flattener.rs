use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::{
    flatten::{ATTRIBUTES_KEY, FlatRow, FlatTable, normalize_value, resolve_path},
    selection::{MAX_CHILD_ROWS, child_slot_header, child_slot_headers},
};

/// Fields read from a child relationship nobody selected fields for.
const DEFAULT_CHILD_FIELDS: &[&str] = &["Id"];

/// Flattened rows plus whether any relationship was cut at [`MAX_CHILD_ROWS`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlattenOutput {
    #[serde(flatten)]
    pub table: FlatTable,
    pub overflow_detected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlattenError {
    #[error("record #{index} is {kind}, expected an object")]
    NotARecord { index: usize, kind: &'static str },
}

/// Flattens nested query results (lookups, subqueries) into a table, using
/// the selection shape to label columns.
#[derive(Debug)]
pub struct ResultFlattener<'a> {
    parent_field_paths: &'a [String],
    child_selections: &'a IndexMap<String, Vec<String>>,
    /// lower-cased relationship -> relationship as selected
    child_keys: HashMap<String, &'a str>,
}

impl<'a> ResultFlattener<'a> {
    pub fn new(parent_field_paths: &'a [String], child_selections: &'a IndexMap<String, Vec<String>>) -> Self {
        let mut child_keys: HashMap<String, &'a str> = HashMap::new();
        for relationship in child_selections.keys() {
            let lower = relationship.to_lowercase();
            match child_keys.get(&lower) {
                // Two selections differing only in case: the first one wins.
                Some(existing) => tracing::warn!(
                    kept = %existing,
                    ignored = %relationship,
                    "child relationships collide case-insensitively"
                ),
                None => {
                    child_keys.insert(lower, relationship);
                }
            }
        }

        Self { parent_field_paths, child_selections, child_keys }
    }

    /// One-shot form of [`ResultFlattener::flatten_records`].
    pub fn flatten(
        records: &[Value],
        parent_field_paths: &'a [String],
        child_selections: &'a IndexMap<String, Vec<String>>,
        header_order: Option<&[String]>,
    ) -> FlattenOutput {
        Self::new(parent_field_paths, child_selections).flatten_records(records, header_order)
    }

    /// Flatten every record into a rectangular table.
    ///
    /// Headers are `header_order` (when given), then every child slot header,
    /// then any other key in first-seen order. A record that cannot be
    /// flattened empties the row set; the headers gathered so far are kept.
    pub fn flatten_records(&self, records: &[Value], header_order: Option<&[String]>) -> FlattenOutput {
        let mut headers: IndexSet<String> = header_order.unwrap_or_default().iter().cloned().collect();
        headers.extend(child_slot_headers(self.child_selections));

        let mut overflow_detected = false;
        let mut cells = Vec::with_capacity(records.len());

        for (index, record) in records.iter().enumerate() {
            match self.flatten_record(index, record, &mut headers, &mut overflow_detected) {
                Ok(row) => cells.push(row),
                Err(err) => {
                    tracing::error!(error = %err, records = records.len(), "flattening failed, returning no rows");
                    return FlattenOutput {
                        table: FlatTable { headers: headers.into_iter().collect(), rows: vec![] },
                        overflow_detected: false,
                    };
                }
            }
        }

        let rows = cells
            .into_iter()
            .map(|mut cell| {
                FlatRow(
                    headers
                        .iter()
                        .map(|h| (h.clone(), cell.remove(h).unwrap_or_default()))
                        .collect(),
                )
            })
            .collect();

        FlattenOutput {
            table: FlatTable { headers: headers.into_iter().collect(), rows },
            overflow_detected,
        }
    }

    fn flatten_record(
        &self,
        index: usize,
        record: &Value,
        headers: &mut IndexSet<String>,
        overflow_detected: &mut bool,
    ) -> Result<HashMap<String, String>, FlattenError> {
        let record = record.as_object().ok_or(FlattenError::NotARecord { index, kind: kind_of(record) })?;
        let mut cells = HashMap::new();

        for (key, value) in record {
            if key == ATTRIBUTES_KEY {
                continue;
            }

            if let Some(children) = self.subquery_rows(key, value) {
                let relationship = self.canonical_child_key(key);
                let fields = self.child_fields(relationship);

                if children.len() > MAX_CHILD_ROWS {
                    *overflow_detected = true;
                }

                for (slot, child) in children.iter().take(MAX_CHILD_ROWS).enumerate() {
                    for path in &fields {
                        let header = child_slot_header(relationship, slot + 1, path);
                        cells.insert(header.clone(), normalize_value(resolve_path(child, path)));
                        headers.insert(header);
                    }
                }
                continue;
            }

            let lookup_paths = self.parent_paths_under(key);
            if !lookup_paths.is_empty() {
                let lookup = value.as_object();
                for subfield in lookup_paths {
                    let header = format!("{key}.{subfield}");
                    let cell = lookup.map(|obj| normalize_value(obj.get(subfield))).unwrap_or_default();
                    cells.insert(header.clone(), cell);
                    headers.insert(header);
                }
                continue;
            }

            if self.is_expanded_lookup_id(key) {
                continue;
            }

            cells.insert(key.clone(), normalize_value(Some(value)));
            headers.insert(key.clone());
        }

        self.warn_missing_children(index, record);
        Ok(cells)
    }

    /// Child rows when `value` is a subquery result: a bare array, an object
    /// with a `records` array, or null under a selected child relationship.
    fn subquery_rows<'v>(&self, key: &str, value: &'v Value) -> Option<&'v [Value]> {
        match value {
            Value::Array(items) => Some(items.as_slice()),
            Value::Object(obj) => match obj.get("records") {
                Some(Value::Array(items)) => Some(items.as_slice()),
                _ => None,
            },
            Value::Null if self.child_keys.contains_key(&key.to_lowercase()) => Some(&[][..]),
            _ => None,
        }
    }

    fn canonical_child_key<'k>(&'k self, key: &'k str) -> &'k str {
        self.child_keys.get(&key.to_lowercase()).copied().unwrap_or(key)
    }

    fn child_fields(&self, relationship: &str) -> Vec<&str> {
        match self.child_selections.get(relationship) {
            Some(fields) => fields.iter().map(String::as_str).collect(),
            None => DEFAULT_CHILD_FIELDS.to_vec(),
        }
    }

    /// Sub-fields of every parent path that starts with `<key>.` (any case).
    fn parent_paths_under(&self, key: &str) -> Vec<&'a str> {
        let prefix = format!("{}.", key.to_lowercase());
        self.parent_field_paths
            .iter()
            .filter(|path| path.to_lowercase().starts_with(&prefix))
            .filter_map(|path| path.split('.').nth(1))
            .collect()
    }

    /// `AccountId` next to expanded `Account.*` columns is redundant.
    fn is_expanded_lookup_id(&self, key: &str) -> bool {
        match key.strip_suffix("Id") {
            Some(relationship) if !relationship.is_empty() => !self.parent_paths_under(relationship).is_empty(),
            _ => false,
        }
    }

    fn warn_missing_children(&self, index: usize, record: &Map<String, Value>) {
        for relationship in self.child_selections.keys() {
            if !record.keys().any(|k| k.eq_ignore_ascii_case(relationship)) {
                tracing::warn!(record = index + 1, relationship = %relationship, "record is missing child relationship");
            }
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paths(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn children(rel: &str, fields: &[&str]) -> IndexMap<String, Vec<String>> {
        IndexMap::from([(rel.to_string(), paths(fields))])
    }

    fn contacts(count: usize) -> Value {
        let records: Vec<Value> = (1..=count)
            .map(|i| json!({ "attributes": { "type": "Contact" }, "LastName": format!("L{i}"), "Email": format!("c{i}@x.co") }))
            .collect();
        json!({ "totalSize": count, "done": true, "records": records })
    }

    #[test]
    fn test_scalars_and_lookups() {
        let records = vec![json!({ "FirstName": "A", "LastName": "B", "Account": { "Name": "Acme" } })];
        let parents = paths(&["Account.Name"]);
        let none = IndexMap::new();

        let out = ResultFlattener::flatten(&records, &parents, &none, None);
        assert_eq!(out.table.headers, vec!["FirstName", "LastName", "Account.Name"]);
        assert_eq!(out.table.rows[0].get("Account.Name"), Some("Acme"));
        assert!(!out.overflow_detected);
    }

    #[test]
    fn test_child_slots_are_capped() {
        let records = vec![json!({ "Name": "Acme", "Contacts": contacts(7) })];
        let child = children("Contacts", &["LastName", "Email"]);

        let out = ResultFlattener::flatten(&records, &[], &child, None);
        assert!(out.overflow_detected);
        assert_eq!(out.table.headers.len(), 1 + 10);
        assert_eq!(out.table.headers[0], "Contacts_1_LastName");
        assert_eq!(out.table.headers[9], "Contacts_5_Email");
        assert_eq!(out.table.headers[10], "Name");
        let row = &out.table.rows[0];
        assert_eq!(row.get("Contacts_5_LastName"), Some("L5"));
        assert!(row.get("Contacts_6_LastName").is_none());
    }

    #[test]
    fn test_short_child_sets_pad_remaining_slots() {
        let records = vec![json!({ "Name": "Acme", "Contacts": contacts(3) })];
        let child = children("Contacts", &["LastName"]);

        let out = ResultFlattener::flatten(&records, &[], &child, None);
        assert!(!out.overflow_detected);
        let row = &out.table.rows[0];
        assert_eq!(row.get("Contacts_3_LastName"), Some("L3"));
        assert_eq!(row.get("Contacts_4_LastName"), Some(""));
        assert_eq!(row.get("Contacts_5_LastName"), Some(""));
    }

    #[test]
    fn test_child_key_matches_case_insensitively() {
        let records = vec![json!({ "contacts": [ { "Account": { "Name": "Acme" } } ] })];
        let child = children("Contacts", &["Account.Name"]);

        let out = ResultFlattener::flatten(&records, &[], &child, None);
        assert_eq!(out.table.rows[0].get("Contacts_1_Account.Name"), Some("Acme"));
        assert!(!out.table.headers.iter().any(|h| h.starts_with("contacts")));
    }

    #[test]
    fn test_unselected_subquery_defaults_to_id() {
        let records = vec![json!({ "Cases": { "records": [ { "Id": "500A", "Subject": "x" } ] } })];
        let out = ResultFlattener::flatten(&records, &[], &IndexMap::new(), None);
        assert_eq!(out.table.headers, vec!["Cases_1_Id"]);
        assert_eq!(out.table.rows[0].get("Cases_1_Id"), Some("500A"));
    }

    #[test]
    fn test_null_child_relationship_is_empty() {
        let records = vec![json!({ "Name": "Acme", "Contacts": null })];
        let child = children("Contacts", &["LastName"]);

        let out = ResultFlattener::flatten(&records, &[], &child, None);
        assert!(!out.table.headers.contains(&"Contacts".to_string()));
        assert_eq!(out.table.rows[0].get("Contacts_1_LastName"), Some(""));
    }

    #[test]
    fn test_null_lookup_keeps_columns() {
        let records = vec![
            json!({ "Name": "A", "Owner": { "Name": "Ana", "Email": "ana@x.co" } }),
            json!({ "Name": "B", "Owner": null }),
        ];
        let parents = paths(&["Owner.Name", "Owner.Email"]);

        let out = ResultFlattener::flatten(&records, &parents, &IndexMap::new(), None);
        assert_eq!(out.table.headers, vec!["Name", "Owner.Name", "Owner.Email"]);
        assert_eq!(out.table.rows[1].get("Owner.Name"), Some(""));
        assert_eq!(out.table.rows[1].get("Owner.Email"), Some(""));
    }

    #[test]
    fn test_expanded_lookup_id_is_skipped() {
        let records = vec![json!({ "AccountId": "001", "Account": { "Name": "Acme" }, "OwnerId": "005" })];
        let parents = paths(&["Account.Name"]);

        let out = ResultFlattener::flatten(&records, &parents, &IndexMap::new(), None);
        assert_eq!(out.table.headers, vec!["Account.Name", "OwnerId"]);
    }

    #[test]
    fn test_header_order_is_respected_and_rows_are_rectangular() {
        let records = vec![
            json!({ "attributes": { "type": "Account" }, "Name": "A", "Industry": "Tech" }),
            json!({ "Name": "B", "Rating": "Hot" }),
        ];
        let order = paths(&["Industry", "Name", "Website"]);

        let out = ResultFlattener::flatten(&records, &[], &IndexMap::new(), Some(order.as_slice()));
        assert_eq!(out.table.headers, vec!["Industry", "Name", "Website", "Rating"]);
        for row in &out.table.rows {
            assert_eq!(row.len(), out.table.headers.len());
            for (cell_header, header) in row.0.keys().zip(&out.table.headers) {
                assert_eq!(cell_header, header);
            }
        }
        assert_eq!(out.table.rows[1].get("Industry"), Some(""));
        assert_eq!(out.table.rows[0].get("Rating"), Some(""));
    }

    #[test]
    fn test_bad_record_degrades_to_empty_rows() {
        let records = vec![json!({ "Name": "A", "Phone": "1" }), json!("not a record")];
        let order = paths(&["Name"]);

        let out = ResultFlattener::flatten(&records, &[], &IndexMap::new(), Some(order.as_slice()));
        assert!(out.table.rows.is_empty());
        assert_eq!(out.table.headers, vec!["Name", "Phone"]);
        assert!(!out.overflow_detected);
    }

    #[test]
    fn test_empty_record_set_keeps_slot_headers() {
        let child = children("Contacts", &["Email"]);
        let out = ResultFlattener::flatten(&[], &[], &child, None);
        assert!(out.table.rows.is_empty());
        assert_eq!(out.table.headers.len(), MAX_CHILD_ROWS);
    }

    #[test]
    fn lookup_keys_match_parent_paths_in_any_case() {
        let records = vec![json!({ "OwnerId": "005", "owner": { "Name": "Ada" } })];
        let parents = paths(&["Owner.Name"]);

        let out = ResultFlattener::flatten(&records, &parents, &IndexMap::new(), None);
        assert_eq!(out.table.headers, vec!["owner.Name"]);
        assert_eq!(out.table.rows[0].get("owner.Name"), Some("Ada"));
        assert_eq!(out.table.rows[0].get("OwnerId"), None);
    }

    #[test]
    fn case_colliding_child_relationships_keep_the_first() {
        let mut child = children("Contacts", &["LastName"]);
        child.insert("contacts".to_string(), paths(&["Email"]));
        let records = vec![json!({
            "Name": "Acme",
            "CONTACTS": { "records": [{ "LastName": "L1", "Email": "e1@x.co" }] }
        })];

        let flattener = ResultFlattener::new(&[], &child);
        assert_eq!(flattener.child_keys.len(), 1);
        assert_eq!(flattener.child_keys["contacts"], "Contacts");

        let out = flattener.flatten_records(&records, None);
        let row = &out.table.rows[0];
        assert_eq!(row.get("Contacts_1_LastName"), Some("L1"));
        assert_eq!(row.get("contacts_1_Email"), Some(""));
        assert_eq!(row.get("Name"), Some("Acme"));
        assert!(!out.table.headers.iter().any(|h| h.starts_with("CONTACTS")));
    }
}

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::{
    query::OperatorResolver,
    selection::{DEFAULT_LIMIT, FieldTypeMap, FilterEdit, MAX_CHILD_ROWS, OrderBy, Predicate},
};

/// Everything the user has picked so far; the core only ever reads a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectionState {
    /// Primary queried object; must be non-empty to build
    pub target_object: String,
    /// Fields on the target object, unique, in column order
    pub main_fields: Vec<String>,
    /// `relationship.field` paths one lookup hop away
    pub parent_field_paths: Vec<String>,
    /// Child relationship -> fields projected by its subquery
    pub child_selections: IndexMap<String, Vec<String>>,
    /// Guided-mode predicates, AND-chained in this order
    pub filters: Vec<Predicate>,
    /// Free-text predicate used in raw mode
    pub raw_where_text: String,
    pub use_raw_mode: bool,
    pub order_by: Option<OrderBy>,
    pub limit: u32,
    pub field_type_map: FieldTypeMap,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self {
            target_object: String::new(),
            main_fields: vec![],
            parent_field_paths: vec![],
            child_selections: IndexMap::new(),
            filters: vec![],
            raw_where_text: String::new(),
            use_raw_mode: false,
            order_by: None,
            limit: DEFAULT_LIMIT,
            field_type_map: FieldTypeMap::default(),
        }
    }
}

impl SelectionState {
    pub fn new(target_object: &str) -> Self {
        Self {
            target_object: target_object.to_string(),
            ..Self::default()
        }
    }

    pub fn with_main_fields(mut self, fields: &[&str]) -> Self {
        self.set_main_fields(fields.iter().copied());
        self
    }

    pub fn with_parent_fields(mut self, paths: &[&str]) -> Self {
        self.parent_field_paths = dedup(paths.iter().copied());
        self
    }

    pub fn with_child_fields(mut self, relationship: &str, fields: &[&str]) -> Self {
        self.set_child_fields(relationship, fields.iter().copied());
        self
    }

    pub fn with_filter(mut self, filter: Predicate) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_raw_where(mut self, text: &str) -> Self {
        self.raw_where_text = text.to_string();
        self.use_raw_mode = true;
        self
    }

    pub fn with_order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = Some(order_by);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_field_types(mut self, field_type_map: FieldTypeMap) -> Self {
        self.field_type_map = field_type_map;
        self
    }

    /// Whether a query can be assembled from this selection.
    pub fn can_build(&self) -> bool {
        !self.target_object.is_empty() && !self.main_fields.is_empty()
    }

    /// LIMIT to render; a zero limit falls back to the default.
    pub fn effective_limit(&self) -> u32 {
        if self.limit == 0 { DEFAULT_LIMIT } else { self.limit }
    }

    /// Switch to another object, dropping every selection but the limit.
    pub fn reset_for_object(&mut self, target_object: &str) {
        *self = Self {
            target_object: target_object.to_string(),
            limit: self.limit,
            ..Self::default()
        };
    }

    pub fn set_main_fields<'a>(&mut self, fields: impl IntoIterator<Item = &'a str>) {
        self.main_fields = dedup(fields);
    }

    /// Distinct relationship names referenced by the parent field paths.
    pub fn parent_relationships(&self) -> Vec<&str> {
        let rels: IndexSet<&str> = self
            .parent_field_paths
            .iter()
            .filter_map(|path| path.split_once('.').map(|(rel, _)| rel))
            .collect();
        rels.into_iter().collect()
    }

    /// Start projecting from a lookup; a new relationship is seeded with its `Id`.
    pub fn add_parent_relationship(&mut self, relationship: &str) {
        let prefix = format!("{relationship}.");
        if !self.parent_field_paths.iter().any(|p| p.starts_with(&prefix)) {
            self.parent_field_paths.push(format!("{relationship}.Id"));
        }
    }

    pub fn remove_parent_relationship(&mut self, relationship: &str) {
        let prefix = format!("{relationship}.");
        self.parent_field_paths.retain(|p| !p.starts_with(&prefix));
    }

    /// Replace the paths selected under `relationship`. Values are full dotted
    /// paths; the relationship keeps its position among the others.
    pub fn set_parent_fields<'a>(&mut self, relationship: &str, paths: impl IntoIterator<Item = &'a str>) {
        let prefix = format!("{relationship}.");
        let position = self.parent_field_paths.iter().position(|p| p.starts_with(&prefix));
        let fresh = dedup(paths);
        self.remove_parent_relationship(relationship);

        let at = position.unwrap_or(self.parent_field_paths.len());
        let tail = self.parent_field_paths.split_off(at);
        self.parent_field_paths.extend(fresh);
        self.parent_field_paths.extend(tail);
        self.parent_field_paths = dedup(self.parent_field_paths.iter().map(String::as_str));
    }

    /// Start projecting a child relationship; a new one is seeded with `Id`.
    pub fn add_child_relationship(&mut self, relationship: &str) {
        self.child_selections
            .entry(relationship.to_string())
            .or_insert_with(|| vec!["Id".to_string()]);
    }

    pub fn remove_child_relationship(&mut self, relationship: &str) {
        self.child_selections.shift_remove(relationship);
    }

    pub fn set_child_fields<'a>(&mut self, relationship: &str, fields: impl IntoIterator<Item = &'a str>) {
        self.child_selections.insert(relationship.to_string(), dedup(fields));
    }

    /// Append a blank filter row and return its index.
    pub fn add_filter(&mut self) -> usize {
        self.filters.push(Predicate::new());
        self.filters.len() - 1
    }

    /// Apply one edit to the filter at `index`. Changing the field re-resolves
    /// the operators offered for its type. Returns false for a stale index.
    pub fn update_filter(&mut self, index: usize, edit: FilterEdit) -> bool {
        let Some(filter) = self.filters.get_mut(index) else {
            return false;
        };

        match edit {
            FilterEdit::Field(field) => {
                let field_type = if field.is_empty() { "" } else { self.field_type_map.type_of(&field) };
                filter.valid_operators = OperatorResolver::operators_for(field_type);
                filter.field = field;
                if filter.operator.is_empty() {
                    filter.operator = "=".to_string();
                }
            }
            FilterEdit::Operator(operator) => filter.operator = operator,
            FilterEdit::Value(value) => filter.value = value,
        }
        true
    }

    pub fn remove_filter(&mut self, index: usize) -> Option<Predicate> {
        (index < self.filters.len()).then(|| self.filters.remove(index))
    }

    /// Header order for flattened results: main fields, parent paths, then
    /// every child slot.
    pub fn field_order(&self) -> Vec<String> {
        let mut order = self.main_fields.clone();
        order.extend(self.parent_field_paths.iter().cloned());
        order.extend(child_slot_headers(&self.child_selections));
        order
    }
}

/// Column key for one field of one child record slot (1-based).
pub fn child_slot_header(relationship: &str, slot: usize, field: &str) -> String {
    format!("{relationship}_{slot}_{field}")
}

/// `R_1_f1 .. R_1_fk, R_2_f1 .. R_C_fk` for every relationship, whether or not
/// any child rows exist.
pub fn child_slot_headers(child_selections: &IndexMap<String, Vec<String>>) -> Vec<String> {
    let mut headers = vec![];
    for (relationship, fields) in child_selections {
        for slot in 1..=MAX_CHILD_ROWS {
            for field in fields {
                headers.push(child_slot_header(relationship, slot, field));
            }
        }
    }
    headers
}

fn dedup<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let set: IndexSet<&str> = values.into_iter().filter(|v| !v.is_empty()).collect();
    set.into_iter().map(str::to_string).collect()
}

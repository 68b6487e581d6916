use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde_json::Value;
use tokio::sync::watch;

use crate::{
    flatten::{FlatRow, FlatTable, FlattenOutput, ResultFlattener},
    options::{
        ChildFieldConfig, OptionFilter, OptionGroup, OptionItem, RelationshipOption, build_field_options,
        child_field_options, relationship_option, resolve_parent_object, where_field_groups,
    },
    query::QueryAssembler,
    selection::{BuilderConfig, FieldTypeMap, FilterEdit, OrderBy, SelectionState},
    shell::{
        CsvExportRequest, ExportOutcome, MetadataService, PreviewDebouncer, QueryService, SessionError,
    },
};

/// Option lists fetched for the current object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectCatalog {
    pub main_field_options: Vec<OptionItem>,
    pub parent_relationship_options: Vec<RelationshipOption>,
    pub child_relationship_options: Vec<OptionItem>,
    /// child relationship -> object its records belong to
    pub relationship_objects: IndexMap<String, String>,
    pub parent_field_options: IndexMap<String, Vec<OptionItem>>,
    pub child_field_options: IndexMap<String, Vec<OptionItem>>,
}

/// Outcome of one explicit run.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRun {
    pub query: String,
    /// Raw records, kept so export can re-flatten them
    pub raw_records: Vec<Value>,
    pub table: FlatTable,
    pub overflow_detected: bool,
    pub executed_at: DateTime<Utc>,
}

/// The single state-holding shell around the query core.
///
/// Owns the authoritative [`SelectionState`]; every edit goes through an
/// explicit method and schedules a debounced preview. Running and exporting
/// are explicit calls.
pub struct QueryBuilderSession<S> {
    service: Arc<S>,
    config: BuilderConfig,
    state: SelectionState,
    catalog: ObjectCatalog,
    preview: PreviewDebouncer,
    last_run: Option<QueryRun>,
}

impl<S> QueryBuilderSession<S>
where
    S: MetadataService + QueryService,
{
    pub fn new(service: Arc<S>, config: BuilderConfig) -> Self {
        let state = SelectionState::default().with_limit(config.default_limit);
        let preview = PreviewDebouncer::new(config.preview_debounce);
        Self { service, config, state, catalog: ObjectCatalog::default(), preview, last_run: None }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn catalog(&self) -> &ObjectCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    pub fn last_run(&self) -> Option<&QueryRun> {
        self.last_run.as_ref()
    }

    /// Latest published preview query.
    pub fn preview(&self) -> Option<String> {
        self.preview.current()
    }

    pub fn subscribe_preview(&self) -> watch::Receiver<Option<String>> {
        self.preview.subscribe()
    }

    /// Switch to `object`: clear every selection and fetch its metadata.
    pub async fn load_object(&mut self, object: &str) -> Result<(), SessionError> {
        self.state.reset_for_object(object);
        self.catalog = ObjectCatalog::default();
        self.last_run = None;

        let fields = self.service.fields_for_object(object).await?;
        self.state.field_type_map = FieldTypeMap::from_descriptors(&fields).with_audit_defaults();
        self.catalog.main_field_options = build_field_options(&fields, None);
        self.catalog.parent_relationship_options = fields.iter().filter_map(relationship_option).collect();

        let mut child_relationships = self.service.child_relationships(object).await?;
        child_relationships.sort();
        self.catalog.child_relationship_options = child_relationships.iter().map(|r| OptionItem::same(r)).collect();

        self.catalog.relationship_objects = self
            .service
            .relationship_targets(object)
            .await?
            .into_iter()
            .map(|t| (t.relationship_name, t.child_object_name))
            .collect();

        tracing::info!(
            object,
            fields = fields.len(),
            child_relationships = child_relationships.len(),
            "object metadata loaded"
        );
        self.touch();
        Ok(())
    }

    pub fn set_main_fields(&mut self, fields: &[&str]) {
        self.state.set_main_fields(fields.iter().copied());
        self.touch();
    }

    /// Replace the expanded lookup relationships. New ones get their field
    /// options fetched and `<rel>.Id` selected; removed ones lose their paths.
    /// A relationship whose fields cannot be fetched is left unselected.
    pub async fn select_parent_relationships(&mut self, relationships: &[&str]) {
        let current: Vec<String> = self.state.parent_relationships().into_iter().map(str::to_string).collect();
        for existing in current {
            if !relationships.contains(&existing.as_str()) {
                self.state.remove_parent_relationship(&existing);
                self.catalog.parent_field_options.shift_remove(&existing);
            }
        }

        for &relationship in relationships {
            if !self.catalog.parent_field_options.contains_key(relationship) {
                let Some(object) = resolve_parent_object(&self.catalog.parent_relationship_options, relationship) else {
                    tracing::warn!(relationship, "could not resolve parent object");
                    continue;
                };
                match self.service.fields_for_object(object).await {
                    Ok(fields) => {
                        let options = build_field_options(&fields, Some(relationship));
                        self.catalog.parent_field_options.insert(relationship.to_string(), options);
                    }
                    Err(err) => {
                        tracing::error!(relationship, error = %err, "fetching parent fields failed");
                        continue;
                    }
                }
            }
            self.state.add_parent_relationship(relationship);
        }
        self.touch();
    }

    pub fn set_parent_fields(&mut self, relationship: &str, paths: &[&str]) {
        self.state.set_parent_fields(relationship, paths.iter().copied());
        self.touch();
    }

    /// Replace the projected child relationships; new ones default to `Id`.
    pub async fn select_child_relationships(&mut self, relationships: &[&str]) {
        let removed: Vec<String> = self
            .state
            .child_selections
            .keys()
            .filter(|rel| !relationships.contains(&rel.as_str()))
            .cloned()
            .collect();
        for relationship in removed {
            self.state.remove_child_relationship(&relationship);
            self.catalog.child_field_options.shift_remove(&relationship);
        }

        for &relationship in relationships {
            if !self.catalog.child_field_options.contains_key(relationship) {
                let object = self
                    .catalog
                    .relationship_objects
                    .get(relationship)
                    .map(String::as_str)
                    .unwrap_or(relationship);
                match self.service.fields_for_object(object).await {
                    Ok(fields) => {
                        self.catalog.child_field_options.insert(relationship.to_string(), child_field_options(&fields));
                    }
                    Err(err) => {
                        tracing::error!(relationship, error = %err, "fetching child fields failed");
                        continue;
                    }
                }
            }
            self.state.add_child_relationship(relationship);
        }
        self.touch();
    }

    pub fn set_child_fields(&mut self, relationship: &str, fields: &[&str]) {
        self.state.set_child_fields(relationship, fields.iter().copied());
        self.touch();
    }

    /// Pickers for every selected child relationship.
    pub fn child_field_configs(&self) -> Vec<ChildFieldConfig> {
        self.state
            .child_selections
            .iter()
            .map(|(relationship, selected)| ChildFieldConfig {
                relationship: relationship.clone(),
                options: self.catalog.child_field_options.get(relationship).cloned().unwrap_or_default(),
                selected: if selected.is_empty() { vec!["Id".to_string()] } else { selected.clone() },
            })
            .collect()
    }

    pub fn add_filter(&mut self) -> usize {
        let index = self.state.add_filter();
        self.touch();
        index
    }

    pub fn update_filter(&mut self, index: usize, edit: FilterEdit) -> bool {
        let updated = self.state.update_filter(index, edit);
        if updated {
            self.touch();
        }
        updated
    }

    pub fn remove_filter(&mut self, index: usize) {
        if self.state.remove_filter(index).is_some() {
            self.touch();
        }
    }

    pub fn set_raw_where(&mut self, text: &str) {
        self.state.raw_where_text = text.to_string();
        self.touch();
    }

    pub fn set_raw_mode(&mut self, enabled: bool) {
        self.state.use_raw_mode = enabled;
        self.touch();
    }

    pub fn set_order_by(&mut self, order_by: Option<OrderBy>) {
        self.state.order_by = order_by;
        self.touch();
    }

    pub fn set_limit(&mut self, limit: u32) {
        self.state.limit = limit;
        self.touch();
    }

    /// Main field options narrowed by `term`, keeping selected fields visible.
    pub fn search_main_fields(&self, term: &str) -> Vec<OptionItem> {
        OptionFilter::filter(&self.catalog.main_field_options, term, &self.state.main_fields)
    }

    /// Field options of one lookup narrowed by `term`, keeping selected paths.
    pub fn search_parent_fields(&self, relationship: &str, term: &str) -> Vec<OptionItem> {
        let options = self.catalog.parent_field_options.get(relationship).map(Vec::as_slice).unwrap_or_default();
        OptionFilter::filter(options, term, &self.state.parent_field_paths)
    }

    pub fn where_field_groups(&self, show_all: bool) -> Vec<OptionGroup> {
        where_field_groups(
            &self.state,
            &self.catalog.main_field_options,
            &self.catalog.parent_field_options,
            show_all,
        )
    }

    /// Assemble, execute and flatten the current selection.
    pub async fn run(&mut self) -> Result<&QueryRun, SessionError> {
        let query = QueryAssembler::build_query(&self.state).ok_or(SessionError::NothingToRun)?;
        let raw_records = self.service.run_query(&query).await?;

        let output = self.flatten(&raw_records);
        tracing::info!(
            rows = output.table.len(),
            overflow = output.overflow_detected,
            "query executed"
        );

        let run = self.last_run.insert(QueryRun {
            query,
            raw_records,
            table: output.table,
            overflow_detected: output.overflow_detected,
            executed_at: Utc::now(),
        });
        Ok(&*run)
    }

    /// Rows of the last run shown in the preview table.
    pub fn visible_rows(&self) -> &[FlatRow] {
        self.last_run
            .as_ref()
            .map(|run| run.table.visible(self.config.visible_rows))
            .unwrap_or_default()
    }

    /// Whether the last run has more rows than the preview shows.
    pub fn needs_export_notice(&self) -> bool {
        self.last_run.as_ref().is_some_and(|run| run.table.len() > self.config.visible_rows)
    }

    /// Re-flatten the last run's records and email them as CSV.
    pub async fn export_csv(&self, recipient_email: &str) -> Result<ExportOutcome, SessionError> {
        let run = self
            .last_run
            .as_ref()
            .filter(|run| !run.raw_records.is_empty())
            .ok_or(SessionError::NoResults)?;

        let output = self.flatten(&run.raw_records);
        let request = CsvExportRequest {
            object_name: self.state.target_object.clone(),
            rows: output.table.rows,
            headers: output.table.headers,
            recipient_email: recipient_email.to_string(),
        };

        let outcome = self.service.email_csv(request).await?;
        if !outcome.success {
            return Err(SessionError::Export(outcome.message));
        }
        tracing::info!(recipient = recipient_email, "csv export sent");
        Ok(outcome)
    }

    fn flatten(&self, records: &[Value]) -> FlattenOutput {
        let order = self.state.field_order();
        ResultFlattener::flatten(records, &self.state.parent_field_paths, &self.state.child_selections, Some(order.as_slice()))
    }

    fn touch(&mut self) {
        self.preview.schedule(self.state.clone());
    }
}

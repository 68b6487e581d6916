use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    flatten::FlatRow,
    selection::FieldDescriptor,
    shell::ServiceError,
};

/// A child relationship and the object its records belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipTarget {
    pub relationship_name: String,
    pub child_object_name: String,
}

/// Remote object metadata lookups.
pub trait MetadataService: Send + Sync {
    fn fields_for_object(&self, object: &str) -> impl Future<Output = Result<Vec<FieldDescriptor>, ServiceError>> + Send;

    fn child_relationships(&self, object: &str) -> impl Future<Output = Result<Vec<String>, ServiceError>> + Send;

    fn relationship_targets(&self, object: &str) -> impl Future<Output = Result<Vec<RelationshipTarget>, ServiceError>> + Send;
}

/// Payload handed to the CSV emailing service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvExportRequest {
    pub object_name: String,
    pub rows: Vec<FlatRow>,
    pub headers: Vec<String>,
    pub recipient_email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOutcome {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

/// Remote query execution and result export.
pub trait QueryService: Send + Sync {
    /// Execute a query and return its nested records.
    fn run_query(&self, query: &str) -> impl Future<Output = Result<Vec<Value>, ServiceError>> + Send;

    fn email_csv(&self, request: CsvExportRequest) -> impl Future<Output = Result<ExportOutcome, ServiceError>> + Send;
}

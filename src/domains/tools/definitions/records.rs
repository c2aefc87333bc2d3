//! Record CRUD and search tools over the NocoDB data surface.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};

use super::schema_of;
use crate::domains::nocodb::NocoClient;
use crate::domains::tools::envelope::now_rfc3339;
use crate::domains::tools::error::ToolError;
use crate::domains::tools::registry::ToolDescriptor;

fn default_limit() -> u32 {
    10
}

/// Parameters for fetching records with pagination.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetRecordsParams {
    #[schemars(description = "Project ID")]
    pub project_id: String,

    #[schemars(description = "Table ID")]
    pub table_id: String,

    /// Maximum number of records to return (default: 10).
    #[schemars(description = "Maximum number of records (default: 10)")]
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Number of records to skip (default: 0).
    #[schemars(description = "Number of records to skip (default: 0)")]
    #[serde(default)]
    pub offset: u32,
}

/// Fetch records from a table.
#[derive(Debug, Clone)]
pub struct GetRecordsTool;

impl GetRecordsTool {
    pub const NAME: &'static str = "nocodb_get_records";
    pub const DESCRIPTION: &'static str =
        "Get records from a NocoDB table with limit/offset pagination.";

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new(Self::NAME, Self::DESCRIPTION, schema_of::<GetRecordsParams>())
    }

    pub async fn execute(params: &GetRecordsParams, client: &NocoClient) -> Result<Value, ToolError> {
        let records = client
            .get_records(&params.project_id, &params.table_id, params.limit, params.offset)
            .await?;
        Ok(json!({
            "project_id": params.project_id,
            "table_id": params.table_id,
            "records": records,
            "timestamp": now_rfc3339(),
        }))
    }
}

/// Parameters for creating a record.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreateRecordParams {
    #[schemars(description = "Project ID")]
    pub project_id: String,

    #[schemars(description = "Table ID")]
    pub table_id: String,

    /// Field names and values for the new record.
    #[schemars(description = "Record data: field names and values")]
    pub record_data: Value,
}

/// Create a new record in a table.
#[derive(Debug, Clone)]
pub struct CreateRecordTool;

impl CreateRecordTool {
    pub const NAME: &'static str = "nocodb_create_record";
    pub const DESCRIPTION: &'static str = "Create a new record in a NocoDB table.";

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new(Self::NAME, Self::DESCRIPTION, schema_of::<CreateRecordParams>())
    }

    pub async fn execute(params: &CreateRecordParams, client: &NocoClient) -> Result<Value, ToolError> {
        let record = client
            .create_record(&params.project_id, &params.table_id, &params.record_data)
            .await?;
        Ok(json!({
            "project_id": params.project_id,
            "table_id": params.table_id,
            "record": record,
            "timestamp": now_rfc3339(),
        }))
    }
}

/// Parameters for updating a record.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UpdateRecordParams {
    #[schemars(description = "Project ID")]
    pub project_id: String,

    #[schemars(description = "Table ID")]
    pub table_id: String,

    #[schemars(description = "Record ID to update")]
    pub record_id: String,

    /// Field names and new values.
    #[schemars(description = "Record data: field names and new values")]
    pub record_data: Value,
}

/// Update an existing record.
#[derive(Debug, Clone)]
pub struct UpdateRecordTool;

impl UpdateRecordTool {
    pub const NAME: &'static str = "nocodb_update_record";
    pub const DESCRIPTION: &'static str = "Update an existing record in a NocoDB table.";

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new(Self::NAME, Self::DESCRIPTION, schema_of::<UpdateRecordParams>())
    }

    pub async fn execute(params: &UpdateRecordParams, client: &NocoClient) -> Result<Value, ToolError> {
        let record = client
            .update_record(
                &params.project_id,
                &params.table_id,
                &params.record_id,
                &params.record_data,
            )
            .await?;
        Ok(json!({
            "project_id": params.project_id,
            "table_id": params.table_id,
            "record_id": params.record_id,
            "record": record,
            "timestamp": now_rfc3339(),
        }))
    }
}

/// Parameters for deleting a record.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DeleteRecordParams {
    #[schemars(description = "Project ID")]
    pub project_id: String,

    #[schemars(description = "Table ID")]
    pub table_id: String,

    #[schemars(description = "Record ID to delete")]
    pub record_id: String,
}

/// Delete a record from a table.
#[derive(Debug, Clone)]
pub struct DeleteRecordTool;

impl DeleteRecordTool {
    pub const NAME: &'static str = "nocodb_delete_record";
    pub const DESCRIPTION: &'static str = "Delete a record from a NocoDB table.";

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new(Self::NAME, Self::DESCRIPTION, schema_of::<DeleteRecordParams>())
    }

    pub async fn execute(params: &DeleteRecordParams, client: &NocoClient) -> Result<Value, ToolError> {
        client
            .delete_record(&params.project_id, &params.table_id, &params.record_id)
            .await?;
        Ok(json!({
            "project_id": params.project_id,
            "table_id": params.table_id,
            "record_id": params.record_id,
            "message": "Record deleted successfully",
            "timestamp": now_rfc3339(),
        }))
    }
}

/// Parameters for searching records with filters.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchRecordsParams {
    #[schemars(description = "Project ID")]
    pub project_id: String,

    #[schemars(description = "Table ID")]
    pub table_id: String,

    /// Filter expression forwarded as NocoDB's `where` parameter.
    #[schemars(description = "Search filters")]
    pub filters: Value,
}

/// Search records with a filter expression.
#[derive(Debug, Clone)]
pub struct SearchRecordsTool;

impl SearchRecordsTool {
    pub const NAME: &'static str = "nocodb_search_records";
    pub const DESCRIPTION: &'static str = "Search records in a NocoDB table with filters.";

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new(Self::NAME, Self::DESCRIPTION, schema_of::<SearchRecordsParams>())
    }

    pub async fn execute(params: &SearchRecordsParams, client: &NocoClient) -> Result<Value, ToolError> {
        let records = client
            .search_records(&params.project_id, &params.table_id, &params.filters)
            .await?;
        Ok(json!({
            "project_id": params.project_id,
            "table_id": params.table_id,
            "filters": params.filters,
            "records": records,
            "timestamp": now_rfc3339(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_records_params_defaults() {
        let params: GetRecordsParams =
            serde_json::from_value(json!({"project_id": "p", "table_id": "t"})).unwrap();
        assert_eq!(params.limit, 10);
        assert_eq!(params.offset, 0);
    }

    #[test]
    fn test_get_records_params_custom_pagination() {
        let params: GetRecordsParams = serde_json::from_value(
            json!({"project_id": "p", "table_id": "t", "limit": 50, "offset": 20}),
        )
        .unwrap();
        assert_eq!(params.limit, 50);
        assert_eq!(params.offset, 20);
    }

    #[test]
    fn test_params_tolerate_extra_api_token_argument() {
        // Per-call credential overrides ride along in the same arguments
        // object; param structs must not reject the extra key.
        let params: DeleteRecordParams = serde_json::from_value(json!({
            "project_id": "p", "table_id": "t", "record_id": "r", "api_token": "tok"
        }))
        .unwrap();
        assert_eq!(params.record_id, "r");
    }

    #[test]
    fn test_create_record_params_require_data() {
        let result: Result<CreateRecordParams, _> =
            serde_json::from_value(json!({"project_id": "p", "table_id": "t"}));
        assert!(result.is_err());
    }
}

//! Connection and metadata lookup tools.
//!
//! These tools cover the NocoDB meta surface: connectivity checks, project
//! listing and table listing.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use super::{NoParams, schema_of};
use crate::domains::nocodb::NocoClient;
use crate::domains::tools::envelope::now_rfc3339;
use crate::domains::tools::error::ToolError;
use crate::domains::tools::registry::ToolDescriptor;

/// Connectivity check against the NocoDB instance.
#[derive(Debug, Clone)]
pub struct TestConnectionTool;

impl TestConnectionTool {
    pub const NAME: &'static str = "nocodb_test_connection";
    pub const DESCRIPTION: &'static str =
        "Test the connection to the NocoDB instance and list accessible projects.";

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new(Self::NAME, Self::DESCRIPTION, schema_of::<NoParams>())
    }

    pub async fn execute(client: &NocoClient) -> Result<Value, ToolError> {
        info!("Testing NocoDB connection");
        let projects = client.test_connection().await?;
        let count = projects
            .get("list")
            .and_then(Value::as_array)
            .map(|list| list.len())
            .unwrap_or(0);

        Ok(json!({
            "message": "Connection successful",
            "projects_count": count,
            "projects": projects,
            "timestamp": now_rfc3339(),
        }))
    }
}

/// List all projects visible to the credential.
#[derive(Debug, Clone)]
pub struct ListProjectsTool;

impl ListProjectsTool {
    pub const NAME: &'static str = "nocodb_list_projects";
    pub const DESCRIPTION: &'static str = "List all projects in NocoDB.";

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new(Self::NAME, Self::DESCRIPTION, schema_of::<NoParams>())
    }

    pub async fn execute(client: &NocoClient) -> Result<Value, ToolError> {
        let projects = client.list_projects().await?;
        Ok(json!({
            "projects": projects,
            "timestamp": now_rfc3339(),
        }))
    }
}

/// Parameters for listing tables in a project.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListTablesParams {
    /// The project ID to list tables from.
    #[schemars(description = "Project ID")]
    pub project_id: String,
}

/// List tables in a NocoDB project.
#[derive(Debug, Clone)]
pub struct ListTablesTool;

impl ListTablesTool {
    pub const NAME: &'static str = "nocodb_list_tables";
    pub const DESCRIPTION: &'static str = "List tables in a NocoDB project.";

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new(Self::NAME, Self::DESCRIPTION, schema_of::<ListTablesParams>())
    }

    pub async fn execute(params: &ListTablesParams, client: &NocoClient) -> Result<Value, ToolError> {
        let tables = client.list_tables(&params.project_id).await?;
        Ok(json!({
            "project_id": params.project_id,
            "tables": tables,
            "timestamp": now_rfc3339(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_tables_params_require_project_id() {
        let result: Result<ListTablesParams, _> = serde_json::from_value(json!({}));
        assert!(result.is_err());

        let params: ListTablesParams =
            serde_json::from_value(json!({"project_id": "p_abc"})).unwrap();
        assert_eq!(params.project_id, "p_abc");
    }

    #[test]
    fn test_descriptors_expose_schema() {
        let descriptor = ListTablesTool::descriptor();
        assert_eq!(descriptor.name, "nocodb_list_tables");
        assert!(
            descriptor
                .input_schema
                .to_string()
                .contains("project_id")
        );
    }
}

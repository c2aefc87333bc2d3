//! Table provisioning tool for the Discord heart-reactions schema.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use super::schema_of;
use crate::domains::nocodb::NocoClient;
use crate::domains::tools::envelope::now_rfc3339;
use crate::domains::tools::error::ToolError;
use crate::domains::tools::registry::ToolDescriptor;

/// Parameters for creating the reactions table.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreateReactionsTableParams {
    /// The project the table will be created in.
    #[schemars(description = "Project ID")]
    pub project_id: String,
}

/// Create the Discord heart-reactions table with its fixed schema.
#[derive(Debug, Clone)]
pub struct CreateReactionsTableTool;

impl CreateReactionsTableTool {
    pub const NAME: &'static str = "nocodb_create_discord_reactions_table";
    pub const DESCRIPTION: &'static str =
        "Create a Discord Heart Reactions table with its predefined schema.";

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            schema_of::<CreateReactionsTableParams>(),
        )
    }

    pub async fn execute(
        params: &CreateReactionsTableParams,
        client: &NocoClient,
    ) -> Result<Value, ToolError> {
        info!("Creating reactions table in project {}", params.project_id);
        let table = client.create_reactions_table(&params.project_id).await?;
        Ok(json!({
            "project_id": params.project_id,
            "table": table,
            "message": "Discord Heart Reactions table created successfully",
            "timestamp": now_rfc3339(),
        }))
    }
}

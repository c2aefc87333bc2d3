//! Tool definitions module.
//!
//! This module exports all available tool definitions, one file per family:
//! connection/metadata lookups, record CRUD, schema provisioning, and the
//! reaction analytics aggregation.

pub mod analytics;
pub mod connection;
pub mod records;
pub mod schema;

pub use analytics::GetAnalyticsTool;
pub use connection::{ListProjectsTool, ListTablesTool, TestConnectionTool};
pub use records::{
    CreateRecordTool, DeleteRecordTool, GetRecordsTool, SearchRecordsTool, UpdateRecordTool,
};
pub use schema::CreateReactionsTableTool;

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

/// Empty parameter set for tools that take no arguments.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct NoParams {}

/// Render a parameter type's JSON schema for the `/tools` listing.
pub(crate) fn schema_of<T: JsonSchema>() -> Value {
    serde_json::to_value(schemars::schema_for!(T)).unwrap_or_default()
}

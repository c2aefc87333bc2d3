//! Tool Registry - central registration and dispatch for all tools.
//!
//! This module provides:
//! - A fixed table of all available tools, built once at startup
//! - Name resolution into a compile-time-checked operation identifier
//! - Dispatch of `/call` requests to the matching handler

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use super::definitions::{
    CreateReactionsTableTool, CreateRecordTool, DeleteRecordTool, GetAnalyticsTool,
    GetRecordsTool, ListProjectsTool, ListTablesTool, SearchRecordsTool, TestConnectionTool,
    UpdateRecordTool,
};
use super::error::ToolError;
use crate::domains::nocodb::NocoClient;

/// Metadata for one registered tool, surfaced by `GET /tools`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl ToolDescriptor {
    pub fn new(name: &'static str, description: &'static str, input_schema: Value) -> Self {
        Self {
            name,
            description,
            input_schema,
        }
    }
}

/// Operation identifiers for every registered tool.
///
/// The registry is fixed at startup; resolving a wire name into this enum
/// is the only string-based step on the dispatch path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolName {
    TestConnection,
    ListProjects,
    ListTables,
    GetRecords,
    CreateRecord,
    UpdateRecord,
    DeleteRecord,
    SearchRecords,
    CreateReactionsTable,
    GetAnalytics,
}

impl ToolName {
    /// Every registered operation, in listing order.
    pub const ALL: [ToolName; 10] = [
        ToolName::TestConnection,
        ToolName::ListProjects,
        ToolName::ListTables,
        ToolName::GetRecords,
        ToolName::CreateRecord,
        ToolName::UpdateRecord,
        ToolName::DeleteRecord,
        ToolName::SearchRecords,
        ToolName::CreateReactionsTable,
        ToolName::GetAnalytics,
    ];

    /// Resolve a wire name into an operation identifier.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|tool| tool.as_str() == name)
    }

    /// The wire name of this operation.
    pub fn as_str(self) -> &'static str {
        match self {
            ToolName::TestConnection => TestConnectionTool::NAME,
            ToolName::ListProjects => ListProjectsTool::NAME,
            ToolName::ListTables => ListTablesTool::NAME,
            ToolName::GetRecords => GetRecordsTool::NAME,
            ToolName::CreateRecord => CreateRecordTool::NAME,
            ToolName::UpdateRecord => UpdateRecordTool::NAME,
            ToolName::DeleteRecord => DeleteRecordTool::NAME,
            ToolName::SearchRecords => SearchRecordsTool::NAME,
            ToolName::CreateReactionsTable => CreateReactionsTableTool::NAME,
            ToolName::GetAnalytics => GetAnalyticsTool::NAME,
        }
    }
}

/// Tool registry - the fixed operation table and its dispatcher.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry;

impl ToolRegistry {
    pub fn new() -> Self {
        Self
    }

    /// Descriptors for all registered tools.
    pub fn descriptors() -> Vec<ToolDescriptor> {
        vec![
            TestConnectionTool::descriptor(),
            ListProjectsTool::descriptor(),
            ListTablesTool::descriptor(),
            GetRecordsTool::descriptor(),
            CreateRecordTool::descriptor(),
            UpdateRecordTool::descriptor(),
            DeleteRecordTool::descriptor(),
            SearchRecordsTool::descriptor(),
            CreateReactionsTableTool::descriptor(),
            GetAnalyticsTool::descriptor(),
        ]
    }

    /// Dispatch one call to the matching handler.
    ///
    /// Unknown names fail before any adapter access. A per-call `api_token`
    /// argument scopes the credential to this call only; the shared client
    /// is never mutated.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: Value,
        client: &NocoClient,
    ) -> Result<Value, ToolError> {
        let Some(tool) = ToolName::from_name(name) else {
            warn!("Unknown tool requested: {}", name);
            return Err(ToolError::unknown_tool(name));
        };

        let scoped;
        let client = match arguments.get("api_token").and_then(Value::as_str) {
            Some(token) => {
                scoped = client.with_token(token);
                &scoped
            }
            None => client,
        };

        match tool {
            ToolName::TestConnection => TestConnectionTool::execute(client).await,
            ToolName::ListProjects => ListProjectsTool::execute(client).await,
            ToolName::ListTables => {
                ListTablesTool::execute(&parse_params(arguments)?, client).await
            }
            ToolName::GetRecords => {
                GetRecordsTool::execute(&parse_params(arguments)?, client).await
            }
            ToolName::CreateRecord => {
                CreateRecordTool::execute(&parse_params(arguments)?, client).await
            }
            ToolName::UpdateRecord => {
                UpdateRecordTool::execute(&parse_params(arguments)?, client).await
            }
            ToolName::DeleteRecord => {
                DeleteRecordTool::execute(&parse_params(arguments)?, client).await
            }
            ToolName::SearchRecords => {
                SearchRecordsTool::execute(&parse_params(arguments)?, client).await
            }
            ToolName::CreateReactionsTable => {
                CreateReactionsTableTool::execute(&parse_params(arguments)?, client).await
            }
            ToolName::GetAnalytics => {
                GetAnalyticsTool::execute(&parse_params(arguments)?, client).await
            }
        }
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(arguments: Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments).map_err(|e| ToolError::invalid_arguments(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn offline_client() -> NocoClient {
        // No token configured: any call reaching the adapter fails with
        // MissingToken before touching the network.
        NocoClient::new("https://db.example.com", None).unwrap()
    }

    #[test]
    fn test_all_names_round_trip() {
        for tool in ToolName::ALL {
            assert_eq!(ToolName::from_name(tool.as_str()), Some(tool));
        }
        assert_eq!(ToolName::from_name("nope"), None);
    }

    #[test]
    fn test_descriptor_table_is_complete() {
        let descriptors = ToolRegistry::descriptors();
        assert_eq!(descriptors.len(), ToolName::ALL.len());
        for tool in ToolName::ALL {
            assert!(descriptors.iter().any(|d| d.name == tool.as_str()));
        }
    }

    #[tokio::test]
    async fn test_unknown_tool_never_reaches_adapter() {
        let registry = ToolRegistry::new();
        let err = registry
            .dispatch("nocodb_drop_everything", json!({}), &offline_client())
            .await
            .unwrap_err();
        // UnknownTool, not MissingToken: the adapter was never consulted.
        assert!(matches!(err, ToolError::UnknownTool(_)));
        assert!(err.to_string().contains("Unknown tool"));
    }

    #[tokio::test]
    async fn test_invalid_arguments_rejected() {
        let registry = ToolRegistry::new();
        let err = registry
            .dispatch("nocodb_list_tables", json!({}), &offline_client())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn test_missing_token_surfaces_as_config_failure() {
        let registry = ToolRegistry::new();
        let err = registry
            .dispatch("nocodb_list_projects", json!({}), &offline_client())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("token"));
    }
}

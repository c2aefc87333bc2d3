//! Downstream NocoDB REST client.
//!
//! One method per downstream capability. Every request carries the
//! `xc-token` credential header; non-success statuses and transport
//! failures surface as typed [`NocoError`] values for the caller to
//! normalize into a response envelope.

use reqwest::Method;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

use super::error::NocoError;

/// Total request timeout, matching the original deployment's client.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the NocoDB v1 REST API.
///
/// Cheap to clone: the underlying connection pool is shared. The gateway
/// owns one instance for the process lifetime; per-call credential
/// overrides use [`NocoClient::with_token`] instead of mutating it.
#[derive(Debug, Clone)]
pub struct NocoClient {
    base_url: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl NocoClient {
    /// Create a client for the given NocoDB instance.
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self, NocoError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: base_url.into(),
            token,
            http,
        })
    }

    /// Scoped credential override: returns a clone of this client carrying
    /// `token`, sharing the connection pool. The original instance is left
    /// untouched, so concurrent calls with different overrides cannot race.
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            base_url: self.base_url.clone(),
            token: Some(token.into()),
            http: self.http.clone(),
        }
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether a credential is available on this instance.
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Test connectivity by listing projects.
    pub async fn test_connection(&self) -> Result<Value, NocoError> {
        self.list_projects().await
    }

    /// List all projects visible to the credential.
    pub async fn list_projects(&self) -> Result<Value, NocoError> {
        let url = format!("{}/api/v1/db/meta/projects", self.base_url);
        self.request(Method::GET, &url, None, &[]).await
    }

    /// List tables in a project.
    pub async fn list_tables(&self, project_id: &str) -> Result<Value, NocoError> {
        let url = format!(
            "{}/api/v1/db/meta/projects/{}/tables",
            self.base_url, project_id
        );
        self.request(Method::GET, &url, None, &[]).await
    }

    /// Fetch records from a table with pagination.
    pub async fn get_records(
        &self,
        project_id: &str,
        table_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Value, NocoError> {
        let url = self.data_url(project_id, table_id, None);
        let params = [
            ("limit".to_string(), limit.to_string()),
            ("offset".to_string(), offset.to_string()),
        ];
        self.request(Method::GET, &url, None, &params).await
    }

    /// Create a record.
    pub async fn create_record(
        &self,
        project_id: &str,
        table_id: &str,
        record_data: &Value,
    ) -> Result<Value, NocoError> {
        let url = self.data_url(project_id, table_id, None);
        self.request(Method::POST, &url, Some(record_data), &[])
            .await
    }

    /// Update an existing record.
    pub async fn update_record(
        &self,
        project_id: &str,
        table_id: &str,
        record_id: &str,
        record_data: &Value,
    ) -> Result<Value, NocoError> {
        let url = self.data_url(project_id, table_id, Some(record_id));
        self.request(Method::PATCH, &url, Some(record_data), &[])
            .await
    }

    /// Delete a record. NocoDB's reply body is not meaningful here, so the
    /// parsed value is discarded.
    pub async fn delete_record(
        &self,
        project_id: &str,
        table_id: &str,
        record_id: &str,
    ) -> Result<(), NocoError> {
        let url = self.data_url(project_id, table_id, Some(record_id));
        let token = self.token.as_deref().ok_or(NocoError::MissingToken)?;
        let response = self
            .http
            .delete(&url)
            .header("xc-token", token)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NocoError::status(status.as_u16(), body));
        }
        Ok(())
    }

    /// Search records with a NocoDB `where` filter expression.
    pub async fn search_records(
        &self,
        project_id: &str,
        table_id: &str,
        filters: &Value,
    ) -> Result<Value, NocoError> {
        let url = self.data_url(project_id, table_id, None);
        let params = [("where".to_string(), filters.to_string())];
        self.request(Method::GET, &url, None, &params).await
    }

    /// Create the Discord heart-reactions table with its fixed schema.
    pub async fn create_reactions_table(&self, project_id: &str) -> Result<Value, NocoError> {
        let url = format!(
            "{}/api/v1/db/meta/projects/{}/tables",
            self.base_url, project_id
        );
        let schema = reactions_table_schema();
        self.request(Method::POST, &url, Some(&schema), &[]).await
    }

    fn data_url(&self, project_id: &str, table_id: &str, record_id: Option<&str>) -> String {
        match record_id {
            Some(record_id) => format!(
                "{}/api/v1/db/data/noco/{}/{}/{}",
                self.base_url, project_id, table_id, record_id
            ),
            None => format!(
                "{}/api/v1/db/data/noco/{}/{}",
                self.base_url, project_id, table_id
            ),
        }
    }

    /// Issue one request and parse the JSON reply.
    async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        query: &[(String, String)],
    ) -> Result<Value, NocoError> {
        let token = self.token.as_deref().ok_or(NocoError::MissingToken)?;

        debug!(%method, url, "NocoDB request");
        let mut request = self.http.request(method, url).header("xc-token", token);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NocoError::status(status.as_u16(), body));
        }

        Ok(response.json().await?)
    }
}

/// Fixed schema for the Discord heart-reactions table.
fn reactions_table_schema() -> Value {
    json!({
        "table_name": "discord_heart_reactions",
        "title": "Discord Heart Reactions",
        "columns": [
            {"column_name": "message_content", "title": "Message Content", "uidt": "Text", "required": true},
            {"column_name": "sref_code", "title": "SREF Code", "uidt": "SingleLineText"},
            {"column_name": "image_url", "title": "Image URL", "uidt": "URL"},
            {"column_name": "cinematic", "title": "Cinematic", "uidt": "Checkbox", "default": false},
            {"column_name": "anime", "title": "Anime", "uidt": "Checkbox", "default": false},
            {"column_name": "colors", "title": "Colors", "uidt": "Text"},
            {"column_name": "shot_type", "title": "Shot Type", "uidt": "SingleLineText"},
            {"column_name": "mood", "title": "Mood", "uidt": "SingleLineText"},
            {"column_name": "style", "title": "Style", "uidt": "SingleLineText"},
            {"column_name": "subject", "title": "Subject", "uidt": "Text"},
            {"column_name": "discord_message_id", "title": "Discord Message ID", "uidt": "SingleLineText", "required": true, "unique": true},
            {"column_name": "discord_channel_id", "title": "Discord Channel ID", "uidt": "SingleLineText", "required": true},
            {"column_name": "timestamp", "title": "Timestamp", "uidt": "DateTime", "required": true}
        ]
    })
}

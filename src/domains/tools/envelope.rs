//! The response envelope shared by every tool result.
//!
//! Every handler return value and every gateway-level failure is normalized
//! into this shape before serialization - callers never see a raw transport
//! error distinct from an application error.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Normalized `{success, ...}` response shape.
///
/// Success payload fields are flattened next to `success`; failures carry a
/// single `error` message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Whether the operation succeeded.
    pub success: bool,

    /// Payload fields of a successful result.
    #[serde(flatten)]
    pub data: Map<String, Value>,

    /// Error message if the operation failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolOutput {
    /// Create a successful envelope from a payload object.
    ///
    /// Non-object payloads are nested under a `data` key.
    pub fn success(payload: Value) -> Self {
        let data = match payload {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        Self {
            success: true,
            data,
            error: None,
        }
    }

    /// Create a failure envelope carrying an error message.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Map::new(),
            error: Some(error.into()),
        }
    }
}

/// Current time as an RFC 3339 string, embedded in tool payloads.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_flattens_payload() {
        let output = ToolOutput::success(json!({"projects": [], "timestamp": "t"}));
        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["success"], json!(true));
        assert_eq!(value["projects"], json!([]));
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_failure_carries_error_only() {
        let output = ToolOutput::failure("boom");
        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["success"], json!(false));
        assert_eq!(value["error"], json!("boom"));
    }

    #[test]
    fn test_non_object_payload_nested() {
        let output = ToolOutput::success(json!(42));
        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["data"], json!(42));
    }
}

//! The uniform envelope every tool call returns.

use crate::error::{ToolError, ToolErrorKind, ToolResult};
use serde::Serialize;
use serde_json::{Map, Value};

/// Outcome of a tool call as sent to the dispatcher.
///
/// Success serializes as `{"status": "success", ...payload}`; failure as
/// `{"status": "error", "error_message": ..., "error_kind": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolResponse {
    Success(Map<String, Value>),
    Error {
        error_message: String,
        error_kind: ToolErrorKind,
    },
}

impl ToolResponse {
    /// Wrap a typed tool result.
    ///
    /// Payloads that do not serialize to a JSON object are placed under a
    /// `result` key.
    pub fn from_result<T: Serialize>(result: ToolResult<T>) -> Self {
        match result {
            Ok(payload) => match serde_json::to_value(payload) {
                Ok(Value::Object(map)) => ToolResponse::Success(map),
                Ok(other) => {
                    let mut map = Map::new();
                    map.insert("result".to_string(), other);
                    ToolResponse::Success(map)
                }
                Err(e) => ToolResponse::error(ToolError::internal(format!(
                    "Failed to serialize tool result: {}",
                    e
                ))),
            },
            Err(e) => ToolResponse::error(e),
        }
    }

    pub fn error(err: ToolError) -> Self {
        ToolResponse::Error {
            error_message: err.message,
            error_kind: err.kind,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ToolResponse::Error { .. })
    }

    /// The envelope as a JSON value.
    pub fn to_value(&self) -> Value {
        match self {
            ToolResponse::Success(payload) => {
                let mut map = Map::with_capacity(payload.len() + 1);
                map.insert("status".to_string(), Value::from("success"));
                for (k, v) in payload {
                    map.insert(k.clone(), v.clone());
                }
                Value::Object(map)
            }
            ToolResponse::Error {
                error_message,
                error_kind,
            } => serde_json::json!({
                "status": "error",
                "error_message": error_message,
                "error_kind": error_kind.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Payload {
        message: String,
        count: u32,
    }

    #[test]
    fn test_success_envelope_flattens_payload() {
        let response = ToolResponse::from_result(Ok(Payload {
            message: "ok".to_string(),
            count: 2,
        }));
        assert!(!response.is_error());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json, json!({"status": "success", "message": "ok", "count": 2}));
        assert_eq!(response.to_value(), json);

        let text = serde_json::to_string(&response).unwrap();
        assert!(text.starts_with(r#"{"status":"success""#));
    }

    #[test]
    fn test_error_envelope() {
        let err = ToolError::not_found("No value stored for key 'x'");
        let response = ToolResponse::from_result::<Payload>(Err(err));
        assert!(response.is_error());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            json!({
                "status": "error",
                "error_message": "No value stored for key 'x'",
                "error_kind": "not_found"
            })
        );
        assert_eq!(response.to_value(), json);
    }

    #[test]
    fn test_scalar_payload_goes_under_result() {
        let response = ToolResponse::from_result(Ok(vec![1, 2]));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"status": "success", "result": [1, 2]})
        );
    }
}

use serde::{Deserialize, Serialize};

/// Envelope returned by every JSON endpoint:
/// `{status, message, data}` with `status` one of
/// `"success" | "fail" | "error" | "created"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

impl ApiResponse {
    pub fn success(message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            status: "success".into(),
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn created(message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            status: "created".into(),
            message: message.into(),
            data: Some(data),
        }
    }

    /// Success without a payload.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "success".into(),
            message: message.into(),
            data: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            status: "fail".into(),
            message: message.into(),
            data: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".into(),
            message: message.into(),
            data: None,
        }
    }
}

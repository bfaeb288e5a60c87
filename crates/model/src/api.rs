//! The envelope every backend response is wrapped in.

use serde::{Deserialize, Serialize};

/// `{success, data?, error?, details?, timestamp}`.
///
/// `timestamp` is the backend's clock in unix milliseconds.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Structured error information, for example one entry per field that
    /// failed validation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub timestamp: u64,
}

impl<T> Envelope<T> {
    pub fn ok(data: T, timestamp: u64) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            details: None,
            timestamp,
        }
    }

    pub fn err(error: impl Into<String>, details: Option<Vec<serde_json::Value>>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            details,
            timestamp: 0,
        }
    }
}

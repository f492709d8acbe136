//! Response envelope returned by the Kowalski query API.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Status string the service uses for a successful query.
pub const STATUS_SUCCESS: &str = "success";

/// Responses keyed by the name of the instance that served them.
pub type ServiceResponse<T> = HashMap<String, T>;

/// One query's outcome: `{"status": ..., "message": ..., "data": ...}`.
///
/// The shape of `data` depends on the query type: a flat list of records
/// for aggregate queries, `{catalog: {center_key: [records]}}` for cone
/// searches, and arbitrary JSON for info queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl QueryResponse {
    pub fn success(data: Value) -> Self {
        QueryResponse {
            status: STATUS_SUCCESS.to_string(),
            message: None,
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        QueryResponse {
            status: "error".to_string(),
            message: Some(message.into()),
            data: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    /// The service message, or a placeholder when it sent none.
    pub fn message_or_default(&self) -> &str {
        self.message.as_deref().unwrap_or("(no message)")
    }
}

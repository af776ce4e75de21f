//! Request and response bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /api/ask` and `POST /api/ask-direct`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskRequest {
    pub query: String,
}

/// The envelope every endpoint responds with.
///
/// Empty optional fields are left out of the JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

impl ApiResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
            query: None,
            answer: None,
            data: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { success: false, message: Some(message.into()), ..Self::ok() }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_answer(mut self, answer: impl Into<String>) -> Self {
        self.answer = Some(answer.into());
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_fields_are_omitted() {
        let json = serde_json::to_value(ApiResponse::ok().with_message("pong")).unwrap();
        let object = json.as_object().unwrap();

        assert_eq!(object["success"], true);
        assert_eq!(object["message"], "pong");
        assert!(object.contains_key("timestamp"));
        assert!(!object.contains_key("query"));
        assert!(!object.contains_key("data"));
    }

    #[test]
    fn error_envelope_is_unsuccessful() {
        let response = ApiResponse::error("boom");
        assert!(!response.success);
        assert_eq!(response.message.as_deref(), Some("boom"));
    }
}

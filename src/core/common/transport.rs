use std::fmt::Display;

use serde::{Deserialize, Serialize};

pub const GENERIC_FAILURE_MESSAGE: &str = "request failed";

/// Standard response envelope of the assessment API. Endpoints are not
/// consistent about which fields they fill in, so everything is optional
/// and a logical failure can be signalled in-band through `statusCode`
/// even on an HTTP 2xx.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T: Clone> {
    #[serde(rename = "statusCode", default)]
    pub status_code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
}

impl<T: Clone> ApiResponse<T> {
    pub fn is_failure(&self) -> bool {
        matches!(self.status_code, Some(code) if !(200..300).contains(&code))
    }

    pub fn failure_message(&self) -> String {
        self.message
            .to_owned()
            .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string())
    }
}

/// Best effort extraction of the server-supplied message from an error
/// body, falling back to the HTTP status line.
pub fn server_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ApiResponse<serde_json::Value>>(body) {
        if let Some(message) = envelope.message {
            return message;
        }
    }

    format!("{} with status {}", GENERIC_FAILURE_MESSAGE, status)
}

#[derive(Debug)]
pub struct ApiResponseError {
    pub reason: String,
}

impl ApiResponseError {
    pub fn new(reason: String) -> Self {
        Self { reason }
    }
}

impl Display for ApiResponseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason)
    }
}

impl std::error::Error for ApiResponseError {}

#[cfg(test)]
mod tests {
    use super::{server_message, ApiResponse};

    #[test]
    fn in_band_failure_is_detected() {
        let envelope: ApiResponse<serde_json::Value> =
            serde_json::from_str(r#"{"statusCode": 500, "message": "card declined"}"#).unwrap();

        assert!(envelope.is_failure());
        assert_eq!("card declined", envelope.failure_message());
    }

    #[test]
    fn two_hundred_status_code_is_not_a_failure() {
        let envelope: ApiResponse<serde_json::Value> =
            serde_json::from_str(r#"{"statusCode": 200, "data": {}}"#).unwrap();

        assert!(!envelope.is_failure());
    }

    #[test]
    fn server_message_falls_back_to_status_line() {
        let message = server_message(reqwest::StatusCode::BAD_GATEWAY, "<html>nope</html>");

        assert!(message.contains("502"));
    }
}

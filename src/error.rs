use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid preferences: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("All {failed} configured providers failed")]
    AllProvidersFailed { failed: usize },
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::AllProvidersFailed { .. } => (StatusCode::BAD_GATEWAY, self.to_string()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Failure of a single provider call
#[derive(thiserror::Error, Debug)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("provider reported {0}")]
    Upstream(String),

    #[error("malformed provider response: {0}")]
    Decode(String),

    #[error("provider task failed: {0}")]
    Task(String),
}

impl ProviderError {
    /// Whether a second attempt has a reasonable chance of succeeding.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Request(e) => !e.is_decode() && !e.is_builder(),
            ProviderError::Status { status, .. } => is_transient_status(*status),
            ProviderError::Upstream(_) | ProviderError::Decode(_) | ProviderError::Task(_) => {
                false
            }
        }
    }
}

/// Failure of a single ranking backend call
#[derive(thiserror::Error, Debug)]
pub enum RankError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response envelope: {0}")]
    Envelope(String),

    #[error("response is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("response does not match the suggestion schema: {0}")]
    Schema(String),
}

impl RankError {
    pub fn is_transient(&self) -> bool {
        match self {
            RankError::Request(e) => !e.is_decode() && !e.is_builder(),
            RankError::Status { status, .. } => is_transient_status(*status),
            _ => false,
        }
    }
}

fn is_transient_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transience() {
        let server_error = ProviderError::Status {
            status: 503,
            body: String::new(),
        };
        let rate_limited = ProviderError::Status {
            status: 429,
            body: String::new(),
        };
        let not_found = ProviderError::Status {
            status: 404,
            body: "gone".to_string(),
        };

        assert!(server_error.is_transient());
        assert!(rate_limited.is_transient());
        assert!(!not_found.is_transient());
    }

    #[test]
    fn test_decode_errors_are_not_retried() {
        assert!(!ProviderError::Decode("bad json".to_string()).is_transient());
        assert!(!ProviderError::Upstream("REQUEST_DENIED".to_string()).is_transient());
        assert!(!RankError::Schema("missing suggestions".to_string()).is_transient());
    }

    #[test]
    fn test_all_providers_failed_is_bad_gateway() {
        let response = AppError::AllProvidersFailed { failed: 3 }.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_validation_is_bad_request() {
        let response = AppError::Validation(validator::ValidationErrors::new()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_invalid_input_is_bad_request() {
        let response = AppError::InvalidInput("location".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

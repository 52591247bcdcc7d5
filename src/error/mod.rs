// Error types for convertifier

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API key not configured")]
    ApiKeyMissing,

    #[error("Gemini API error: {0}")]
    GeminiApi(String),

    #[error("Rate limit exceeded: {0}")]
    TooManyRequests(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Empty response from model: {0}")]
    EmptyResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Input rejected by the language validator. Carries the user-facing message.
    #[error("{0}")]
    Validation(String),

    #[error("Conversion error: {0}")]
    Conversion(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Config parsing error: {0}")]
    ConfigParsing(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    /// Stable machine-readable error type used in JSON bodies and metrics labels.
    pub fn error_type(&self) -> &'static str {
        match self {
            ConvertError::InvalidRequest(_) => "invalid_request_error",
            ConvertError::Validation(_) => "validation_error",
            ConvertError::Config(_) | ConvertError::ConfigParsing(_) | ConvertError::ApiKeyMissing => {
                "configuration_error"
            }
            ConvertError::TooManyRequests(_) => "rate_limit_error",
            ConvertError::ServiceUnavailable(_) => "overloaded_error",
            ConvertError::GeminiApi(_) | ConvertError::EmptyResponse(_) | ConvertError::Http(_) => {
                "api_error"
            }
            ConvertError::Conversion(_) => "conversion_error",
            _ => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ConvertError::InvalidRequest(_) | ConvertError::Json(_) => StatusCode::BAD_REQUEST,
            ConvertError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ConvertError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ConvertError::ServiceUnavailable(_) | ConvertError::ApiKeyMissing => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ConvertError::GeminiApi(_) | ConvertError::EmptyResponse(_) | ConvertError::Http(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Convert ConvertError to HTTP responses for Axum
impl IntoResponse for ConvertError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({
            "type": "error",
            "error": {
                "type": self.error_type(),
                "message": self.to_string(),
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;

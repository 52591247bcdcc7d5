// Error handling tests

use axum::http::StatusCode;
use axum::response::IntoResponse;
use convertifier::error::ConvertError;
use http_body_util::BodyExt;

#[test]
fn test_error_display_messages() {
    let errors = vec![
        ConvertError::Config("bad".to_string()),
        ConvertError::ApiKeyMissing,
        ConvertError::GeminiApi("API error".to_string()),
        ConvertError::TooManyRequests("Rate limited".to_string()),
        ConvertError::ServiceUnavailable("Service down".to_string()),
        ConvertError::EmptyResponse("no candidates returned".to_string()),
        ConvertError::InvalidRequest("Bad request".to_string()),
        ConvertError::Validation("Invalid C++ code: Missing required element ';'".to_string()),
        ConvertError::Conversion("Conversion failed".to_string()),
        ConvertError::Internal("oops".to_string()),
    ];

    for error in errors {
        let display = format!("{}", error);
        assert!(!display.is_empty(), "Error should have display message");
    }
}

#[test]
fn test_api_key_missing_message() {
    assert_eq!(ConvertError::ApiKeyMissing.to_string(), "API key not configured");
}

#[test]
fn test_validation_error_is_message_only() {
    let error = ConvertError::Validation("Invalid Python code: invalid syntax (line 1)".to_string());
    assert_eq!(error.to_string(), "Invalid Python code: invalid syntax (line 1)");
    assert_eq!(error.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[test]
fn test_status_mapping() {
    let cases = [
        (ConvertError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST),
        (ConvertError::TooManyRequests("x".into()), StatusCode::TOO_MANY_REQUESTS),
        (ConvertError::ServiceUnavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
        (ConvertError::ApiKeyMissing, StatusCode::SERVICE_UNAVAILABLE),
        (ConvertError::GeminiApi("x".into()), StatusCode::BAD_GATEWAY),
        (ConvertError::EmptyResponse("x".into()), StatusCode::BAD_GATEWAY),
        (ConvertError::Conversion("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (error, status) in cases {
        assert_eq!(error.status_code(), status, "{}", error);
    }
}

#[test]
fn test_rate_limit_error() {
    let error = ConvertError::TooManyRequests("Quota exceeded".to_string());
    assert!(format!("{}", error).contains("Quota exceeded"));
    assert_eq!(error.error_type(), "rate_limit_error");
}

#[test]
fn test_io_error_conversion() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    let error: ConvertError = io.into();
    assert!(matches!(error, ConvertError::Io(_)));
    assert_eq!(error.error_type(), "internal_error");
}

#[tokio::test]
async fn test_error_response_body() {
    let response = ConvertError::InvalidRequest("Please enter some code to convert".to_string())
        .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["type"], "error");
    assert_eq!(body["error"]["type"], "invalid_request_error");
    assert_eq!(
        body["error"]["message"],
        "Invalid request: Please enter some code to convert"
    );
}

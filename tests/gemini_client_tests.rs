// Gemini client tests against a mock generateContent endpoint

use convertifier::config::GeminiConfig;
use convertifier::error::ConvertError;
use convertifier::gemini::{GeminiClient, TranslationBackend};
use mockito::Matcher;
use serde_json::json;

const API_KEY: &str = "AIzaTestKey0123456789";
const PATH: &str = "/models/gemini-test:generateContent";

fn client_for(server: &mockito::Server) -> GeminiClient {
    let config = GeminiConfig {
        api_key: Some(API_KEY.to_string()),
        api_base_url: server.url(),
        model: "gemini-test".to_string(),
        max_retries: 0,
        ..GeminiConfig::default()
    };
    GeminiClient::new(&config).unwrap()
}

#[tokio::test]
async fn test_generate_text_success() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .match_header("x-goog-api-key", API_KEY)
        .match_body(Matcher::PartialJson(json!({
            "contents": [{"role": "user", "parts": [{"text": "convert me"}]}],
            "generationConfig": {"candidateCount": 1}
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "```cpp\n"}, {"text": "int x = 1;\n```"}]},
                    "finishReason": "STOP"
                }],
                "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 5, "totalTokenCount": 17}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = client_for(&server);
    let text = client.translate("convert me").await.unwrap();
    assert_eq!(text, "```cpp\nint x = 1;\n```");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_blocked_prompt_is_empty_response() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", PATH)
        .with_status(200)
        .with_body(json!({"promptFeedback": {"blockReason": "SAFETY"}}).to_string())
        .create_async()
        .await;

    let err = client_for(&server).generate_text("x").await.unwrap_err();
    match err {
        ConvertError::EmptyResponse(reason) => assert_eq!(reason, "prompt blocked (SAFETY)"),
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_quota_error_maps_to_rate_limit() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", PATH)
        .with_status(429)
        .with_body(
            json!({"error": {"code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED"}})
                .to_string(),
        )
        .create_async()
        .await;

    let err = client_for(&server).generate_text("x").await.unwrap_err();
    assert!(matches!(err, ConvertError::TooManyRequests(_)));
    assert!(err.to_string().contains("Resource has been exhausted"));
}

#[tokio::test]
async fn test_bad_key_maps_to_api_error() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .with_status(400)
        .with_body(
            json!({"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}})
                .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let err = client_for(&server).generate_text("x").await.unwrap_err();
    assert_eq!(err.to_string(), "Gemini API error: HTTP 400: API key not valid");
    // client errors are not retried
    mock.assert_async().await;
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .with_status(503)
        .with_body(
            json!({"error": {
                "code": 503,
                "message": "The model is overloaded",
                "details": [{"@type": "type.googleapis.com/google.rpc.RetryInfo", "retryDelay": "0.01s"}]
            }})
            .to_string(),
        )
        .expect(2)
        .create_async()
        .await;

    let config = GeminiConfig {
        api_key: Some(API_KEY.to_string()),
        api_base_url: server.url(),
        model: "gemini-test".to_string(),
        max_retries: 1,
        ..GeminiConfig::default()
    };
    let client = GeminiClient::new(&config).unwrap();

    let err = client.generate_text("x").await.unwrap_err();
    assert!(matches!(err, ConvertError::ServiceUnavailable(_)));
    mock.assert_async().await;
}

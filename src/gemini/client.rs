// Gemini generateContent client

use super::TranslationBackend;
use crate::config::GeminiConfig;
use crate::error::{ConvertError, Result};
use crate::metrics;
use crate::models::gemini::{GenerateContentRequest, GenerateContentResponse, GenerationConfig};
use crate::utils::logging::redact;
use crate::utils::retry::{with_retry, UpstreamFailure};
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};
use zeroize::Zeroizing;

/// Client for the public Gemini API.
///
/// Authenticates with an API key sent in the `x-goog-api-key` header. The key
/// lives in a zeroizing buffer and is wiped when the client is dropped.
pub struct GeminiClient {
    http_client: Client,
    config: GeminiConfig,
    api_key: Zeroizing<String>,
}

impl GeminiClient {
    /// Create a client with a pooled HTTP connection.
    ///
    /// Fails with [`ConvertError::ApiKeyMissing`] when no key is configured.
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ConvertError::ApiKeyMissing)?;

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .use_rustls_tls()
            .build()
            .map_err(|e| ConvertError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        debug!("Created HTTP client with connection pooling and keep-alive");
        info!("Gemini AI configured with model {}", config.model);

        Ok(Self {
            http_client,
            config: config.clone(),
            api_key: Zeroizing::new(api_key.to_string()),
        })
    }

    /// The `generateContent` URL for the configured model.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Call `generateContent`, retrying on 429/5xx.
    pub async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = self.endpoint();
        let model = self.config.model.as_str();
        debug!("Calling generateContent API for model: {}", model);

        let client = &self.http_client;
        let api_key: &str = &self.api_key;
        let url_ref = url.as_str();
        let start = Instant::now();

        let result = with_retry("Gemini generateContent", self.config.max_retries, move || async move {
            let response = client
                .post(url_ref)
                .header("x-goog-api-key", api_key)
                .header("Content-Type", "application/json")
                .json(request)
                .send()
                .await
                .map_err(UpstreamFailure::transport)?;

            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            if !status.is_success() {
                return Err(UpstreamFailure::new(status.as_u16(), body));
            }
            Ok(body)
        })
        .await;

        let elapsed = start.elapsed().as_secs_f64();
        let body = match result {
            Ok(body) => {
                metrics::record_gemini_call(model, 200, elapsed);
                body
            }
            Err(UpstreamFailure { status, body }) => {
                metrics::record_gemini_call(model, status, elapsed);
                error!("Gemini API error: HTTP {} - Response body: {}", status, redact(&body));
                let message = extract_error_message(&body).unwrap_or(body);
                return Err(match status {
                    429 => ConvertError::TooManyRequests(format!(
                        "Gemini API quota exceeded: {}",
                        message
                    )),
                    503 | 504 => ConvertError::ServiceUnavailable(format!(
                        "Upstream unavailable: {}",
                        message
                    )),
                    _ => ConvertError::GeminiApi(format!("HTTP {}: {}", status, message)),
                });
            }
        };

        debug!(
            "Raw Gemini response (first 500 chars): {}",
            body.chars().take(500).collect::<String>()
        );

        serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse Gemini response: {}", e);
            ConvertError::GeminiApi(format!("Response parsing error: {}", e))
        })
    }

    /// Send a single prompt and return the answer text.
    pub async fn generate_text(&self, prompt: &str) -> Result<String> {
        let request = GenerateContentRequest::from_prompt(
            prompt,
            Some(GenerationConfig {
                max_output_tokens: Some(self.config.max_output_tokens),
                temperature: Some(self.config.temperature),
                candidate_count: Some(1),
            }),
        );

        let response = self.generate_content(&request).await?;

        if let Some(usage) = &response.usage_metadata {
            metrics::record_tokens(
                &self.config.model,
                usage.prompt_token_count.unwrap_or(0),
                usage.candidates_token_count.unwrap_or(0),
            );
        }

        response
            .text()
            .ok_or_else(|| ConvertError::EmptyResponse(response.empty_reason()))
    }
}

#[async_trait]
impl TranslationBackend for GeminiClient {
    async fn translate(&self, prompt: &str) -> Result<String> {
        self.generate_text(prompt).await
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

/// Extract error message from API response JSON
fn extract_error_message(response_text: &str) -> Option<String> {
    #[derive(serde::Deserialize)]
    struct ErrorResponse {
        error: Option<ErrorDetail>,
    }

    #[derive(serde::Deserialize)]
    struct ErrorDetail {
        message: Option<String>,
        status: Option<String>,
    }

    let parsed: ErrorResponse = serde_json::from_str(response_text).ok()?;
    let error = parsed.error?;
    error.message.or(error.status)
}

// Conversion service: validation, AI conversion with cache, basic fallback

use crate::cache::ConversionCache;
use crate::config::AppConfig;
use crate::error::{ConvertError, Result};
use crate::gemini::{GeminiClient, TranslationBackend};
use crate::highlight::highlight_code;
use crate::metrics;
use crate::models::{ConversionMethod, ConversionOutcome, ConvertRequest, Direction};
use crate::translation::{
    basic_convert, build_prompt, clean_response, ensure_not_empty, format_code, validate,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

pub const AI_SUCCESS_MESSAGE: &str = "AI-enhanced conversion completed successfully!";
pub const BASIC_SUCCESS_MESSAGE: &str = "Basic conversion completed successfully!";

/// Runs conversions for the web UI, the JSON API and the CLI.
pub struct Converter {
    backend: Option<Arc<dyn TranslationBackend>>,
    cache: ConversionCache,
}

impl Converter {
    /// `backend` is `None` when no API key is configured; AI requests then
    /// fall back to the basic converter.
    pub fn new(backend: Option<Arc<dyn TranslationBackend>>, cache: ConversionCache) -> Self {
        Self { backend, cache }
    }

    /// Build the service from configuration.
    ///
    /// A missing or unusable API key leaves AI conversion disabled rather
    /// than failing startup.
    pub fn from_config(config: &AppConfig) -> Self {
        let backend: Option<Arc<dyn TranslationBackend>> = if config.gemini.has_api_key() {
            match GeminiClient::new(&config.gemini) {
                Ok(client) => Some(Arc::new(client)),
                Err(e) => {
                    error!("Failed to initialize AI features. Please check your API key: {}", e);
                    None
                }
            }
        } else {
            warn!("Google API key not found, AI conversion disabled");
            None
        };

        Self::new(backend, ConversionCache::new(config.cache.max_entries))
    }

    pub fn ai_available(&self) -> bool {
        self.backend.is_some()
    }

    /// Model of the configured backend, if any.
    pub fn model(&self) -> Option<&str> {
        self.backend.as_deref().map(|b| b.model())
    }

    pub fn cache(&self) -> &ConversionCache {
        &self.cache
    }

    pub async fn convert(&self, request: ConvertRequest) -> Result<ConversionOutcome> {
        let direction = Direction::from_source(request.source_language);
        let start = Instant::now();

        let result = self.run(&request, direction).await;

        match &result {
            Ok(outcome) => {
                metrics::record_conversion(direction.label(), outcome.method.as_str());
                info!(
                    "Converted {} ({} method, {} chars) in {:?}",
                    direction,
                    outcome.method.as_str(),
                    outcome.code.len(),
                    start.elapsed()
                );
            }
            Err(e) => {
                metrics::record_conversion_failure(direction.label(), e.error_type());
                error!("Conversion {} failed: {}", direction, e);
            }
        }

        result
    }

    async fn run(&self, request: &ConvertRequest, direction: Direction) -> Result<ConversionOutcome> {
        ensure_not_empty(&request.code)?;

        let verdict = validate(&request.code, direction.source);
        if !verdict.valid {
            metrics::record_validation_failure(direction.source.code_tag());
            return Err(ConvertError::Validation(verdict.message));
        }

        let mut warning = None;
        if request.use_ai {
            match self.convert_with_ai(&request.code, direction).await {
                Ok(code) => return Ok(outcome(direction, code, ConversionMethod::Ai, None)),
                Err(e) => {
                    let message = format!(
                        "AI conversion failed: {}. Falling back to basic conversion.",
                        e
                    );
                    warn!("{}", message);
                    metrics::record_ai_fallback(direction.label());
                    warning = Some(message);
                }
            }
        }

        let converted = basic_convert(&request.code, direction)?;
        let code = format_code(&converted, direction.target);
        Ok(outcome(direction, code, ConversionMethod::Basic, warning))
    }

    /// Ask the backend for a conversion, consulting the answer cache first.
    async fn convert_with_ai(&self, code: &str, direction: Direction) -> Result<String> {
        let backend = self.backend.as_ref().ok_or(ConvertError::ApiKeyMissing)?;

        let key = ConversionCache::key(backend.model(), direction, code);
        if let Some(cached) = self.cache.get(&key) {
            debug!("Using cached AI conversion for {}", direction);
            return Ok(cached);
        }

        let prompt = build_prompt(code, direction);
        let answer = backend.translate(&prompt).await?;
        let cleaned = clean_response(&answer);
        if cleaned.is_empty() {
            return Err(ConvertError::EmptyResponse(
                "model returned no code".to_string(),
            ));
        }

        let formatted = format_code(&cleaned, direction.target);
        self.cache.insert(key, formatted.clone());
        Ok(formatted)
    }
}

fn outcome(
    direction: Direction,
    code: String,
    method: ConversionMethod,
    warning: Option<String>,
) -> ConversionOutcome {
    let message = match method {
        ConversionMethod::Ai => AI_SUCCESS_MESSAGE,
        ConversionMethod::Basic => BASIC_SUCCESS_MESSAGE,
    };
    ConversionOutcome {
        source_language: direction.source,
        target_language: direction.target,
        highlighted_html: highlight_code(&code, direction.target),
        code,
        method,
        message: message.to_string(),
        warning,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Language;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers every prompt with a fixed text, or fails when there is none.
    struct CannedBackend {
        answer: Option<String>,
        calls: AtomicUsize,
    }

    impl CannedBackend {
        fn answering(text: &str) -> Arc<Self> {
            Arc::new(Self {
                answer: Some(text.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                answer: None,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl TranslationBackend for CannedBackend {
        async fn translate(&self, _prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer
                .clone()
                .ok_or_else(|| ConvertError::GeminiApi("HTTP 500: boom".to_string()))
        }

        fn model(&self) -> &str {
            "canned"
        }
    }

    fn request(language: Language, code: &str, use_ai: bool) -> ConvertRequest {
        ConvertRequest {
            source_language: language,
            code: code.to_string(),
            use_ai,
        }
    }

    #[tokio::test]
    async fn test_empty_input_rejected() {
        let converter = Converter::new(None, ConversionCache::disabled());
        let err = converter
            .convert(request(Language::Python, "   ", false))
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_invalid_cpp_reports_validator_message() {
        let converter = Converter::new(None, ConversionCache::disabled());
        let err = converter
            .convert(request(Language::Cpp, "int x = 1", false))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid C++ code: Missing required element ';'");
    }

    #[tokio::test]
    async fn test_basic_conversion() {
        let converter = Converter::new(None, ConversionCache::disabled());
        let outcome = converter
            .convert(request(Language::Python, "x = 1\nprint(x)", false))
            .await
            .unwrap();
        assert_eq!(outcome.method, ConversionMethod::Basic);
        assert_eq!(outcome.target_language, Language::Cpp);
        assert!(outcome.code.contains("auto x = 1;"));
        assert!(outcome.code.contains("int main() {"));
        assert!(outcome.highlighted_html.starts_with("<div class=\"highlight\">"));
        assert!(outcome.warning.is_none());
    }

    #[tokio::test]
    async fn test_ai_without_backend_falls_back() {
        let converter = Converter::new(None, ConversionCache::disabled());
        let outcome = converter
            .convert(request(Language::Python, "x = 1", true))
            .await
            .unwrap();
        assert_eq!(outcome.method, ConversionMethod::Basic);
        assert_eq!(
            outcome.warning.as_deref(),
            Some("AI conversion failed: API key not configured. Falling back to basic conversion.")
        );
    }

    #[tokio::test]
    async fn test_ai_answer_is_cleaned_and_cached() {
        let backend = CannedBackend::answering("```python\nx = 1\n```");
        let converter = Converter::new(Some(backend.clone() as Arc<dyn TranslationBackend>), ConversionCache::new(8));

        for _ in 0..2 {
            let outcome = converter
                .convert(request(Language::Cpp, "int x = 1; { }", true))
                .await
                .unwrap();
            assert_eq!(outcome.method, ConversionMethod::Ai);
            assert_eq!(outcome.code, "x = 1");
            assert_eq!(outcome.message, AI_SUCCESS_MESSAGE);
        }

        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        assert_eq!(converter.cache().stats().hits, 1);
    }

    #[tokio::test]
    async fn test_ai_failure_falls_back_with_warning() {
        let backend = CannedBackend::failing();
        let converter = Converter::new(Some(backend as Arc<dyn TranslationBackend>), ConversionCache::disabled());
        let outcome = converter
            .convert(request(Language::Python, "x = 1", true))
            .await
            .unwrap();
        assert_eq!(outcome.method, ConversionMethod::Basic);
        let warning = outcome.warning.unwrap();
        assert!(warning.starts_with("AI conversion failed: Gemini API error:"));
        assert!(warning.ends_with("Falling back to basic conversion."));
    }

    #[tokio::test]
    async fn test_blank_ai_answer_falls_back() {
        let backend = CannedBackend::answering("```\n```");
        let converter = Converter::new(Some(backend as Arc<dyn TranslationBackend>), ConversionCache::disabled());
        let outcome = converter
            .convert(request(Language::Python, "x = 1", true))
            .await
            .unwrap();
        assert_eq!(outcome.method, ConversionMethod::Basic);
        assert!(outcome.warning.is_some());
    }
}

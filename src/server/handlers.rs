// HTTP request handlers

use super::page::{self, PageView};
use super::routes::AppState;
use crate::cache::CacheStats;
use crate::error::{ConvertError, Result};
use crate::highlight::highlight_code;
use crate::metrics;
use crate::models::api::HighlightResponse;
use crate::models::{ConversionOutcome, ConvertRequest, Language, SnippetRequest, Validation};
use crate::translation::{ensure_not_empty, validate};
use axum::{
    extract::{rejection::FormRejection, Form, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub checks: HashMap<String, HealthCheck>,
    pub ai_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub cache: CacheStats,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    /// Serving, but only basic conversion is available.
    Degraded,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheck {
    pub status: String,
    pub message: String,
}

/// Fields posted by the HTML form.
#[derive(Debug, Deserialize)]
pub struct ConvertForm {
    pub source_language: Language,
    #[serde(default)]
    pub code: String,
    /// Checkbox value; present only when ticked.
    #[serde(default)]
    pub use_ai: Option<String>,
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut checks = HashMap::new();
    let mut overall_status = HealthStatus::Healthy;
    let converter = &state.converter;

    let gemini_check = match converter.model() {
        Some(model) => HealthCheck {
            status: "ok".to_string(),
            message: format!("AI conversion enabled with model {}", model),
        },
        None => {
            overall_status = HealthStatus::Degraded;
            HealthCheck {
                status: "warning".to_string(),
                message: "API key not configured, basic conversion only".to_string(),
            }
        }
    };
    checks.insert("gemini".to_string(), gemini_check);

    let config_check = HealthCheck {
        status: "ok".to_string(),
        message: format!("API base: {}", state.config.gemini.api_base_url),
    };
    checks.insert("configuration".to_string(), config_check);

    Json(HealthResponse {
        status: overall_status,
        checks,
        ai_configured: converter.ai_available(),
        model: converter.model().map(str::to_string),
        cache: converter.cache().stats(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

pub async fn metrics_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::gather_metrics(),
    )
}

/// `GET /`: the empty converter form.
pub async fn index_handler(State(state): State<AppState>) -> Html<String> {
    Html(page::render(&PageView::blank(state.converter.ai_available())))
}

/// `POST /convert`: run the form conversion and re-render the page.
pub async fn convert_form_handler(
    State(state): State<AppState>,
    form: std::result::Result<Form<ConvertForm>, FormRejection>,
) -> Html<String> {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            warn!("Rejected convert form: {}", rejection.body_text());
            let view = PageView {
                error: Some(rejection.body_text()),
                ..PageView::blank(state.converter.ai_available())
            };
            return Html(page::render(&view));
        }
    };

    let use_ai = form.use_ai.is_some();
    let request = ConvertRequest {
        source_language: form.source_language,
        code: form.code.clone(),
        use_ai,
    };

    let mut view = PageView {
        source_language: Some(form.source_language),
        code: form.code,
        use_ai,
        ai_available: state.converter.ai_available(),
        ..PageView::default()
    };

    match state.converter.convert(request).await {
        Ok(outcome) => view.outcome = Some(outcome),
        Err(e) => view.error = Some(form_error_message(&e)),
    }

    Html(page::render(&view))
}

/// `POST /api/convert`
pub async fn api_convert_handler(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<ConversionOutcome>> {
    let request: ConvertRequest = parse_json(&body)?;
    info!(
        "Received convert request: source={}, use_ai={}, {} chars",
        request.source_language,
        request.use_ai,
        request.code.len()
    );
    let outcome = state.converter.convert(request).await?;
    Ok(Json(outcome))
}

/// `POST /api/validate`
pub async fn api_validate_handler(body: String) -> Result<Json<Validation>> {
    let request: SnippetRequest = parse_json(&body)?;
    ensure_not_empty(&request.code)?;

    let verdict = validate(&request.code, request.language);
    if !verdict.valid {
        metrics::record_validation_failure(request.language.code_tag());
    }
    Ok(Json(verdict))
}

/// `POST /api/highlight`
pub async fn api_highlight_handler(body: String) -> Result<Json<HighlightResponse>> {
    let request: SnippetRequest = parse_json(&body)?;
    Ok(Json(HighlightResponse {
        html: highlight_code(&request.code, request.language),
    }))
}

pub async fn not_found_handler() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "type": "error",
            "error": {"type": "not_found_error", "message": "Not found"}
        })),
    )
        .into_response()
}

/// Deserialize a JSON body, reporting failures as invalid requests.
fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T> {
    debug!(
        "Raw request JSON (first 500 chars): {}",
        body.chars().take(500).collect::<String>()
    );
    serde_json::from_str(body).map_err(|e| {
        error!("Failed to deserialize request: {}", e);
        ConvertError::InvalidRequest(format!("JSON deserialization error: {}", e))
    })
}

/// Banner text for a failed form conversion.
fn form_error_message(err: &ConvertError) -> String {
    match err {
        ConvertError::Validation(message) | ConvertError::InvalidRequest(message) => {
            message.clone()
        }
        other => format!("An error occurred during conversion: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_error_message() {
        let empty = ConvertError::InvalidRequest("Please enter some code to convert".to_string());
        assert_eq!(form_error_message(&empty), "Please enter some code to convert");

        let other = ConvertError::Conversion("boom".to_string());
        assert_eq!(
            form_error_message(&other),
            "An error occurred during conversion: Conversion error: boom"
        );
    }

    #[test]
    fn test_parse_json_error_is_invalid_request() {
        let err = parse_json::<SnippetRequest>("{").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_form_language_ignores_case() {
        let form: ConvertForm = decode_form("source_language=PYTHON&code=x+%3D+1");
        assert_eq!(form.source_language, Language::Python);
        assert!(form.use_ai.is_none());
    }

    #[test]
    fn test_form_checkbox() {
        let form: ConvertForm =
            decode_form("source_language=cpp&code=int+x%3B&use_ai=on");
        assert_eq!(form.source_language, Language::Cpp);
        assert_eq!(form.use_ai.as_deref(), Some("on"));
    }

    fn decode_form(query: &str) -> ConvertForm {
        let uri: axum::http::Uri = format!("/?{}", query).parse().unwrap();
        axum::extract::Query::<ConvertForm>::try_from_uri(&uri).unwrap().0
    }
}

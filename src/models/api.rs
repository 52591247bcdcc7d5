// Request/response bodies of the convertifier HTTP API

use super::language::Language;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/convert`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertRequest {
    pub source_language: Language,
    pub code: String,
    /// Try Gemini first; fall back to basic conversion on failure.
    #[serde(default)]
    pub use_ai: bool,
}

/// Which converter produced the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionMethod {
    Ai,
    Basic,
}

impl ConversionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversionMethod::Ai => "ai",
            ConversionMethod::Basic => "basic",
        }
    }
}

/// Result of a successful conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutcome {
    pub source_language: Language,
    pub target_language: Language,
    /// Formatted converted code.
    pub code: String,
    /// Syntax-highlighted HTML rendition of `code`.
    pub highlighted_html: String,
    pub method: ConversionMethod,
    /// Success banner text.
    pub message: String,
    /// Set when AI conversion was requested but the basic converter was used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Body of `POST /api/validate` and `POST /api/highlight`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnippetRequest {
    pub language: Language,
    pub code: String,
}

/// Verdict of a language validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    pub valid: bool,
    pub message: String,
}

impl Validation {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            valid: true,
            message: message.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightResponse {
    pub html: String,
}

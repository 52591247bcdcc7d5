//! Data models shared across the crate.
//!
//! - `api`: request/response bodies of the HTTP API
//! - `gemini`: wire types of the upstream Gemini `generateContent` API
//! - `language`: the supported languages and conversion directions

pub mod api;
pub mod gemini;
pub mod language;

pub use api::{ConversionMethod, ConversionOutcome, ConvertRequest, SnippetRequest, Validation};
pub use gemini::{GenerateContentRequest, GenerateContentResponse, GenerationConfig};
pub use language::{Direction, Language};

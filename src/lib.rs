// convertifier - Python <-> C++ code converter backed by Gemini with a local fallback

pub mod cache;
pub mod cli;
pub mod config;
pub mod converter;
pub mod error;
pub mod gemini;
pub mod highlight;
pub mod metrics;
pub mod models;
pub mod server;
pub mod translation;
pub mod utils;

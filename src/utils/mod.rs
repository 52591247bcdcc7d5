//! Utility functions and helpers for convertifier.
//!
//! # Submodules
//!
//! - `logging`: Tracing initialization and API key redaction.
//! - `retry`: Retry with backoff that respects Google's `retryDelay` hints.

pub mod logging;
pub mod retry;

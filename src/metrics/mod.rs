// Metrics module for Prometheus observability

mod registry;

pub use registry::{
    gather_metrics, AI_FALLBACKS, CACHE_ENTRIES, CACHE_OPERATIONS, CONVERSIONS_TOTAL,
    CONVERSION_FAILURES, GEMINI_API_CALLS, GEMINI_API_DURATION, REQUESTS_TOTAL,
    REQUEST_DURATION, TOKENS_TOTAL, VALIDATION_FAILURES,
};

/// Helper to record HTTP request metrics
pub fn record_request(method: &str, endpoint: &str, status_code: u16, duration_secs: f64) {
    REQUESTS_TOTAL
        .with_label_values(&[method, endpoint, &status_code.to_string()])
        .inc();

    REQUEST_DURATION
        .with_label_values(&[method, endpoint])
        .observe(duration_secs);
}

/// Helper to record a completed conversion
pub fn record_conversion(direction: &str, method: &str) {
    CONVERSIONS_TOTAL.with_label_values(&[direction, method]).inc();
}

pub fn record_conversion_failure(direction: &str, error_type: &str) {
    CONVERSION_FAILURES
        .with_label_values(&[direction, error_type])
        .inc();
}

pub fn record_ai_fallback(direction: &str) {
    AI_FALLBACKS.with_label_values(&[direction]).inc();
}

pub fn record_validation_failure(language: &str) {
    VALIDATION_FAILURES.with_label_values(&[language]).inc();
}

/// Helper to record Gemini API call metrics
pub fn record_gemini_call(model: &str, status_code: u16, duration_secs: f64) {
    GEMINI_API_CALLS
        .with_label_values(&[model, &status_code.to_string()])
        .inc();

    GEMINI_API_DURATION
        .with_label_values(&[model])
        .observe(duration_secs);
}

/// Helper to record token usage
pub fn record_tokens(model: &str, input: u32, output: u32) {
    if input > 0 {
        TOKENS_TOTAL
            .with_label_values(&[model, "input"])
            .inc_by(input as f64);
    }
    if output > 0 {
        TOKENS_TOTAL
            .with_label_values(&[model, "output"])
            .inc_by(output as f64);
    }
}

/// Helpers for the AI answer cache
pub fn record_cache_hit() {
    CACHE_OPERATIONS.with_label_values(&["hit"]).inc();
}

pub fn record_cache_miss() {
    CACHE_OPERATIONS.with_label_values(&["miss"]).inc();
}

pub fn record_cache_insert() {
    CACHE_OPERATIONS.with_label_values(&["insert"]).inc();
}

pub fn record_cache_eviction() {
    CACHE_OPERATIONS.with_label_values(&["eviction"]).inc();
}

pub fn update_cache_entries(count: usize) {
    CACHE_ENTRIES.set(count as f64);
}

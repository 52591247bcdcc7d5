// Prometheus metrics registry and collectors

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec_with_registry, register_gauge_with_registry,
    register_histogram_vec_with_registry, CounterVec, Encoder, Gauge, HistogramVec, Opts,
    Registry, TextEncoder,
};
use tracing::error;

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // ============================================================================
    // HTTP METRICS
    // ============================================================================

    /// Total number of HTTP requests
    pub static ref REQUESTS_TOTAL: CounterVec = register_counter_vec_with_registry!(
        Opts::new("convertifier_requests_total", "Total number of HTTP requests"),
        &["method", "endpoint", "status_code"],
        REGISTRY
    ).unwrap();

    /// Request duration histogram
    pub static ref REQUEST_DURATION: HistogramVec = register_histogram_vec_with_registry!(
        prometheus::HistogramOpts::new("convertifier_request_duration_seconds", "Request duration in seconds")
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["method", "endpoint"],
        REGISTRY
    ).unwrap();

    // ============================================================================
    // CONVERSION METRICS
    // ============================================================================

    /// Completed conversions
    pub static ref CONVERSIONS_TOTAL: CounterVec = register_counter_vec_with_registry!(
        Opts::new("convertifier_conversions_total", "Total completed conversions"),
        &["direction", "method"], // method: ai, basic
        REGISTRY
    ).unwrap();

    /// Failed conversions
    pub static ref CONVERSION_FAILURES: CounterVec = register_counter_vec_with_registry!(
        Opts::new("convertifier_conversion_failures_total", "Total failed conversions"),
        &["direction", "error_type"],
        REGISTRY
    ).unwrap();

    /// AI conversions that fell back to the basic converter
    pub static ref AI_FALLBACKS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("convertifier_ai_fallbacks_total", "AI conversions that fell back to basic conversion"),
        &["direction"],
        REGISTRY
    ).unwrap();

    /// Inputs rejected by a validator
    pub static ref VALIDATION_FAILURES: CounterVec = register_counter_vec_with_registry!(
        Opts::new("convertifier_validation_failures_total", "Inputs rejected by validation"),
        &["language"],
        REGISTRY
    ).unwrap();

    // ============================================================================
    // GEMINI API METRICS
    // ============================================================================

    /// Total Gemini API calls
    pub static ref GEMINI_API_CALLS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("convertifier_gemini_api_calls_total", "Total Gemini API calls"),
        &["model", "status_code"],
        REGISTRY
    ).unwrap();

    /// Gemini API call duration
    pub static ref GEMINI_API_DURATION: HistogramVec = register_histogram_vec_with_registry!(
        prometheus::HistogramOpts::new("convertifier_gemini_api_duration_seconds", "Gemini API call duration")
            .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["model"],
        REGISTRY
    ).unwrap();

    /// Tokens reported by the Gemini API
    pub static ref TOKENS_TOTAL: CounterVec = register_counter_vec_with_registry!(
        Opts::new("convertifier_tokens_total", "Total tokens processed"),
        &["model", "type"], // type: input, output
        REGISTRY
    ).unwrap();

    // ============================================================================
    // CACHE METRICS
    // ============================================================================

    /// AI answer cache operations
    pub static ref CACHE_OPERATIONS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("convertifier_cache_operations_total", "Total AI answer cache operations"),
        &["operation"], // operation: hit, miss, insert, eviction
        REGISTRY
    ).unwrap();

    /// Current AI answer cache entries
    pub static ref CACHE_ENTRIES: Gauge = register_gauge_with_registry!(
        Opts::new("convertifier_cache_entries", "Current number of cached AI answers"),
        REGISTRY
    ).unwrap();
}

/// Gather all metrics and return as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        CONVERSIONS_TOTAL
            .with_label_values(&["python_to_cpp", "basic"])
            .inc();
        CACHE_ENTRIES.set(3.0);

        let metrics = gather_metrics();
        assert!(metrics.contains("convertifier_conversions_total"));
        assert!(metrics.contains("convertifier_cache_entries"));
    }
}

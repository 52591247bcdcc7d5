// Retrying upstream calls with backoff and Google's retryDelay hint

use backoff::{backoff::Backoff, ExponentialBackoff};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

const RETRY_INFO_TYPE: &str = "type.googleapis.com/google.rpc.RetryInfo";

/// Longest delay honored from a server hint.
const MAX_HINTED_DELAY: Duration = Duration::from_secs(60);

/// A failed upstream attempt: HTTP status plus the raw response body.
///
/// Transport errors use status 500 so they are retried like server errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamFailure {
    pub status: u16,
    pub body: String,
}

impl UpstreamFailure {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::new(500, format!("HTTP error: {}", err))
    }

    /// Rate limits and transient server errors are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self.status, 429 | 500 | 502 | 503 | 504)
    }

    /// The `RetryInfo.retryDelay` hint from a Google error body, if any.
    pub fn retry_hint(&self) -> Option<Duration> {
        let parsed: Value = serde_json::from_str(&self.body).ok()?;
        parsed
            .pointer("/error/details")?
            .as_array()?
            .iter()
            .find(|detail| detail.get("@type").and_then(Value::as_str) == Some(RETRY_INFO_TYPE))
            .and_then(|detail| detail.get("retryDelay")?.as_str())
            .and_then(parse_seconds)
    }
}

/// Parse protobuf duration strings such as `"40s"` or `"0.457639761s"`.
fn parse_seconds(text: &str) -> Option<Duration> {
    let seconds: f64 = text.strip_suffix('s')?.parse().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Some(Duration::from_secs_f64(
        seconds.min(MAX_HINTED_DELAY.as_secs_f64()),
    ))
}

fn exponential_backoff() -> ExponentialBackoff {
    ExponentialBackoff {
        current_interval: Duration::from_millis(500),
        initial_interval: Duration::from_millis(500),
        randomization_factor: 0.3,
        multiplier: 2.0,
        max_interval: Duration::from_secs(30),
        max_elapsed_time: Some(Duration::from_secs(120)),
        ..Default::default()
    }
}

/// Run `attempt` until it succeeds, fails permanently, or `max_retries`
/// retries have been spent (at most `max_retries + 1` calls).
pub async fn with_retry<F, Fut, T>(
    label: &str,
    max_retries: u32,
    mut attempt: F,
) -> Result<T, UpstreamFailure>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, UpstreamFailure>>,
{
    let mut schedule = exponential_backoff();
    let mut retries = 0u32;

    loop {
        let failure = match attempt().await {
            Ok(value) => {
                if retries > 0 {
                    debug!("{} succeeded after {} retries", label, retries);
                }
                return Ok(value);
            }
            Err(failure) => failure,
        };

        if !failure.is_retryable() || retries >= max_retries {
            return Err(failure);
        }
        retries += 1;

        let delay = failure
            .retry_hint()
            .or_else(|| schedule.next_backoff())
            .unwrap_or(Duration::from_secs(30));
        warn!(
            "{} failed with HTTP {}, retry {}/{} in {}ms",
            label,
            failure.status,
            retries,
            max_retries,
            delay.as_millis()
        );
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn hinted(status: u16, delay: &str) -> UpstreamFailure {
        UpstreamFailure::new(
            status,
            format!(
                r#"{{"error":{{"code":{},"details":[{{"@type":"type.googleapis.com/google.rpc.QuotaFailure"}},{{"@type":"{}","retryDelay":"{}"}}]}}}}"#,
                status, RETRY_INFO_TYPE, delay
            ),
        )
    }

    #[test]
    fn test_retry_hint() {
        assert_eq!(hinted(429, "0.25s").retry_hint(), Some(Duration::from_millis(250)));
        assert_eq!(hinted(429, "3600s").retry_hint(), Some(MAX_HINTED_DELAY));
        assert_eq!(hinted(429, "soon").retry_hint(), None);
        assert_eq!(UpstreamFailure::new(503, "<html>").retry_hint(), None);
    }

    #[test]
    fn test_parse_seconds() {
        assert_eq!(parse_seconds("2s"), Some(Duration::from_secs(2)));
        assert_eq!(parse_seconds("2"), None);
        assert_eq!(parse_seconds("-0.5s"), None);
        assert_eq!(parse_seconds("inf"), None);
    }

    #[test]
    fn test_huge_hint_is_capped() {
        assert_eq!(parse_seconds("1e30s"), Some(MAX_HINTED_DELAY));
        assert_eq!(hinted(429, "1e30s").retry_hint(), Some(MAX_HINTED_DELAY));
        assert_eq!(hinted(429, "1e309s").retry_hint(), None);
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(UpstreamFailure::new(429, "").is_retryable());
        assert!(UpstreamFailure::transport("connection reset").is_retryable());
        assert!(!UpstreamFailure::new(400, "").is_retryable());
        assert!(!UpstreamFailure::new(404, "").is_retryable());
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry("test", 3, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(UpstreamFailure::new(403, "forbidden")) }
        })
        .await;
        assert_eq!(result.unwrap_err().status, 403);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_hint_drives_retries_until_success() {
        let calls = AtomicU32::new(0);
        let result = with_retry("test", 3, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(hinted(503, "0.001s"))
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_budget_is_respected() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry("test", 1, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(hinted(429, "0.001s")) }
        })
        .await;
        assert_eq!(result.unwrap_err().status, 429);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}

//! Shared infrastructure for HTTP-backed converters.
//!
//! Rate-limit handling only: a 429 is retried with exponential backoff, every
//! other answer goes back to the caller untouched.

use std::future::Future;
use std::time::Duration;

use reqwest::Response;
use tracing::warn;

use super::backend::{ConverterType, OcrError};

/// Maximum retry attempts on rate limit (429) errors.
pub const MAX_RETRIES: u32 = 5;

/// Parse a `Retry-After` header given in seconds, capped at one minute.
pub fn parse_retry_after(header_value: Option<&str>) -> Option<Duration> {
    let value = header_value?;
    value
        .trim()
        .parse::<u64>()
        .ok()
        .map(|secs| Duration::from_secs(secs.min(60)))
}

/// Calculate exponential backoff delay for a given attempt.
pub fn backoff_delay(attempt: u32, base_ms: u64) -> Duration {
    let delay_ms = base_ms.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(delay_ms.min(60_000))
}

/// Retry an API request on 429 (rate limited) responses with exponential backoff.
///
/// Returns the first non-429 response. If all retries are exhausted,
/// returns `OcrError::RateLimited`.
pub async fn retry_on_rate_limit<F, Fut>(
    backend_type: ConverterType,
    base_delay_ms: u64,
    make_request: F,
) -> Result<Response, OcrError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Response, OcrError>>,
{
    let mut attempt = 0;
    loop {
        let response = make_request().await?;

        if response.status().as_u16() != 429 {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let retry_after_secs = retry_after.as_deref().and_then(|s| s.trim().parse::<u64>().ok());

        if attempt + 1 >= MAX_RETRIES {
            return Err(OcrError::RateLimited {
                backend: backend_type,
                retry_after_secs,
            });
        }

        let wait = parse_retry_after(retry_after.as_deref())
            .unwrap_or_else(|| backoff_delay(attempt, base_delay_ms));

        warn!(
            "{} rate limited (attempt {}), waiting {:?}",
            backend_type,
            attempt + 1,
            wait
        );
        tokio::time::sleep(wait).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_delay() {
        assert_eq!(backoff_delay(0, 1000), Duration::from_millis(1000));
        assert_eq!(backoff_delay(3, 1000), Duration::from_millis(8000));
        assert_eq!(backoff_delay(10, 1000), Duration::from_secs(60));
        assert_eq!(backoff_delay(80, 1000), Duration::from_secs(60));
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after(Some("5")), Some(Duration::from_secs(5)));
        assert_eq!(parse_retry_after(Some("600")), Some(Duration::from_secs(60)));
        assert_eq!(parse_retry_after(Some("Wed, 21 Oct 2015 07:28:00 GMT")), None);
        assert_eq!(parse_retry_after(None), None);
    }
}

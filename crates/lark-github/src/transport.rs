use std::time::Duration;

const MAX_RETRY_DELAY_MS: u64 = 30_000;
const ERROR_BODY_PREVIEW_CHARS: usize = 400;

/// Rate limits and server-side failures are worth retrying; everything else
/// is a terminal answer from the API.
pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..=599).contains(&status)
}

/// Parse a `Retry-After` header value given in whole seconds.
pub fn parse_retry_after(value: Option<&str>) -> Option<Duration> {
    let seconds = value?.trim().parse::<u64>().ok()?;
    Some(Duration::from_secs(seconds))
}

/// Exponential backoff capped at 30s; an explicit `Retry-After` wins when it
/// asks for a longer wait.
pub fn retry_delay(
    attempt: usize,
    base_delay_ms: u64,
    retry_after: Option<Duration>,
) -> Duration {
    let exponent = u32::try_from(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
    let backoff_ms = base_delay_ms
        .max(1)
        .saturating_mul(2_u64.saturating_pow(exponent))
        .min(MAX_RETRY_DELAY_MS);
    let backoff = Duration::from_millis(backoff_ms);
    match retry_after {
        Some(hinted) if hinted > backoff => hinted,
        _ => backoff,
    }
}

/// Bound an error body for inclusion in error messages.
pub fn truncate_for_error(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= ERROR_BODY_PREVIEW_CHARS {
        return trimmed.to_string();
    }
    let preview = trimmed
        .chars()
        .take(ERROR_BODY_PREVIEW_CHARS)
        .collect::<String>();
    format!("{preview}…")
}

#[cfg(test)]
mod tests {
    use super::{is_retryable_status, parse_retry_after, retry_delay, truncate_for_error};
    use std::time::Duration;

    #[test]
    fn unit_is_retryable_status_covers_rate_limits_and_server_errors() {
        assert!(is_retryable_status(429));
        assert!(is_retryable_status(500));
        assert!(is_retryable_status(503));
        assert!(!is_retryable_status(404));
        assert!(!is_retryable_status(403));
        assert!(!is_retryable_status(422));
    }

    #[test]
    fn unit_parse_retry_after_accepts_whole_seconds_only() {
        assert_eq!(
            parse_retry_after(Some("3")),
            Some(Duration::from_secs(3))
        );
        assert_eq!(parse_retry_after(Some("soon")), None);
        assert_eq!(parse_retry_after(None), None);
    }

    #[test]
    fn functional_retry_delay_doubles_and_caps() {
        assert_eq!(retry_delay(1, 100, None), Duration::from_millis(100));
        assert_eq!(retry_delay(2, 100, None), Duration::from_millis(200));
        assert_eq!(retry_delay(3, 100, None), Duration::from_millis(400));
        assert_eq!(retry_delay(30, 100, None), Duration::from_millis(30_000));
    }

    #[test]
    fn functional_retry_after_wins_when_longer_than_backoff() {
        let hinted = Some(Duration::from_secs(5));
        assert_eq!(retry_delay(1, 100, hinted), Duration::from_secs(5));
        let short_hint = Some(Duration::from_millis(10));
        assert_eq!(retry_delay(3, 100, short_hint), Duration::from_millis(400));
    }

    #[test]
    fn regression_truncate_for_error_bounds_long_bodies() {
        let long = "x".repeat(1_000);
        let preview = truncate_for_error(&long);
        assert!(preview.chars().count() <= 401);
        assert!(preview.ends_with('…'));
        assert_eq!(truncate_for_error("  short  "), "short");
    }
}

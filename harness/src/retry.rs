use crate::{
    data::RawResponse,
    error::Error,
};
use std::time::Duration;

/// Statuses the original pet store suite treated as transient.
pub const DEFAULT_RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// How a call is retried: up to `max_retries` extra attempts after the
/// first one, sleeping `base_delay * 2^attempt` (capped) between attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
    retryable_statuses: Vec<u16>,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
            retryable_statuses: DEFAULT_RETRYABLE_STATUSES.to_vec(),
        }
    }

    pub fn with_retryable_statuses(mut self, statuses: Vec<u16>) -> Self {
        self.retryable_statuses = statuses;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Total attempts allowed for one logical call, the first one included.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    pub fn is_retryable_status(&self, status_code: u16) -> bool {
        self.retryable_statuses.contains(&status_code)
    }

    /// The delay slept after the given zero-based attempt number.
    /// Doubling with a cap keeps the sequence non-decreasing.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        let delay = self
            .base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay);
        delay.min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500), Duration::from_secs(5))
    }
}

/// The retry decision for one attempt. The send loop matches on this
/// instead of threading control flow through error conversions.
#[derive(Debug)]
pub enum Disposition {
    /// A usable response; hand it to the caller as the final outcome.
    Deliver(RawResponse),
    /// A transient failure worth another attempt.
    Retry(String),
    /// A failure no amount of retrying can fix.
    Fatal(Error),
}

pub fn classify(policy: &RetryPolicy, attempt: Result<RawResponse, Error>) -> Disposition {
    match attempt {
        Ok(raw) if raw.status_code == 401 || raw.status_code == 403 => Disposition::Fatal(Error::Auth {
            status_code: raw.status_code,
        }),
        Ok(raw) if policy.is_retryable_status(raw.status_code) => {
            Disposition::Retry(format!("status {}", raw.status_code))
        }
        Ok(raw) => Disposition::Deliver(raw),
        Err(error) if error.is_transient() => Disposition::Retry(error.to_string()),
        Err(error) => Disposition::Fatal(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(status_code: u16) -> RawResponse {
        RawResponse {
            status_code,
            body: String::new(),
        }
    }

    #[test]
    fn backoff_delays_are_non_decreasing() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100), Duration::from_secs(2));

        let delays: Vec<_> = (0..6).map(|attempt| policy.backoff_delay(attempt)).collect();
        for pair in delays.windows(2) {
            assert!(pair[1] >= pair[0], "delays decreased: {:?}", delays);
        }
    }

    #[test]
    fn backoff_is_capped_at_max_delay() {
        let policy = RetryPolicy::new(3, Duration::from_millis(500), Duration::from_secs(5));

        assert_eq!(policy.backoff_delay(0), Duration::from_millis(500));
        assert_eq!(policy.backoff_delay(1), Duration::from_secs(1));
        assert_eq!(policy.backoff_delay(10), Duration::from_secs(5));
        assert_eq!(policy.backoff_delay(31), Duration::from_secs(5));
        assert_eq!(policy.backoff_delay(40), Duration::from_secs(5));
    }

    #[test]
    fn server_errors_are_retryable() {
        let policy = RetryPolicy::default();

        for status in &[429u16, 500, 502, 503, 504] {
            match classify(&policy, Ok(raw(*status))) {
                Disposition::Retry(_) => (),
                other => panic!("status {} should be retried, got {:?}", status, other),
            }
        }
    }

    #[test]
    fn client_errors_are_delivered_without_retry() {
        let policy = RetryPolicy::default();

        match classify(&policy, Ok(raw(404))) {
            Disposition::Deliver(response) => assert_eq!(response.status_code, 404),
            other => panic!("404 should be delivered, got {:?}", other),
        }
        match classify(&policy, Ok(raw(400))) {
            Disposition::Deliver(response) => assert_eq!(response.status_code, 400),
            other => panic!("400 should be delivered, got {:?}", other),
        }
    }

    #[test]
    fn auth_rejection_is_fatal() {
        let policy = RetryPolicy::default();

        match classify(&policy, Ok(raw(401))) {
            Disposition::Fatal(Error::Auth { status_code: 401 }) => (),
            other => panic!("401 should be fatal, got {:?}", other),
        }
    }

    #[test]
    fn connection_failures_are_retryable() {
        let policy = RetryPolicy::default();
        let error = Error::Connection {
            url: String::from("http://localhost:1/pet"),
            detail: String::from("connection refused"),
        };

        match classify(&policy, Err(error)) {
            Disposition::Retry(_) => (),
            other => panic!("connection failure should be retried, got {:?}", other),
        }
    }

    #[test]
    fn max_attempts_counts_the_first_attempt() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(1));
        assert_eq!(policy.max_attempts(), 4);
    }
}

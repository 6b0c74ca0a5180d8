//! Test helpers for the Aiven API

#[cfg(test)]
#[allow(dead_code)]
pub fn create_test_client(url: &str) -> super::Client {
    super::Client::new(url, "test-token").unwrap()
}

/// Client whose retries do not slow the test down
#[cfg(test)]
#[allow(dead_code)]
pub fn fast_retry_client(url: &str, max_retries: u32) -> super::Client {
    super::Client::with_config(
        url,
        "test-token",
        super::RetryConfig {
            max_retries,
            initial_backoff_ms: 1,
            max_backoff_ms: 5,
            timeout_seconds: 5,
        },
    )
    .unwrap()
}

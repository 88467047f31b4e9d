// src/edgar/client.rs
use crate::edgar::models::{FetchConfig, SearchResponse};
use crate::utils::error::FetchError;
use reqwest::{header, StatusCode};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// Rate-limited, retrying, circuit-breaking EDGAR client.
///
/// A semaphore slot is held through each request *and* a cool-down delay
/// before release, so the bound applies to request rate rather than just
/// concurrency. Transient failures retry with exponential backoff; repeated
/// failures inside a rolling window open a circuit breaker that fails fast
/// until a cooldown elapses. Breaker and limiter state are process-wide:
/// one client instance is shared by every chunk of a batch.
pub struct EdgarClient {
    http: reqwest::Client,
    limiter: Semaphore,
    breaker: CircuitBreaker,
    config: FetchConfig,
}

impl EdgarClient {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            limiter: Semaphore::new(config.max_concurrent_requests),
            breaker: CircuitBreaker::new(
                config.failure_threshold,
                config.failure_window(),
                config.break_duration(),
            ),
            http,
            config,
        })
    }

    /// Fetches a filing document from the archive host.
    pub async fn get_document(&self, url: &str) -> Result<String, FetchError> {
        self.get_with_host(url, &self.config.archive_host).await
    }

    /// Runs a full-text search for filings of `form` by the company with the
    /// given (zero-padded) CIK within a date range.
    pub async fn search(
        &self,
        cik: &str,
        form: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<SearchResponse, FetchError> {
        let url = self.config.search_url(cik, form, start_date, end_date);
        let body = self.get_with_host(&url, &self.config.search_host).await?;
        serde_json::from_str(&body).map_err(|_| FetchError::Parse(url))
    }

    /// Fetches the raw company ticker table.
    pub async fn get_company_tickers(&self) -> Result<String, FetchError> {
        self.get_with_host(&self.config.company_tickers_url, &self.config.archive_host)
            .await
    }

    /// GET with an explicit Host override, subject to the rate limit.
    pub async fn get_with_host(&self, url: &str, host: &str) -> Result<String, FetchError> {
        let permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| FetchError::LimiterClosed)?;

        let result = self.get_with_retries(url, host).await;

        // The slot stays taken through the cool-down so the request *rate*
        // is bounded, not just the number in flight.
        tokio::time::sleep(self.config.request_cooldown()).await;
        drop(permit);

        result
    }

    async fn get_with_retries(&self, url: &str, host: &str) -> Result<String, FetchError> {
        let mut attempts: u32 = 0;
        loop {
            if !self.breaker.allow_request() {
                tracing::warn!("Circuit open, failing fast for {}", url);
                return Err(FetchError::CircuitOpen(url.to_string()));
            }
            attempts += 1;

            match self.send(url, host).await {
                Ok(body) => {
                    self.breaker.record_success();
                    return Ok(body);
                }
                Err(err) if is_transient(&err) => {
                    self.breaker.record_failure();
                    if attempts > self.config.retry_count {
                        return Err(FetchError::RetriesExhausted {
                            url: url.to_string(),
                            attempts,
                            reason: err.to_string(),
                        });
                    }
                    let backoff = Duration::from_secs(1u64 << attempts.min(6));
                    tracing::warn!(
                        "Transient failure for {} (attempt {}): {}. Retrying in {:?}",
                        url,
                        attempts,
                        err,
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
                // 403/404 and other non-transient statuses are answers, not
                // outages; they neither retry nor count against the breaker.
                Err(err) => return Err(err),
            }
        }
    }

    async fn send(&self, url: &str, host: &str) -> Result<String, FetchError> {
        let response = self
            .http
            .get(url)
            .header(header::ACCEPT, "application/json,text/html,text/plain,*/*")
            .header(header::HOST, host)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let body = response.text().await?;
            tracing::debug!("Fetched {} bytes from {}", body.len(), url);
            return Ok(body);
        }

        if status == StatusCode::FORBIDDEN {
            return Err(FetchError::Forbidden(url.to_string()));
        }
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(url.to_string()));
        }
        Err(FetchError::Http(status))
    }
}

fn is_transient(err: &FetchError) -> bool {
    match err {
        FetchError::Network(_) => true,
        FetchError::Http(status) => {
            status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
        }
        _ => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CircuitState {
    Closed,
    Open { since: Instant },
    HalfOpen { trial_in_flight: bool },
}

struct BreakerInner {
    state: CircuitState,
    failures: Vec<Instant>,
}

/// Failure-counting circuit breaker with half-open probing.
struct CircuitBreaker {
    failure_threshold: usize,
    failure_window: Duration,
    break_duration: Duration,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    fn new(failure_threshold: usize, failure_window: Duration, break_duration: Duration) -> Self {
        Self {
            failure_threshold,
            failure_window,
            break_duration,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                failures: Vec::new(),
            }),
        }
    }

    /// Whether a request may go out. While open, only the transition to
    /// half-open (after the break duration) lets a single trial through.
    fn allow_request(&self) -> bool {
        let mut inner = self.inner.lock().unwrap();
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open { since } => {
                if since.elapsed() >= self.break_duration {
                    inner.state = CircuitState::HalfOpen {
                        trial_in_flight: true,
                    };
                    true
                } else {
                    false
                }
            }
            CircuitState::HalfOpen { trial_in_flight } => {
                if trial_in_flight {
                    false
                } else {
                    inner.state = CircuitState::HalfOpen {
                        trial_in_flight: true,
                    };
                    true
                }
            }
        }
    }

    fn record_success(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.state = CircuitState::Closed;
        inner.failures.clear();
    }

    fn record_failure(&self) {
        let now = Instant::now();
        let mut inner = self.inner.lock().unwrap();
        match inner.state {
            // A failed half-open trial re-opens the circuit immediately.
            CircuitState::HalfOpen { .. } => {
                inner.state = CircuitState::Open { since: now };
                inner.failures.clear();
            }
            CircuitState::Closed => {
                let window = self.failure_window;
                inner.failures.retain(|t| now.duration_since(*t) < window);
                inner.failures.push(now);
                if inner.failures.len() >= self.failure_threshold {
                    inner.state = CircuitState::Open { since: now };
                    inner.failures.clear();
                }
            }
            CircuitState::Open { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(threshold: usize, window_ms: u64, break_ms: u64) -> CircuitBreaker {
        CircuitBreaker::new(
            threshold,
            Duration::from_millis(window_ms),
            Duration::from_millis(break_ms),
        )
    }

    #[test]
    fn breaker_opens_after_threshold_failures() {
        let b = breaker(3, 1_000, 1_000);
        for _ in 0..2 {
            b.record_failure();
            assert!(b.allow_request());
        }
        b.record_failure();
        assert!(!b.allow_request(), "circuit should be open");
    }

    #[test]
    fn breaker_half_open_allows_single_trial_then_closes_on_success() {
        let b = breaker(1, 1_000, 30);
        b.record_failure();
        assert!(!b.allow_request());

        std::thread::sleep(Duration::from_millis(40));
        assert!(b.allow_request(), "half-open trial should be allowed");
        assert!(!b.allow_request(), "only one trial may be in flight");

        b.record_success();
        assert!(b.allow_request(), "success closes the circuit");
    }

    #[test]
    fn failed_trial_reopens_the_circuit() {
        let b = breaker(1, 1_000, 30);
        b.record_failure();
        std::thread::sleep(Duration::from_millis(40));
        assert!(b.allow_request());
        b.record_failure();
        assert!(!b.allow_request(), "failed trial re-opens the circuit");
    }

    #[test]
    fn failures_outside_the_window_do_not_count() {
        let b = breaker(2, 30, 1_000);
        b.record_failure();
        std::thread::sleep(Duration::from_millis(40));
        b.record_failure();
        assert!(
            b.allow_request(),
            "stale failure should have been pruned from the window"
        );
    }

    #[test]
    fn transient_classification() {
        assert!(is_transient(&FetchError::Http(
            StatusCode::INTERNAL_SERVER_ERROR
        )));
        assert!(is_transient(&FetchError::Http(
            StatusCode::TOO_MANY_REQUESTS
        )));
        assert!(!is_transient(&FetchError::Http(StatusCode::BAD_REQUEST)));
        assert!(!is_transient(&FetchError::NotFound("u".into())));
        assert!(!is_transient(&FetchError::Forbidden("u".into())));
    }
}

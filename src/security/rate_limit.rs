//! Per-client fixed-window rate limiting.
//!
//! Each client address owns a bucket `{window start, count}`. The window resets
//! wholesale once it has fully elapsed, so bursts straddling a window boundary
//! can see up to twice the limit.

use std::time::{Duration, Instant};

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::time;

use crate::config::RateLimitConfig;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Key used when the peer address is unknown.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Request count within the current window of one client.
#[derive(Debug, Clone, Copy)]
struct RateBucket {
    window_start: Instant,
    count: u32,
}

/// Outcome of a rate-limit check, with the values exposed as headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub blocked: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_secs: u64,
}

impl RateDecision {
    /// Write the `X-RateLimit-*` headers.
    pub fn apply_headers(&self, headers: &mut HeaderMap) {
        headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(self.limit));
        headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(self.remaining));
        headers.insert(X_RATELIMIT_RESET, HeaderValue::from(self.reset_secs));
    }
}

/// Fixed-window limiter shared by all requests.
#[derive(Debug)]
pub struct RateLimiter {
    buckets: DashMap<String, RateBucket>,
    window: Duration,
    max_requests: u32,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            buckets: DashMap::new(),
            window,
            max_requests,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(Duration::from_secs(config.window_secs), config.max_requests)
    }

    /// Count a request from `client` against its window.
    pub fn check(&self, client: &str) -> RateDecision {
        self.check_at(client, Instant::now())
    }

    /// Same as [`check`](Self::check) with an explicit clock reading.
    pub fn check_at(&self, client: &str, now: Instant) -> RateDecision {
        let mut bucket = self
            .buckets
            .entry(client.to_string())
            .or_insert(RateBucket {
                window_start: now,
                count: 0,
            });

        let elapsed = now.saturating_duration_since(bucket.window_start);
        if bucket.count == 0 || elapsed >= self.window {
            *bucket = RateBucket {
                window_start: now,
                count: 1,
            };
            return RateDecision {
                blocked: false,
                limit: self.max_requests,
                remaining: self.max_requests.saturating_sub(1),
                reset_secs: self.window.as_secs(),
            };
        }

        bucket.count = bucket.count.saturating_add(1);
        RateDecision {
            blocked: bucket.count > self.max_requests,
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(bucket.count),
            reset_secs: (self.window - elapsed).as_secs(),
        }
    }

    /// Drop buckets whose window has fully elapsed. Returns how many were removed.
    pub fn sweep_expired(&self, now: Instant) -> usize {
        let before = self.buckets.len();
        self.buckets
            .retain(|_, bucket| now.saturating_duration_since(bucket.window_start) < self.window);
        before.saturating_sub(self.buckets.len())
    }

    /// Number of tracked clients.
    pub fn tracked_clients(&self) -> usize {
        self.buckets.len()
    }

    /// Periodically sweep expired buckets until shutdown.
    pub async fn run_sweeper(&self, interval: Duration, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval_secs = interval.as_secs(), "Rate limit sweeper starting");

        let mut ticker = time::interval(interval);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = self.sweep_expired(Instant::now());
                    if removed > 0 {
                        tracing::debug!(removed, remaining = self.tracked_clients(), "Swept expired rate buckets");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Rate limit sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> RateLimiter {
        RateLimiter::new(Duration::from_secs(60), 60)
    }

    #[test]
    fn test_first_request_opens_window() {
        let limiter = limiter();
        let decision = limiter.check_at("10.0.0.1", Instant::now());
        assert_eq!(
            decision,
            RateDecision {
                blocked: false,
                limit: 60,
                remaining: 59,
                reset_secs: 60,
            }
        );
    }

    #[test]
    fn test_sixty_first_request_is_blocked() {
        let limiter = limiter();
        let start = Instant::now();
        for i in 0..60 {
            let decision = limiter.check_at("10.0.0.1", start + Duration::from_millis(i * 10));
            assert!(!decision.blocked, "request {} should pass", i + 1);
        }

        let decision = limiter.check_at("10.0.0.1", start + Duration::from_secs(1));
        assert!(decision.blocked);
        assert_eq!(decision.remaining, 0);
        assert_eq!(decision.reset_secs, 59);

        // Still counted while blocked
        let decision = limiter.check_at("10.0.0.1", start + Duration::from_secs(2));
        assert!(decision.blocked);
        assert_eq!(decision.remaining, 0);
    }

    #[test]
    fn test_window_expiry_resets_count() {
        let limiter = limiter();
        let start = Instant::now();
        for _ in 0..61 {
            limiter.check_at("10.0.0.1", start);
        }
        assert!(limiter.check_at("10.0.0.1", start + Duration::from_secs(59)).blocked);

        let decision = limiter.check_at("10.0.0.1", start + Duration::from_secs(60));
        assert!(!decision.blocked);
        assert_eq!(decision.remaining, 59);
        assert_eq!(decision.reset_secs, 60);

        let decision = limiter.check_at("10.0.0.1", start + Duration::from_secs(61));
        assert_eq!(decision.remaining, 58);
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 1);
        let now = Instant::now();
        assert!(!limiter.check_at("a", now).blocked);
        assert!(limiter.check_at("a", now).blocked);
        assert!(!limiter.check_at("b", now).blocked);
        assert!(!limiter.check_at(UNKNOWN_CLIENT, now).blocked);
    }

    #[test]
    fn test_reset_counts_down() {
        let limiter = limiter();
        let start = Instant::now();
        limiter.check_at("c", start);
        let decision = limiter.check_at("c", start + Duration::from_millis(30_500));
        assert_eq!(decision.reset_secs, 29);
        assert_eq!(decision.remaining, 58);
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let limiter = limiter();
        let start = Instant::now();
        limiter.check_at("old", start);
        limiter.check_at("new", start + Duration::from_secs(30));

        assert_eq!(limiter.sweep_expired(start + Duration::from_secs(65)), 1);
        assert_eq!(limiter.tracked_clients(), 1);
        assert_eq!(limiter.check_at("new", start + Duration::from_secs(66)).remaining, 58);
    }

    #[tokio::test]
    async fn test_sweeper_runs_until_shutdown() {
        let limiter = std::sync::Arc::new(RateLimiter::new(Duration::from_millis(20), 5));
        limiter.check("a");
        limiter.check("b");

        let (tx, rx) = broadcast::channel(1);
        let sweeper = {
            let limiter = limiter.clone();
            tokio::spawn(async move { limiter.run_sweeper(Duration::from_millis(50), rx).await })
        };

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(limiter.tracked_clients(), 0);

        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), sweeper)
            .await
            .expect("sweeper should exit on shutdown")
            .unwrap();
    }

    #[test]
    fn test_headers() {
        let mut headers = HeaderMap::new();
        RateDecision {
            blocked: true,
            limit: 60,
            remaining: 0,
            reset_secs: 12,
        }
        .apply_headers(&mut headers);

        assert_eq!(headers[X_RATELIMIT_LIMIT], "60");
        assert_eq!(headers[X_RATELIMIT_REMAINING], "0");
        assert_eq!(headers[X_RATELIMIT_RESET], "12");
    }
}

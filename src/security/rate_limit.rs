//! Rate-limit partitioning.
//!
//! # Responsibilities
//! - Resolve which bucket a request counts against
//! - Provide a local token bucket behind the `RateLimiter` seam
//!
//! # Design Decisions
//! - Key resolution is pure and always yields a non-empty key
//! - Identity keys come from the trusted `X-User-Id` header, which the
//!   authentication filter strips from client input before setting it
//! - The counting backend is swappable; a shared store can implement
//!   `RateLimiter` without touching key resolution
//! - A refilled bucket is indistinguishable from a new one, so full buckets
//!   are swept out periodically and memory tracks active keys only

use std::net::{IpAddr, SocketAddr};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::extract::ConnectInfo;
use axum::http::Request;
use dashmap::DashMap;

use crate::config::{KeyStrategy, RateLimitConfig};
use crate::security::headers::X_USER_ID;

/// Key used when no identity or address is available.
pub const UNKNOWN_KEY: &str = "unknown";

/// Default interval between idle-bucket sweeps.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(10);

/// Resolve a key from its inputs.
pub fn resolve_key(strategy: KeyStrategy, identity: Option<&str>, client: Option<IpAddr>) -> String {
    if strategy == KeyStrategy::Identity {
        if let Some(id) = identity.map(str::trim).filter(|id| !id.is_empty()) {
            return id.to_string();
        }
    }

    client.map_or_else(|| UNKNOWN_KEY.to_string(), |ip| ip.to_string())
}

/// Resolves a request's rate-limit key.
#[derive(Debug, Clone, Copy)]
pub struct KeyResolver {
    strategy: KeyStrategy,
}

impl KeyResolver {
    pub fn new(strategy: KeyStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> KeyStrategy {
        self.strategy
    }

    /// Reads the identity header and the peer address recorded by the server.
    pub fn resolve<B>(&self, request: &Request<B>) -> String {
        let identity = request
            .headers()
            .get(&X_USER_ID)
            .and_then(|v| v.to_str().ok());
        let client = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        resolve_key(self.strategy, identity, client)
    }
}

/// Result of asking the limiter for tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Whole tokens left in the bucket after this request.
    pub remaining: u64,
}

/// Counts requests per key.
pub trait RateLimiter: Send + Sync {
    fn try_acquire(&self, key: &str) -> RateLimitDecision;
}

/// A simple token bucket.
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_update: Instant::now(),
        }
    }

    /// Whether the bucket would be back at capacity by `now`.
    fn is_full_at(&self, now: Instant, capacity: f64, refill_rate: f64) -> bool {
        let elapsed = now.saturating_duration_since(self.last_update).as_secs_f64();
        self.tokens + elapsed * refill_rate >= capacity
    }

    fn try_acquire(&mut self, now: Instant, capacity: f64, refill_rate: f64, cost: f64) -> bool {
        let elapsed = now.saturating_duration_since(self.last_update).as_secs_f64();

        // Refill tokens
        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_update = now;

        if self.tokens >= cost {
            self.tokens -= cost;
            true
        } else {
            false
        }
    }
}

/// In-process token buckets keyed by the resolved rate-limit key.
#[derive(Debug)]
pub struct LocalRateLimiter {
    buckets: DashMap<String, TokenBucket>,
    replenish_rate: f64,
    burst_capacity: f64,
    requested_tokens: f64,
    sweep_interval: Duration,
    last_sweep: Mutex<Instant>,
}

impl LocalRateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self::with_sweep_interval(config, SWEEP_INTERVAL)
    }

    pub fn with_sweep_interval(config: &RateLimitConfig, sweep_interval: Duration) -> Self {
        Self {
            buckets: DashMap::new(),
            replenish_rate: f64::from(config.replenish_rate),
            burst_capacity: f64::from(config.burst_capacity),
            requested_tokens: f64::from(config.requested_tokens),
            sweep_interval,
            last_sweep: Mutex::new(Instant::now()),
        }
    }

    /// Drop every bucket that has refilled to capacity by `now`.
    /// Returns how many were removed.
    pub fn evict_idle(&self, now: Instant) -> usize {
        let before = self.buckets.len();
        self.buckets.retain(|_, bucket| {
            !bucket.is_full_at(now, self.burst_capacity, self.replenish_rate)
        });
        before.saturating_sub(self.buckets.len())
    }

    /// Sweep if the interval has passed. Contended or poisoned locks skip
    /// the sweep; the next caller will pick it up.
    fn maybe_sweep(&self, now: Instant) {
        let Ok(mut last) = self.last_sweep.try_lock() else {
            return;
        };
        if now.saturating_duration_since(*last) < self.sweep_interval {
            return;
        }
        *last = now;
        drop(last);

        let evicted = self.evict_idle(now);
        if evicted > 0 {
            tracing::debug!(evicted, tracked = self.buckets.len(), "Evicted idle rate-limit buckets");
        }
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    fn acquire_at(&self, key: &str, now: Instant) -> RateLimitDecision {
        // Must run before the entry guard below is taken.
        self.maybe_sweep(now);

        let mut bucket = self
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::new(self.burst_capacity));

        let allowed = bucket.try_acquire(
            now,
            self.burst_capacity,
            self.replenish_rate,
            self.requested_tokens,
        );

        RateLimitDecision {
            allowed,
            remaining: bucket.tokens.max(0.0).floor() as u64,
        }
    }
}

impl RateLimiter for LocalRateLimiter {
    fn try_acquire(&self, key: &str) -> RateLimitDecision {
        self.acquire_at(key, Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn ip(s: &str) -> Option<IpAddr> {
        Some(s.parse().unwrap())
    }

    #[test]
    fn test_identity_strategy() {
        assert_eq!(resolve_key(KeyStrategy::Identity, Some("u-42"), ip("10.0.0.5")), "u-42");
        assert_eq!(resolve_key(KeyStrategy::Identity, None, ip("10.0.0.5")), "10.0.0.5");
        assert_eq!(resolve_key(KeyStrategy::Identity, Some(""), ip("10.0.0.5")), "10.0.0.5");
        assert_eq!(resolve_key(KeyStrategy::Identity, None, None), UNKNOWN_KEY);
    }

    #[test]
    fn test_address_strategy_ignores_identity() {
        assert_eq!(resolve_key(KeyStrategy::Address, Some("u-42"), ip("10.0.0.5")), "10.0.0.5");
        assert_eq!(resolve_key(KeyStrategy::Address, Some("u-42"), None), UNKNOWN_KEY);
        assert_eq!(resolve_key(KeyStrategy::Address, None, ip("::1")), "::1");
    }

    #[test]
    fn test_resolver_reads_request() {
        let mut request = Request::builder()
            .header("x-user-id", "u-42")
            .body(Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo("10.0.0.5:40000".parse::<SocketAddr>().unwrap()));

        assert_eq!(KeyResolver::new(KeyStrategy::Identity).resolve(&request), "u-42");
        assert_eq!(KeyResolver::new(KeyStrategy::Address).resolve(&request), "10.0.0.5");

        let bare = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(KeyResolver::new(KeyStrategy::Identity).resolve(&bare), UNKNOWN_KEY);
    }

    #[test]
    fn test_bucket_exhausts_and_refills() {
        let limiter = LocalRateLimiter::new(&RateLimitConfig {
            enabled: true,
            strategy: KeyStrategy::Address,
            replenish_rate: 1,
            burst_capacity: 2,
            requested_tokens: 1,
        });
        let start = Instant::now();

        assert_eq!(
            limiter.acquire_at("k", start),
            RateLimitDecision { allowed: true, remaining: 1 }
        );
        assert!(limiter.acquire_at("k", start).allowed);
        assert!(!limiter.acquire_at("k", start).allowed);

        // Other keys have their own bucket
        assert!(limiter.acquire_at("other", start).allowed);
        assert_eq!(limiter.len(), 2);

        assert!(limiter.acquire_at("k", start + Duration::from_secs(1)).allowed);
    }

    #[test]
    fn test_requested_tokens_cost() {
        let limiter = LocalRateLimiter::new(&RateLimitConfig {
            enabled: true,
            strategy: KeyStrategy::Identity,
            replenish_rate: 1,
            burst_capacity: 5,
            requested_tokens: 3,
        });
        let now = Instant::now();

        assert_eq!(
            limiter.acquire_at("k", now),
            RateLimitDecision { allowed: true, remaining: 2 }
        );
        assert_eq!(
            limiter.acquire_at("k", now),
            RateLimitDecision { allowed: false, remaining: 2 }
        );
    }

    fn fast_refill() -> RateLimitConfig {
        RateLimitConfig {
            enabled: true,
            strategy: KeyStrategy::Address,
            replenish_rate: 1000,
            burst_capacity: 1,
            requested_tokens: 1,
        }
    }

    #[test]
    fn test_refilled_buckets_are_evicted() {
        let limiter = LocalRateLimiter::new(&fast_refill());
        let start = Instant::now();

        for i in 0..1_000 {
            assert!(limiter.acquire_at(&format!("10.0.{}.{}", i / 256, i % 256), start).allowed);
        }
        assert_eq!(limiter.len(), 1_000);

        // Nothing has refilled yet.
        assert_eq!(limiter.evict_idle(start), 0);
        assert_eq!(limiter.len(), 1_000);

        assert_eq!(limiter.evict_idle(start + Duration::from_millis(50)), 1_000);
        assert!(limiter.is_empty());
    }

    #[test]
    fn test_acquire_sweeps_after_interval() {
        let limiter = LocalRateLimiter::with_sweep_interval(&fast_refill(), Duration::from_millis(10));
        let start = Instant::now();

        for i in 0..500 {
            limiter.acquire_at(&format!("user-{i}"), start);
        }
        assert_eq!(limiter.len(), 500);

        let later = start + Duration::from_secs(1);
        assert!(limiter.acquire_at("newcomer", later).allowed);
        assert_eq!(limiter.len(), 1);
    }

    #[test]
    fn test_sweep_keeps_draining_buckets() {
        let limiter = LocalRateLimiter::new(&RateLimitConfig {
            enabled: true,
            strategy: KeyStrategy::Address,
            replenish_rate: 1,
            burst_capacity: 10,
            requested_tokens: 5,
        });
        let start = Instant::now();

        limiter.acquire_at("busy", start);
        limiter.acquire_at("busy", start);
        assert_eq!(limiter.evict_idle(start + Duration::from_secs(2)), 0);

        // A kept bucket still remembers its deficit.
        assert!(!limiter.acquire_at("busy", start + Duration::from_secs(2)).allowed);
    }
}

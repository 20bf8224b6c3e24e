//! Per-connection WebSocket rate limiting.
//!
//! Redis round-trips are too slow to gate a per-message check, so unlike the
//! HTTP surface's sliding-window limiter (`quizbattle-api`'s
//! `middleware/rate_limit.rs`), this guards a single socket with an in-process
//! `governor` token bucket (`spec.md` §6's ambient rate-limiting note).

use std::num::NonZeroU32;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};

/// Token bucket guarding one connection's inbound client messages against a
/// flooding peer (vote/ping spam). Exceeding the quota silently drops the
/// message rather than closing the socket, which `spec.md` §7 reserves for
/// protocol violations.
pub struct ConnectionLimiter {
    limiter: DefaultDirectRateLimiter,
}

impl ConnectionLimiter {
    /// `per_minute` messages sustained, with bursts up to the same amount.
    pub fn new(per_minute: u32) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(per_minute.max(1)).unwrap());
        Self { limiter: RateLimiter::direct(quota) }
    }

    pub fn check(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_messages_within_quota() {
        let limiter = ConnectionLimiter::new(90);
        assert!(limiter.check());
    }

    #[test]
    fn rejects_once_quota_is_exhausted() {
        let limiter = ConnectionLimiter::new(1);
        assert!(limiter.check());
        assert!(!limiter.check());
    }
}

//! Per-client rate limits for the write endpoints that are cheap to abuse:
//! user registration and order creation.

use std::net::{IpAddr, Ipv4Addr};
use std::num::NonZeroU32;
use std::sync::Arc;

use actix_web::HttpRequest;
use governor::clock::Clock;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};

use crate::errors::AppError;

const fn non_zero(n: u32) -> NonZeroU32 {
    match NonZeroU32::new(n) {
        Some(v) => v,
        None => NonZeroU32::MIN,
    }
}

/// Sustained rate plus the burst a client may spend at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSettings {
    pub per_minute: NonZeroU32,
    pub burst: NonZeroU32,
}

impl RateLimitSettings {
    pub const USER_REGISTRATION: Self = Self {
        per_minute: non_zero(5),
        burst: non_zero(2),
    };

    pub const ORDER_CREATION: Self = Self {
        per_minute: non_zero(10),
        burst: non_zero(3),
    };

    fn quota(self) -> Quota {
        Quota::per_minute(self.per_minute).allow_burst(self.burst)
    }
}

/// A token bucket per client IP.
#[derive(Clone)]
pub struct KeyedLimiter {
    inner: Arc<DefaultKeyedRateLimiter<IpAddr>>,
}

impl KeyedLimiter {
    pub fn new(settings: RateLimitSettings) -> Self {
        Self {
            inner: Arc::new(RateLimiter::keyed(settings.quota())),
        }
    }

    /// Take one token for the peer behind `req`.
    ///
    /// Keyed on the socket peer address; forwarding headers are not trusted.
    /// Requests without a peer address share one bucket.
    pub fn check(&self, req: &HttpRequest) -> Result<(), AppError> {
        let key = req
            .peer_addr()
            .map(|addr| addr.ip())
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

        self.inner.check_key(&key).map_err(|not_until| {
            let wait = not_until.wait_time_from(self.inner.clock().now());
            log::warn!("rate limit exceeded for {} (retry in {:?})", key, wait);
            AppError::RateLimited {
                retry_after_secs: wait.as_secs().max(1),
            }
        })
    }

    /// Drop buckets that have refilled completely.
    pub fn retain_recent(&self) {
        self.inner.retain_recent();
    }
}

#[derive(Clone)]
pub struct RateLimits {
    pub user_registration: KeyedLimiter,
    pub order_creation: KeyedLimiter,
}

impl RateLimits {
    pub fn new(user_registration: RateLimitSettings, order_creation: RateLimitSettings) -> Self {
        Self {
            user_registration: KeyedLimiter::new(user_registration),
            order_creation: KeyedLimiter::new(order_creation),
        }
    }

    pub fn retain_recent(&self) {
        self.user_registration.retain_recent();
        self.order_creation.retain_recent();
    }
}

impl Default for RateLimits {
    fn default() -> Self {
        Self::new(
            RateLimitSettings::USER_REGISTRATION,
            RateLimitSettings::ORDER_CREATION,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn from(ip: &str) -> HttpRequest {
        TestRequest::default()
            .peer_addr(format!("{ip}:40000").parse().expect("socket addr"))
            .to_http_request()
    }

    #[test]
    fn burst_is_spent_then_rejected() {
        let limiter = KeyedLimiter::new(RateLimitSettings::USER_REGISTRATION);
        let req = from("10.0.0.1");

        assert!(limiter.check(&req).is_ok());
        assert!(limiter.check(&req).is_ok());
        let err = limiter.check(&req).unwrap_err();
        assert!(matches!(err, AppError::RateLimited { retry_after_secs } if retry_after_secs >= 1));
    }

    #[test]
    fn clients_have_separate_buckets() {
        let limiter = KeyedLimiter::new(RateLimitSettings::USER_REGISTRATION);
        let first = from("10.0.0.1");
        let second = from("10.0.0.2");

        for _ in 0..2 {
            limiter.check(&first).expect("within burst");
        }
        assert!(limiter.check(&first).is_err());
        assert!(limiter.check(&second).is_ok());
    }

    #[test]
    fn order_creation_allows_a_burst_of_three() {
        let limiter = KeyedLimiter::new(RateLimitSettings::ORDER_CREATION);
        let req = from("192.168.1.5");

        for _ in 0..3 {
            limiter.check(&req).expect("within burst");
        }
        assert!(limiter.check(&req).is_err());
    }
}

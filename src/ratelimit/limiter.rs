//! Resource registry and admission checks.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use super::bucket::TokenBucket;
use super::clock::{Clock, SystemClock};
use crate::config::EndpointLimit;

/// Milliseconds per minute, used to turn a per-minute rate into a per-ms one.
const MILLIS_PER_MINUTE: f64 = 60_000.0;

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    /// Tokens left in the resource's bucket right after the attempt
    pub remaining_tokens: u64,
    /// Whether the request may proceed
    pub admitted: bool,
}

/// Anything that can answer "may this resource proceed?".
///
/// The HTTP layer is generic over this trait rather than tied to
/// [`RateLimiter`].
pub trait RateLimiterBackend: Send + Sync {
    /// Check and consume admission for `resource`.
    fn allow_connection(&self, resource: &str) -> Admission;
}

/// Per-resource token bucket rate limiter.
///
/// Buckets are registered up front through [`add_bucket`](Self::add_bucket),
/// which needs `&mut self`; once the limiter is shared behind an `Arc` the set
/// of resources is fixed. Each bucket has its own lock, so checks against
/// different resources never contend.
pub struct RateLimiter {
    /// Token buckets indexed by resource name
    buckets: HashMap<String, Mutex<TokenBucket>>,
    /// Time source handed to buckets on every check
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Create an empty rate limiter using the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty rate limiter reading time from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            buckets: HashMap::new(),
            clock,
        }
    }

    /// Create a rate limiter with one bucket per configured endpoint.
    ///
    /// Later entries for the same endpoint replace earlier ones.
    pub fn from_limits<'a, I>(limits: I) -> Self
    where
        I: IntoIterator<Item = &'a EndpointLimit>,
    {
        let mut limiter = Self::new();
        limiter.add_limits(limits);
        limiter
    }

    /// Register a bucket for every entry in `limits`.
    pub fn add_limits<'a, I>(&mut self, limits: I)
    where
        I: IntoIterator<Item = &'a EndpointLimit>,
    {
        for limit in limits {
            self.add_bucket(&limit.endpoint, limit.burst, limit.sustained);
        }
    }

    /// Install a full bucket for `resource`, replacing any existing one.
    ///
    /// `burst` is the bucket capacity, `sustained` the number of requests per
    /// minute it refills at. Zero for either is accepted.
    pub fn add_bucket(&mut self, resource: impl Into<String>, burst: u64, sustained: u64) {
        let resource = resource.into();
        let refill_rate = sustained as f64 / MILLIS_PER_MINUTE;

        debug!(
            resource = %resource,
            burst = burst,
            sustained = sustained,
            refill_rate = refill_rate,
            "Registering token bucket"
        );

        let bucket = TokenBucket::new(burst, refill_rate, self.clock.now());
        self.buckets.insert(resource, Mutex::new(bucket));
    }

    /// Try to admit one request for `resource`.
    ///
    /// Resources without a bucket are always admitted and report zero
    /// remaining tokens. Otherwise the reported count is read from the bucket
    /// after the refill and take, under the same lock.
    pub fn allow_connection(&self, resource: &str) -> Admission {
        let Some(bucket) = self.buckets.get(resource) else {
            trace!(resource = %resource, "No bucket registered, admitting");
            return Admission {
                remaining_tokens: 0,
                admitted: true,
            };
        };

        let mut bucket = bucket.lock();
        let now = self.clock.now();
        let admitted = bucket.take_token(now);

        Admission {
            remaining_tokens: bucket.tokens(),
            admitted,
        }
    }

    /// Current token count for `resource`, without refilling.
    ///
    /// Returns `None` if no bucket is registered.
    pub fn tokens(&self, resource: &str) -> Option<u64> {
        self.buckets.get(resource).map(|b| b.lock().tokens())
    }

    /// Whether `resource` has a bucket.
    pub fn contains(&self, resource: &str) -> bool {
        self.buckets.contains_key(resource)
    }

    /// Number of registered buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiterBackend for RateLimiter {
    fn allow_connection(&self, resource: &str) -> Admission {
        RateLimiter::allow_connection(self, resource)
    }
}

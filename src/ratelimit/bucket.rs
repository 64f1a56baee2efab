//! Token bucket implementation.

use std::time::Instant;

/// A single-resource token bucket.
///
/// Tokens are refilled lazily on every take attempt, in proportion to the
/// whole milliseconds elapsed since the last refill. Fractional credit is
/// carried over in `fractional_tokens` until it adds up to a whole token.
///
/// The bucket itself is not synchronized; the owning [`RateLimiter`] wraps
/// each bucket in its own mutex.
///
/// [`RateLimiter`]: super::RateLimiter
#[derive(Debug, Clone)]
pub struct TokenBucket {
    /// Maximum number of tokens the bucket can hold
    capacity: u64,
    /// Tokens currently available, always `<= capacity`
    tokens: u64,
    /// Tokens credited per elapsed millisecond
    refill_rate: f64,
    /// Accumulated credit not yet promoted to a whole token, in `[0, 1)`
    fractional_tokens: f64,
    /// When tokens were last credited
    last_refill: Instant,
}

impl TokenBucket {
    /// Create a full bucket.
    pub fn new(capacity: u64, refill_rate: f64, now: Instant) -> Self {
        Self {
            capacity,
            tokens: capacity,
            refill_rate,
            fractional_tokens: 0.0,
            last_refill: now,
        }
    }

    /// Credit tokens for the time elapsed since the last refill.
    ///
    /// A refill that yields no credit at all leaves the refill clock where it
    /// was, so slow rates still accumulate across frequent calls.
    pub fn refill(&mut self, now: Instant) {
        let elapsed_ms = now.saturating_duration_since(self.last_refill).as_millis() as f64;
        let refill_amount = elapsed_ms * self.refill_rate;

        let mut whole_tokens = refill_amount.floor() as u64;
        self.fractional_tokens += refill_amount - refill_amount.floor();

        if self.fractional_tokens >= 1.0 {
            whole_tokens = whole_tokens.saturating_add(1);
            self.fractional_tokens -= 1.0;
        }

        if refill_amount > 0.0 {
            self.tokens = self.tokens.saturating_add(whole_tokens).min(self.capacity);
            self.last_refill = now;
        }
    }

    /// Refill, then try to consume one token.
    ///
    /// Returns `false` without touching the count when the bucket is empty.
    pub fn take_token(&mut self, now: Instant) -> bool {
        self.refill(now);

        if self.tokens == 0 {
            return false;
        }

        self.tokens -= 1;
        true
    }

    /// Maximum number of tokens.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Tokens available as of the last refill.
    pub fn tokens(&self) -> u64 {
        self.tokens
    }

    /// Tokens credited per millisecond.
    pub fn refill_rate(&self) -> f64 {
        self.refill_rate
    }

    /// Carried-over fractional credit.
    pub fn fractional_tokens(&self) -> f64 {
        self.fractional_tokens
    }
}

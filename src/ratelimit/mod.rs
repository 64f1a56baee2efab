//! Token bucket rate limiting and the per-resource registry.

mod bucket;
mod clock;
mod limiter;

pub use bucket::TokenBucket;
pub use clock::{Clock, ManualClock, SystemClock};
pub use limiter::{Admission, RateLimiter, RateLimiterBackend};

//! Turnstile - Per-Resource Admission Control Service
//!
//! This crate decides, for each request tagged with a resource name (such as
//! an API route template), whether to admit or reject it. Every registered
//! resource gets its own token bucket with an independent burst capacity and
//! sustained per-minute rate; resources without a bucket are unrestricted.

pub mod config;
pub mod error;
pub mod http;
pub mod ratelimit;

//! HTTP client module
//!
//! Provides the JSON client used by HTTP-backed job repositories.
//!
//! # Features
//!
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Status Classification**: Non-2xx responses become errors carrying the body

mod client;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};

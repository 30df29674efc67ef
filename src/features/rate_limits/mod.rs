//! Per-address throttling for the unauthenticated whistleblowing surface.

pub mod services;

pub use services::{RateLimitScope, RateLimitService};

//! # Utility Modules
//!
//! Supporting utilities for the routing core.
//!
//! ## Components
//! - **Metrics**: Thread-safe observability counters

pub mod metrics;

pub use metrics::Metrics;

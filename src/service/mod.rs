//! # Service Layer
//!
//! Server lifecycle orchestration.

pub mod server;

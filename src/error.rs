//! # Error Types
//!
//! Error handling for the routing core.
//!
//! This module defines all error variants that can occur during server operations,
//! from low-level I/O errors to registry wiring failures.
//!
//! ## Error Categories
//! - **I/O Errors**: Socket and bind failures
//! - **Codec Errors**: Invalid frames, oversized payloads, version mismatches
//! - **Registry Errors**: Duplicate keys, missing or mismatched components
//! - **Lifecycle Errors**: Calls made in the wrong server state
//!
//! All errors implement `std::error::Error` for interoperability.

use std::io;
use thiserror::Error;

/// RouterError is the primary error type for all server operations
#[derive(Error, Debug)]
pub enum RouterError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to bind {addr}: {source}")]
    Bind { addr: String, source: io::Error },

    #[error("invalid packet header")]
    InvalidHeader,

    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    #[error("packet body too large: {0} bytes")]
    OversizedPacket(usize),

    #[error("packet namespace too long: {0} bytes")]
    OversizedNamespace(usize),

    #[error("duplicate handler key: {0:#04x}")]
    DuplicateHandlerKey(u8),

    #[error("duplicate component name: {0}")]
    DuplicateComponent(String),

    #[error("no component registered under name: {0}")]
    ComponentNotFound(String),

    #[error("component {name} is not of the expected type {expected}")]
    ComponentTypeMismatch {
        name: String,
        expected: &'static str,
    },

    #[error("handler construction failed: {0}")]
    HandlerBuild(String),

    #[error("handler error: {0}")]
    Handler(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("invalid lifecycle transition: {op}() called while server is {actual}")]
    InvalidState { op: &'static str, actual: &'static str },
}

/// Type alias for Results using RouterError
pub type Result<T> = std::result::Result<T, RouterError>;

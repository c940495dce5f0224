//! # Registries
//!
//! Shared-singleton wiring for the server: named components and the
//! key-indexed handler table.
//!
//! Both registries are built exactly once during `init()`, are immutable for
//! the server's running lifetime, and are released exactly once during
//! `stop()` - handlers first, then components.

pub mod components;
pub mod handlers;

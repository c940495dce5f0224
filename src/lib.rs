//! # packet-router
//!
//! Bootstrap and request-routing core for packet-oriented TCP servers.
//!
//! The crate accepts connections, decodes framed messages, routes each
//! message to exactly one pluggable business handler by a single-byte
//! command code, and manages the lifecycle of shared runtime components and
//! thread pools.
//!
//! ## Architecture
//!
//! ```text
//!  acceptor pool          I/O pool                business pool
//! ┌─────────────┐   ┌───────────────────┐   ┌─────────────────────┐
//! │ accept loop │──>│ decode ── encode  │──>│ dispatch ── handler │
//! └─────────────┘   └───────────────────┘   └──────────┬──────────┘
//!                                                      │
//!                       ┌──────────────────┐   ┌───────┴────────┐
//!                       │ ComponentRegistry │<──│ HandlerRegistry │
//!                       └──────────────────┘   └────────────────┘
//! ```
//!
//! Handler code is the only part of the core expected to block or perform
//! downstream I/O, and it always runs on the business pool so slow handlers
//! never stall connection acceptance or framing. Each connection's packets
//! dispatch in arrival order through a dedicated serial lane; packets on
//! different connections dispatch concurrently.
//!
//! ## Quick Start
//!
//! ```ignore
//! use packet_router::{Packet, Server, ServerConfig};
//! use packet_router::registry::components::ComponentRegistry;
//! use packet_router::registry::handlers::Handler;
//!
//! struct Ping;
//!
//! impl Handler for Ping {
//!     fn key(&self) -> u8 { 0x01 }
//!     fn on_receive(
//!         &self,
//!         packet: Packet,
//!         _remote: std::net::SocketAddr,
//!     ) -> packet_router::Result<Option<Packet>> {
//!         Ok(Some(packet.reply(&b"pong"[..])))
//!     }
//! }
//!
//! fn main() -> packet_router::Result<()> {
//!     let mut server = Server::builder()
//!         .handler(|_: &ComponentRegistry| Ok(Box::new(Ping) as _))
//!         .build();
//!     server.init(ServerConfig::default())?;
//!     server.start()?;
//!     // ... run until told otherwise ...
//!     server.stop()
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`config`]: server configuration with TOML and environment loading
//! - [`core`]: packet model and framing codec
//! - [`registry`]: component and handler registries
//! - [`protocol`]: the dispatcher
//! - [`service`]: server lifecycle (init/start/stop)
//! - [`utils`]: metrics counters
//!
//! The crate emits `tracing` events but installs no subscriber; that is the
//! embedding binary's job.

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod service;
pub(crate) mod transport;
pub mod utils;

// Re-export commonly used types for convenience
pub use crate::config::ServerConfig;
pub use crate::core::codec::PacketCodec;
pub use crate::core::packet::Packet;
pub use crate::error::{Result, RouterError};
pub use crate::protocol::dispatcher::Dispatcher;
pub use crate::registry::components::{Component, ComponentRegistry};
pub use crate::registry::handlers::{Handler, HandlerFactory, HandlerRegistry};
pub use crate::service::server::{LifecycleState, Server, ServerBuilder};
pub use crate::utils::metrics::Metrics;

/// Version of packet-router
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

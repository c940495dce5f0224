//! # Core Protocol Components
//!
//! Low-level packet model and framing codec.
//!
//! This module provides the foundation for the routing core: the in-memory
//! packet representation and the tokio codec that frames it over byte streams.
//!
//! ## Components
//! - **Packet**: command key, namespace, and body
//! - **Codec**: Tokio codec for framing over byte streams
//!
//! ## Wire Format
//! ```text
//! [Magic(4)] [Version(1)] [Key(1)] [NsLen(2)] [BodyLen(4)] [Namespace(N)] [Body(M)]
//! ```
//!
//! ## Security
//! - Maximum body size: 16MB (prevents memory exhaustion)
//! - Magic bytes prevent accidental misinterpretation
//! - Length validation before allocation

pub mod codec;
pub mod packet;

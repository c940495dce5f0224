//! # Packet Model
//!
//! The unit of routing: a one-byte command key, a diagnostic namespace,
//! and an opaque body.
//!
//! Packets are immutable once constructed. The core never interprets the
//! body; it belongs to whichever handler owns the key.

use bytes::Bytes;

/// A decoded protocol message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Command code selecting the handler (0-255 key space)
    pub key: u8,
    /// Diagnostic/routing hint, logged when no handler owns the key
    pub namespace: String,
    /// Opaque payload, owned by the handler
    pub body: Bytes,
}

impl Packet {
    /// Create a new packet
    pub fn new(key: u8, namespace: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            key,
            namespace: namespace.into(),
            body: body.into(),
        }
    }

    /// Build a response carrying this packet's key and namespace with a new body
    pub fn reply(&self, body: impl Into<Bytes>) -> Self {
        Self {
            key: self.key,
            namespace: self.namespace.clone(),
            body: body.into(),
        }
    }

    /// Size of this packet on the wire, header included
    pub fn encoded_len(&self) -> usize {
        crate::core::codec::HEADER_LEN + self.namespace.len() + self.body.len()
    }
}

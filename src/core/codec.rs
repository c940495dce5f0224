//! # Framing Codec
//!
//! `tokio_util` codec that frames [`Packet`]s over a byte stream.
//!
//! The decoder validates magic bytes, protocol version, and length fields
//! before allocating, and leaves partial frames in the buffer untouched so
//! the next read can complete them. The codec is public so clients and tests
//! can round-trip frames with the same implementation the server uses.

use crate::config::{MAGIC_BYTES, MAX_BODY_SIZE, PROTOCOL_VERSION};
use crate::core::packet::Packet;
use crate::error::RouterError;
use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// Fixed header size: magic(4) + version(1) + key(1) + ns_len(2) + body_len(4)
pub const HEADER_LEN: usize = 12;

/// Stateless framing codec for [`Packet`]
#[derive(Debug, Default, Clone, Copy)]
pub struct PacketCodec;

impl Decoder for PacketCodec {
    type Item = Packet;
    type Error = RouterError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Packet>, RouterError> {
        if src.len() < HEADER_LEN {
            return Ok(None);
        }

        if src[0..4] != MAGIC_BYTES {
            return Err(RouterError::InvalidHeader);
        }

        let version = src[4];
        if version != PROTOCOL_VERSION {
            return Err(RouterError::UnsupportedVersion(version));
        }

        let key = src[5];
        let ns_len = u16::from_be_bytes([src[6], src[7]]) as usize;
        let body_len = u32::from_be_bytes([src[8], src[9], src[10], src[11]]) as usize;

        // Validate claimed length before reserving anything
        if body_len > MAX_BODY_SIZE {
            return Err(RouterError::OversizedPacket(body_len));
        }

        let frame_len = HEADER_LEN + ns_len + body_len;
        if src.len() < frame_len {
            src.reserve(frame_len - src.len());
            return Ok(None);
        }

        src.advance(HEADER_LEN);
        let namespace = String::from_utf8(src.split_to(ns_len).to_vec())
            .map_err(|_| RouterError::InvalidHeader)?;
        let body = src.split_to(body_len).freeze();

        Ok(Some(Packet {
            key,
            namespace,
            body,
        }))
    }
}

impl Encoder<Packet> for PacketCodec {
    type Error = RouterError;

    fn encode(&mut self, packet: Packet, dst: &mut BytesMut) -> Result<(), RouterError> {
        if packet.namespace.len() > u16::MAX as usize {
            return Err(RouterError::OversizedNamespace(packet.namespace.len()));
        }
        if packet.body.len() > MAX_BODY_SIZE {
            return Err(RouterError::OversizedPacket(packet.body.len()));
        }

        dst.reserve(packet.encoded_len());
        dst.put_slice(&MAGIC_BYTES);
        dst.put_u8(PROTOCOL_VERSION);
        dst.put_u8(packet.key);
        dst.put_u16(packet.namespace.len() as u16);
        dst.put_u32(packet.body.len() as u32);
        dst.put_slice(packet.namespace.as_bytes());
        dst.put_slice(&packet.body);

        Ok(())
    }
}

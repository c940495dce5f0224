//! # Protocol Logic
//!
//! Packet routing above the codec layer.

pub mod dispatcher;

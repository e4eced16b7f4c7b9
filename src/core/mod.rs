//! # Core Protocol Components
//!
//! Packet contract, byte cursor, packet vault and frame codec.
//!
//! This module provides the foundation for the protocol: how packets serialize their fields,
//! how packet types map to wire ids, and how one packet becomes one frame.
//!
//! ## Components
//! - **ByteCursor**: fixed-width and length-prefixed field primitives
//! - **Packet**: the contract every message type implements
//! - **PacketVault**: registration-ordered type <-> id registry
//! - **FrameCodec**: id-prefixed frame encoding and decoding
//!
//! ## Wire Format
//! ```text
//! [Packet id: u32 BE (4)] [Payload(N)]
//! ```
//!
//! ## Safety
//! - Reads are bounds-checked and never panic on short frames
//! - Length prefixes are validated before allocation
//! - Unknown ids are rejected before any instance is constructed

pub mod codec;
pub mod cursor;
pub mod packet;
pub mod vault;

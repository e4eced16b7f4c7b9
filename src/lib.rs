//! # packet-delivery
//!
//! Typed binary packets between two peers over an already-connected, frame-delimited byte
//! stream.
//!
//! - [`core::vault::PacketVault`] maps packet types to dense wire ids by registration order.
//! - [`core::codec::FrameCodec`] frames a packet as `[id: u32 BE][payload]`; each packet
//!   writes and reads its own payload through a [`core::cursor::ByteCursor`].
//! - [`protocol::EventRouter`] invokes handlers registered for the decoded packet's type,
//!   in priority order, after the global handlers.
//! - [`transport`] holds the interfaces expected from the surrounding transport plus a
//!   `tokio` stream adapter.
//!
//! Both peers must build identical vaults (same types, same order) before connecting.
//!
//! ```rust
//! use std::sync::Arc;
//! use packet_delivery::prelude::*;
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Ping {
//!     seq: i32,
//! }
//!
//! impl Packet for Ping {
//!     fn write(&self, cursor: &mut ByteCursor<'_>) -> Result<()> {
//!         cursor.write_int(self.seq);
//!         Ok(())
//!     }
//!
//!     fn read(&mut self, cursor: &mut ByteCursor<'_>) -> Result<()> {
//!         self.seq = cursor.read_int()?;
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let mut vault = PacketVault::new();
//! vault.register::<Ping>()?;
//! let codec = FrameCodec::new(Arc::new(vault));
//!
//! let mut router = EventRouter::new();
//! router.register(EventHandler::on::<Ping, _>(Priority::High, |ping| {
//!     assert_eq!(ping.seq, 7);
//!     Ok(())
//! }))?;
//!
//! let frame = codec.encode_to_bytes(&Ping { seq: 7 })?;
//! let packet = codec.decode_bytes(&frame)?;
//! router.dispatch(&*packet)?;
//! # Ok(())
//! # }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod transport;
pub mod utils;

pub use crate::core::codec::FrameCodec;
pub use crate::core::cursor::ByteCursor;
pub use crate::core::packet::{Packet, PacketKind};
pub use crate::core::vault::{PacketId, PacketVault};
pub use crate::error::{ProtocolError, Result};
pub use crate::protocol::{EventHandler, EventRouter, HandlerContext, Priority};

/// Everything needed to define packets and wire up a vault, codec and router.
pub mod prelude {
    pub use crate::config::{DispatchPolicy, ProtocolConfig};
    pub use crate::core::codec::FrameCodec;
    pub use crate::core::cursor::ByteCursor;
    pub use crate::core::packet::{Packet, PacketKind};
    pub use crate::core::vault::{PacketId, PacketVault};
    pub use crate::error::{ProtocolError, Result};
    pub use crate::protocol::{EventHandler, EventRouter, HandlerContext, Priority};
    pub use crate::transport::{Broadcast, ChannelSink, Endpoint, FrameSink};
}

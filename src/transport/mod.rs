//! # Transport Glue
//!
//! Connection management lives outside this crate. This module holds the interfaces the core
//! needs from a transport and a thin adapter for `tokio` byte streams.
//!
//! ## Components
//! - **FrameSink**: delivers one encoded frame to one peer
//! - **Broadcast**: delivers one frame to every connected peer
//! - **ChannelSink**: `FrameSink` over an unbounded `tokio` channel
//! - **FramedPacketCodec**: length-delimits frames on a stream and runs the frame codec
//! - **Endpoint**: ties a codec and a router to a stream

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::warn;

use crate::error::{ProtocolError, Result};

pub mod endpoint;
pub mod framed;

pub use endpoint::Endpoint;
pub use framed::FramedPacketCodec;

/// Sends encoded frames to a single peer.
///
/// Shared with handlers on any thread, hence `Send + Sync`.
pub trait FrameSink: Send + Sync {
    fn send(&self, frame: Bytes) -> Result<()>;
}

/// Sends encoded frames to every currently connected peer.
pub trait Broadcast {
    /// Returns how many peers the frame reached.
    fn broadcast_all(&self, frame: Bytes) -> Result<usize>;
}

impl<S: FrameSink> Broadcast for [S] {
    fn broadcast_all(&self, frame: Bytes) -> Result<usize> {
        let mut reached = 0;
        for sink in self {
            // one dead peer must not starve the rest
            match sink.send(frame.clone()) {
                Ok(()) => reached += 1,
                Err(e) => warn!(error = %e, "Skipping peer during broadcast"),
            }
        }
        Ok(reached)
    }
}

impl<S: FrameSink> Broadcast for Vec<S> {
    fn broadcast_all(&self, frame: Bytes) -> Result<usize> {
        self.as_slice().broadcast_all(frame)
    }
}

/// Frame sink feeding an unbounded channel, typically drained by [`Endpoint::run`].
///
/// The channel is unbounded so handlers can reply without blocking the read loop.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Bytes>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Bytes>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl FrameSink for ChannelSink {
    fn send(&self, frame: Bytes) -> Result<()> {
        self.tx
            .send(frame)
            .map_err(|_| ProtocolError::ConnectionClosed)
    }
}

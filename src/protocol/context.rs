//! Per-dispatch context handed to every handler: the connection the packet arrived on.

use std::fmt;

use crate::core::codec::FrameCodec;
use crate::core::packet::Packet;
use crate::error::{ProtocolError, Result};
use crate::transport::FrameSink;

/// Where a packet came from.
///
/// One router serves every connection, so replies must go through the context rather than a
/// sink captured when the handler was built.
#[derive(Clone, Copy)]
pub struct HandlerContext<'a> {
    peer: Option<Peer<'a>>,
}

#[derive(Clone, Copy)]
struct Peer<'a> {
    codec: &'a FrameCodec,
    sink: &'a dyn FrameSink,
}

impl<'a> HandlerContext<'a> {
    /// Context for a packet received from `sink`, replies encoded with `codec`.
    pub fn new(codec: &'a FrameCodec, sink: &'a dyn FrameSink) -> Self {
        Self {
            peer: Some(Peer { codec, sink }),
        }
    }

    /// Context for a packet that did not arrive on a connection, e.g. a local dispatch.
    pub fn detached() -> Self {
        Self { peer: None }
    }

    pub fn is_detached(&self) -> bool {
        self.peer.is_none()
    }

    /// Encode `packet` and send it back to the originating peer.
    ///
    /// Fails with [`ProtocolError::ConnectionClosed`] on a detached context.
    pub fn reply(&self, packet: &dyn Packet) -> Result<()> {
        let peer = self.peer.ok_or(ProtocolError::ConnectionClosed)?;
        let frame = peer.codec.encode_to_bytes(packet)?;
        peer.sink.send(frame)
    }

    /// Sink of the originating peer, for already-encoded frames.
    pub fn peer(&self) -> Option<&'a dyn FrameSink> {
        self.peer.map(|peer| peer.sink)
    }
}

impl fmt::Debug for HandlerContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerContext")
            .field("detached", &self.is_detached())
            .finish()
    }
}

use std::sync::Arc;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info, instrument, warn};

use crate::core::codec::FrameCodec;
use crate::core::packet::Packet;
use crate::error::Result;
use crate::protocol::context::HandlerContext;
use crate::protocol::router::EventRouter;
use crate::transport::{Broadcast, ChannelSink, FrameSink, FramedPacketCodec};
use crate::utils::metrics::Timer;

/// One side of a conversation: a frozen codec and router shared by every connection.
#[derive(Debug, Clone)]
pub struct Endpoint {
    codec: Arc<FrameCodec>,
    router: Arc<EventRouter>,
}

impl Endpoint {
    /// Freeze a fully populated codec and router.
    pub fn new(codec: FrameCodec, router: EventRouter) -> Self {
        Self::from_shared(Arc::new(codec), Arc::new(router))
    }

    pub fn from_shared(codec: Arc<FrameCodec>, router: Arc<EventRouter>) -> Self {
        Self { codec, router }
    }

    pub fn codec(&self) -> &Arc<FrameCodec> {
        &self.codec
    }

    pub fn router(&self) -> &Arc<EventRouter> {
        &self.router
    }

    /// Encode `packet` and hand it to one peer.
    pub fn send<S: FrameSink + ?Sized>(&self, sink: &S, packet: &dyn Packet) -> Result<()> {
        let frame = self.codec.encode_to_bytes(packet)?;
        sink.send(frame)
    }

    /// Encode `packet` once and hand it to every peer in `group`.
    pub fn broadcast<B: Broadcast + ?Sized>(&self, group: &B, packet: &dyn Packet) -> Result<usize> {
        let frame = self.codec.encode_to_bytes(packet)?;
        group.broadcast_all(frame)
    }

    /// Decode exactly one frame received from `peer` and dispatch the packet it carries.
    pub fn handle_frame(&self, frame: &[u8], peer: &dyn FrameSink) -> Result<()> {
        let _timer = Timer::start("handle_frame");
        let packet = self.codec.decode_bytes(frame)?;
        self.router
            .dispatch_with(&*packet, &HandlerContext::new(&self.codec, peer))
    }

    /// Pump a length-delimited stream for one connection: decode and dispatch every inbound
    /// frame, and write every frame received on `outbound`.
    ///
    /// `peer` is the sending half of `outbound`; handlers reply through it via their
    /// [`HandlerContext`]. Reading and writing run concurrently, so a write blocked on a full
    /// stream never stops inbound frames from being drained.
    ///
    /// Returns `Ok(())` when the peer closes the stream. Returns the error on the first fatal
    /// protocol error; the caller must drop the connection. Non-fatal handler errors are
    /// logged and the loop continues.
    #[instrument(skip_all, level = "debug")]
    pub async fn run<T>(
        &self,
        io: T,
        peer: ChannelSink,
        outbound: mpsc::UnboundedReceiver<Bytes>,
    ) -> Result<()>
    where
        T: AsyncRead + AsyncWrite + Unpin,
    {
        let (reader, writer) = tokio::io::split(io);
        let inbound = self.read_frames(
            FramedRead::new(reader, FramedPacketCodec::new(self.codec.clone())),
            &peer,
        );
        let outbound = Self::write_frames(
            FramedWrite::new(writer, FramedPacketCodec::new(self.codec.clone())),
            outbound,
        );
        tokio::pin!(inbound);
        tokio::pin!(outbound);

        tokio::select! {
            result = &mut inbound => result,
            result = &mut outbound => {
                result?;
                inbound.await
            }
        }
    }

    async fn read_frames<R>(
        &self,
        mut frames: FramedRead<R, FramedPacketCodec>,
        peer: &ChannelSink,
    ) -> Result<()>
    where
        R: AsyncRead + Unpin,
    {
        while let Some(packet) = frames.next().await {
            let packet = packet?;
            let ctx = HandlerContext::new(&self.codec, peer);
            if let Err(e) = self.router.dispatch_with(&*packet, &ctx) {
                if e.is_fatal() {
                    return Err(e);
                }
                warn!(error = %e, "Dispatch failed, keeping connection");
            }
        }

        info!("Peer closed the stream");
        Ok(())
    }

    async fn write_frames<W>(
        mut frames: FramedWrite<W, FramedPacketCodec>,
        mut outbound: mpsc::UnboundedReceiver<Bytes>,
    ) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        while let Some(frame) = outbound.recv().await {
            frames.send(frame).await?;
        }

        debug!("Outbound channel closed");
        Ok(())
    }
}

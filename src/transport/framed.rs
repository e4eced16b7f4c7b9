//! Stream adapter: a `tokio_util` codec that delimits frames with a `u32` length prefix and
//! decodes each frame into a packet.
//!
//! ## Wire Format on the stream
//! ```text
//! [Length: u32 BE (4)] [Packet id: u32 BE (4)] [Payload(N)]
//! ```
//! The length prefix belongs to the transport; [`FrameCodec`] never sees it.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder, LengthDelimitedCodec};

use crate::core::codec::FrameCodec;
use crate::core::cursor::ByteCursor;
use crate::core::packet::Packet;
use crate::error::ProtocolError;

#[derive(Debug)]
pub struct FramedPacketCodec {
    delimiter: LengthDelimitedCodec,
    codec: Arc<FrameCodec>,
}

impl FramedPacketCodec {
    pub fn new(codec: Arc<FrameCodec>) -> Self {
        let delimiter = LengthDelimitedCodec::builder()
            .length_field_length(4)
            .max_frame_length(codec.config().max_frame_size)
            .big_endian()
            .new_codec();
        Self { delimiter, codec }
    }
}

impl Decoder for FramedPacketCodec {
    type Item = Box<dyn Packet>;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.delimiter.decode(src)? {
            Some(mut frame) => self
                .codec
                .decode(&mut ByteCursor::new(&mut frame))
                .map(Some),
            None => Ok(None),
        }
    }
}

/// Already-encoded frames, e.g. drained from a [`ChannelSink`](super::ChannelSink).
impl Encoder<Bytes> for FramedPacketCodec {
    type Error = ProtocolError;

    fn encode(&mut self, frame: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.delimiter.encode(frame, dst)?;
        Ok(())
    }
}

impl Encoder<Box<dyn Packet>> for FramedPacketCodec {
    type Error = ProtocolError;

    fn encode(&mut self, packet: Box<dyn Packet>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let frame = self.codec.encode_to_bytes(&*packet)?;
        self.delimiter.encode(frame, dst)?;
        Ok(())
    }
}

//! # Frame Codec
//!
//! Turns a [`Packet`] into an id-prefixed frame and back.
//!
//! ```text
//! [Packet id: u32 BE (4)] [Payload(N), written by Packet::write]
//! ```
//!
//! No length field is written: the transport must hand exactly one complete frame to every
//! [`FrameCodec::decode`] call. See [`crate::transport::framed`] for a delimiter that does
//! this over a byte stream.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace, warn};

use crate::config::{CodecConfig, FRAME_HEADER_SIZE};
use crate::core::cursor::ByteCursor;
use crate::core::packet::Packet;
use crate::core::vault::PacketVault;
use crate::error::{constants, ProtocolError, Result};
use crate::utils::metrics::global_metrics;

/// Encoder and decoder bound to one vault.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    vault: Arc<PacketVault>,
    config: CodecConfig,
}

impl FrameCodec {
    pub fn new(vault: Arc<PacketVault>) -> Self {
        Self::with_config(vault, CodecConfig::default())
    }

    pub fn with_config(vault: Arc<PacketVault>, config: CodecConfig) -> Self {
        Self { vault, config }
    }

    pub fn vault(&self) -> &Arc<PacketVault> {
        &self.vault
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Append one frame for `packet` to the cursor.
    ///
    /// On failure nothing this call wrote stays in the buffer. `Packet::write` must only
    /// append; one that reads from the cursor fails the encode.
    pub fn encode(&self, packet: &dyn Packet, cursor: &mut ByteCursor<'_>) -> Result<()> {
        let result = self.encode_inner(packet, cursor);
        match &result {
            Ok(len) => {
                global_metrics().frame_encoded(*len as u64);
                trace!(packet = packet.packet_name(), len, "Encoded frame");
            }
            Err(e) => {
                global_metrics().encode_error();
                debug!(packet = packet.packet_name(), error = %e, "Failed to encode frame");
            }
        }
        result.map(|_| ())
    }

    fn encode_inner(&self, packet: &dyn Packet, cursor: &mut ByteCursor<'_>) -> Result<usize> {
        let id = self.vault.id_of_packet(packet)?;
        let start = cursor.mark();

        cursor.write_u32(id);
        if let Err(e) = packet.write(cursor) {
            cursor.rollback(start);
            return Err(e);
        }

        // write may only append; a shorter buffer means it read bytes it does not own
        let Some(len) = cursor.mark().checked_sub(start) else {
            return Err(ProtocolError::Custom(
                constants::ERR_WRITE_CONSUMED.to_string(),
            ));
        };
        if len > self.config.max_frame_size {
            cursor.rollback(start);
            return Err(ProtocolError::OversizedFrame(len));
        }
        Ok(len)
    }

    /// Encode a packet into a standalone frame.
    pub fn encode_to_bytes(&self, packet: &dyn Packet) -> Result<Bytes> {
        let mut buf = BytesMut::new();
        self.encode(packet, &mut ByteCursor::new(&mut buf))?;
        Ok(buf.freeze())
    }

    /// Read exactly one frame from the cursor and build the packet it carries.
    ///
    /// Every error is fatal to the connection the frame came from.
    pub fn decode(&self, cursor: &mut ByteCursor<'_>) -> Result<Box<dyn Packet>> {
        let len = cursor.remaining();
        match self.decode_inner(cursor) {
            Ok(packet) => {
                global_metrics().frame_decoded(len as u64);
                trace!(packet = (*packet).packet_name(), len, "Decoded frame");
                Ok(packet)
            }
            Err(e) => {
                global_metrics().decode_error();
                warn!(len, error = %e, "Failed to decode frame");
                Err(e)
            }
        }
    }

    fn decode_inner(&self, cursor: &mut ByteCursor<'_>) -> Result<Box<dyn Packet>> {
        let len = cursor.remaining();
        if len > self.config.max_frame_size {
            return Err(ProtocolError::OversizedFrame(len));
        }
        if len < FRAME_HEADER_SIZE {
            return Err(ProtocolError::Truncated {
                needed: FRAME_HEADER_SIZE,
                remaining: len,
            });
        }

        let id = cursor.read_u32()?;
        let mut packet = self.vault.instantiate(id)?;
        packet.read(cursor)?;

        if self.config.reject_trailing_bytes && !cursor.is_empty() {
            return Err(ProtocolError::TrailingBytes(cursor.remaining()));
        }
        Ok(packet)
    }

    /// Decode a standalone frame.
    pub fn decode_bytes(&self, frame: &[u8]) -> Result<Box<dyn Packet>> {
        let mut buf = BytesMut::from(frame);
        self.decode(&mut ByteCursor::new(&mut buf))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Ping {
        seq: i32,
    }

    impl Packet for Ping {
        fn write(&self, cursor: &mut ByteCursor<'_>) -> Result<()> {
            cursor.write_int(self.seq);
            Ok(())
        }

        fn read(&mut self, cursor: &mut ByteCursor<'_>) -> Result<()> {
            self.seq = cursor.read_int()?;
            Ok(())
        }
    }

    #[derive(Debug, Default, PartialEq)]
    struct Greeting {
        name: String,
    }

    impl Packet for Greeting {
        fn write(&self, cursor: &mut ByteCursor<'_>) -> Result<()> {
            cursor.write_int(1);
            cursor.write_string(&self.name)
        }

        fn read(&mut self, cursor: &mut ByteCursor<'_>) -> Result<()> {
            cursor.read_int()?;
            self.name = cursor.read_string()?;
            Ok(())
        }
    }

    fn codec() -> FrameCodec {
        let vault = PacketVault::new()
            .with::<Ping>()
            .and_then(|v| v.with::<Greeting>())
            .unwrap();
        FrameCodec::new(Arc::new(vault))
    }

    #[test]
    fn test_frame_layout() {
        let frame = codec().encode_to_bytes(&Greeting { name: "a".into() }).unwrap();
        assert_eq!(
            &frame[..],
            &[0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, b'a'][..]
        );
    }

    #[test]
    fn test_roundtrip() {
        let codec = codec();
        let frame = codec.encode_to_bytes(&Ping { seq: 7 }).unwrap();
        let decoded = codec.decode_bytes(&frame).unwrap();
        assert_eq!(decoded.downcast_ref::<Ping>(), Some(&Ping { seq: 7 }));
    }

    #[test]
    fn test_failed_write_rolls_back() {
        let codec = codec();
        let mut buf = BytesMut::new();
        let mut cursor = ByteCursor::new(&mut buf);
        codec.encode(&Ping { seq: 1 }, &mut cursor).unwrap();

        let err = codec
            .encode(&Greeting { name: String::new() }, &mut cursor)
            .unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidStringWrite));
        // only the first frame remains
        assert_eq!(buf.len(), 8);
    }

    #[derive(Debug, Default)]
    struct Greedy;

    impl Packet for Greedy {
        fn write(&self, cursor: &mut ByteCursor<'_>) -> Result<()> {
            cursor.read_long()?;
            Ok(())
        }

        fn read(&mut self, _cursor: &mut ByteCursor<'_>) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_that_consumes_buffer_fails() {
        let vault = PacketVault::new()
            .with::<Ping>()
            .and_then(|v| v.with::<Greedy>())
            .unwrap();
        let codec = FrameCodec::new(Arc::new(vault));

        let mut buf = BytesMut::new();
        let mut cursor = ByteCursor::new(&mut buf);
        codec.encode(&Ping { seq: 1 }, &mut cursor).unwrap();

        let err = codec.encode(&Greedy, &mut cursor).unwrap_err();
        assert!(
            matches!(err, ProtocolError::Custom(ref msg) if msg == constants::ERR_WRITE_CONSUMED)
        );
    }

    #[test]
    fn test_trailing_bytes() {
        let codec = codec();
        let mut frame = codec.encode_to_bytes(&Ping { seq: 3 }).unwrap().to_vec();
        frame.push(0xAA);
        assert!(matches!(
            codec.decode_bytes(&frame),
            Err(ProtocolError::TrailingBytes(1))
        ));

        let lenient = FrameCodec::with_config(
            codec.vault().clone(),
            CodecConfig {
                reject_trailing_bytes: false,
                ..CodecConfig::default()
            },
        );
        assert!(lenient.decode_bytes(&frame).is_ok());
    }

    #[test]
    fn test_oversized_frames() {
        let codec = FrameCodec::with_config(
            codec().vault().clone(),
            CodecConfig {
                max_frame_size: 6,
                ..CodecConfig::default()
            },
        );
        assert!(matches!(
            codec.encode_to_bytes(&Ping { seq: 1 }),
            Err(ProtocolError::OversizedFrame(8))
        ));
        assert!(matches!(
            codec.decode_bytes(&[0u8; 8]),
            Err(ProtocolError::OversizedFrame(8))
        ));
    }

    #[test]
    fn test_short_header() {
        assert!(matches!(
            codec().decode_bytes(&[0, 0]),
            Err(ProtocolError::Truncated {
                needed: 4,
                remaining: 2
            })
        ));
    }
}

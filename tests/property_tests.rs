//! Property-based tests using proptest
//!
//! These tests validate codec and vault invariants across randomly generated packets and
//! arbitrary byte input.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use bytes::BytesMut;
use packet_delivery::core::codec::FrameCodec;
use packet_delivery::core::cursor::ByteCursor;
use packet_delivery::core::packet::{Packet, PacketKind};
use packet_delivery::core::vault::PacketVault;
use packet_delivery::error::Result;
use proptest::prelude::*;

#[derive(Debug, Default, Clone, PartialEq)]
struct Telemetry {
    alive: bool,
    channel: i8,
    port: i16,
    sequence: i32,
    timestamp: i64,
    ratio: f32,
    position: f64,
    label: String,
    tags: Vec<String>,
    blob: Vec<u8>,
}

impl Packet for Telemetry {
    fn write(&self, cursor: &mut ByteCursor<'_>) -> Result<()> {
        cursor.write_bool(self.alive);
        cursor.write_byte(self.channel);
        cursor.write_short(self.port);
        cursor.write_int(self.sequence);
        cursor.write_long(self.timestamp);
        cursor.write_float(self.ratio);
        cursor.write_double(self.position);
        cursor.write_string(&self.label)?;
        cursor.write_string_list(&self.tags)?;
        cursor.write_bytes(&self.blob)
    }

    fn read(&mut self, cursor: &mut ByteCursor<'_>) -> Result<()> {
        self.alive = cursor.read_bool()?;
        self.channel = cursor.read_byte()?;
        self.port = cursor.read_short()?;
        self.sequence = cursor.read_int()?;
        self.timestamp = cursor.read_long()?;
        self.ratio = cursor.read_float()?;
        self.position = cursor.read_double()?;
        self.label = cursor.read_string()?;
        self.tags = cursor.read_string_list()?;
        self.blob = cursor.read_bytes()?;
        Ok(())
    }
}

macro_rules! marker_packets {
    ($($name:ident),*) => {
        $(
            #[derive(Debug, Default)]
            struct $name;

            impl Packet for $name {
                fn write(&self, _cursor: &mut ByteCursor<'_>) -> Result<()> {
                    Ok(())
                }

                fn read(&mut self, _cursor: &mut ByteCursor<'_>) -> Result<()> {
                    Ok(())
                }
            }
        )*
    };
}

marker_packets!(Alpha, Beta, Gamma, Delta);

fn telemetry_strategy() -> impl Strategy<Value = Telemetry> {
    (
        any::<bool>(),
        any::<i8>(),
        any::<i16>(),
        any::<i32>(),
        any::<i64>(),
        // NaN breaks PartialEq, so only normal floats here
        prop::num::f32::NORMAL,
        prop::num::f64::NORMAL,
        ".{1,64}",
        prop::collection::vec(".{0,16}", 0..12),
        prop::collection::vec(any::<u8>(), 0..256),
    )
        .prop_map(
            |(alive, channel, port, sequence, timestamp, ratio, position, label, tags, blob)| {
                Telemetry {
                    alive,
                    channel,
                    port,
                    sequence,
                    timestamp,
                    ratio,
                    position,
                    label,
                    tags,
                    blob,
                }
            },
        )
}

fn telemetry_codec() -> FrameCodec {
    let vault = PacketVault::new()
        .with::<Alpha>()
        .unwrap()
        .with::<Telemetry>()
        .unwrap();
    FrameCodec::new(Arc::new(vault))
}

// Property: any packet survives encode then decode with identical field values
proptest! {
    #[test]
    fn prop_packet_roundtrip(packet in telemetry_strategy()) {
        let codec = telemetry_codec();
        let frame = codec.encode_to_bytes(&packet).expect("Encoding should not fail");
        prop_assert_eq!(&frame[..4], &[0, 0, 0, 1]);

        let decoded = codec.decode_bytes(&frame).expect("Decoding should not fail");
        prop_assert_eq!(decoded.downcast_ref::<Telemetry>(), Some(&packet));
    }
}

// Property: encoding is deterministic
proptest! {
    #[test]
    fn prop_encoding_deterministic(packet in telemetry_strategy()) {
        let codec = telemetry_codec();
        let first = codec.encode_to_bytes(&packet).unwrap();
        let second = codec.encode_to_bytes(&packet).unwrap();
        prop_assert_eq!(first, second);
    }
}

// Property: list elements are opaque, separators inside them do not split anything
proptest! {
    #[test]
    fn prop_string_list_with_separators(
        parts in prop::collection::vec("[a-z:]{0,8}", 0..10),
        joiner in prop::sample::select(vec!["::", ":", "", "a::b"]),
    ) {
        let list: Vec<String> = parts.iter().map(|p| format!("{p}{joiner}{p}")).collect();
        let mut buf = BytesMut::new();
        let mut cursor = ByteCursor::new(&mut buf);
        cursor.write_string_list(&list).unwrap();

        let decoded = cursor.read_string_list().unwrap();
        prop_assert_eq!(decoded, list);
        prop_assert!(cursor.is_empty());
    }
}

// Property: two vaults built with the same registration order agree on every id
proptest! {
    #[test]
    fn prop_vault_determinism(order in Just(vec![0usize, 1, 2, 3]).prop_shuffle()) {
        fn build(order: &[usize]) -> PacketVault {
            let mut vault = PacketVault::new();
            for &i in order {
                match i {
                    0 => vault.register::<Alpha>().unwrap(),
                    1 => vault.register::<Beta>().unwrap(),
                    2 => vault.register::<Gamma>().unwrap(),
                    _ => vault.register::<Delta>().unwrap(),
                };
            }
            vault
        }

        let left = build(&order);
        let right = build(&order);
        let kinds = [
            PacketKind::of::<Alpha>(),
            PacketKind::of::<Beta>(),
            PacketKind::of::<Gamma>(),
            PacketKind::of::<Delta>(),
        ];
        for (position, &i) in order.iter().enumerate() {
            prop_assert_eq!(left.id_of(kinds[i]).unwrap(), position as u32);
            prop_assert_eq!(right.id_of(kinds[i]).unwrap(), position as u32);
        }
        prop_assert_eq!(left.len(), 4);
    }
}

// Property: decoding arbitrary bytes never panics
proptest! {
    #[test]
    fn prop_decode_arbitrary_bytes(data in prop::collection::vec(any::<u8>(), 0..512)) {
        let codec = telemetry_codec();
        let _ = codec.decode_bytes(&data);
    }
}

// Property: a frame with an unregistered id never builds a packet
proptest! {
    #[test]
    fn prop_unknown_id_rejected(id in 2u32.., payload in prop::collection::vec(any::<u8>(), 0..64)) {
        let codec = telemetry_codec();
        let mut frame = id.to_be_bytes().to_vec();
        frame.extend_from_slice(&payload);
        prop_assert!(codec.decode_bytes(&frame).is_err());
    }
}

#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use once_cell::sync::Lazy;
use packet_delivery::prelude::*;

#[derive(Debug, Default)]
struct Sample {
    flag: bool,
    name: String,
    tags: Vec<String>,
    data: Vec<u8>,
}

impl Packet for Sample {
    fn write(&self, cursor: &mut ByteCursor<'_>) -> Result<()> {
        cursor.write_bool(self.flag);
        cursor.write_string(&self.name)?;
        cursor.write_string_list(&self.tags)?;
        cursor.write_bytes(&self.data)
    }

    fn read(&mut self, cursor: &mut ByteCursor<'_>) -> Result<()> {
        self.flag = cursor.read_bool()?;
        self.name = cursor.read_string()?;
        self.tags = cursor.read_string_list()?;
        self.data = cursor.read_bytes()?;
        Ok(())
    }
}

static CODEC: Lazy<FrameCodec> = Lazy::new(|| {
    let mut vault = PacketVault::new();
    let _ = vault.register::<Sample>();
    FrameCodec::new(Arc::new(vault))
});

fuzz_target!(|data: &[u8]| {
    // Fuzz frame decoding - test for panics, crashes, oversized allocations
    if let Ok(packet) = CODEC.decode_bytes(data) {
        // anything that decodes re-encodes to the same bytes
        if let Ok(frame) = CODEC.encode_to_bytes(&*packet) {
            assert_eq!(&frame[..], data);
        }
    }
});

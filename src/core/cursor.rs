//! # Byte Cursor
//!
//! Fixed-width and length-prefixed primitives used by every packet to (de)serialize its own
//! fields.
//!
//! A [`ByteCursor`] borrows a [`BytesMut`] for the duration of one encode or decode call.
//! Writes append to the end of the buffer; reads consume from the front. Every read checks the
//! remaining length first, so a short frame yields [`ProtocolError::Truncated`] instead of a
//! panic.
//!
//! ## Encodings
//! ```text
//! bool          1 byte, 0 or 1
//! i8..i64       fixed width, big-endian, two's complement
//! f32/f64       IEEE-754 bits, big-endian
//! string        [len: u32 BE][UTF-8 bytes]   (empty strings are rejected on write)
//! string list   [count: u32 BE] then [len: u32 BE][UTF-8 bytes] per element
//! bytes         [len: u32 BE][raw bytes]
//! ```

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{ProtocolError, Result};

/// Size of every length and count prefix on the wire.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Cursor over a borrowed, mutable byte buffer.
pub struct ByteCursor<'a> {
    buf: &'a mut BytesMut,
}

impl<'a> ByteCursor<'a> {
    pub fn new(buf: &'a mut BytesMut) -> Self {
        Self { buf }
    }

    /// Bytes left to read.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Current end of the written region, used to roll back a failed encode.
    pub(crate) fn mark(&self) -> usize {
        self.buf.len()
    }

    pub(crate) fn rollback(&mut self, mark: usize) {
        self.buf.truncate(mark);
    }

    #[inline]
    fn ensure(&self, needed: usize) -> Result<()> {
        let remaining = self.buf.len();
        if remaining < needed {
            return Err(ProtocolError::Truncated { needed, remaining });
        }
        Ok(())
    }

    fn write_len(&mut self, len: usize) -> Result<()> {
        let len = u32::try_from(len).map_err(|_| ProtocolError::LengthOverflow(len))?;
        self.buf.put_u32(len);
        Ok(())
    }

    /// Reads a length prefix and checks that the announced bytes are actually present.
    fn read_len(&mut self) -> Result<usize> {
        self.ensure(LENGTH_PREFIX_SIZE)?;
        let len = self.buf.get_u32() as usize;
        self.ensure(len)?;
        Ok(len)
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.put_u8(u8::from(value));
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        self.ensure(1)?;
        match self.buf.get_u8() {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(ProtocolError::InvalidBool(other)),
        }
    }

    pub fn write_byte(&mut self, value: i8) {
        self.buf.put_i8(value);
    }

    pub fn read_byte(&mut self) -> Result<i8> {
        self.ensure(1)?;
        Ok(self.buf.get_i8())
    }

    pub fn write_short(&mut self, value: i16) {
        self.buf.put_i16(value);
    }

    pub fn read_short(&mut self) -> Result<i16> {
        self.ensure(2)?;
        Ok(self.buf.get_i16())
    }

    pub fn write_int(&mut self, value: i32) {
        self.buf.put_i32(value);
    }

    pub fn read_int(&mut self) -> Result<i32> {
        self.ensure(4)?;
        Ok(self.buf.get_i32())
    }

    pub fn write_long(&mut self, value: i64) {
        self.buf.put_i64(value);
    }

    pub fn read_long(&mut self) -> Result<i64> {
        self.ensure(8)?;
        Ok(self.buf.get_i64())
    }

    pub fn write_float(&mut self, value: f32) {
        self.buf.put_f32(value);
    }

    pub fn read_float(&mut self) -> Result<f32> {
        self.ensure(4)?;
        Ok(self.buf.get_f32())
    }

    pub fn write_double(&mut self, value: f64) {
        self.buf.put_f64(value);
    }

    pub fn read_double(&mut self) -> Result<f64> {
        self.ensure(8)?;
        Ok(self.buf.get_f64())
    }

    /// Unsigned 32-bit value; the frame header uses this for the packet id.
    pub fn write_u32(&mut self, value: u32) {
        self.buf.put_u32(value);
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        Ok(self.buf.get_u32())
    }

    /// Writes a length-prefixed UTF-8 string. Empty strings fail eagerly.
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        if value.is_empty() {
            return Err(ProtocolError::InvalidStringWrite);
        }
        self.write_str_unchecked(value)
    }

    fn write_str_unchecked(&mut self, value: &str) -> Result<()> {
        self.write_len(value.len())?;
        self.buf.put_slice(value.as_bytes());
        Ok(())
    }

    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_len()?;
        let raw = self.buf.split_to(len);
        String::from_utf8(raw.to_vec()).map_err(|_| ProtocolError::InvalidUtf8)
    }

    /// Writes an element count followed by each element with its own length prefix.
    ///
    /// Elements may be empty and may contain any character sequence.
    pub fn write_string_list<S: AsRef<str>>(&mut self, values: &[S]) -> Result<()> {
        self.write_len(values.len())?;
        for value in values {
            self.write_str_unchecked(value.as_ref())?;
        }
        Ok(())
    }

    pub fn read_string_list(&mut self) -> Result<Vec<String>> {
        self.ensure(LENGTH_PREFIX_SIZE)?;
        let count = self.buf.get_u32() as usize;
        // every element carries at least its own prefix
        let min_bytes = count.saturating_mul(LENGTH_PREFIX_SIZE);
        self.ensure(min_bytes)?;

        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(self.read_string()?);
        }
        Ok(values)
    }

    pub fn write_bytes(&mut self, value: &[u8]) -> Result<()> {
        self.write_len(value.len())?;
        self.buf.put_slice(value);
        Ok(())
    }

    pub fn read_bytes(&mut self) -> Result<Vec<u8>> {
        let len = self.read_len()?;
        Ok(self.buf.split_to(len).to_vec())
    }
}

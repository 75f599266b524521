//! Test-only encoder for InterOp layouts.
//!
//! Production code only decodes; tests build byte streams with this to check the
//! decoders against known record sequences.

use byteorder::{LittleEndian, WriteBytesExt};

/// Builder that appends little-endian primitives to an in-memory buffer.
#[derive(Debug, Default, Clone)]
pub struct Encoder {
    buffer: Vec<u8>,
}

#[allow(clippy::len_without_is_empty)]
impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a buffer with a `{version, record_size}` header.
    pub fn header(version: u8, record_size: u8) -> Self {
        Self::new().u8(version).u8(record_size)
    }

    pub fn u8(mut self, value: u8) -> Self {
        self.buffer.write_u8(value).unwrap();
        self
    }

    pub fn u16(mut self, value: u16) -> Self {
        self.buffer.write_u16::<LittleEndian>(value).unwrap();
        self
    }

    pub fn u32(mut self, value: u32) -> Self {
        self.buffer.write_u32::<LittleEndian>(value).unwrap();
        self
    }

    pub fn i32(mut self, value: i32) -> Self {
        self.buffer.write_i32::<LittleEndian>(value).unwrap();
        self
    }

    pub fn u64(mut self, value: u64) -> Self {
        self.buffer.write_u64::<LittleEndian>(value).unwrap();
        self
    }

    pub fn f32(mut self, value: f32) -> Self {
        self.buffer.write_f32::<LittleEndian>(value).unwrap();
        self
    }

    pub fn bytes(mut self, value: &[u8]) -> Self {
        self.buffer.extend_from_slice(value);
        self
    }

    /// Writes a `u16` length-prefixed string.
    pub fn string(self, value: &str) -> Self {
        self.u16(value.len() as u16).bytes(value.as_bytes())
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn finish(self) -> Vec<u8> {
        self.buffer
    }
}

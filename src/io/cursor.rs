//! Sequential little-endian primitive reads over a buffered byte stream.
//!
//! Every metric decoder is a loop of the form "start a record; on clean end of
//! stream stop; otherwise decode the record's fields". [`ByteCursor::next_record`]
//! is the only place a clean end of stream is reported. Once a record has been
//! started, running out of bytes in any field read is a
//! [`TruncatedRecord`](InteropError::TruncatedRecord) error.

use std::io::{BufRead, ErrorKind, Read};

use byteorder::{ByteOrder, LittleEndian};

use crate::{InteropError, Result};

/// Little-endian reader that tracks its byte position and the start of the
/// record currently being decoded.
#[derive(Debug)]
pub struct ByteCursor<R: BufRead> {
    /// Inner buffered reader providing the data stream
    inner: R,

    /// Total number of bytes consumed from the inner reader
    pos: usize,

    /// Byte position where the current record started
    record_start: usize,
}

impl<R: BufRead> ByteCursor<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            pos: 0,
            record_start: 0,
        }
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Byte position where the current record started.
    pub fn record_start(&self) -> usize {
        self.record_start
    }

    /// Returns true if no bytes remain in the stream.
    pub fn at_end(&mut self) -> Result<bool> {
        loop {
            match self.inner.fill_buf() {
                Ok(buf) => return Ok(buf.is_empty()),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Marks the start of the next record.
    ///
    /// Returns `Ok(false)` when the stream ended cleanly on a record boundary.
    pub fn next_record(&mut self) -> Result<bool> {
        self.record_start = self.pos;
        Ok(!self.at_end()?)
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(InteropError::TruncatedRecord {
                        pos: self.record_start,
                    })
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        self.pos += buf.len();
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.fill(&mut buf)?;
        Ok(buf[0])
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.fill(&mut buf)?;
        Ok(LittleEndian::read_u16(&buf))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.fill(&mut buf)?;
        Ok(LittleEndian::read_u32(&buf))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let mut buf = [0u8; 4];
        self.fill(&mut buf)?;
        Ok(LittleEndian::read_i32(&buf))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.fill(&mut buf)?;
        Ok(LittleEndian::read_u64(&buf))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        let mut buf = [0u8; 4];
        self.fill(&mut buf)?;
        Ok(LittleEndian::read_f32(&buf))
    }

    /// Fills `dst` with consecutive little-endian `u16` values.
    pub fn read_u16_into(&mut self, dst: &mut [u16]) -> Result<()> {
        let mut buf = vec![0u8; dst.len() * 2];
        self.fill(&mut buf)?;
        LittleEndian::read_u16_into(&buf, dst);
        Ok(())
    }

    /// Fills `dst` with consecutive little-endian `u32` values.
    pub fn read_u32_into(&mut self, dst: &mut [u32]) -> Result<()> {
        let mut buf = vec![0u8; dst.len() * 4];
        self.fill(&mut buf)?;
        LittleEndian::read_u32_into(&buf, dst);
        Ok(())
    }

    /// Fills `dst` with consecutive little-endian `f32` values.
    pub fn read_f32_into(&mut self, dst: &mut [f32]) -> Result<()> {
        let mut buf = vec![0u8; dst.len() * 4];
        self.fill(&mut buf)?;
        LittleEndian::read_f32_into(&buf, dst);
        Ok(())
    }

    /// Reads `len` raw bytes.
    ///
    /// The buffer grows as bytes arrive, so a length taken from a damaged file fails
    /// as a truncation instead of allocating up front.
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        (&mut self.inner).take(len as u64).read_to_end(&mut buf)?;
        if buf.len() < len {
            return Err(InteropError::TruncatedRecord {
                pos: self.record_start,
            });
        }
        self.pos += len;
        Ok(buf)
    }

    /// Reads a `u16` length-prefixed string.
    ///
    /// Invalid UTF-8 is replaced rather than rejected; instrument software writes
    /// plain ASCII names.
    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_u16()? as usize;
        let bytes = self.read_bytes(len)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::encode::Encoder;

    #[test]
    fn test_primitive_reads() {
        let bytes = Encoder::new()
            .u8(7)
            .u16(0xBEEF)
            .u32(0xDEADBEEF)
            .i32(-5)
            .u64(u64::MAX - 1)
            .f32(1.5)
            .string("AATC")
            .finish();
        let mut cursor = ByteCursor::new(bytes.as_slice());

        assert_eq!(cursor.read_u8().unwrap(), 7);
        assert_eq!(cursor.read_u16().unwrap(), 0xBEEF);
        assert_eq!(cursor.read_u32().unwrap(), 0xDEADBEEF);
        assert_eq!(cursor.read_i32().unwrap(), -5);
        assert_eq!(cursor.read_u64().unwrap(), u64::MAX - 1);
        assert_eq!(cursor.read_f32().unwrap(), 1.5);
        assert_eq!(cursor.read_string().unwrap(), "AATC");
        assert!(cursor.at_end().unwrap());
        assert_eq!(cursor.position(), bytes.len());
    }

    #[test]
    fn test_little_endian_layout() {
        let bytes = [0x01, 0x02, 0x03, 0x04];
        let mut cursor = ByteCursor::new(&bytes[..]);
        assert_eq!(cursor.read_u32().unwrap(), 0x04030201);
    }

    #[test]
    fn test_clean_end_of_stream() {
        let bytes = Encoder::new().u16(1).finish();
        let mut cursor = ByteCursor::new(bytes.as_slice());

        assert!(cursor.next_record().unwrap());
        cursor.read_u16().unwrap();
        assert!(!cursor.next_record().unwrap());
    }

    #[test]
    fn test_partial_record_is_truncated() {
        let bytes = Encoder::new().u16(1).u8(9).finish();
        let mut cursor = ByteCursor::new(bytes.as_slice());

        assert!(cursor.next_record().unwrap());
        cursor.read_u16().unwrap();
        assert!(cursor.next_record().unwrap());
        let result = cursor.read_u16();
        assert!(matches!(result, Err(InteropError::TruncatedRecord { pos: 2 })));
    }

    #[test]
    fn test_bulk_reads() {
        let bytes = Encoder::new().u32(1).u32(2).u32(3).f32(0.25).f32(0.5).finish();
        let mut cursor = ByteCursor::new(bytes.as_slice());

        let mut ints = [0u32; 3];
        cursor.read_u32_into(&mut ints).unwrap();
        assert_eq!(ints, [1, 2, 3]);

        let mut floats = [0f32; 2];
        cursor.read_f32_into(&mut floats).unwrap();
        assert_eq!(floats, [0.25, 0.5]);
    }

    #[test]
    fn test_read_bytes_beyond_stream() {
        let bytes = Encoder::new().bytes(b"ACGT").finish();
        let mut cursor = ByteCursor::new(bytes.as_slice());
        assert!(cursor.next_record().unwrap());
        assert!(matches!(
            cursor.read_bytes(usize::MAX),
            Err(InteropError::TruncatedRecord { pos: 0 })
        ));
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_read_bytes_exact() {
        let bytes = Encoder::new().bytes(b"ACGTN").finish();
        let mut cursor = ByteCursor::new(bytes.as_slice());
        assert_eq!(cursor.read_bytes(4).unwrap(), b"ACGT".to_vec());
        assert_eq!(cursor.position(), 4);
        assert_eq!(cursor.read_bytes(0).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_string_shorter_than_length_prefix() {
        let bytes = Encoder::new().u16(10).u8(b'A').finish();
        let mut cursor = ByteCursor::new(bytes.as_slice());
        assert!(cursor.next_record().unwrap());
        assert!(matches!(
            cursor.read_string(),
            Err(InteropError::TruncatedRecord { pos: 0 })
        ));
    }
}

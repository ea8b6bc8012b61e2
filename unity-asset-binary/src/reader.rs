//! Endian-aware binary cursor over an in-memory byte slice.

use crate::error::{BinaryError, Result};
use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read, Seek, SeekFrom};

/// Default cap on unbounded (`cstr`) string reads, matching the bundle and
/// SerializedFile formats' longest observed field/type names plus margin.
pub const DEFAULT_MAX_CSTRING_LEN: usize = 16384;

/// Byte order for reading binary data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    /// Big endian (network byte order); used by bundle and SerializedFile headers.
    Big,
    /// Little endian; used by most SerializedFile body fields.
    #[default]
    Little,
}

/// A positioned, bounds-checked view over an immutable byte slice.
pub struct BinaryReader<'a> {
    cursor: Cursor<&'a [u8]>,
    byte_order: ByteOrder,
    strict: bool,
}

impl<'a> BinaryReader<'a> {
    pub fn new(data: &'a [u8], byte_order: ByteOrder) -> Self {
        Self {
            cursor: Cursor::new(data),
            byte_order,
            strict: false,
        }
    }

    /// Enable strict mode: alignment padding must be all-zero or [`BinaryError::AlignmentValidation`] is raised.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    pub fn set_position(&mut self, pos: u64) -> Result<()> {
        self.cursor.set_position(pos);
        Ok(())
    }

    pub fn seek(&mut self, offset: i64) -> Result<u64> {
        Ok(self.cursor.seek(SeekFrom::Current(offset))?)
    }

    pub fn len(&self) -> usize {
        self.cursor.get_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn remaining(&self) -> usize {
        self.len().saturating_sub(self.position() as usize)
    }

    pub fn has_bytes(&self, count: usize) -> bool {
        self.remaining() >= count
    }

    /// Peek `count` bytes without advancing the cursor.
    pub fn peek(&self, count: usize) -> Result<&'a [u8]> {
        if !self.has_bytes(count) {
            return Err(BinaryError::eof(count, self.remaining()));
        }
        let pos = self.position() as usize;
        let data = *self.cursor.get_ref();
        Ok(&data[pos..pos + count])
    }

    /// Align to a 4-byte boundary.
    pub fn align(&mut self) -> Result<()> {
        self.align_to(4)
    }

    /// Align to the given boundary (2, 4, 8, or 16). In strict mode, the
    /// skipped padding bytes must all be zero.
    pub fn align_to(&mut self, alignment: u64) -> Result<()> {
        let pos = self.position();
        let aligned = pos.div_ceil(alignment) * alignment;
        if aligned != pos {
            let padding = (aligned - pos) as usize;
            if self.strict {
                let bytes = self.read_bytes(padding)?;
                if bytes.iter().any(|&b| b != 0) {
                    return Err(BinaryError::AlignmentValidation);
                }
            } else {
                self.set_position(aligned)?;
            }
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        if !self.has_bytes(1) {
            return Err(BinaryError::eof(1, self.remaining()));
        }
        Ok(self.cursor.read_u8()?)
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        if !self.has_bytes(count) {
            return Err(BinaryError::eof(count, self.remaining()));
        }
        let mut buffer = vec![0u8; count];
        self.cursor.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    pub fn read_remaining(&mut self) -> &'a [u8] {
        let pos = self.cursor.position() as usize;
        let data = *self.cursor.get_ref();
        &data[pos..]
    }

    /// Bounds-check `width` bytes, then dispatch a `byteorder` read to the
    /// reader's configured order. Every multi-byte primitive below is one
    /// invocation of this against the `ReadBytesExt` method for its type.
    fn read_width<T>(
        &mut self,
        width: usize,
        read_be: impl FnOnce(&mut Cursor<&'a [u8]>) -> std::io::Result<T>,
        read_le: impl FnOnce(&mut Cursor<&'a [u8]>) -> std::io::Result<T>,
    ) -> Result<T> {
        if !self.has_bytes(width) {
            return Err(BinaryError::eof(width, self.remaining()));
        }
        Ok(match self.byte_order {
            ByteOrder::Big => read_be(&mut self.cursor)?,
            ByteOrder::Little => read_le(&mut self.cursor)?,
        })
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_width(2, |c| c.read_u16::<BigEndian>(), |c| c.read_u16::<LittleEndian>())
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.read_width(2, |c| c.read_i16::<BigEndian>(), |c| c.read_i16::<LittleEndian>())
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_width(4, |c| c.read_u32::<BigEndian>(), |c| c.read_u32::<LittleEndian>())
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_width(4, |c| c.read_i32::<BigEndian>(), |c| c.read_i32::<LittleEndian>())
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.read_width(8, |c| c.read_u64::<BigEndian>(), |c| c.read_u64::<LittleEndian>())
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.read_width(8, |c| c.read_i64::<BigEndian>(), |c| c.read_i64::<LittleEndian>())
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.read_width(4, |c| c.read_f32::<BigEndian>(), |c| c.read_f32::<LittleEndian>())
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.read_width(8, |c| c.read_f64::<BigEndian>(), |c| c.read_f64::<LittleEndian>())
    }

    /// Read a null-terminated string, bounded by `max_len` bytes before the
    /// terminator. Exceeding the bound without finding `\0` is [`BinaryError::UnexpectedEof`].
    pub fn read_cstring_bounded(&mut self, max_len: usize) -> Result<String> {
        let mut bytes = Vec::new();
        loop {
            if bytes.len() >= max_len {
                return Err(BinaryError::eof(max_len + 1, self.remaining()));
            }
            let byte = self.read_u8()?;
            if byte == 0 {
                break;
            }
            bytes.push(byte);
        }
        String::from_utf8(bytes).map_err(|e| BinaryError::InvalidUtf8(e.to_string()))
    }

    /// Read a null-terminated string using [`DEFAULT_MAX_CSTRING_LEN`].
    pub fn read_cstring(&mut self) -> Result<String> {
        self.read_cstring_bounded(DEFAULT_MAX_CSTRING_LEN)
    }

    /// Read a 4-byte length prefix followed by that many bytes as UTF-8.
    pub fn read_string(&mut self) -> Result<String> {
        let length = self.read_u32()? as usize;
        let bytes = self.read_bytes(length)?;
        String::from_utf8(bytes).map_err(|e| BinaryError::InvalidUtf8(e.to_string()))
    }

    /// Read a length-prefixed string and align to 4 bytes afterward.
    pub fn read_aligned_string(&mut self) -> Result<String> {
        let string = self.read_string()?;
        self.align()?;
        Ok(string)
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn set_byte_order(&mut self, byte_order: ByteOrder) {
        self.byte_order = byte_order;
    }

    pub fn remaining_slice(&self) -> &'a [u8] {
        let pos = self.position() as usize;
        &self.cursor.get_ref()[pos..]
    }

    /// Build a fresh reader over `data[offset..offset+length]`, sharing byte order and strictness.
    pub fn sub_reader(&self, offset: usize, length: usize) -> Result<BinaryReader<'a>> {
        let data = self.cursor.get_ref();
        if offset + length > data.len() {
            return Err(BinaryError::eof(offset + length, data.len()));
        }
        Ok(BinaryReader::new(&data[offset..offset + length], self.byte_order).with_strict(self.strict))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_u8_reads_advance_position_and_remaining() {
        let data = [0x01, 0x02, 0x03, 0x04];
        let mut reader = BinaryReader::new(&data, ByteOrder::Little);

        assert_eq!(reader.read_u8().unwrap(), 0x01);
        assert_eq!(reader.read_u8().unwrap(), 0x02);
        assert_eq!(reader.position(), 2);
        assert_eq!(reader.remaining(), 2);
        assert!(reader.read_bytes(3).is_err());
    }

    #[test]
    fn byte_order_flips_multi_byte_widths() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];

        let mut le = BinaryReader::new(&data, ByteOrder::Little);
        assert_eq!(le.read_u16().unwrap(), 0x0201);
        assert_eq!(le.read_u32().unwrap(), 0x06050403);

        let mut be = BinaryReader::new(&data, ByteOrder::Big);
        assert_eq!(be.read_i64().unwrap(), 0x0102030405060708);
    }

    #[test]
    fn cstrings_split_on_null_terminator_and_leave_cursor_after_it() {
        let data = b"Hello\0World\0";
        let mut reader = BinaryReader::new(data, ByteOrder::Little);

        assert_eq!(reader.read_cstring().unwrap(), "Hello");
        assert_eq!(reader.read_cstring().unwrap(), "World");
        assert_eq!(reader.position() as usize, data.len());
    }

    #[test]
    fn bounded_cstring_rejects_runaway_input() {
        let data = vec![b'a'; 64];
        let mut reader = BinaryReader::new(&data, ByteOrder::Little);
        assert!(reader.read_cstring_bounded(8).is_err());
    }

    #[test]
    fn alignment() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let mut reader = BinaryReader::new(&data, ByteOrder::Little);

        reader.read_u8().unwrap();
        reader.align().unwrap();
        assert_eq!(reader.position(), 4);
    }

    #[test]
    fn strict_alignment_rejects_nonzero_padding() {
        let data = [0x01, 0xFF, 0x00, 0x00];
        let mut reader = BinaryReader::new(&data, ByteOrder::Little).with_strict(true);
        reader.read_u8().unwrap();
        assert!(reader.align().is_err());
    }

    #[test]
    fn peek_does_not_advance() {
        let data = [0x01, 0x02, 0x03];
        let reader = BinaryReader::new(&data, ByteOrder::Little);
        assert_eq!(reader.peek(2).unwrap(), &[0x01, 0x02]);
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn invalid_utf8_is_distinct_from_eof() {
        let data = [0xFF, 0xFE, 0x00];
        let mut reader = BinaryReader::new(&data, ByteOrder::Little);
        match reader.read_cstring() {
            Err(BinaryError::InvalidUtf8(_)) => {}
            other => panic!("expected InvalidUtf8, got {other:?}"),
        }
    }
}

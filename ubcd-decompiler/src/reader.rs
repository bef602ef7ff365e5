use byteorder::{ByteOrder, LittleEndian};

use crate::error::DecodeError;

/// Little-endian cursor over a bytecode blob.
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Storage offset of the next byte.
    pub fn offset(&self) -> u32 {
        self.pos as u32
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    pub fn peek_u8(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < n {
            return Err(DecodeError::Truncated {
                offset: self.offset(),
                wanted: n,
            });
        }
        let s = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(s)
    }

    pub fn get_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    pub fn get_u16(&mut self) -> Result<u16, DecodeError> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    pub fn get_u32(&mut self) -> Result<u32, DecodeError> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    pub fn get_i32(&mut self) -> Result<i32, DecodeError> {
        Ok(LittleEndian::read_i32(self.take(4)?))
    }

    pub fn get_f32(&mut self) -> Result<f32, DecodeError> {
        Ok(LittleEndian::read_f32(self.take(4)?))
    }

    /// Variable-length signed index: sign and continuation in the first byte,
    /// then seven bits per byte, at most five bytes.
    pub fn get_compact_index(&mut self) -> Result<i32, DecodeError> {
        let start = self.offset();
        let first = self.get_u8()?;
        let negative = first & 0x80 != 0;
        let mut value = (first & 0x3F) as i64;
        let mut more = first & 0x40 != 0;
        let mut shift = 6;
        let mut count = 1;
        while more {
            if count == 5 {
                return Err(DecodeError::InvalidCompactIndex { offset: start });
            }
            let b = self.get_u8()?;
            value |= ((b & 0x7F) as i64) << shift;
            more = b & 0x80 != 0;
            shift += 7;
            count += 1;
        }
        if value > i32::MAX as i64 {
            return Err(DecodeError::InvalidCompactIndex { offset: start });
        }
        Ok(if negative { -(value as i32) } else { value as i32 })
    }

    /// Zero-terminated single-byte string; returns the text and the byte
    /// count including the terminator.
    pub fn get_ansi_string(&mut self) -> Result<(String, usize), DecodeError> {
        let start = self.offset();
        let rest = &self.buf[self.pos.min(self.buf.len())..];
        let Some(len) = rest.iter().position(|&b| b == 0) else {
            return Err(DecodeError::UnterminatedString { offset: start });
        };
        let text = rest[..len].iter().map(|&b| b as char).collect();
        self.pos += len + 1;
        Ok((text, len + 1))
    }

    /// Zero-terminated UTF-16 string; returns the text and the byte count
    /// including the terminator.
    pub fn get_wide_string(&mut self) -> Result<(String, usize), DecodeError> {
        let start = self.offset();
        let mut units = Vec::new();
        loop {
            if self.remaining() < 2 {
                return Err(DecodeError::UnterminatedString { offset: start });
            }
            let unit = self.get_u16()?;
            if unit == 0 {
                break;
            }
            units.push(unit);
        }
        let consumed = (units.len() + 1) * 2;
        Ok((String::from_utf16_lossy(&units), consumed))
    }
}

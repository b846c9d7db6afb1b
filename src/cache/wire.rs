//! Byte-level primitives of the persisted record format: little-endian IDs, LEB128 integers,
//! length-prefixed strings.

use crate::runtime::ChainDigest;
use crate::svm::SymbolId;

use super::error::{CodecError, CodecResult};

#[derive(Default)]
pub struct WireWriter {
    bytes: Vec<u8>,
}

impl WireWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn put_u8(&mut self, value: u8) {
        self.bytes.push(value);
    }

    pub fn put_u16_le(&mut self, value: u16) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    pub fn put_uleb128(&mut self, mut value: u64) {
        loop {
            let byte = (value & 0x7F) as u8;
            value >>= 7;
            if value == 0 {
                self.bytes.push(byte);
                break;
            }
            self.bytes.push(byte | 0x80);
        }
    }

    pub fn put_sleb128(&mut self, mut value: i64) {
        loop {
            let byte = (value & 0x7F) as u8;
            value >>= 7;
            let done = (value == 0 && byte & 0x40 == 0) || (value == -1 && byte & 0x40 != 0);
            if done {
                self.bytes.push(byte);
                break;
            }
            self.bytes.push(byte | 0x80);
        }
    }
}

pub struct WireReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    pub fn read_u8(&mut self) -> CodecResult<u8> {
        let byte = *self
            .bytes
            .get(self.position)
            .ok_or(CodecError::Truncated { offset: self.position })?;
        self.position += 1;
        Ok(byte)
    }

    pub fn read_u16_le(&mut self) -> CodecResult<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_bytes(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        let end = self
            .position
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(CodecError::Truncated { offset: self.bytes.len() })?;
        let slice = &self.bytes[self.position..end];
        self.position = end;
        Ok(slice)
    }

    pub fn read_uleb128(&mut self) -> CodecResult<u64> {
        let start = self.position;
        let mut result = 0u64;
        let mut shift = 0;
        loop {
            let byte = self.read_u8()?;
            if shift >= 64 || (shift == 63 && byte & 0x7E != 0) {
                return Err(CodecError::IntegerOverflow { offset: start });
            }
            result |= ((byte & 0x7F) as u64) << shift;
            if (byte & 0x80) == 0 {
                break;
            }
            shift += 7;
        }
        Ok(result)
    }

    pub fn read_sleb128(&mut self) -> CodecResult<i64> {
        let start = self.position;
        let mut result = 0i64;
        let mut shift = 0;
        let mut byte;
        loop {
            byte = self.read_u8()? as i64;
            if shift >= 64 {
                return Err(CodecError::IntegerOverflow { offset: start });
            }
            result |= (byte & 0x7F) << shift;
            shift += 7;
            if (byte & 0x80) == 0 {
                break;
            }
        }
        if (shift < 64) && ((byte & 0x40) != 0) {
            result |= !0 << shift;
        }
        Ok(result)
    }
}

/// A value that knows its own persisted encoding.
pub trait WireField {
    fn write(&self, writer: &mut WireWriter);
    fn read(reader: &mut WireReader<'_>) -> CodecResult<Self>
    where
        Self: Sized;
}

impl WireField for SymbolId {
    fn write(&self, writer: &mut WireWriter) {
        writer.put_u16_le(self.raw());
    }

    fn read(reader: &mut WireReader<'_>) -> CodecResult<Self> {
        let offset = reader.position();
        SymbolId::from_raw(reader.read_u16_le()?).ok_or(CodecError::ZeroSymbolId { offset })
    }
}

impl WireField for u32 {
    fn write(&self, writer: &mut WireWriter) {
        writer.put_uleb128(u64::from(*self));
    }

    fn read(reader: &mut WireReader<'_>) -> CodecResult<Self> {
        let offset = reader.position();
        u32::try_from(reader.read_uleb128()?).map_err(|_| CodecError::IntegerOverflow { offset })
    }
}

impl WireField for i32 {
    fn write(&self, writer: &mut WireWriter) {
        writer.put_sleb128(i64::from(*self));
    }

    fn read(reader: &mut WireReader<'_>) -> CodecResult<Self> {
        let offset = reader.position();
        i32::try_from(reader.read_sleb128()?).map_err(|_| CodecError::IntegerOverflow { offset })
    }
}

impl WireField for bool {
    fn write(&self, writer: &mut WireWriter) {
        writer.put_u8(u8::from(*self));
    }

    fn read(reader: &mut WireReader<'_>) -> CodecResult<Self> {
        let offset = reader.position();
        match reader.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(CodecError::InvalidBool { offset, value }),
        }
    }
}

impl WireField for String {
    fn write(&self, writer: &mut WireWriter) {
        writer.put_uleb128(self.len() as u64);
        writer.put_bytes(self.as_bytes());
    }

    fn read(reader: &mut WireReader<'_>) -> CodecResult<Self> {
        let offset = reader.position();
        let len = usize::try_from(reader.read_uleb128()?)
            .map_err(|_| CodecError::IntegerOverflow { offset })?;
        let bytes = reader.read_bytes(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidUtf8 { offset })
    }
}

impl WireField for ChainDigest {
    fn write(&self, writer: &mut WireWriter) {
        writer.put_bytes(self.as_bytes());
    }

    fn read(reader: &mut WireReader<'_>) -> CodecResult<Self> {
        let mut array = [0u8; ChainDigest::LEN];
        array.copy_from_slice(reader.read_bytes(ChainDigest::LEN)?);
        Ok(ChainDigest::from_bytes(array))
    }
}

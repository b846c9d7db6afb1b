//! Binary container for a sealed record list.
//!
//! Layout: `b"SVMR"`, format version (`u16` LE), record count (ULEB128), then every record as
//! its kind tag followed by its fields, then a SHA-256 digest of everything before it.

use std::io::{Read, Write};

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::svm::{PersistedRecord, RecordKind};

use super::error::{CodecError, CodecResult};
use super::wire::{WireReader, WireWriter};

pub const MAGIC: [u8; 4] = *b"SVMR";
pub const FORMAT_VERSION: u16 = 1;
const DIGEST_LEN: usize = 32;

fn payload_digest(payload: &[u8]) -> [u8; DIGEST_LEN] {
    let digest = Sha256::digest(payload);
    let mut array = [0u8; DIGEST_LEN];
    array.copy_from_slice(&digest);
    array
}

pub fn encode_records(records: &[PersistedRecord]) -> Vec<u8> {
    let mut writer = WireWriter::new();
    writer.put_bytes(&MAGIC);
    writer.put_u16_le(FORMAT_VERSION);
    writer.put_uleb128(records.len() as u64);
    for record in records {
        writer.put_u8(record.kind().tag());
        record.write_fields(&mut writer);
    }
    let trailer = payload_digest(writer.as_slice());
    writer.put_bytes(&trailer);
    writer.into_bytes()
}

pub fn decode_records(bytes: &[u8]) -> CodecResult<Vec<PersistedRecord>> {
    if bytes.len() < MAGIC.len() {
        return Err(CodecError::Truncated { offset: bytes.len() });
    }
    let mut magic = [0u8; 4];
    magic.copy_from_slice(&bytes[..MAGIC.len()]);
    if magic != MAGIC {
        return Err(CodecError::BadMagic(magic));
    }
    let Some(body_len) = bytes.len().checked_sub(DIGEST_LEN) else {
        return Err(CodecError::Truncated { offset: bytes.len() });
    };
    let (payload, trailer) = bytes.split_at(body_len);
    if payload_digest(payload).as_slice() != trailer {
        warn!(len = bytes.len(), "record list checksum mismatch");
        return Err(CodecError::ChecksumMismatch);
    }

    let mut reader = WireReader::new(payload);
    reader.read_bytes(MAGIC.len())?;
    let version = reader.read_u16_le()?;
    if version != FORMAT_VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }
    let count_offset = reader.position();
    let count = usize::try_from(reader.read_uleb128()?)
        .map_err(|_| CodecError::IntegerOverflow { offset: count_offset })?;
    // Every record takes at least three bytes, which bounds a corrupt count.
    let mut records = Vec::with_capacity(count.min(reader.remaining() / 3));
    for _ in 0..count {
        let offset = reader.position();
        let tag = reader.read_u8()?;
        let kind = RecordKind::from_tag(tag).ok_or(CodecError::UnknownKind { offset, tag })?;
        records.push(PersistedRecord::read_fields(kind, &mut reader)?);
    }
    if reader.remaining() != 0 {
        return Err(CodecError::TrailingBytes {
            offset: reader.position(),
        });
    }
    debug!(count = records.len(), "decoded record list");
    Ok(records)
}

pub fn write_records<W: Write>(mut sink: W, records: &[PersistedRecord]) -> CodecResult<()> {
    sink.write_all(&encode_records(records))?;
    sink.flush()?;
    Ok(())
}

pub fn read_records<R: Read>(mut source: R) -> CodecResult<Vec<PersistedRecord>> {
    let mut bytes = Vec::new();
    source.read_to_end(&mut bytes)?;
    decode_records(&bytes)
}

//! Persisted form of a sealed record list.

pub mod codec;
pub mod error;
pub mod wire;

pub use codec::{FORMAT_VERSION, MAGIC, decode_records, encode_records, read_records, write_records};
pub use error::{CodecError, CodecResult};
pub use wire::{WireField, WireReader, WireWriter};

use std::{error::Error, fmt, io};

pub type CodecResult<T> = Result<T, CodecError>;

/// Reasons a persisted record list cannot be decoded. Any of them means the cached artifact is
/// discarded, exactly like a validation failure.
#[derive(Debug)]
pub enum CodecError {
    Truncated { offset: usize },
    BadMagic([u8; 4]),
    UnsupportedVersion(u16),
    UnknownKind { offset: usize, tag: u8 },
    ZeroSymbolId { offset: usize },
    InvalidBool { offset: usize, value: u8 },
    IntegerOverflow { offset: usize },
    InvalidUtf8 { offset: usize },
    ChecksumMismatch,
    TrailingBytes { offset: usize },
    Io(io::Error),
}

impl From<io::Error> for CodecError {
    fn from(err: io::Error) -> Self {
        CodecError::Io(err)
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Truncated { offset } => write!(f, "record list truncated at byte {offset}"),
            CodecError::BadMagic(found) => write!(f, "bad record list magic {found:02X?}"),
            CodecError::UnsupportedVersion(version) => {
                write!(f, "unsupported record list version {version}")
            }
            CodecError::UnknownKind { offset, tag } => {
                write!(f, "unknown record kind tag {tag} at byte {offset}")
            }
            CodecError::ZeroSymbolId { offset } => {
                write!(f, "reserved symbol ID 0 used as an operand at byte {offset}")
            }
            CodecError::InvalidBool { offset, value } => {
                write!(f, "invalid boolean 0x{value:02X} at byte {offset}")
            }
            CodecError::IntegerOverflow { offset } => {
                write!(f, "variable-length integer overflows at byte {offset}")
            }
            CodecError::InvalidUtf8 { offset } => {
                write!(f, "invalid UTF-8 string at byte {offset}")
            }
            CodecError::ChecksumMismatch => write!(f, "record list checksum mismatch"),
            CodecError::TrailingBytes { offset } => {
                write!(f, "unexpected bytes after the last record at byte {offset}")
            }
            CodecError::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CodecError::Io(source) => Some(source),
            _ => None,
        }
    }
}

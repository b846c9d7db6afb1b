use std::fmt;
use std::panic::Location;

use super::manager::Phase;
use super::record::RecordKind;

pub type SvmResult<T> = Result<T, SvmError>;

/// Failures that abort the current compilation or AOT load. None of them is allowed to take
/// the process down except an invariant violation under [`Strictness::Strict`].
///
/// [`Strictness::Strict`]: super::config::Strictness::Strict
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SvmError {
    /// An invariant of the manager itself does not hold.
    Invariant {
        location: &'static Location<'static>,
        message: String,
    },
    /// A rare but legitimate limit was hit, e.g. the ID space ran out.
    Limit { message: String },
    /// An operation was issued in a phase that does not accept it.
    WrongPhase {
        operation: &'static str,
        phase: Phase,
    },
    /// A persisted record no longer holds against the current runtime.
    Rejected { index: usize, kind: RecordKind },
}

impl SvmError {
    /// True for failures that indicate a bug rather than runtime drift or resource limits.
    pub fn is_logic_error(&self) -> bool {
        matches!(self, SvmError::Invariant { .. } | SvmError::WrongPhase { .. })
    }
}

impl fmt::Display for SvmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SvmError::Invariant { location, message } => {
                write!(f, "symbol validation invariant violated at {location}: {message}")
            }
            SvmError::Limit { message } => write!(f, "symbol validation limit reached: {message}"),
            SvmError::WrongPhase { operation, phase } => {
                write!(f, "{operation} is not permitted while the manager is {phase:?}")
            }
            SvmError::Rejected { index, kind } => {
                write!(f, "validation record {index} ({}) no longer holds", kind.name())
            }
        }
    }
}

impl std::error::Error for SvmError {}

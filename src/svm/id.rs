//! Identifier helpers used by the validation manager.

use std::fmt;
use std::num::NonZeroU16;

/// Small integer name for a symbol inside one compilation or load attempt.
///
/// Zero is reserved as the "no symbol" sentinel and is therefore unrepresentable; use
/// `Option<SymbolId>` where a missing ID is meaningful.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(NonZeroU16);

impl SymbolId {
    /// Raw value of the reserved "no symbol" ID.
    pub const NO_ID: u16 = 0;
    pub const FIRST: Self = Self(NonZeroU16::MIN);

    pub fn from_raw(value: u16) -> Option<Self> {
        NonZeroU16::new(value).map(Self)
    }

    pub fn raw(self) -> u16 {
        self.0.get()
    }

    pub(crate) fn index(self) -> usize {
        self.0.get() as usize
    }

    pub(crate) fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Raw form used when a caller needs the sentinel, e.g. for relocation data.
pub fn raw_or_no_id(id: Option<SymbolId>) -> u16 {
    id.map_or(SymbolId::NO_ID, SymbolId::raw)
}

/// Whether a load-time lookup of an ID must succeed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
}

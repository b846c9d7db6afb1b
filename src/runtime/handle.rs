//! Opaque handles the runtime hands out for its types and procedures.

use std::fmt;

/// Identity of a type descriptor. Equality is identity; ordering is only stable within one
/// runtime instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeRef(u32);

impl TypeRef {
    pub fn from_index(index: usize) -> Self {
        assert!(
            index < (u32::MAX as usize),
            "TypeRef index exceeded u32::MAX range"
        );
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type@{}", self.0)
    }
}

/// Identity of a procedure descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProcRef(u32);

impl ProcRef {
    pub fn from_index(index: usize) -> Self {
        assert!(
            index < (u32::MAX as usize),
            "ProcRef index exceeded u32::MAX range"
        );
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ProcRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "proc@{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SymbolCategory {
    Type,
    Procedure,
}

/// Either kind of runtime symbol the validation manager can assign an ID to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
    Type(TypeRef),
    Procedure(ProcRef),
}

impl Symbol {
    pub fn category(self) -> SymbolCategory {
        match self {
            Symbol::Type(_) => SymbolCategory::Type,
            Symbol::Procedure(_) => SymbolCategory::Procedure,
        }
    }

    pub fn as_type(self) -> Option<TypeRef> {
        match self {
            Symbol::Type(ty) => Some(ty),
            Symbol::Procedure(_) => None,
        }
    }

    pub fn as_procedure(self) -> Option<ProcRef> {
        match self {
            Symbol::Procedure(proc) => Some(proc),
            Symbol::Type(_) => None,
        }
    }
}

impl From<TypeRef> for Symbol {
    fn from(value: TypeRef) -> Self {
        Symbol::Type(value)
    }
}

impl From<ProcRef> for Symbol {
    fn from(value: ProcRef) -> Self {
        Symbol::Procedure(value)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Type(ty) => ty.fmt(f),
            Symbol::Procedure(proc) => proc.fmt(f),
        }
    }
}

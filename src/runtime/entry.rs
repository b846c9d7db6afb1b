//! Symbolic references a type carries in its own symbol table.

use std::fmt;

/// How a procedure reference is meant to be dispatched by the code that names it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DispatchKind {
    Static,
    Special,
    Virtual,
    Interface,
}

/// One slot of a type's symbol table. Names are resolved relative to the owning type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SymbolEntry {
    Type {
        name: String,
    },
    Field {
        owner: String,
        name: String,
        is_static: bool,
    },
    Procedure {
        owner: String,
        name: String,
        signature: String,
        dispatch: DispatchKind,
    },
}

impl SymbolEntry {
    pub fn type_ref(name: impl Into<String>) -> Self {
        SymbolEntry::Type { name: name.into() }
    }

    pub fn field(owner: impl Into<String>, name: impl Into<String>, is_static: bool) -> Self {
        SymbolEntry::Field {
            owner: owner.into(),
            name: name.into(),
            is_static,
        }
    }

    pub fn procedure(
        owner: impl Into<String>,
        name: impl Into<String>,
        signature: impl Into<String>,
        dispatch: DispatchKind,
    ) -> Self {
        SymbolEntry::Procedure {
            owner: owner.into(),
            name: name.into(),
            signature: signature.into(),
            dispatch,
        }
    }

    /// Name of the type the entry points into.
    pub fn owner_name(&self) -> &str {
        match self {
            SymbolEntry::Type { name } => name,
            SymbolEntry::Field { owner, .. } | SymbolEntry::Procedure { owner, .. } => owner,
        }
    }
}

impl fmt::Display for SymbolEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolEntry::Type { name } => write!(f, "type {name}"),
            SymbolEntry::Field {
                owner,
                name,
                is_static,
            } => {
                let prefix = if *is_static { "static " } else { "" };
                write!(f, "{prefix}field {owner}.{name}")
            }
            SymbolEntry::Procedure {
                owner,
                name,
                signature,
                dispatch,
            } => write!(f, "{dispatch:?} {owner}.{name}{signature}"),
        }
    }
}

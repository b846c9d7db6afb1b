//! Fluent builders used by embedders and tests to populate a [`Universe`].

use smallvec::SmallVec;

use super::entry::SymbolEntry;
use super::handle::{ProcRef, TypeRef};
use super::universe::{ContextId, FieldDesc, ProcDesc, ProcFlags, TypeDesc, TypeFlags, Universe};

pub struct TypeBuilder<'a> {
    universe: &'a mut Universe,
    name: String,
    context: ContextId,
    flags: TypeFlags,
    super_type: Option<TypeRef>,
    interfaces: SmallVec<[TypeRef; 2]>,
    fields: Vec<FieldDesc>,
    entries: Vec<SymbolEntry>,
}

impl<'a> TypeBuilder<'a> {
    pub(crate) fn new(universe: &'a mut Universe, name: String) -> Self {
        Self {
            universe,
            name,
            context: ContextId::SYSTEM,
            flags: TypeFlags::empty(),
            super_type: None,
            interfaces: SmallVec::new(),
            fields: Vec::new(),
            entries: Vec::new(),
        }
    }

    pub fn context(mut self, context: ContextId) -> Self {
        self.context = context;
        self
    }

    pub fn extends(mut self, super_type: TypeRef) -> Self {
        self.super_type = Some(super_type);
        self
    }

    pub fn implements(mut self, interface: TypeRef) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn interface(mut self) -> Self {
        self.flags |= TypeFlags::INTERFACE | TypeFlags::ABSTRACT;
        self
    }

    pub fn abstract_type(mut self) -> Self {
        self.flags |= TypeFlags::ABSTRACT;
        self
    }

    pub fn initialized(mut self) -> Self {
        self.flags |= TypeFlags::INITIALIZED;
        self
    }

    pub fn field(mut self, name: impl Into<String>, is_static: bool) -> Self {
        self.fields.push(FieldDesc {
            name: name.into(),
            is_static,
        });
        self
    }

    pub fn entry(mut self, entry: SymbolEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Commits the type. Classes without an explicit supertype extend the root type;
    /// interfaces have none.
    pub fn finish(self) -> TypeRef {
        let mut desc = TypeDesc::new(self.name, self.context, self.flags);
        desc.super_type = match self.super_type {
            Some(parent) => Some(parent),
            None if self.flags.contains(TypeFlags::INTERFACE) => None,
            None => Some(self.universe.root_handle()),
        };
        desc.interfaces = self.interfaces;
        desc.fields = self.fields;
        desc.entries = self.entries;
        self.universe.commit_type(desc)
    }
}

pub struct ProcedureBuilder<'a> {
    universe: &'a mut Universe,
    owner: TypeRef,
    name: String,
    signature: String,
    flags: ProcFlags,
}

impl<'a> ProcedureBuilder<'a> {
    pub(crate) fn new(
        universe: &'a mut Universe,
        owner: TypeRef,
        name: String,
        signature: String,
    ) -> Self {
        Self {
            universe,
            owner,
            name,
            signature,
            flags: ProcFlags::empty(),
        }
    }

    pub fn static_procedure(mut self) -> Self {
        self.flags |= ProcFlags::STATIC;
        self
    }

    pub fn abstract_procedure(mut self) -> Self {
        self.flags |= ProcFlags::ABSTRACT;
        self
    }

    pub fn private(mut self) -> Self {
        self.flags |= ProcFlags::PRIVATE;
        self
    }

    pub fn may_skip_frames(mut self) -> Self {
        self.flags |= ProcFlags::MAY_SKIP_FRAMES;
        self
    }

    pub fn finish(self) -> ProcRef {
        self.universe.commit_procedure(ProcDesc {
            name: self.name,
            signature: self.signature,
            owner: self.owner,
            flags: self.flags,
            vtable_slot: None,
        })
    }
}

impl Universe {
    pub fn define_type(&mut self, name: impl Into<String>) -> TypeBuilder<'_> {
        TypeBuilder::new(self, name.into())
    }

    pub fn define_procedure(
        &mut self,
        owner: TypeRef,
        name: impl Into<String>,
        signature: impl Into<String>,
    ) -> ProcedureBuilder<'_> {
        ProcedureBuilder::new(self, owner, name.into(), signature.into())
    }
}

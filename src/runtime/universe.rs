//! In-memory runtime: an append-only arena of type and procedure descriptors plus the indices
//! the [`ObjectModel`] queries need.

use ahash::AHashMap;
use bitflags::bitflags;
use sha2::{Digest, Sha256};
use smallvec::SmallVec;

use super::entry::{DispatchKind, SymbolEntry};
use super::handle::{ProcRef, TypeRef};
use super::model::{ChainDigest, ObjectModel, TriState};

pub const ROOT_TYPE_NAME: &str = "Object";
pub const META_TYPE_NAME: &str = "Type";

/// Naming context (loader) a type was defined in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContextId(u16);

impl ContextId {
    /// Bootstrap context; visible from every other context.
    pub const SYSTEM: Self = Self(0);

    pub fn raw(self) -> u16 {
        self.0
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct TypeFlags: u8 {
        const INTERFACE = 0b0001;
        const ABSTRACT = 0b0010;
        const ARRAY = 0b0100;
        const INITIALIZED = 0b1000;
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ProcFlags: u8 {
        const STATIC = 0b0001;
        const ABSTRACT = 0b0010;
        const PRIVATE = 0b0100;
        const MAY_SKIP_FRAMES = 0b1000;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDesc {
    pub name: String,
    pub is_static: bool,
}

#[derive(Clone, Debug)]
pub struct TypeDesc {
    pub name: String,
    pub context: ContextId,
    pub flags: TypeFlags,
    pub super_type: Option<TypeRef>,
    pub interfaces: SmallVec<[TypeRef; 2]>,
    pub component: Option<TypeRef>,
    pub procedures: Vec<ProcRef>,
    pub vtable: Vec<ProcRef>,
    pub fields: Vec<FieldDesc>,
    pub entries: Vec<SymbolEntry>,
    array: Option<TypeRef>,
}

impl TypeDesc {
    pub(crate) fn new(name: String, context: ContextId, flags: TypeFlags) -> Self {
        Self {
            name,
            context,
            flags,
            super_type: None,
            interfaces: SmallVec::new(),
            component: None,
            procedures: Vec::new(),
            vtable: Vec::new(),
            fields: Vec::new(),
            entries: Vec::new(),
            array: None,
        }
    }

    pub fn is_concrete(&self) -> bool {
        !self
            .flags
            .intersects(TypeFlags::INTERFACE | TypeFlags::ABSTRACT | TypeFlags::ARRAY)
    }
}

#[derive(Clone, Debug)]
pub struct ProcDesc {
    pub name: String,
    pub signature: String,
    pub owner: TypeRef,
    pub flags: ProcFlags,
    pub vtable_slot: Option<u32>,
}

impl ProcDesc {
    fn is_dispatchable(&self) -> bool {
        !self.flags.intersects(ProcFlags::STATIC | ProcFlags::PRIVATE)
    }
}

/// The runtime's symbol universe. Handles stay valid for the lifetime of the universe; types
/// and procedures are only ever added, renamed or re-flagged, never removed.
///
/// Procedures must be defined on a supertype before its subtypes are created, because a
/// subtype copies its supertype's dispatch table when it is committed.
pub struct Universe {
    types: Vec<TypeDesc>,
    procedures: Vec<ProcDesc>,
    by_name: AHashMap<String, SmallVec<[TypeRef; 2]>>,
    next_context: u16,
    root: TypeRef,
    meta: TypeRef,
}

impl Universe {
    pub fn new() -> Self {
        let mut universe = Self {
            types: Vec::new(),
            procedures: Vec::new(),
            by_name: AHashMap::new(),
            next_context: 1,
            root: TypeRef::from_index(0),
            meta: TypeRef::from_index(0),
        };
        let root = TypeDesc::new(
            ROOT_TYPE_NAME.to_owned(),
            ContextId::SYSTEM,
            TypeFlags::INITIALIZED,
        );
        universe.root = universe.commit_type(root);
        let mut meta = TypeDesc::new(
            META_TYPE_NAME.to_owned(),
            ContextId::SYSTEM,
            TypeFlags::INITIALIZED,
        );
        meta.super_type = Some(universe.root);
        universe.meta = universe.commit_type(meta);
        universe
    }

    pub fn new_context(&mut self) -> ContextId {
        let id = ContextId(self.next_context);
        self.next_context += 1;
        id
    }

    pub(crate) fn root_handle(&self) -> TypeRef {
        self.root
    }

    pub fn type_desc(&self, ty: TypeRef) -> &TypeDesc {
        &self.types[ty.index()]
    }

    pub fn procedure_desc(&self, proc: ProcRef) -> &ProcDesc {
        &self.procedures[proc.index()]
    }

    /// Returns the array type whose component is `component`, creating it on first use.
    pub fn array_of(&mut self, component: TypeRef) -> TypeRef {
        if let Some(existing) = self.types[component.index()].array {
            return existing;
        }
        let source = &self.types[component.index()];
        let mut desc = TypeDesc::new(
            format!("[{}", source.name),
            source.context,
            TypeFlags::ARRAY | TypeFlags::INITIALIZED,
        );
        desc.super_type = Some(self.root);
        desc.component = Some(component);
        let array = self.commit_type(desc);
        self.types[component.index()].array = Some(array);
        array
    }

    pub fn rename_type(&mut self, ty: TypeRef, name: impl Into<String>) {
        let old = std::mem::replace(&mut self.types[ty.index()].name, name.into());
        if let Some(handles) = self.by_name.get_mut(&old) {
            handles.retain(|handle| *handle != ty);
            if handles.is_empty() {
                self.by_name.remove(&old);
            }
        }
        let new = self.types[ty.index()].name.clone();
        self.by_name.entry(new).or_default().push(ty);
    }

    pub fn mark_initialized(&mut self, ty: TypeRef, initialized: bool) {
        self.types[ty.index()]
            .flags
            .set(TypeFlags::INITIALIZED, initialized);
    }

    pub fn set_may_skip_frames(&mut self, proc: ProcRef, may_skip: bool) {
        self.procedures[proc.index()]
            .flags
            .set(ProcFlags::MAY_SKIP_FRAMES, may_skip);
    }

    /// Appends a symbol-table entry to `ty`, returning its index.
    pub fn add_entry(&mut self, ty: TypeRef, entry: SymbolEntry) -> u32 {
        let entries = &mut self.types[ty.index()].entries;
        entries.push(entry);
        (entries.len() - 1) as u32
    }

    pub fn is_subtype(&self, sub: TypeRef, sup: TypeRef) -> bool {
        if sub == sup {
            return true;
        }
        let sub_desc = &self.types[sub.index()];
        let sup_desc = &self.types[sup.index()];
        if let (Some(a), Some(b)) = (sub_desc.component, sup_desc.component) {
            return self.is_subtype(a, b);
        }
        let mut pending: SmallVec<[TypeRef; 8]> = SmallVec::new();
        pending.push(sub);
        while let Some(current) = pending.pop() {
            if current == sup {
                return true;
            }
            let desc = &self.types[current.index()];
            pending.extend(desc.super_type);
            pending.extend(desc.interfaces.iter().copied());
        }
        false
    }

    pub(crate) fn commit_type(&mut self, mut desc: TypeDesc) -> TypeRef {
        if let Some(parent) = desc.super_type {
            desc.vtable = self.types[parent.index()].vtable.clone();
        }
        let handle = TypeRef::from_index(self.types.len());
        self.by_name
            .entry(desc.name.clone())
            .or_default()
            .push(handle);
        self.types.push(desc);
        handle
    }

    pub(crate) fn commit_procedure(&mut self, mut desc: ProcDesc) -> ProcRef {
        let handle = ProcRef::from_index(self.procedures.len());
        let owner = &self.types[desc.owner.index()];
        if desc.is_dispatchable() && !owner.flags.contains(TypeFlags::INTERFACE) {
            let overridden = owner.vtable.iter().position(|existing| {
                let existing = &self.procedures[existing.index()];
                existing.name == desc.name && existing.signature == desc.signature
            });
            let owner = &mut self.types[desc.owner.index()];
            let slot = match overridden {
                Some(slot) => {
                    owner.vtable[slot] = handle;
                    slot
                }
                None => {
                    owner.vtable.push(handle);
                    owner.vtable.len() - 1
                }
            };
            desc.vtable_slot = Some(slot as u32);
        }
        self.types[desc.owner.index()].procedures.push(handle);
        self.procedures.push(desc);
        handle
    }

    fn entry(&self, beholder: TypeRef, index: u32) -> Option<&SymbolEntry> {
        self.types[beholder.index()].entries.get(index as usize)
    }

    fn entry_owner(&self, beholder: TypeRef, entry: &SymbolEntry) -> Option<TypeRef> {
        self.type_by_name(beholder, entry.owner_name())
    }

    /// Walks the supertype chain, then every reachable interface.
    fn find_procedure<F>(
        &self,
        ty: TypeRef,
        name: &str,
        signature: &str,
        accept: F,
    ) -> Option<ProcRef>
    where
        F: Fn(&ProcDesc) -> bool,
    {
        let matches = |proc: &ProcRef| {
            let desc = &self.procedures[proc.index()];
            desc.name == name && desc.signature == signature && accept(desc)
        };
        let mut interfaces: SmallVec<[TypeRef; 8]> = SmallVec::new();
        let mut current = Some(ty);
        while let Some(handle) = current {
            let desc = &self.types[handle.index()];
            if let Some(found) = desc.procedures.iter().find(|proc| matches(proc)) {
                return Some(*found);
            }
            interfaces.extend(desc.interfaces.iter().copied());
            current = desc.super_type;
        }
        while let Some(handle) = interfaces.pop() {
            let desc = &self.types[handle.index()];
            if let Some(found) = desc.procedures.iter().find(|proc| matches(proc)) {
                return Some(*found);
            }
            interfaces.extend(desc.interfaces.iter().copied());
        }
        None
    }

    fn declaring_type_of_field(
        &self,
        owner: TypeRef,
        name: &str,
        is_static: Option<bool>,
    ) -> Option<TypeRef> {
        let mut current = Some(owner);
        while let Some(handle) = current {
            let desc = &self.types[handle.index()];
            let declared = desc
                .fields
                .iter()
                .any(|field| {
                    field.name == name && is_static.is_none_or(|flag| field.is_static == flag)
                });
            if declared {
                return Some(handle);
            }
            current = desc.super_type;
        }
        None
    }

    fn concrete_subtypes(&self, ty: TypeRef) -> impl Iterator<Item = TypeRef> + '_ {
        self.types
            .iter()
            .enumerate()
            .filter(|(_, desc)| desc.is_concrete())
            .map(|(index, _)| TypeRef::from_index(index))
            .filter(move |candidate| self.is_subtype(*candidate, ty))
    }

    /// Yields the one implementation every concrete subtype of `ty` agrees on, if any.
    fn unique_implementation<F>(&self, ty: TypeRef, lookup: F) -> Option<ProcRef>
    where
        F: Fn(TypeRef) -> Option<ProcRef>,
    {
        let mut found = None;
        for candidate in self.concrete_subtypes(ty) {
            let proc = lookup(candidate)?;
            if self.procedures[proc.index()].flags.contains(ProcFlags::ABSTRACT) {
                return None;
            }
            match found {
                Some(existing) if existing != proc => return None,
                _ => found = Some(proc),
            }
        }
        found
    }
}

impl Default for Universe {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectModel for Universe {
    fn root_type(&self) -> TypeRef {
        self.root
    }

    fn meta_type(&self) -> TypeRef {
        self.meta
    }

    fn type_name(&self, ty: TypeRef) -> &str {
        &self.types[ty.index()].name
    }

    fn procedure_name(&self, proc: ProcRef) -> &str {
        &self.procedures[proc.index()].name
    }

    fn procedure_signature(&self, proc: ProcRef) -> &str {
        &self.procedures[proc.index()].signature
    }

    fn type_by_name(&self, beholder: TypeRef, name: &str) -> Option<TypeRef> {
        let candidates = self.by_name.get(name)?;
        let context = self.types[beholder.index()].context;
        candidates
            .iter()
            .find(|ty| self.types[ty.index()].context == context)
            .or_else(|| {
                candidates
                    .iter()
                    .find(|ty| self.types[ty.index()].context == ContextId::SYSTEM)
            })
            .copied()
    }

    fn system_type_by_name(&self, name: &str) -> Option<TypeRef> {
        self.by_name
            .get(name)?
            .iter()
            .find(|ty| self.types[ty.index()].context == ContextId::SYSTEM)
            .copied()
    }

    fn type_by_chain(&self, name: &str, chain: &ChainDigest) -> Option<TypeRef> {
        self.by_name
            .get(name)?
            .iter()
            .find(|ty| self.chain_digest(**ty) == *chain)
            .copied()
    }

    fn chain_digest(&self, ty: TypeRef) -> ChainDigest {
        let mut hasher = Sha256::new();
        let mut current = Some(ty);
        while let Some(handle) = current {
            let desc = &self.types[handle.index()];
            hasher.update(desc.name.as_bytes());
            hasher.update([0u8]);
            for iface in &desc.interfaces {
                hasher.update(self.types[iface.index()].name.as_bytes());
                hasher.update([1u8]);
            }
            current = desc.super_type;
        }
        for proc in &self.types[ty.index()].procedures {
            let desc = &self.procedures[proc.index()];
            hasher.update(desc.name.as_bytes());
            hasher.update(desc.signature.as_bytes());
            hasher.update([2u8]);
        }
        let digest = hasher.finalize();
        let mut bytes = [0u8; ChainDigest::LEN];
        bytes.copy_from_slice(&digest);
        ChainDigest::from_bytes(bytes)
    }

    fn entry_type(&self, beholder: TypeRef, index: u32) -> Option<TypeRef> {
        let entry = self.entry(beholder, index)?;
        self.entry_owner(beholder, entry)
    }

    fn entry_defining_type(
        &self,
        beholder: TypeRef,
        index: u32,
        is_static: bool,
    ) -> Option<TypeRef> {
        let entry = self.entry(beholder, index)?;
        match entry {
            SymbolEntry::Field {
                name,
                is_static: declared_static,
                ..
            } if *declared_static == is_static => {
                let owner = self.entry_owner(beholder, entry)?;
                self.declaring_type_of_field(owner, name, Some(is_static))
            }
            _ => None,
        }
    }

    fn entry_static_type(&self, beholder: TypeRef, index: u32) -> Option<TypeRef> {
        let entry = self.entry(beholder, index)?;
        match entry {
            SymbolEntry::Field {
                name,
                is_static: true,
                ..
            } => {
                let owner = self.entry_owner(beholder, entry)?;
                self.declaring_type_of_field(owner, name, Some(true))
            }
            SymbolEntry::Procedure {
                dispatch: DispatchKind::Static,
                ..
            } => {
                let proc = self.entry_procedure(beholder, index, DispatchKind::Static)?;
                Some(self.owner_of(proc))
            }
            _ => None,
        }
    }

    fn entry_declaring_type(&self, beholder: TypeRef, index: u32) -> Option<TypeRef> {
        let entry = self.entry(beholder, index)?;
        match entry {
            SymbolEntry::Field { name, .. } => {
                let owner = self.entry_owner(beholder, entry)?;
                self.declaring_type_of_field(owner, name, None)
            }
            _ => None,
        }
    }

    fn entry_dispatch_type(&self, beholder: TypeRef, index: u32) -> Option<TypeRef> {
        let entry = self.entry(beholder, index)?;
        match entry {
            SymbolEntry::Procedure {
                dispatch: DispatchKind::Interface,
                ..
            } => {
                let owner = self.entry_owner(beholder, entry)?;
                self.types[owner.index()]
                    .flags
                    .contains(TypeFlags::INTERFACE)
                    .then_some(owner)
            }
            _ => None,
        }
    }

    fn entry_procedure(
        &self,
        beholder: TypeRef,
        index: u32,
        dispatch: DispatchKind,
    ) -> Option<ProcRef> {
        let entry = self.entry(beholder, index)?;
        let SymbolEntry::Procedure {
            name,
            signature,
            dispatch: declared,
            ..
        } = entry
        else {
            return None;
        };
        if *declared != dispatch {
            return None;
        }
        let owner = self.entry_owner(beholder, entry)?;
        let wants_static = dispatch == DispatchKind::Static;
        self.find_procedure(owner, name, signature, |desc| {
            desc.flags.contains(ProcFlags::STATIC) == wants_static
        })
    }

    fn entry_interface_procedure(
        &self,
        beholder: TypeRef,
        lookup: TypeRef,
        index: u32,
    ) -> Option<ProcRef> {
        match self.entry(beholder, index)? {
            SymbolEntry::Procedure {
                name,
                signature,
                dispatch: DispatchKind::Interface,
                ..
            } => self.find_procedure(lookup, name, signature, |desc| {
                !desc.flags.contains(ProcFlags::STATIC)
            }),
            _ => None,
        }
    }

    fn entry_improper_interface_procedure(&self, beholder: TypeRef, index: u32) -> Option<ProcRef> {
        let entry = self.entry(beholder, index)?;
        let SymbolEntry::Procedure {
            name,
            signature,
            dispatch: DispatchKind::Interface,
            ..
        } = entry
        else {
            return None;
        };
        let owner = self.entry_owner(beholder, entry)?;
        let instance = |desc: &ProcDesc| !desc.flags.contains(ProcFlags::STATIC);
        let proc = self
            .find_procedure(owner, name, signature, instance)
            .or_else(|| self.find_procedure(self.root, name, signature, instance))?;
        let declaring = &self.types[self.procedures[proc.index()].owner.index()];
        (!declaring.flags.contains(TypeFlags::INTERFACE)).then_some(proc)
    }

    fn owner_of(&self, proc: ProcRef) -> TypeRef {
        self.procedures[proc.index()].owner
    }

    fn super_type(&self, ty: TypeRef) -> Option<TypeRef> {
        self.types[ty.index()].super_type
    }

    fn component_type(&self, ty: TypeRef) -> Option<TypeRef> {
        self.types[ty.index()].component
    }

    fn array_type(&self, ty: TypeRef) -> Option<TypeRef> {
        self.types[ty.index()].array
    }

    fn is_instance_of(
        &self,
        object: TypeRef,
        cast: TypeRef,
        object_fixed: bool,
        _cast_fixed: bool,
    ) -> TriState {
        if self.is_subtype(object, cast) {
            return TriState::Yes;
        }
        if object_fixed {
            return TriState::No;
        }
        let either_interface = self.types[object.index()]
            .flags
            .contains(TypeFlags::INTERFACE)
            || self.types[cast.index()].flags.contains(TypeFlags::INTERFACE);
        if either_interface || self.is_subtype(cast, object) {
            TriState::Maybe
        } else {
            TriState::No
        }
    }

    fn single_concrete_subtype(&self, ty: TypeRef) -> Option<TypeRef> {
        let mut subtypes = self.concrete_subtypes(ty);
        let first = subtypes.next()?;
        subtypes.next().is_none().then_some(first)
    }

    fn is_initialized(&self, ty: TypeRef) -> bool {
        self.types[ty.index()]
            .flags
            .contains(TypeFlags::INITIALIZED)
    }

    fn procedure_at(&self, ty: TypeRef, index: u32) -> Option<ProcRef> {
        self.types[ty.index()]
            .procedures
            .get(index as usize)
            .copied()
    }

    fn virtual_procedure_at(
        &self,
        ty: TypeRef,
        offset: i32,
        ignore_rt_resolve: bool,
    ) -> Option<ProcRef> {
        let slot = usize::try_from(offset).ok()?;
        let proc = *self.types[ty.index()].vtable.get(slot)?;
        let is_abstract = self.procedures[proc.index()]
            .flags
            .contains(ProcFlags::ABSTRACT);
        (ignore_rt_resolve || !is_abstract).then_some(proc)
    }

    fn procedure_by_signature(
        &self,
        owner: TypeRef,
        beholder: TypeRef,
        name: &str,
        signature: &str,
    ) -> Option<ProcRef> {
        self.find_procedure(owner, name, signature, |desc| {
            !desc.flags.contains(ProcFlags::PRIVATE) || desc.owner == beholder
        })
    }

    fn single_implementer(
        &self,
        this_type: TypeRef,
        slot: u32,
        _caller: ProcRef,
    ) -> Option<ProcRef> {
        self.unique_implementation(this_type, |candidate| {
            self.types[candidate.index()]
                .vtable
                .get(slot as usize)
                .copied()
        })
    }

    fn single_interface_implementer(
        &self,
        this_type: TypeRef,
        index: u32,
        caller: ProcRef,
    ) -> Option<ProcRef> {
        if !self.types[this_type.index()]
            .flags
            .contains(TypeFlags::INTERFACE)
        {
            return None;
        }
        let caller_owner = self.owner_of(caller);
        let SymbolEntry::Procedure {
            name,
            signature,
            dispatch: DispatchKind::Interface,
            ..
        } = self.entry(caller_owner, index)?
        else {
            return None;
        };
        self.unique_implementation(this_type, |candidate| {
            self.find_procedure(candidate, name, signature, |desc| {
                !desc.flags.intersects(ProcFlags::STATIC | ProcFlags::ABSTRACT)
            })
        })
    }

    fn single_abstract_implementer(
        &self,
        this_type: TypeRef,
        slot: u32,
        caller: ProcRef,
    ) -> Option<ProcRef> {
        let desc = &self.types[this_type.index()];
        if !desc.flags.contains(TypeFlags::ABSTRACT) {
            return None;
        }
        let declared = *desc.vtable.get(slot as usize)?;
        if !self.procedures[declared.index()]
            .flags
            .contains(ProcFlags::ABSTRACT)
        {
            return None;
        }
        self.single_implementer(this_type, slot, caller)
    }

    fn may_skip_frames(&self, proc: ProcRef, owner: TypeRef) -> bool {
        let desc = &self.procedures[proc.index()];
        desc.owner == owner && desc.flags.contains(ProcFlags::MAY_SKIP_FRAMES)
    }
}

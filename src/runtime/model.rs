//! Read-only query surface the validation manager needs from the runtime's object model.

use std::fmt;

use super::entry::DispatchKind;
use super::handle::{ProcRef, TypeRef};

/// Three-valued answer for queries that may be undecidable from static knowledge alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TriState {
    Yes,
    No,
    Maybe,
}

/// SHA-256 fingerprint of a type's shape: its supertype chain, interfaces and declared
/// procedures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChainDigest([u8; 32]);

impl ChainDigest {
    pub const LEN: usize = 32;

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ChainDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..6] {
            write!(f, "{byte:02x}")?;
        }
        f.write_str("…")
    }
}

/// Queries consumed from the runtime. Implementations must never hand out two different
/// handles for the same live entity.
pub trait ObjectModel {
    /// Root of the type hierarchy; pre-seeded with a guaranteed ID.
    fn root_type(&self) -> TypeRef;
    /// Type that describes types themselves; pre-seeded with a guaranteed ID.
    fn meta_type(&self) -> TypeRef;

    fn type_name(&self, ty: TypeRef) -> &str;
    fn procedure_name(&self, proc: ProcRef) -> &str;
    fn procedure_signature(&self, proc: ProcRef) -> &str;

    /// Resolves `name` inside the naming context `beholder` sees.
    fn type_by_name(&self, beholder: TypeRef, name: &str) -> Option<TypeRef>;
    fn system_type_by_name(&self, name: &str) -> Option<TypeRef>;
    /// Finds a type by name whose shape still matches `chain`.
    fn type_by_chain(&self, name: &str, chain: &ChainDigest) -> Option<TypeRef>;
    fn chain_digest(&self, ty: TypeRef) -> ChainDigest;

    fn entry_type(&self, beholder: TypeRef, index: u32) -> Option<TypeRef>;
    fn entry_defining_type(
        &self,
        beholder: TypeRef,
        index: u32,
        is_static: bool,
    ) -> Option<TypeRef>;
    fn entry_static_type(&self, beholder: TypeRef, index: u32) -> Option<TypeRef>;
    fn entry_declaring_type(&self, beholder: TypeRef, index: u32) -> Option<TypeRef>;
    fn entry_dispatch_type(&self, beholder: TypeRef, index: u32) -> Option<TypeRef>;
    fn entry_procedure(
        &self,
        beholder: TypeRef,
        index: u32,
        dispatch: DispatchKind,
    ) -> Option<ProcRef>;
    fn entry_interface_procedure(
        &self,
        beholder: TypeRef,
        lookup: TypeRef,
        index: u32,
    ) -> Option<ProcRef>;
    fn entry_improper_interface_procedure(&self, beholder: TypeRef, index: u32) -> Option<ProcRef>;

    fn owner_of(&self, proc: ProcRef) -> TypeRef;
    fn super_type(&self, ty: TypeRef) -> Option<TypeRef>;
    fn component_type(&self, ty: TypeRef) -> Option<TypeRef>;
    fn array_type(&self, ty: TypeRef) -> Option<TypeRef>;
    fn is_instance_of(
        &self,
        object: TypeRef,
        cast: TypeRef,
        object_fixed: bool,
        cast_fixed: bool,
    ) -> TriState;
    fn single_concrete_subtype(&self, ty: TypeRef) -> Option<TypeRef>;
    fn is_initialized(&self, ty: TypeRef) -> bool;

    fn procedure_at(&self, ty: TypeRef, index: u32) -> Option<ProcRef>;
    fn virtual_procedure_at(
        &self,
        ty: TypeRef,
        offset: i32,
        ignore_rt_resolve: bool,
    ) -> Option<ProcRef>;
    fn procedure_by_signature(
        &self,
        owner: TypeRef,
        beholder: TypeRef,
        name: &str,
        signature: &str,
    ) -> Option<ProcRef>;
    fn single_implementer(&self, this_type: TypeRef, slot: u32, caller: ProcRef) -> Option<ProcRef>;
    fn single_interface_implementer(
        &self,
        this_type: TypeRef,
        index: u32,
        caller: ProcRef,
    ) -> Option<ProcRef>;
    fn single_abstract_implementer(
        &self,
        this_type: TypeRef,
        slot: u32,
        caller: ProcRef,
    ) -> Option<ProcRef>;
    fn may_skip_frames(&self, proc: ProcRef, owner: TypeRef) -> bool;

    fn is_array(&self, ty: TypeRef) -> bool {
        self.component_type(ty).is_some()
    }

    /// Strips array layers off `ty`, returning the innermost component and the number of
    /// dimensions removed.
    fn base_component(&self, ty: TypeRef) -> (TypeRef, u32) {
        let mut current = ty;
        let mut dims = 0;
        while let Some(component) = self.component_type(current) {
            current = component;
            dims += 1;
        }
        (current, dims)
    }
}

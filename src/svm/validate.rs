//! Load-time side: one `validate_*_record` operation per record kind.
//!
//! Operands that an earlier record must have bound are resolved with the asserting lookup; the
//! symbol a record defines is recomputed against the live model and checked (or bound) with
//! [`SymbolValidationManager::validate_symbol`]. `Ok(false)` means the runtime has drifted.

use tracing::debug;

use crate::runtime::{
    ChainDigest, DispatchKind, ObjectModel, ProcRef, Symbol, SymbolCategory, TriState, TypeRef,
};

use super::error::SvmResult;
use super::id::{Presence, SymbolId};
use super::identity::Binding;
use super::manager::{LOADING, SymbolValidationManager};
use super::record::{PersistedRecord, ValidationRecord};

impl<'m, M: ObjectModel + ?Sized> SymbolValidationManager<'m, M> {
    #[track_caller]
    fn bound_type(&self, id: SymbolId) -> SvmResult<TypeRef> {
        match self.get_symbol_from_id(id, SymbolCategory::Type, Presence::Required)? {
            Some(Symbol::Type(ty)) => Ok(ty),
            _ => Err(self.invariant(format!("{id} does not name a type"))),
        }
    }

    #[track_caller]
    fn bound_procedure(&self, id: SymbolId) -> SvmResult<ProcRef> {
        match self.get_symbol_from_id(id, SymbolCategory::Procedure, Presence::Required)? {
            Some(Symbol::Procedure(proc)) => Ok(proc),
            _ => Err(self.invariant(format!("{id} does not name a procedure"))),
        }
    }

    /// Checks a recomputed symbol against `id`: binds it on first sight, otherwise requires the
    /// same symbol. A missing symbol, or one already reached through another ID, fails.
    pub fn validate_symbol(&mut self, id: SymbolId, symbol: Option<Symbol>) -> SvmResult<bool> {
        self.expect_phase("validate_symbol", LOADING)?;
        Ok(self.bind_symbol(id, symbol))
    }

    fn bind_symbol(&mut self, id: SymbolId, symbol: Option<Symbol>) -> bool {
        let Some(symbol) = symbol else {
            debug!(%id, "symbol no longer resolves");
            return false;
        };
        match self.ids.set_symbol_of_id(id, symbol) {
            Binding::Bound => {
                debug!(%id, %symbol, "symbol ID bound");
                true
            }
            Binding::Confirmed => true,
            Binding::Conflict => {
                debug!(%id, %symbol, "symbol ID conflicts with an earlier binding");
                false
            }
        }
    }

    fn validate_type(&mut self, id: SymbolId, ty: Option<TypeRef>) -> bool {
        self.bind_symbol(id, ty.map(Symbol::Type))
    }

    fn validate_procedure(&mut self, id: SymbolId, procedure: Option<ProcRef>) -> bool {
        self.bind_symbol(id, procedure.map(Symbol::Procedure))
    }

    pub fn validate_type_by_name_record(
        &mut self,
        ty: SymbolId,
        beholder: SymbolId,
        name: &str,
    ) -> SvmResult<bool> {
        self.expect_phase("validate_type_by_name_record", LOADING)?;
        let beholder = self.bound_type(beholder)?;
        let found = self.model.type_by_name(beholder, name);
        Ok(self.validate_type(ty, found))
    }

    pub fn validate_profiled_type_record(
        &mut self,
        ty: SymbolId,
        name: &str,
        chain: &ChainDigest,
    ) -> SvmResult<bool> {
        self.expect_phase("validate_profiled_type_record", LOADING)?;
        let found = self.model.type_by_chain(name, chain);
        Ok(self.validate_type(ty, found))
    }

    pub fn validate_type_from_entry_record(
        &mut self,
        ty: SymbolId,
        beholder: SymbolId,
        index: u32,
    ) -> SvmResult<bool> {
        self.expect_phase("validate_type_from_entry_record", LOADING)?;
        let beholder = self.bound_type(beholder)?;
        let found = self.model.entry_type(beholder, index);
        Ok(self.validate_type(ty, found))
    }

    pub fn validate_defining_type_from_entry_record(
        &mut self,
        ty: SymbolId,
        beholder: SymbolId,
        index: u32,
        is_static: bool,
    ) -> SvmResult<bool> {
        self.expect_phase("validate_defining_type_from_entry_record", LOADING)?;
        let beholder = self.bound_type(beholder)?;
        let found = self.model.entry_defining_type(beholder, index, is_static);
        Ok(self.validate_type(ty, found))
    }

    pub fn validate_static_type_from_entry_record(
        &mut self,
        ty: SymbolId,
        beholder: SymbolId,
        index: u32,
    ) -> SvmResult<bool> {
        self.expect_phase("validate_static_type_from_entry_record", LOADING)?;
        let beholder = self.bound_type(beholder)?;
        let found = self.model.entry_static_type(beholder, index);
        Ok(self.validate_type(ty, found))
    }

    pub fn validate_type_from_procedure_record(
        &mut self,
        ty: SymbolId,
        procedure: SymbolId,
    ) -> SvmResult<bool> {
        self.expect_phase("validate_type_from_procedure_record", LOADING)?;
        let procedure = self.bound_procedure(procedure)?;
        let owner = self.model.owner_of(procedure);
        Ok(self.validate_type(ty, Some(owner)))
    }

    pub fn validate_component_type_from_array_record(
        &mut self,
        component: SymbolId,
        array: SymbolId,
    ) -> SvmResult<bool> {
        self.expect_phase("validate_component_type_from_array_record", LOADING)?;
        let array = self.bound_type(array)?;
        let found = self.model.component_type(array);
        Ok(self.validate_type(component, found))
    }

    pub fn validate_array_type_from_component_record(
        &mut self,
        array: SymbolId,
        component: SymbolId,
    ) -> SvmResult<bool> {
        self.expect_phase("validate_array_type_from_component_record", LOADING)?;
        let component = self.bound_type(component)?;
        let found = self.model.array_type(component);
        Ok(self.validate_type(array, found))
    }

    pub fn validate_super_type_from_type_record(
        &mut self,
        super_type: SymbolId,
        child: SymbolId,
    ) -> SvmResult<bool> {
        self.expect_phase("validate_super_type_from_type_record", LOADING)?;
        let child = self.bound_type(child)?;
        let found = self.model.super_type(child);
        Ok(self.validate_type(super_type, found))
    }

    /// An indeterminate answer now fails regardless of what was recorded.
    pub fn validate_type_instance_of_type_record(
        &mut self,
        object: SymbolId,
        cast: SymbolId,
        object_fixed: bool,
        cast_fixed: bool,
        was_instance: bool,
    ) -> SvmResult<bool> {
        self.expect_phase("validate_type_instance_of_type_record", LOADING)?;
        let object = self.bound_type(object)?;
        let cast = self.bound_type(cast)?;
        Ok(match self.model.is_instance_of(object, cast, object_fixed, cast_fixed) {
            TriState::Yes => was_instance,
            TriState::No => !was_instance,
            TriState::Maybe => false,
        })
    }

    pub fn validate_system_type_by_name_record(
        &mut self,
        ty: SymbolId,
        name: &str,
    ) -> SvmResult<bool> {
        self.expect_phase("validate_system_type_by_name_record", LOADING)?;
        let found = self.model.system_type_by_name(name);
        Ok(self.validate_type(ty, found))
    }

    pub fn validate_type_from_dispatch_entry_record(
        &mut self,
        ty: SymbolId,
        beholder: SymbolId,
        index: u32,
    ) -> SvmResult<bool> {
        self.expect_phase("validate_type_from_dispatch_entry_record", LOADING)?;
        let beholder = self.bound_type(beholder)?;
        let found = self.model.entry_dispatch_type(beholder, index);
        Ok(self.validate_type(ty, found))
    }

    pub fn validate_declaring_type_from_field_record(
        &mut self,
        ty: SymbolId,
        beholder: SymbolId,
        index: u32,
    ) -> SvmResult<bool> {
        self.expect_phase("validate_declaring_type_from_field_record", LOADING)?;
        let beholder = self.bound_type(beholder)?;
        let found = self.model.entry_declaring_type(beholder, index);
        Ok(self.validate_type(ty, found))
    }

    pub fn validate_meta_type_from_type_record(
        &mut self,
        meta: SymbolId,
        object: SymbolId,
    ) -> SvmResult<bool> {
        self.expect_phase("validate_meta_type_from_type_record", LOADING)?;
        self.bound_type(object)?;
        let meta_type = self.model.meta_type();
        Ok(self.validate_type(meta, Some(meta_type)))
    }

    pub fn validate_concrete_subtype_from_type_record(
        &mut self,
        child: SymbolId,
        super_type: SymbolId,
    ) -> SvmResult<bool> {
        self.expect_phase("validate_concrete_subtype_from_type_record", LOADING)?;
        let super_type = self.bound_type(super_type)?;
        let found = self.model.single_concrete_subtype(super_type);
        Ok(self.validate_type(child, found))
    }

    pub fn validate_type_chain_record(
        &mut self,
        ty: SymbolId,
        chain: &ChainDigest,
    ) -> SvmResult<bool> {
        self.expect_phase("validate_type_chain_record", LOADING)?;
        let ty = self.bound_type(ty)?;
        Ok(self.model.chain_digest(ty) == *chain)
    }

    pub fn validate_procedure_from_type_record(
        &mut self,
        procedure: SymbolId,
        beholder: SymbolId,
        index: u32,
    ) -> SvmResult<bool> {
        self.expect_phase("validate_procedure_from_type_record", LOADING)?;
        let beholder = self.bound_type(beholder)?;
        let found = self.model.procedure_at(beholder, index);
        Ok(self.validate_procedure(procedure, found))
    }

    fn validate_procedure_from_entry(
        &mut self,
        operation: &'static str,
        procedure: SymbolId,
        beholder: SymbolId,
        index: u32,
        dispatch: DispatchKind,
    ) -> SvmResult<bool> {
        self.expect_phase(operation, LOADING)?;
        let beholder = self.bound_type(beholder)?;
        let found = self.model.entry_procedure(beholder, index, dispatch);
        Ok(self.validate_procedure(procedure, found))
    }

    pub fn validate_static_procedure_from_entry_record(
        &mut self,
        procedure: SymbolId,
        beholder: SymbolId,
        index: u32,
    ) -> SvmResult<bool> {
        self.validate_procedure_from_entry(
            "validate_static_procedure_from_entry_record",
            procedure,
            beholder,
            index,
            DispatchKind::Static,
        )
    }

    pub fn validate_special_procedure_from_entry_record(
        &mut self,
        procedure: SymbolId,
        beholder: SymbolId,
        index: u32,
    ) -> SvmResult<bool> {
        self.validate_procedure_from_entry(
            "validate_special_procedure_from_entry_record",
            procedure,
            beholder,
            index,
            DispatchKind::Special,
        )
    }

    pub fn validate_virtual_procedure_from_entry_record(
        &mut self,
        procedure: SymbolId,
        beholder: SymbolId,
        index: u32,
    ) -> SvmResult<bool> {
        self.validate_procedure_from_entry(
            "validate_virtual_procedure_from_entry_record",
            procedure,
            beholder,
            index,
            DispatchKind::Virtual,
        )
    }

    pub fn validate_virtual_procedure_from_offset_record(
        &mut self,
        procedure: SymbolId,
        beholder: SymbolId,
        offset: i32,
        ignore_rt_resolve: bool,
    ) -> SvmResult<bool> {
        self.expect_phase("validate_virtual_procedure_from_offset_record", LOADING)?;
        let beholder = self.bound_type(beholder)?;
        let found = self.model.virtual_procedure_at(beholder, offset, ignore_rt_resolve);
        Ok(self.validate_procedure(procedure, found))
    }

    pub fn validate_interface_procedure_from_entry_record(
        &mut self,
        procedure: SymbolId,
        beholder: SymbolId,
        lookup: SymbolId,
        index: u32,
    ) -> SvmResult<bool> {
        self.expect_phase("validate_interface_procedure_from_entry_record", LOADING)?;
        let beholder = self.bound_type(beholder)?;
        let lookup = self.bound_type(lookup)?;
        let found = self.model.entry_interface_procedure(beholder, lookup, index);
        Ok(self.validate_procedure(procedure, found))
    }

    pub fn validate_improper_interface_procedure_from_entry_record(
        &mut self,
        procedure: SymbolId,
        beholder: SymbolId,
        index: u32,
    ) -> SvmResult<bool> {
        self.expect_phase("validate_improper_interface_procedure_from_entry_record", LOADING)?;
        let beholder = self.bound_type(beholder)?;
        let found = self.model.entry_improper_interface_procedure(beholder, index);
        Ok(self.validate_procedure(procedure, found))
    }

    pub fn validate_procedure_from_type_and_signature_record(
        &mut self,
        procedure: SymbolId,
        owner: SymbolId,
        beholder: SymbolId,
        name: &str,
        signature: &str,
    ) -> SvmResult<bool> {
        self.expect_phase("validate_procedure_from_type_and_signature_record", LOADING)?;
        let owner = self.bound_type(owner)?;
        let beholder = self.bound_type(beholder)?;
        let found = self.model.procedure_by_signature(owner, beholder, name, signature);
        Ok(self.validate_procedure(procedure, found))
    }

    pub fn validate_stack_walker_may_skip_frames_record(
        &mut self,
        procedure: SymbolId,
        owner: SymbolId,
        could_skip_frames: bool,
    ) -> SvmResult<bool> {
        self.expect_phase("validate_stack_walker_may_skip_frames_record", LOADING)?;
        let procedure = self.bound_procedure(procedure)?;
        let owner = self.bound_type(owner)?;
        Ok(self.model.may_skip_frames(procedure, owner) == could_skip_frames)
    }

    /// Only a type that was initialized at compile time and no longer is fails.
    pub fn validate_type_initialization_record(
        &mut self,
        ty: SymbolId,
        was_initialized: bool,
    ) -> SvmResult<bool> {
        self.expect_phase("validate_type_initialization_record", LOADING)?;
        let ty = self.bound_type(ty)?;
        Ok(!was_initialized || self.model.is_initialized(ty))
    }

    pub fn validate_procedure_from_single_implementer_record(
        &mut self,
        procedure: SymbolId,
        this_type: SymbolId,
        slot: u32,
        caller: SymbolId,
    ) -> SvmResult<bool> {
        self.expect_phase("validate_procedure_from_single_implementer_record", LOADING)?;
        let this_type = self.bound_type(this_type)?;
        let caller = self.bound_procedure(caller)?;
        let found = self.model.single_implementer(this_type, slot, caller);
        Ok(self.validate_procedure(procedure, found))
    }

    pub fn validate_procedure_from_single_interface_implementer_record(
        &mut self,
        procedure: SymbolId,
        this_type: SymbolId,
        index: u32,
        caller: SymbolId,
    ) -> SvmResult<bool> {
        self.expect_phase("validate_procedure_from_single_interface_implementer_record", LOADING)?;
        let this_type = self.bound_type(this_type)?;
        let caller = self.bound_procedure(caller)?;
        let found = self.model.single_interface_implementer(this_type, index, caller);
        Ok(self.validate_procedure(procedure, found))
    }

    pub fn validate_procedure_from_single_abstract_implementer_record(
        &mut self,
        procedure: SymbolId,
        this_type: SymbolId,
        slot: u32,
        caller: SymbolId,
    ) -> SvmResult<bool> {
        self.expect_phase("validate_procedure_from_single_abstract_implementer_record", LOADING)?;
        let this_type = self.bound_type(this_type)?;
        let caller = self.bound_procedure(caller)?;
        let found = self.model.single_abstract_implementer(this_type, slot, caller);
        Ok(self.validate_procedure(procedure, found))
    }

    /// Dispatches one persisted record to its kind's check.
    pub fn validate_record(&mut self, record: &PersistedRecord) -> SvmResult<bool> {
        match record {
            ValidationRecord::TypeByName { ty, beholder, name } => {
                self.validate_type_by_name_record(*ty, *beholder, name)
            }
            ValidationRecord::ProfiledType { ty, name, chain } => {
                self.validate_profiled_type_record(*ty, name, chain)
            }
            ValidationRecord::TypeFromEntry { ty, beholder, index } => {
                self.validate_type_from_entry_record(*ty, *beholder, *index)
            }
            ValidationRecord::DefiningTypeFromEntry {
                ty,
                beholder,
                index,
                is_static,
            } => self.validate_defining_type_from_entry_record(*ty, *beholder, *index, *is_static),
            ValidationRecord::StaticTypeFromEntry { ty, beholder, index } => {
                self.validate_static_type_from_entry_record(*ty, *beholder, *index)
            }
            ValidationRecord::TypeFromProcedure { ty, procedure } => {
                self.validate_type_from_procedure_record(*ty, *procedure)
            }
            ValidationRecord::ComponentTypeFromArray { component, array } => {
                self.validate_component_type_from_array_record(*component, *array)
            }
            ValidationRecord::ArrayTypeFromComponent { array, component } => {
                self.validate_array_type_from_component_record(*array, *component)
            }
            ValidationRecord::SuperTypeFromType { super_type, child } => {
                self.validate_super_type_from_type_record(*super_type, *child)
            }
            ValidationRecord::TypeInstanceOfType {
                object,
                cast,
                object_fixed,
                cast_fixed,
                is_instance,
            } => self.validate_type_instance_of_type_record(
                *object,
                *cast,
                *object_fixed,
                *cast_fixed,
                *is_instance,
            ),
            ValidationRecord::SystemTypeByName { ty, name } => {
                self.validate_system_type_by_name_record(*ty, name)
            }
            ValidationRecord::TypeFromDispatchEntry { ty, beholder, index } => {
                self.validate_type_from_dispatch_entry_record(*ty, *beholder, *index)
            }
            ValidationRecord::DeclaringTypeFromField { ty, beholder, index } => {
                self.validate_declaring_type_from_field_record(*ty, *beholder, *index)
            }
            ValidationRecord::MetaTypeFromType { meta, object } => {
                self.validate_meta_type_from_type_record(*meta, *object)
            }
            ValidationRecord::ConcreteSubtypeFromType { child, super_type } => {
                self.validate_concrete_subtype_from_type_record(*child, *super_type)
            }
            ValidationRecord::TypeChain { ty, chain } => {
                self.validate_type_chain_record(*ty, chain)
            }
            ValidationRecord::ProcedureFromType {
                beholder,
                procedure,
                index,
            } => self.validate_procedure_from_type_record(*procedure, *beholder, *index),
            ValidationRecord::StaticProcedureFromEntry {
                beholder,
                procedure,
                index,
            } => self.validate_static_procedure_from_entry_record(*procedure, *beholder, *index),
            ValidationRecord::SpecialProcedureFromEntry {
                beholder,
                procedure,
                index,
            } => self.validate_special_procedure_from_entry_record(*procedure, *beholder, *index),
            ValidationRecord::VirtualProcedureFromEntry {
                beholder,
                procedure,
                index,
            } => self.validate_virtual_procedure_from_entry_record(*procedure, *beholder, *index),
            ValidationRecord::VirtualProcedureFromOffset {
                beholder,
                procedure,
                offset,
                ignore_rt_resolve,
            } => self.validate_virtual_procedure_from_offset_record(
                *procedure,
                *beholder,
                *offset,
                *ignore_rt_resolve,
            ),
            ValidationRecord::InterfaceProcedureFromEntry {
                beholder,
                lookup,
                procedure,
                index,
            } => self.validate_interface_procedure_from_entry_record(
                *procedure,
                *beholder,
                *lookup,
                *index,
            ),
            ValidationRecord::ImproperInterfaceProcedureFromEntry {
                beholder,
                procedure,
                index,
            } => self.validate_improper_interface_procedure_from_entry_record(
                *procedure,
                *beholder,
                *index,
            ),
            ValidationRecord::ProcedureFromTypeAndSignature {
                owner,
                beholder,
                procedure,
                name,
                signature,
            } => self.validate_procedure_from_type_and_signature_record(
                *procedure,
                *owner,
                *beholder,
                name,
                signature,
            ),
            ValidationRecord::StackWalkerMaySkipFrames {
                owner,
                procedure,
                skip_frames,
            } => self.validate_stack_walker_may_skip_frames_record(
                *procedure,
                *owner,
                *skip_frames,
            ),
            ValidationRecord::TypeInitialization { ty, is_initialized } => {
                self.validate_type_initialization_record(*ty, *is_initialized)
            }
            ValidationRecord::ProcedureFromSingleImplementer {
                this_type,
                procedure,
                caller,
                slot,
            } => self.validate_procedure_from_single_implementer_record(
                *procedure,
                *this_type,
                *slot,
                *caller,
            ),
            ValidationRecord::ProcedureFromSingleInterfaceImplementer {
                this_type,
                procedure,
                caller,
                index,
            } => self.validate_procedure_from_single_interface_implementer_record(
                *procedure,
                *this_type,
                *index,
                *caller,
            ),
            ValidationRecord::ProcedureFromSingleAbstractImplementer {
                this_type,
                procedure,
                caller,
                slot,
            } => self.validate_procedure_from_single_abstract_implementer_record(
                *procedure,
                *this_type,
                *slot,
                *caller,
            ),
        }
    }
}

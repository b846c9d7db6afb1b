//! Compile-time side: one `add_*_record` operation per record kind.
//!
//! Every operation returns `Ok(true)` when the defined symbol may now be relied upon and
//! `Ok(false)` when it was deliberately left unrecorded (no symbol, or a heuristic region is
//! open). Already-present records count as success.

use crate::runtime::{ObjectModel, ProcRef, Symbol, TypeRef};

use super::error::SvmResult;
use super::manager::{BUILDING, SymbolValidationManager};
use super::record::ValidationRecord;

impl<'m, M: ObjectModel + ?Sized> SymbolValidationManager<'m, M> {
    fn definable<T>(&self, symbol: Option<T>) -> Option<T> {
        symbol.filter(|_| !self.in_heuristic_region())
    }

    /// Every operand other than the one the record defines must already carry an ID.
    #[track_caller]
    fn assert_operands_validated(&self, record: &ValidationRecord) -> SvmResult<()> {
        let defined = record.defined_symbol();
        let mut skipped = false;
        for symbol in record.symbols() {
            if !skipped && Some(symbol) == defined {
                skipped = true;
                continue;
            }
            if !self.is_already_validated(symbol) {
                return Err(self.invariant(format!(
                    "{symbol} should have already been validated for {}",
                    record.kind().name()
                )));
            }
        }
        Ok(())
    }

    fn add_type_record(&mut self, ty: TypeRef, record: ValidationRecord) -> SvmResult<bool> {
        self.assert_operands_validated(&record)?;
        if self.is_already_validated(ty) {
            self.append_record_if_new(Some(Symbol::Type(ty)), record)?;
            return Ok(true);
        }
        self.append_new_record(Some(Symbol::Type(ty)), record)?;
        if !self.model.is_array(ty) {
            let chain = self.model.chain_digest(ty);
            self.append_record_if_new(None, ValidationRecord::TypeChain { ty, chain })?;
        }
        Ok(true)
    }

    fn add_procedure_record(
        &mut self,
        procedure: ProcRef,
        record: ValidationRecord,
    ) -> SvmResult<bool> {
        self.assert_operands_validated(&record)?;
        if self.is_already_validated(procedure) {
            self.append_record_if_new(Some(Symbol::Procedure(procedure)), record)?;
            return Ok(true);
        }
        self.append_new_record(Some(Symbol::Procedure(procedure)), record)?;
        let owner = self.model.owner_of(procedure);
        if !self.is_already_validated(owner) {
            self.add_type_record(
                owner,
                ValidationRecord::TypeFromProcedure { ty: owner, procedure },
            )?;
        }
        Ok(true)
    }

    fn add_check_record(&mut self, record: ValidationRecord) -> SvmResult<bool> {
        if self.in_heuristic_region() {
            return Ok(false);
        }
        self.assert_operands_validated(&record)?;
        self.append_record_if_new(None, record)?;
        Ok(true)
    }

    /// Records a name-derived type. Arrays are recorded through their base component plus one
    /// array record per dimension, so a broken chain fails at the exact dimension.
    fn add_named_type_record(
        &mut self,
        ty: TypeRef,
        make: impl FnOnce(TypeRef) -> ValidationRecord,
    ) -> SvmResult<bool> {
        let (component, dims) = self.model.base_component(ty);
        if dims > self.config.max_array_dimensions {
            return Err(self.limit(format!(
                "{ty} has {dims} array dimensions, the limit is {}",
                self.config.max_array_dimensions
            )));
        }
        self.add_type_record(component, make(component))?;
        let mut current = component;
        for _ in 0..dims {
            let Some(array) = self.model.array_type(current) else {
                return Err(self.invariant(format!(
                    "array type of {current} vanished while unrolling {ty}"
                )));
            };
            self.add_type_record(
                array,
                ValidationRecord::ArrayTypeFromComponent {
                    array,
                    component: current,
                },
            )?;
            current = array;
        }
        Ok(true)
    }

    pub fn add_type_by_name_record(
        &mut self,
        ty: Option<TypeRef>,
        beholder: TypeRef,
    ) -> SvmResult<bool> {
        self.expect_phase("add_type_by_name_record", BUILDING)?;
        let Some(ty) = self.definable(ty) else {
            return Ok(false);
        };
        let model = self.model;
        self.add_named_type_record(ty, |component| ValidationRecord::TypeByName {
            ty: component,
            beholder,
            name: model.type_name(component).to_owned(),
        })
    }

    pub fn add_profiled_type_record(&mut self, ty: Option<TypeRef>) -> SvmResult<bool> {
        self.expect_phase("add_profiled_type_record", BUILDING)?;
        let Some(ty) = self.definable(ty) else {
            return Ok(false);
        };
        let model = self.model;
        self.add_named_type_record(ty, |component| ValidationRecord::ProfiledType {
            ty: component,
            name: model.type_name(component).to_owned(),
            chain: model.chain_digest(component),
        })
    }

    pub fn add_type_from_entry_record(
        &mut self,
        ty: Option<TypeRef>,
        beholder: TypeRef,
        index: u32,
    ) -> SvmResult<bool> {
        self.expect_phase("add_type_from_entry_record", BUILDING)?;
        let Some(ty) = self.definable(ty) else {
            return Ok(false);
        };
        self.add_type_record(ty, ValidationRecord::TypeFromEntry { ty, beholder, index })
    }

    pub fn add_defining_type_from_entry_record(
        &mut self,
        ty: Option<TypeRef>,
        beholder: TypeRef,
        index: u32,
        is_static: bool,
    ) -> SvmResult<bool> {
        self.expect_phase("add_defining_type_from_entry_record", BUILDING)?;
        let Some(ty) = self.definable(ty) else {
            return Ok(false);
        };
        self.add_type_record(
            ty,
            ValidationRecord::DefiningTypeFromEntry {
                ty,
                beholder,
                index,
                is_static,
            },
        )
    }

    pub fn add_static_type_from_entry_record(
        &mut self,
        ty: Option<TypeRef>,
        beholder: TypeRef,
        index: u32,
    ) -> SvmResult<bool> {
        self.expect_phase("add_static_type_from_entry_record", BUILDING)?;
        let Some(ty) = self.definable(ty) else {
            return Ok(false);
        };
        self.add_type_record(ty, ValidationRecord::StaticTypeFromEntry { ty, beholder, index })
    }

    pub fn add_type_from_procedure_record(
        &mut self,
        ty: Option<TypeRef>,
        procedure: ProcRef,
    ) -> SvmResult<bool> {
        self.expect_phase("add_type_from_procedure_record", BUILDING)?;
        let Some(ty) = self.definable(ty) else {
            return Ok(false);
        };
        self.add_type_record(ty, ValidationRecord::TypeFromProcedure { ty, procedure })
    }

    pub fn add_component_type_from_array_record(
        &mut self,
        component: Option<TypeRef>,
        array: TypeRef,
    ) -> SvmResult<bool> {
        self.expect_phase("add_component_type_from_array_record", BUILDING)?;
        let Some(component) = self.definable(component) else {
            return Ok(false);
        };
        self.add_type_record(
            component,
            ValidationRecord::ComponentTypeFromArray { component, array },
        )
    }

    pub fn add_array_type_from_component_record(
        &mut self,
        array: Option<TypeRef>,
        component: TypeRef,
    ) -> SvmResult<bool> {
        self.expect_phase("add_array_type_from_component_record", BUILDING)?;
        let Some(array) = self.definable(array) else {
            return Ok(false);
        };
        self.add_type_record(array, ValidationRecord::ArrayTypeFromComponent { array, component })
    }

    pub fn add_super_type_from_type_record(
        &mut self,
        super_type: Option<TypeRef>,
        child: TypeRef,
    ) -> SvmResult<bool> {
        self.expect_phase("add_super_type_from_type_record", BUILDING)?;
        let Some(super_type) = self.definable(super_type) else {
            return Ok(false);
        };
        self.add_type_record(super_type, ValidationRecord::SuperTypeFromType { super_type, child })
    }

    pub fn add_type_instance_of_type_record(
        &mut self,
        object: TypeRef,
        cast: TypeRef,
        object_fixed: bool,
        cast_fixed: bool,
        is_instance: bool,
    ) -> SvmResult<bool> {
        self.expect_phase("add_type_instance_of_type_record", BUILDING)?;
        self.add_check_record(ValidationRecord::TypeInstanceOfType {
            object,
            cast,
            object_fixed,
            cast_fixed,
            is_instance,
        })
    }

    pub fn add_system_type_by_name_record(&mut self, ty: Option<TypeRef>) -> SvmResult<bool> {
        self.expect_phase("add_system_type_by_name_record", BUILDING)?;
        let Some(ty) = self.definable(ty) else {
            return Ok(false);
        };
        let model = self.model;
        self.add_named_type_record(ty, |component| ValidationRecord::SystemTypeByName {
            ty: component,
            name: model.type_name(component).to_owned(),
        })
    }

    pub fn add_type_from_dispatch_entry_record(
        &mut self,
        ty: Option<TypeRef>,
        beholder: TypeRef,
        index: u32,
    ) -> SvmResult<bool> {
        self.expect_phase("add_type_from_dispatch_entry_record", BUILDING)?;
        let Some(ty) = self.definable(ty) else {
            return Ok(false);
        };
        self.add_type_record(ty, ValidationRecord::TypeFromDispatchEntry { ty, beholder, index })
    }

    pub fn add_declaring_type_from_field_record(
        &mut self,
        ty: Option<TypeRef>,
        beholder: TypeRef,
        index: u32,
    ) -> SvmResult<bool> {
        self.expect_phase("add_declaring_type_from_field_record", BUILDING)?;
        let Some(ty) = self.definable(ty) else {
            return Ok(false);
        };
        self.add_type_record(ty, ValidationRecord::DeclaringTypeFromField { ty, beholder, index })
    }

    pub fn add_meta_type_from_type_record(
        &mut self,
        meta: Option<TypeRef>,
        object: TypeRef,
    ) -> SvmResult<bool> {
        self.expect_phase("add_meta_type_from_type_record", BUILDING)?;
        let Some(meta) = self.definable(meta) else {
            return Ok(false);
        };
        self.add_type_record(meta, ValidationRecord::MetaTypeFromType { meta, object })
    }

    pub fn add_concrete_subtype_from_type_record(
        &mut self,
        child: Option<TypeRef>,
        super_type: TypeRef,
    ) -> SvmResult<bool> {
        self.expect_phase("add_concrete_subtype_from_type_record", BUILDING)?;
        let Some(child) = self.definable(child) else {
            return Ok(false);
        };
        self.add_type_record(child, ValidationRecord::ConcreteSubtypeFromType { child, super_type })
    }

    pub fn add_procedure_from_type_record(
        &mut self,
        procedure: Option<ProcRef>,
        beholder: TypeRef,
        index: u32,
    ) -> SvmResult<bool> {
        self.expect_phase("add_procedure_from_type_record", BUILDING)?;
        let Some(procedure) = self.definable(procedure) else {
            return Ok(false);
        };
        self.add_procedure_record(
            procedure,
            ValidationRecord::ProcedureFromType {
                beholder,
                procedure,
                index,
            },
        )
    }

    pub fn add_static_procedure_from_entry_record(
        &mut self,
        procedure: Option<ProcRef>,
        beholder: TypeRef,
        index: u32,
    ) -> SvmResult<bool> {
        self.expect_phase("add_static_procedure_from_entry_record", BUILDING)?;
        let Some(procedure) = self.definable(procedure) else {
            return Ok(false);
        };
        self.add_procedure_record(
            procedure,
            ValidationRecord::StaticProcedureFromEntry {
                beholder,
                procedure,
                index,
            },
        )
    }

    pub fn add_special_procedure_from_entry_record(
        &mut self,
        procedure: Option<ProcRef>,
        beholder: TypeRef,
        index: u32,
    ) -> SvmResult<bool> {
        self.expect_phase("add_special_procedure_from_entry_record", BUILDING)?;
        let Some(procedure) = self.definable(procedure) else {
            return Ok(false);
        };
        self.add_procedure_record(
            procedure,
            ValidationRecord::SpecialProcedureFromEntry {
                beholder,
                procedure,
                index,
            },
        )
    }

    pub fn add_virtual_procedure_from_entry_record(
        &mut self,
        procedure: Option<ProcRef>,
        beholder: TypeRef,
        index: u32,
    ) -> SvmResult<bool> {
        self.expect_phase("add_virtual_procedure_from_entry_record", BUILDING)?;
        let Some(procedure) = self.definable(procedure) else {
            return Ok(false);
        };
        self.add_procedure_record(
            procedure,
            ValidationRecord::VirtualProcedureFromEntry {
                beholder,
                procedure,
                index,
            },
        )
    }

    pub fn add_virtual_procedure_from_offset_record(
        &mut self,
        procedure: Option<ProcRef>,
        beholder: TypeRef,
        offset: i32,
        ignore_rt_resolve: bool,
    ) -> SvmResult<bool> {
        self.expect_phase("add_virtual_procedure_from_offset_record", BUILDING)?;
        let Some(procedure) = self.definable(procedure) else {
            return Ok(false);
        };
        self.add_procedure_record(
            procedure,
            ValidationRecord::VirtualProcedureFromOffset {
                beholder,
                procedure,
                offset,
                ignore_rt_resolve,
            },
        )
    }

    pub fn add_interface_procedure_from_entry_record(
        &mut self,
        procedure: Option<ProcRef>,
        beholder: TypeRef,
        lookup: TypeRef,
        index: u32,
    ) -> SvmResult<bool> {
        self.expect_phase("add_interface_procedure_from_entry_record", BUILDING)?;
        let Some(procedure) = self.definable(procedure) else {
            return Ok(false);
        };
        self.add_procedure_record(
            procedure,
            ValidationRecord::InterfaceProcedureFromEntry {
                beholder,
                lookup,
                procedure,
                index,
            },
        )
    }

    pub fn add_improper_interface_procedure_from_entry_record(
        &mut self,
        procedure: Option<ProcRef>,
        beholder: TypeRef,
        index: u32,
    ) -> SvmResult<bool> {
        self.expect_phase("add_improper_interface_procedure_from_entry_record", BUILDING)?;
        let Some(procedure) = self.definable(procedure) else {
            return Ok(false);
        };
        self.add_procedure_record(
            procedure,
            ValidationRecord::ImproperInterfaceProcedureFromEntry {
                beholder,
                procedure,
                index,
            },
        )
    }

    pub fn add_procedure_from_type_and_signature_record(
        &mut self,
        procedure: Option<ProcRef>,
        owner: TypeRef,
        beholder: TypeRef,
    ) -> SvmResult<bool> {
        self.expect_phase("add_procedure_from_type_and_signature_record", BUILDING)?;
        let Some(procedure) = self.definable(procedure) else {
            return Ok(false);
        };
        let name = self.model.procedure_name(procedure).to_owned();
        let signature = self.model.procedure_signature(procedure).to_owned();
        self.add_procedure_record(
            procedure,
            ValidationRecord::ProcedureFromTypeAndSignature {
                owner,
                beholder,
                procedure,
                name,
                signature,
            },
        )
    }

    pub fn add_stack_walker_may_skip_frames_record(
        &mut self,
        procedure: ProcRef,
        owner: TypeRef,
        skip_frames: bool,
    ) -> SvmResult<bool> {
        self.expect_phase("add_stack_walker_may_skip_frames_record", BUILDING)?;
        self.add_check_record(ValidationRecord::StackWalkerMaySkipFrames {
            owner,
            procedure,
            skip_frames,
        })
    }

    pub fn add_type_initialization_record(
        &mut self,
        ty: TypeRef,
        is_initialized: bool,
    ) -> SvmResult<bool> {
        self.expect_phase("add_type_initialization_record", BUILDING)?;
        self.add_check_record(ValidationRecord::TypeInitialization { ty, is_initialized })
    }

    pub fn add_procedure_from_single_implementer_record(
        &mut self,
        procedure: Option<ProcRef>,
        this_type: TypeRef,
        slot: u32,
        caller: ProcRef,
    ) -> SvmResult<bool> {
        self.expect_phase("add_procedure_from_single_implementer_record", BUILDING)?;
        let Some(procedure) = self.definable(procedure) else {
            return Ok(false);
        };
        self.add_procedure_record(
            procedure,
            ValidationRecord::ProcedureFromSingleImplementer {
                this_type,
                procedure,
                caller,
                slot,
            },
        )
    }

    pub fn add_procedure_from_single_interface_implementer_record(
        &mut self,
        procedure: Option<ProcRef>,
        this_type: TypeRef,
        index: u32,
        caller: ProcRef,
    ) -> SvmResult<bool> {
        self.expect_phase("add_procedure_from_single_interface_implementer_record", BUILDING)?;
        let Some(procedure) = self.definable(procedure) else {
            return Ok(false);
        };
        self.add_procedure_record(
            procedure,
            ValidationRecord::ProcedureFromSingleInterfaceImplementer {
                this_type,
                procedure,
                caller,
                index,
            },
        )
    }

    pub fn add_procedure_from_single_abstract_implementer_record(
        &mut self,
        procedure: Option<ProcRef>,
        this_type: TypeRef,
        slot: u32,
        caller: ProcRef,
    ) -> SvmResult<bool> {
        self.expect_phase("add_procedure_from_single_abstract_implementer_record", BUILDING)?;
        let Some(procedure) = self.definable(procedure) else {
            return Ok(false);
        };
        self.add_procedure_record(
            procedure,
            ValidationRecord::ProcedureFromSingleAbstractImplementer {
                this_type,
                procedure,
                caller,
                slot,
            },
        )
    }
}

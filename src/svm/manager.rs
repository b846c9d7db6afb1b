//! The manager instance owned by one compilation or one AOT load attempt.

use std::panic::Location;

use tracing::{debug, error, trace, warn};

use crate::runtime::{ObjectModel, ProcRef, Symbol, SymbolCategory, TypeRef};

use super::config::SvmConfig;
use super::error::{SvmError, SvmResult};
use super::heuristic::{HeuristicRegion, HeuristicRegionGuard};
use super::id::{Presence, SymbolId};
use super::identity::SymbolIdentityTable;
use super::record::{PersistedRecord, ValidationRecord};
use super::store::RecordStore;

/// Lifecycle of a manager. Compile-time and load-time phases never mix in one instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Building,
    Sealed,
    Loading,
    Validated,
    Rejected,
}

pub(super) const BUILDING: &[Phase] = &[Phase::Building];
pub(super) const LOADING: &[Phase] = &[Phase::Loading];

pub struct SymbolValidationManager<'m, M: ObjectModel + ?Sized> {
    pub(super) model: &'m M,
    pub(super) config: SvmConfig,
    pub(super) phase: Phase,
    pub(super) ids: SymbolIdentityTable,
    pub(super) store: RecordStore,
    heuristic: HeuristicRegion,
    guaranteed: usize,
}

impl<'m, M: ObjectModel + ?Sized> SymbolValidationManager<'m, M> {
    /// Starts recording for one compilation against `model`.
    pub fn for_compile(model: &'m M, config: SvmConfig) -> Self {
        Self::seeded(model, config, Phase::Building)
    }

    /// Starts replaying a persisted record list against `model`.
    pub fn for_load(model: &'m M, config: SvmConfig) -> Self {
        Self::seeded(model, config, Phase::Loading)
    }

    fn seeded(model: &'m M, config: SvmConfig, phase: Phase) -> Self {
        let mut ids = SymbolIdentityTable::new();
        let mut guaranteed = 0;
        for ty in [model.root_type(), model.meta_type()] {
            if ids.define_guaranteed_id(Symbol::Type(ty)).is_some() {
                guaranteed += 1;
            }
        }
        debug!(?phase, guaranteed, "symbol validation manager created");
        Self {
            model,
            config,
            phase,
            ids,
            store: RecordStore::new(),
            heuristic: HeuristicRegion::default(),
            guaranteed,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &SvmConfig {
        &self.config
    }

    pub fn model(&self) -> &'m M {
        self.model
    }

    /// Seeds another well-known symbol. Must happen before the first record in either phase,
    /// and both phases must seed the same symbols in the same order.
    #[track_caller]
    pub fn define_guaranteed_id(&mut self, symbol: impl Into<Symbol>) -> SvmResult<SymbolId> {
        self.expect_phase("define_guaranteed_id", &[Phase::Building, Phase::Loading])?;
        let symbol = symbol.into();
        if !self.store.is_empty() || self.ids.len() > self.guaranteed {
            return Err(self.invariant(format!(
                "guaranteed ID for {symbol} requested after records were added"
            )));
        }
        if let Some(existing) = self.ids.try_get_id(symbol) {
            return Ok(existing);
        }
        let id = self
            .ids
            .define_guaranteed_id(symbol)
            .ok_or_else(|| self.limit("symbol ID space exhausted"))?;
        self.guaranteed += 1;
        debug!(%id, %symbol, "guaranteed symbol ID defined");
        Ok(id)
    }

    pub fn in_heuristic_region(&self) -> bool {
        self.heuristic.is_active()
    }

    pub fn enter_heuristic_region(&mut self) -> SvmResult<()> {
        self.expect_phase("enter_heuristic_region", BUILDING)?;
        self.heuristic.enter();
        trace!(depth = self.heuristic.depth(), "entered heuristic region");
        Ok(())
    }

    #[track_caller]
    pub fn exit_heuristic_region(&mut self) -> SvmResult<()> {
        if !self.heuristic.exit() {
            return Err(self.invariant("heuristic region exited more often than entered"));
        }
        trace!(depth = self.heuristic.depth(), "exited heuristic region");
        Ok(())
    }

    /// Opens a heuristic region that closes when the returned guard is dropped.
    pub fn heuristic_region(&mut self) -> SvmResult<HeuristicRegionGuard<'_, 'm, M>> {
        self.expect_phase("heuristic_region", BUILDING)?;
        Ok(HeuristicRegionGuard::new(self))
    }

    pub(super) fn heuristic_mut(&mut self) -> &mut HeuristicRegion {
        &mut self.heuristic
    }

    /// True if `symbol` has an ID, or unconditionally while a heuristic region is open.
    pub fn is_already_validated(&self, symbol: impl Into<Symbol>) -> bool {
        self.in_heuristic_region() || self.ids.try_get_id(symbol.into()).is_some()
    }

    pub fn try_get_id_from_symbol(&self, symbol: impl Into<Symbol>) -> Option<SymbolId> {
        self.ids.try_get_id(symbol.into())
    }

    /// Like [`Self::try_get_id_from_symbol`], but a missing ID is an invariant violation.
    #[track_caller]
    pub fn get_id_from_symbol(&self, symbol: impl Into<Symbol>) -> SvmResult<SymbolId> {
        let symbol = symbol.into();
        match self.ids.try_get_id(symbol) {
            Some(id) => Ok(id),
            None => Err(self.invariant(format!("{symbol} has no symbol ID"))),
        }
    }

    #[track_caller]
    pub fn get_symbol_from_id(
        &self,
        id: SymbolId,
        category: SymbolCategory,
        presence: Presence,
    ) -> SvmResult<Option<Symbol>> {
        match (self.ids.symbol_of(id), presence) {
            (Some(symbol), _) if symbol.category() == category => Ok(Some(symbol)),
            (Some(symbol), _) => Err(self.invariant(format!(
                "{id} names {symbol}, expected a {category:?} symbol"
            ))),
            (None, Presence::Optional) => Ok(None),
            (None, Presence::Required) => {
                Err(self.invariant(format!("{id} is not bound to any symbol")))
            }
        }
    }

    #[track_caller]
    pub fn get_type_from_id(&self, id: SymbolId, presence: Presence) -> SvmResult<Option<TypeRef>> {
        Ok(self
            .get_symbol_from_id(id, SymbolCategory::Type, presence)?
            .and_then(Symbol::as_type))
    }

    #[track_caller]
    pub fn get_procedure_from_id(
        &self,
        id: SymbolId,
        presence: Presence,
    ) -> SvmResult<Option<ProcRef>> {
        Ok(self
            .get_symbol_from_id(id, SymbolCategory::Procedure, presence)?
            .and_then(Symbol::as_procedure))
    }

    /// Records added so far, in emission order.
    pub fn records(&self) -> &[ValidationRecord] {
        self.store.records()
    }

    pub fn record_exists(&self, record: &ValidationRecord) -> bool {
        self.store.record_exists(record)
    }

    /// Ends the compilation phase and returns the record list with every operand replaced by
    /// its ID.
    #[track_caller]
    pub fn seal(&mut self) -> SvmResult<Vec<PersistedRecord>> {
        self.expect_phase("seal", BUILDING)?;
        if self.in_heuristic_region() {
            return Err(self.invariant(format!(
                "sealed inside {} open heuristic region(s)",
                self.heuristic.depth()
            )));
        }
        let persisted = self
            .store
            .records()
            .iter()
            .map(|record| {
                record.try_map_operands(
                    |ty| self.get_id_from_symbol(*ty),
                    |proc| self.get_id_from_symbol(*proc),
                )
            })
            .collect::<SvmResult<Vec<_>>>()?;
        self.phase = Phase::Sealed;
        debug!(records = persisted.len(), symbols = self.ids.len(), "record list sealed");
        Ok(persisted)
    }

    pub(super) fn get_new_symbol_id(&mut self) -> SvmResult<SymbolId> {
        match self.ids.new_symbol_id() {
            Some(id) => Ok(id),
            None => Err(self.limit("symbol ID space exhausted")),
        }
    }

    /// Stores a record known to be absent, giving `symbol` an ID first if it has none.
    #[track_caller]
    pub(super) fn append_new_record(
        &mut self,
        symbol: Option<Symbol>,
        record: ValidationRecord,
    ) -> SvmResult<()> {
        if self.store.record_exists(&record) {
            return Err(self.invariant(format!("{record} appended twice")));
        }
        if let Some(symbol) = symbol {
            if self.ids.try_get_id(symbol).is_none() {
                let id = self.get_new_symbol_id()?;
                self.ids.assign(symbol, id);
                debug!(%id, %symbol, "assigned symbol ID");
            }
        }
        let kind = record.kind();
        self.store.insert(record);
        debug!(kind = kind.name(), index = self.store.len() - 1, "validation record appended");
        Ok(())
    }

    pub(super) fn append_record_if_new(
        &mut self,
        symbol: Option<Symbol>,
        record: ValidationRecord,
    ) -> SvmResult<()> {
        if self.store.record_exists(&record) {
            trace!(kind = record.kind().name(), "validation record already present");
            return Ok(());
        }
        self.append_new_record(symbol, record)
    }

    /// Builds a logic error, panicking instead under strict assertions.
    #[track_caller]
    pub(super) fn invariant(&self, message: impl Into<String>) -> SvmError {
        let location = Location::caller();
        let message = message.into();
        if self.config.assertions_are_fatal() {
            panic!("symbol validation invariant violated at {location}: {message}");
        }
        error!(%location, detail = %message, "symbol validation invariant violated");
        SvmError::Invariant { location, message }
    }

    pub(super) fn limit(&self, message: impl Into<String>) -> SvmError {
        let message = message.into();
        warn!(detail = %message, "symbol validation limit reached");
        SvmError::Limit { message }
    }

    #[track_caller]
    pub(super) fn expect_phase(&self, operation: &'static str, allowed: &[Phase]) -> SvmResult<()> {
        if allowed.contains(&self.phase) {
            return Ok(());
        }
        let err = SvmError::WrongPhase {
            operation,
            phase: self.phase,
        };
        if self.config.assertions_are_fatal() {
            panic!("{err}");
        }
        error!(operation, phase = ?self.phase, "operation issued in the wrong phase");
        Err(err)
    }
}

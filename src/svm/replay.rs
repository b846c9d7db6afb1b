//! Replays a persisted record list in order and decides whether the artifact can be trusted.

use tracing::{info, trace, warn};

use crate::runtime::ObjectModel;

use super::error::{SvmError, SvmResult};
use super::manager::{LOADING, Phase, SymbolValidationManager};
use super::record::PersistedRecord;

impl<'m, M: ObjectModel + ?Sized> SymbolValidationManager<'m, M> {
    /// Validates every record in list order, stopping at the first that no longer holds.
    ///
    /// On success the manager is `Validated` and IDs resolve to live symbols. On any failure it
    /// is `Rejected` with every binding dropped, and the error names the offending record.
    pub fn validate_records(&mut self, records: &[PersistedRecord]) -> SvmResult<()> {
        self.expect_phase("validate_records", LOADING)?;
        for (index, record) in records.iter().enumerate() {
            let kind = record.kind();
            match self.validate_record(record) {
                Ok(true) => trace!(index, kind = kind.name(), "validation record holds"),
                Ok(false) => {
                    warn!(index, kind = kind.name(), %record, "validation record no longer holds");
                    self.reject();
                    return Err(SvmError::Rejected { index, kind });
                }
                Err(err) => {
                    warn!(index, kind = kind.name(), %err, "validation aborted");
                    self.reject();
                    return Err(err);
                }
            }
        }
        self.phase = Phase::Validated;
        info!(records = records.len(), symbols = self.ids.len(), "validation records replayed");
        Ok(())
    }

    fn reject(&mut self) {
        self.ids.clear();
        self.phase = Phase::Rejected;
    }
}

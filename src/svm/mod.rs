//! Symbol validation: recording how a compilation discovered each runtime symbol, and
//! replaying those discoveries before a cached artifact is trusted.

mod add;
pub mod config;
pub mod error;
pub mod heuristic;
pub mod id;
pub mod identity;
pub mod manager;
pub mod record;
mod replay;
pub mod store;
mod validate;

pub use config::{MAX_ARRAY_DIMENSIONS, Strictness, SvmConfig};
pub use error::{SvmError, SvmResult};
pub use heuristic::{HeuristicRegion, HeuristicRegionGuard};
pub use id::{Presence, SymbolId, raw_or_no_id};
pub use identity::{Binding, SymbolIdentityTable};
pub use manager::{Phase, SymbolValidationManager};
pub use record::{Operand, PersistedRecord, RecordClass, RecordKind, ValidationRecord};
pub use store::RecordStore;

//! Runtime object model the validation manager observes: opaque handles, the query trait it
//! consumes, and an in-memory universe implementing it.

pub mod builder;
pub mod entry;
pub mod handle;
pub mod model;
pub mod universe;

pub use builder::{ProcedureBuilder, TypeBuilder};
pub use entry::{DispatchKind, SymbolEntry};
pub use handle::{ProcRef, Symbol, SymbolCategory, TypeRef};
pub use model::{ChainDigest, ObjectModel, TriState};
pub use universe::{ContextId, FieldDesc, ProcDesc, ProcFlags, TypeDesc, TypeFlags, Universe};

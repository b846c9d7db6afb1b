//! Provenance tracking for ahead-of-time compiled code.
//!
//! A compilation records, through [`svm::SymbolValidationManager`], how it discovered every
//! runtime type and procedure it depends on. The sealed record list travels with the cached
//! artifact ([`cache`]) and is replayed against the runtime at load time; the artifact is used
//! only if every record still holds.

pub mod cache;
pub mod runtime;
pub mod svm;

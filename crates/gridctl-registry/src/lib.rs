//! Symbol registry and lifecycle bookkeeping for gridctl.
//!
//! Everything in this crate is in-memory and infallible:
//! - `SymbolRegistry`: ordered rows of configured symbols
//! - `reconcile`: merges backend status into the registry (lifecycle fields only)
//! - `OperationRegistry`: in-flight start/stop keys with drop-guard clearance
//! - `SymbolCatalog`: tradable symbols offered by the backend, with search

pub mod catalog;
pub mod operations;
pub mod reconcile;
pub mod registry;

pub use catalog::SymbolCatalog;
pub use operations::{InFlightOperation, OperationGuard, OperationRegistry};
pub use reconcile::{reconcile, ReconcileSummary};
pub use registry::SymbolRegistry;

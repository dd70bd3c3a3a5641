//! Symbol-exchange lifecycle orchestration.
//!
//! `LifecycleOrchestrator` is the only mutator of the symbol registry. It
//! gates start/stop requests through operation keys, fans a start out to
//! every selected exchange, applies structural edits under an edit session
//! and publishes a `RegistrySnapshot` after every change.
//!
//! Network failures never surface as `Err`: they are logged and reported in
//! the returned outcome. `Err` means a precondition was not met.

pub mod edit_session;
pub mod error;
pub mod orchestrator;
pub mod outcome;
pub mod poller;
pub mod selection;
pub mod snapshot;

pub use edit_session::EditSession;
pub use error::{OrchestratorError, OrchestratorResult};
pub use orchestrator::LifecycleOrchestrator;
pub use outcome::{SaveOutcome, StartOutcome, StopOutcome, SyncOutcome};
pub use poller::ReconcileLoop;
pub use selection::{DynSelection, ExchangeSelection, SelectionFile, StaticSelection};
pub use snapshot::{RegistrySnapshot, SymbolView};

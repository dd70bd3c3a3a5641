//! In-flight lifecycle operation registry.
//!
//! Every start/stop request holds an `OperationGuard` for its key while the
//! network call runs. Dropping the guard removes the entry, so a key is
//! cleared on success, on failure, and when the owning future is dropped.
//!
//! Entries are keyed by `(OperationKey, OperationStatus)`: a second start of
//! the same symbol is refused while the first is in flight, but a stop is
//! not serialized against a start.

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use gridctl_core::{OperationKey, OperationStatus, SymbolId};
use serde::Serialize;
use tracing::trace;

type Slot = (OperationKey, OperationStatus);

/// One in-flight operation, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InFlightOperation {
    pub key: OperationKey,
    pub status: OperationStatus,
    pub since: DateTime<Utc>,
}

/// Registry of in-flight lifecycle operations.
#[derive(Debug, Default)]
pub struct OperationRegistry {
    in_flight: DashMap<Slot, DateTime<Utc>>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key` for `status`.
    ///
    /// Returns `None` if the same operation is already in flight.
    pub fn try_begin(&self, key: OperationKey, status: OperationStatus) -> Option<OperationGuard<'_>> {
        let slot = (key, status);
        match self.in_flight.entry(slot.clone()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(vacant) => {
                vacant.insert(Utc::now());
                trace!(key = %slot.0, status = %slot.1, "Operation key set");
                Some(OperationGuard {
                    registry: self,
                    slot,
                })
            }
        }
    }

    pub fn contains(&self, key: &OperationKey, status: OperationStatus) -> bool {
        self.in_flight.contains_key(&(key.clone(), status))
    }

    /// Status shown for `key`; `Stopping` wins when both are in flight.
    pub fn status_of(&self, key: &OperationKey) -> Option<OperationStatus> {
        [OperationStatus::Stopping, OperationStatus::Starting]
            .into_iter()
            .find(|status| self.contains(key, *status))
    }

    /// True if any operation targets `symbol_id`, whatever its scope.
    pub fn is_symbol_busy(&self, symbol_id: &SymbolId) -> bool {
        self.in_flight
            .iter()
            .any(|entry| &entry.key().0.symbol_id == symbol_id)
    }

    pub fn len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }

    /// All in-flight operations, oldest first.
    pub fn snapshot(&self) -> Vec<InFlightOperation> {
        let mut ops: Vec<InFlightOperation> = self
            .in_flight
            .iter()
            .map(|entry| InFlightOperation {
                key: entry.key().0.clone(),
                status: entry.key().1,
                since: *entry.value(),
            })
            .collect();
        ops.sort_by(|a, b| a.since.cmp(&b.since));
        ops
    }
}

/// Clears its operation key on drop.
#[derive(Debug)]
pub struct OperationGuard<'a> {
    registry: &'a OperationRegistry,
    slot: Slot,
}

impl Drop for OperationGuard<'_> {
    fn drop(&mut self) {
        self.registry.in_flight.remove(&self.slot);
        trace!(key = %self.slot.0, status = %self.slot.1, "Operation key cleared");
    }
}

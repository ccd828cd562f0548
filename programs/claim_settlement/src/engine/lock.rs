use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

/**
 * Per-contract exclusion table
 *
 * At most one settlement holds a contract's guard at a time. Entries are
 * created on demand and dropped once the last waiter releases its guard,
 * so the table only holds contracts with settlements in flight.
 */
#[derive(Debug, Default)]
pub struct ContractLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ContractLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `contract`
    pub async fn acquire(&self, contract: &str) -> ContractGuard<'_> {
        let lock = self
            .locks
            .entry(contract.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = lock.lock_owned().await;
        trace!(contract, "acquired contract guard");
        ContractGuard {
            locks: self,
            contract: contract.to_string(),
            guard: Some(guard),
        }
    }

    /// Whether a guard for `contract` is currently held or awaited
    pub fn in_flight(&self, contract: &str) -> bool {
        self.locks.contains_key(contract)
    }
}

/// Releases the contract on drop, including on early returns and errors
pub struct ContractGuard<'a> {
    locks: &'a ContractLocks,
    contract: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl ContractGuard<'_> {
    pub fn contract(&self) -> &str {
        &self.contract
    }
}

impl Drop for ContractGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the table's own reference left: nobody holds or awaits it
        self.locks
            .locks
            .remove_if(&self.contract, |_, lock| Arc::strong_count(lock) == 1);
        trace!(contract = %self.contract, "released contract guard");
    }
}

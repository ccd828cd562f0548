use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::StoreError;
use crate::state::{ClaimCondition, ClaimMetadata, ClaimUpdate};

/**
 * Claim-record store
 *
 * Only conditional writes are exposed: a record is inserted once and then
 * updated with a compare-and-swap on its status and settlement owner. The
 * store is shared by every engine instance, so its conditional update is
 * what keeps two instances from settling the same contract.
 */
#[async_trait]
pub trait ClaimStore: Send + Sync {
    async fn get(&self, contract_address: &str) -> Result<Option<ClaimMetadata>, StoreError>;

    /// Fails with `AlreadyExists` when a record is already stored under the address
    async fn put_if_absent(&self, record: ClaimMetadata) -> Result<(), StoreError>;

    /// Applies `update` only while the stored record matches `expected`
    /// - `Conflict` when it differs, `NotFound` when there is no record
    async fn compare_and_swap(
        &self,
        contract_address: &str,
        expected: &ClaimCondition,
        update: ClaimUpdate,
    ) -> Result<ClaimMetadata, StoreError>;
}

/// Process-local store keyed by contract address
#[derive(Debug, Default)]
pub struct MemoryClaimStore {
    records: DashMap<String, ClaimMetadata>,
}

impl MemoryClaimStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Serializes every record as a JSON array, ordered by address
    pub fn export_json(&self) -> Result<String, StoreError> {
        let mut records: Vec<ClaimMetadata> =
            self.records.iter().map(|entry| entry.value().clone()).collect();
        records.sort_by(|a, b| a.contract_address.cmp(&b.contract_address));
        serde_json::to_string_pretty(&records).map_err(|e| StoreError::Backend(e.to_string()))
    }
}

#[async_trait]
impl ClaimStore for MemoryClaimStore {
    async fn get(&self, contract_address: &str) -> Result<Option<ClaimMetadata>, StoreError> {
        Ok(self.records.get(contract_address).map(|r| r.value().clone()))
    }

    async fn put_if_absent(&self, record: ClaimMetadata) -> Result<(), StoreError> {
        match self.records.entry(record.contract_address.clone()) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists(record.contract_address)),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    async fn compare_and_swap(
        &self,
        contract_address: &str,
        expected: &ClaimCondition,
        update: ClaimUpdate,
    ) -> Result<ClaimMetadata, StoreError> {
        let mut entry = self
            .records
            .get_mut(contract_address)
            .ok_or_else(|| StoreError::NotFound(contract_address.to_string()))?;
        if !expected.matches(&entry) {
            return Err(StoreError::Conflict(contract_address.to_string()));
        }
        let next = entry.with_update(&update);
        *entry = next.clone();
        Ok(next)
    }
}

use std::str::FromStr;
use std::sync::Arc;

use anchor_lang::prelude::Pubkey;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::{ConfigError, SettlementError};
use crate::ports::{ClaimStore, ContentOracle, LedgerClient, MetricsProvider, PostLookup};

pub mod lock;
pub mod registration;
pub mod settlement;

pub use lock::*;
pub use registration::*;
pub use settlement::*;

/// External capabilities the engine is wired with
#[derive(Clone)]
pub struct Collaborators {
    pub ledger: Arc<dyn LedgerClient>,
    pub metrics: Arc<dyn MetricsProvider>,
    pub posts: Arc<dyn PostLookup>,
    pub oracle: Arc<dyn ContentOracle>,
    pub store: Arc<dyn ClaimStore>,
}

/**
 * Claim Settlement Engine
 *
 * Request-scoped: no background tasks, polling loops or caches. The
 * per-contract exclusion table keeps a single settlement in flight per
 * contract within this engine; the store's in-progress marker extends that
 * to every instance sharing the store.
 *
 * - `instance_id` prefixes every settlement owner token this engine writes
 */
pub struct ClaimSettlementEngine {
    config: EngineConfig,
    program_id: Pubkey,
    authority: Pubkey,
    ledger: Arc<dyn LedgerClient>,
    metrics: Arc<dyn MetricsProvider>,
    posts: Arc<dyn PostLookup>,
    oracle: Arc<dyn ContentOracle>,
    store: Arc<dyn ClaimStore>,
    locks: ContractLocks,
    instance_id: String,
}

impl ClaimSettlementEngine {
    pub fn new(config: EngineConfig, collaborators: Collaborators) -> Result<Self, ConfigError> {
        config.validate()?;
        let program_id = config.program_id()?;
        let authority = config.authority()?;
        Ok(Self {
            config,
            program_id,
            authority,
            ledger: collaborators.ledger,
            metrics: collaborators.metrics,
            posts: collaborators.posts,
            oracle: collaborators.oracle,
            store: collaborators.store,
            locks: ContractLocks::new(),
            instance_id: format!("engine_{}", Uuid::new_v4().simple()),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn program_id(&self) -> &Pubkey {
        &self.program_id
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Whether a settlement for `contract_address` currently holds the contract guard
    pub fn settlement_in_flight(&self, contract_address: &str) -> bool {
        self.locks.in_flight(contract_address)
    }
}

pub(crate) fn parse_address(contract_address: &str) -> Result<Pubkey, SettlementError> {
    Pubkey::from_str(contract_address.trim())
        .map_err(|e| SettlementError::InvalidAddress(format!("{contract_address}: {e}")))
}

use std::time::Duration;

use anchor_lang::prelude::Pubkey;
use anchor_lang::solana_program::instruction::Instruction;
use async_trait::async_trait;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::{LedgerError, SettlementError};
use crate::state::ContractRecord;

/// Raw account as returned by the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerAccount {
    /// Program that owns the account
    pub owner: Pubkey,
    pub lamports: u64,
    pub data: Vec<u8>,
}

/**
 * Ledger session handle
 *
 * Owned by the caller and shared across claims; implementations hold the
 * connection and the paymaster signer. `submit` signs, sends and confirms a
 * single instruction and returns the transaction signature.
 */
#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn get_account(&self, address: &Pubkey) -> Result<Option<LedgerAccount>, LedgerError>;

    async fn submit(&self, instruction: Instruction) -> Result<String, LedgerError>;
}

/**
 * Reads and decodes a payment contract account
 *
 * - `Ok(None)` when the account does not exist
 * - Accounts owned by another program are rejected
 * - A timeout is reported as `LedgerUnavailable`
 */
pub async fn fetch_contract(
    ledger: &dyn LedgerClient,
    program_id: &Pubkey,
    address: &Pubkey,
    limit: Duration,
) -> Result<Option<ContractRecord>, SettlementError> {
    let account = match timeout(limit, ledger.get_account(address)).await {
        Ok(Ok(account)) => account,
        Ok(Err(err)) => {
            warn!(%address, error = %err, "ledger read failed");
            return Err(SettlementError::LedgerUnavailable(err.to_string()));
        }
        Err(_) => {
            warn!(%address, timeout_ms = limit.as_millis() as u64, "ledger read timed out");
            return Err(SettlementError::LedgerUnavailable(LedgerError::Timeout.to_string()));
        }
    };

    let Some(account) = account else {
        debug!(%address, "contract account not found");
        return Ok(None);
    };

    if account.owner != *program_id {
        let err = LedgerError::WrongOwner {
            address: address.to_string(),
            owner: account.owner.to_string(),
        };
        return Err(SettlementError::InvalidAddress(err.to_string()));
    }

    let record = ContractRecord::decode(&account.data)?;
    debug!(
        %address,
        tranche_count = record.tranche_count,
        paid_tranches = record.paid_tranches,
        "decoded contract account"
    );
    Ok(Some(record))
}

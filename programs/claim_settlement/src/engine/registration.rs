use tracing::{info, instrument};

use super::{parse_address, ClaimSettlementEngine};
use crate::error::{CodecError, SettlementError, SettlementResult, StoreError};
use crate::event::{emit, ContractRegistered};
use crate::ports::fetch_contract;
use crate::state::{ClaimMetadata, ContractRecord};
use crate::utils::{normalize_handle, validate_schedule};

/// Metadata submitted when a sponsor registers a payment contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterRequest {
    pub contract_address: String,
    pub verification_text: String,
    pub handle: String,
    pub tranche_distribution: Vec<u64>,
}

/// Claim record together with the live ledger account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractInfo {
    pub metadata: ClaimMetadata,
    /// `None` once the contract account has been closed
    pub ledger: Option<ContractRecord>,
}

impl ClaimSettlementEngine {
    /**
     * Registers a payment contract for claiming
     *
     * Validation Process:
     * 1. Verification text is non-blank and within the configured length bounds
     * 2. Handle is non-empty once normalized
     * 3. Threshold ladder is valid (`InvalidSchedule` is only raised here)
     * 4. The contract account exists, decodes, and has one tranche per threshold
     * 5. The record is inserted only if absent (status = pending)
     */
    #[instrument(skip(self, request), fields(contract = %request.contract_address))]
    pub async fn register_contract(&self, request: &RegisterRequest) -> SettlementResult<ClaimMetadata> {
        self.validate_verification_text(&request.verification_text)?;

        if normalize_handle(&request.handle).is_empty() {
            return Err(SettlementError::InvalidHandle(request.handle.clone()));
        }

        validate_schedule(&request.tranche_distribution)?;

        let contract_key = parse_address(&request.contract_address)?;
        let address = contract_key.to_string();

        let contract = fetch_contract(
            self.ledger.as_ref(),
            &self.program_id,
            &contract_key,
            self.config.ledger_read_timeout(),
        )
        .await?
        .ok_or_else(|| SettlementError::NotFound(address.clone()))?;

        let schedule_len = request.tranche_distribution.len() as u64;
        if contract.tranche_count != schedule_len {
            return Err(SettlementError::TrancheCountMismatch {
                schedule: schedule_len,
                tranche_count: contract.tranche_count,
            });
        }
        if contract.recipients.len() > self.config.max_recipients {
            return Err(SettlementError::Codec(CodecError::TooManyRecipients {
                count: contract.recipients.len(),
                max: self.config.max_recipients,
            }));
        }

        let record = ClaimMetadata::new_pending(
            address.clone(),
            request.verification_text.trim(),
            request.handle.trim(),
            request.tranche_distribution.clone(),
        );

        self.store
            .put_if_absent(record.clone())
            .await
            .map_err(|e| match e {
                StoreError::AlreadyExists(_) => SettlementError::AlreadyRegistered(address.clone()),
                other => SettlementError::StoreUnavailable(other.to_string()),
            })?;

        info!(tranche_count = contract.tranche_count, "contract registered");
        emit(&ContractRegistered {
            contract: address,
            handle: record.handle.clone(),
            tranche_count: contract.tranche_count,
            thresholds: record.tranche_distribution.clone(),
        });
        Ok(record)
    }

    /// Claim record plus the current ledger view of the contract
    pub async fn contract_info(&self, contract_address: &str) -> SettlementResult<ContractInfo> {
        let contract_key = parse_address(contract_address)?;
        let address = contract_key.to_string();

        let metadata = self
            .store
            .get(&address)
            .await
            .map_err(|e| SettlementError::StoreUnavailable(e.to_string()))?
            .ok_or_else(|| SettlementError::NotFound(address.clone()))?;

        let ledger = fetch_contract(
            self.ledger.as_ref(),
            &self.program_id,
            &contract_key,
            self.config.ledger_read_timeout(),
        )
        .await?;

        Ok(ContractInfo { metadata, ledger })
    }

    fn validate_verification_text(&self, text: &str) -> SettlementResult<()> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(SettlementError::InvalidVerificationText("text is empty".to_string()));
        }
        let len = trimmed.chars().count();
        if len < self.config.min_verification_text_len {
            return Err(SettlementError::InvalidVerificationText(format!(
                "text too short: {len} characters"
            )));
        }
        if len > self.config.max_verification_text_len {
            return Err(SettlementError::InvalidVerificationText(format!(
                "text too long: {len} characters"
            )));
        }
        Ok(())
    }
}

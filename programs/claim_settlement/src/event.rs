use serde::Serialize;
use tracing::{error, info};

/// Event emitted when a contract's claim record is registered
#[derive(Debug, Clone, Serialize)]
pub struct ContractRegistered {
    /// The payment contract address
    pub contract: String,
    /// Expected author of the claiming post
    pub handle: String,
    /// Number of tranches on the ledger
    pub tranche_count: u64,
    /// Engagement threshold per tranche
    pub thresholds: Vec<u64>,
}

/// Event emitted for every tranche the ledger confirmed
#[derive(Debug, Clone, Serialize)]
pub struct TrancheDistributed {
    /// The payment contract address
    pub contract: String,
    /// Index of the tranche paid
    pub tranche_index: u64,
    /// Recipient of the tranche
    pub recipient: String,
    /// Lamports released
    pub amount: u64,
    /// Transaction signature
    pub signature: String,
}

/// Event emitted when a claim settles
#[derive(Debug, Clone, Serialize)]
pub struct ClaimSettled {
    /// The payment contract address
    pub contract: String,
    /// Post that proved engagement
    pub post_reference: String,
    /// Engagement value used for evaluation
    pub engagement_value: u64,
    /// Tranches qualified by the engagement value
    pub qualified: u64,
    /// Tranches requested by this claim
    pub requested: u64,
    /// Tranches that actually landed during this claim
    pub distributed: u64,
    /// Total tranches paid for the contract after this claim
    pub total_distributed: u64,
}

/// Event emitted when funds moved but the claim record could not be written
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationRequired {
    /// The payment contract address
    pub contract: String,
    /// Tranches paid on the ledger
    pub ledger_paid_tranches: u64,
    /// Tranches the claim record still reports
    pub recorded_tranches: u64,
    /// Persistence failure
    pub reason: String,
}

/// Structured settlement events, logged as JSON payloads
pub trait SettlementEvent: Serialize {
    const NAME: &'static str;

    /// Whether the event needs operator attention
    const CRITICAL: bool = false;
}

impl SettlementEvent for ContractRegistered {
    const NAME: &'static str = "ContractRegistered";
}

impl SettlementEvent for TrancheDistributed {
    const NAME: &'static str = "TrancheDistributed";
}

impl SettlementEvent for ClaimSettled {
    const NAME: &'static str = "ClaimSettled";
}

impl SettlementEvent for ReconciliationRequired {
    const NAME: &'static str = "ReconciliationRequired";
    const CRITICAL: bool = true;
}

/// Emits an event for off-chain indexing and monitoring
pub fn emit<E: SettlementEvent>(event: &E) {
    let payload = serde_json::to_string(event).unwrap_or_else(|e| format!("{{\"encode_error\":\"{e}\"}}"));
    if E::CRITICAL {
        error!(event = E::NAME, reconciliation_required = true, %payload, "settlement event");
    } else {
        info!(event = E::NAME, %payload, "settlement event");
    }
}

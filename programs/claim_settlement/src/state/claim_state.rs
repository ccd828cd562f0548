use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/**
 * Lifecycle of a claim record
 *
 * `Pending -> Claimed` (terminal) is the only externally visible
 * transition. `InProgress` marks the settlement that currently owns the
 * contract: `Pending -> InProgress -> Claimed`, or back to `Pending` when
 * nothing moved.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    Pending,
    InProgress,
    Claimed,
}

/**
 * Engagement measured for a post
 *
 * Individual public counters are kept for audit; `engagement_value` is the
 * single number compared against the tranche thresholds.
 */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementMetrics {
    pub engagement_value: u64,
    #[serde(default)]
    pub impressions: u64,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub reposts: u64,
    #[serde(default)]
    pub replies: u64,
    #[serde(default)]
    pub quotes: u64,
    pub retrieved_at: DateTime<Utc>,
}

impl EngagementMetrics {
    /// Metrics carrying only an aggregate engagement value
    pub fn from_value(engagement_value: u64, retrieved_at: DateTime<Utc>) -> Self {
        Self {
            engagement_value,
            impressions: 0,
            likes: 0,
            reposts: 0,
            replies: 0,
            quotes: 0,
            retrieved_at,
        }
    }

    /// Sums the public counters into the engagement value
    pub fn from_counters(
        impressions: u64,
        likes: u64,
        reposts: u64,
        replies: u64,
        quotes: u64,
        retrieved_at: DateTime<Utc>,
    ) -> Self {
        let engagement_value = [impressions, likes, reposts, replies, quotes]
            .iter()
            .fold(0u64, |acc, v| acc.saturating_add(*v));
        Self {
            engagement_value,
            impressions,
            likes,
            reposts,
            replies,
            quotes,
            retrieved_at,
        }
    }
}

/**
 * Off-ledger claim record for a payment contract
 *
 * Lifecycle:
 * 1. Created once at registration with status = pending
 * 2. Marked in progress by the settling engine, then moved to claimed (or
 *    back to pending) with conditional writes only
 * 3. Never deleted; read-only once claimed
 */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimMetadata {
    /// Base58 address of the payment contract account
    pub contract_address: String,

    /// Free-form requirement the post must satisfy
    pub verification_text: String,

    /// Expected author of the post
    pub handle: String,

    pub number_of_tranches: u64,

    /// Non-decreasing engagement thresholds, one per tranche
    pub tranche_distribution: Vec<u64>,

    pub status: ClaimStatus,

    /// Tranches released through this engine
    #[serde(default)]
    pub tranches_distributed: u64,

    #[serde(default)]
    pub post_reference: Option<String>,

    #[serde(default)]
    pub engagement_metrics: Option<EngagementMetrics>,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub claimed_at: Option<DateTime<Utc>>,

    /// Token of the settlement holding the in-progress marker
    #[serde(default)]
    pub settlement_owner: Option<String>,

    /// When the in-progress marker was taken
    #[serde(default)]
    pub settlement_started_at: Option<DateTime<Utc>>,
}

impl ClaimMetadata {
    pub fn new_pending(
        contract_address: impl Into<String>,
        verification_text: impl Into<String>,
        handle: impl Into<String>,
        tranche_distribution: Vec<u64>,
    ) -> Self {
        Self {
            contract_address: contract_address.into(),
            verification_text: verification_text.into(),
            handle: handle.into(),
            number_of_tranches: tranche_distribution.len() as u64,
            tranche_distribution,
            status: ClaimStatus::Pending,
            tranches_distributed: 0,
            post_reference: None,
            engagement_metrics: None,
            created_at: Utc::now(),
            claimed_at: None,
            settlement_owner: None,
            settlement_started_at: None,
        }
    }

    pub fn is_claimed(&self) -> bool {
        self.status == ClaimStatus::Claimed
    }

    /// Whether an in-progress marker was taken at least `lease` ago
    pub fn lease_expired(&self, now: DateTime<Utc>, lease: chrono::Duration) -> bool {
        match (self.status, self.settlement_started_at) {
            (ClaimStatus::InProgress, Some(started)) => now - started >= lease,
            (ClaimStatus::InProgress, None) => true,
            _ => false,
        }
    }

    /// Applies a settlement update to a copy of this record
    pub fn with_update(&self, update: &ClaimUpdate) -> Self {
        let mut next = self.clone();
        match update {
            ClaimUpdate::Begin {
                settlement_owner,
                started_at,
            } => {
                next.status = ClaimStatus::InProgress;
                next.settlement_owner = Some(settlement_owner.clone());
                next.settlement_started_at = Some(*started_at);
            }
            ClaimUpdate::Release => {
                next.status = ClaimStatus::Pending;
                next.settlement_owner = None;
                next.settlement_started_at = None;
            }
            ClaimUpdate::Settle {
                tranches_distributed,
                post_reference,
                engagement_metrics,
                claimed_at,
            } => {
                next.status = ClaimStatus::Claimed;
                next.tranches_distributed = *tranches_distributed;
                next.post_reference = Some(post_reference.clone());
                next.engagement_metrics = Some(engagement_metrics.clone());
                next.claimed_at = Some(*claimed_at);
                next.settlement_owner = None;
                next.settlement_started_at = None;
            }
        }
        next
    }
}

/// State a conditional update requires the stored record to be in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimCondition {
    pub status: ClaimStatus,
    pub settlement_owner: Option<String>,
}

impl ClaimCondition {
    /// Pending, with no settlement holding the marker
    pub fn pending() -> Self {
        Self {
            status: ClaimStatus::Pending,
            settlement_owner: None,
        }
    }

    /// In progress under the given settlement token
    pub fn held_by(settlement_owner: impl Into<String>) -> Self {
        Self {
            status: ClaimStatus::InProgress,
            settlement_owner: Some(settlement_owner.into()),
        }
    }

    /// Exactly the state `record` was observed in
    pub fn observed(record: &ClaimMetadata) -> Self {
        Self {
            status: record.status,
            settlement_owner: record.settlement_owner.clone(),
        }
    }

    pub fn matches(&self, record: &ClaimMetadata) -> bool {
        self.status == record.status && self.settlement_owner == record.settlement_owner
    }
}

/// Transitions written by a settlement, each with one conditional update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimUpdate {
    /// Take the in-progress marker
    Begin {
        settlement_owner: String,
        started_at: DateTime<Utc>,
    },
    /// Drop the marker after a settlement that moved nothing
    Release,
    /// Record the settled claim
    Settle {
        tranches_distributed: u64,
        post_reference: String,
        engagement_metrics: EngagementMetrics,
        claimed_at: DateTime<Utc>,
    },
}

use anchor_lang::prelude::Pubkey;
use chrono::Utc;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::{parse_address, ClaimSettlementEngine};
use crate::error::{LedgerError, SettlementError, SettlementResult, StoreError, TrancheProgramError};
use crate::event::{emit, ClaimSettled, ReconciliationRequired, TrancheDistributed};
use crate::instructions::{distribute_tranche, DistributeTrancheAccounts};
use crate::ports::fetch_contract;
use crate::state::{
    ClaimCondition, ClaimMetadata, ClaimStatus, ClaimUpdate, ContractRecord, EngagementMetrics,
};
use crate::utils::{evaluate, handles_match, next_threshold, validate_schedule, TrancheEvaluation};

/// A claim against a registered payment contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimRequest {
    pub contract_address: String,
    pub post_reference: String,
}

/**
 * Result of a settled claim
 *
 * `distributed` is always the number of tranches that actually landed
 * during this claim, never the number requested. A partial distribution is
 * still a success.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementOutcome {
    pub contract_address: String,
    pub post_reference: String,
    pub engagement_value: u64,
    /// Tranches cleared by the engagement value
    pub qualified: u64,
    /// Tranches this claim tried to distribute
    pub requested: u64,
    /// Tranches that landed during this claim
    pub distributed: u64,
    /// Tranches paid for the contract after this claim
    pub total_distributed: u64,
    /// Signatures of the confirmed distributions, in tranche order
    pub signatures: Vec<String>,
    /// Failure that stopped the distribution early, if any
    pub distribution_error: Option<String>,
    /// False when funds moved but the claim record could not be written
    pub record_persisted: bool,
}

impl SettlementOutcome {
    pub fn is_partial(&self) -> bool {
        self.distributed < self.requested
    }
}

/// Outcome of the read-only validation phase
struct ValidatedClaim {
    metrics: EngagementMetrics,
    evaluation: TrancheEvaluation,
}

/// Progress of the sequential distribution phase
struct DistributionProgress {
    landed: u64,
    signatures: Vec<String>,
    failure: Option<LedgerError>,
}

impl ClaimSettlementEngine {
    /**
     * Settles a claim: `Pending --claim(post)--> Claimed`
     *
     * Phases:
     * 1. Pre-check the record exists and is pending (no side effects)
     * 2. Author, content and engagement validation, without the contract guard
     * 3. Under the contract guard: re-check the record and take the store's
     *    in-progress marker, which excludes every other engine instance
     * 4. Read the ledger and distribute each newly qualified tranche in
     *    ascending order
     * 5. Persist the claimed state under the marker, or release the marker
     *    when nothing moved
     */
    #[instrument(skip(self, request), fields(contract = %request.contract_address, post = %request.post_reference))]
    pub async fn claim(&self, request: &ClaimRequest) -> SettlementResult<SettlementOutcome> {
        let contract_key = parse_address(&request.contract_address)?;
        let address = contract_key.to_string();

        // ===== PRE-CHECK (no side effects) =====
        let snapshot = self.load_claimable(&address).await?;

        // ===== VALIDATION PHASE (read-only, unguarded) =====
        let validated = self.validate_claim(&snapshot, &request.post_reference).await?;

        // ===== SETTLEMENT PHASE (guarded) =====
        let _guard = self.locks.acquire(&address).await;

        let current = self.load_claimable(&address).await?;
        if current.tranches_distributed != snapshot.tranches_distributed {
            warn!(
                seen = snapshot.tranches_distributed,
                now = current.tranches_distributed,
                "claim record advanced during validation"
            );
            return Err(SettlementError::Conflict(address));
        }

        let owner = self.begin_settlement(&address, &current).await?;

        match self
            .settle(&contract_key, &current, &owner, &request.post_reference, validated)
            .await
        {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                self.release_settlement(&address, &owner).await;
                Err(err)
            }
        }
    }

    /**
     * Reads the claim record and requires it to be claimable
     *
     * - `Claimed` is rejected as `AlreadyClaimed`
     * - `InProgress` is rejected while its lease runs; an expired marker
     *   belongs to a settlement that died and may be taken over
     */
    async fn load_claimable(&self, address: &str) -> SettlementResult<ClaimMetadata> {
        let record = self
            .store
            .get(address)
            .await
            .map_err(|e| SettlementError::StoreUnavailable(e.to_string()))?
            .ok_or_else(|| SettlementError::NotFound(address.to_string()))?;

        match record.status {
            ClaimStatus::Pending => Ok(record),
            ClaimStatus::Claimed => {
                info!(
                    tranches_distributed = record.tranches_distributed,
                    "contract already claimed"
                );
                Err(SettlementError::AlreadyClaimed(address.to_string()))
            }
            ClaimStatus::InProgress => {
                if record.lease_expired(Utc::now(), self.settlement_lease()) {
                    warn!(
                        previous_owner = ?record.settlement_owner,
                        started_at = ?record.settlement_started_at,
                        "taking over expired settlement"
                    );
                    Ok(record)
                } else {
                    info!(owner = ?record.settlement_owner, "settlement in progress elsewhere");
                    Err(SettlementError::InProgress(address.to_string()))
                }
            }
        }
    }

    /// Takes the in-progress marker with a fresh owner token
    async fn begin_settlement(&self, address: &str, current: &ClaimMetadata) -> SettlementResult<String> {
        let owner = format!("{}:{}", self.instance_id, Uuid::new_v4());
        let update = ClaimUpdate::Begin {
            settlement_owner: owner.clone(),
            started_at: Utc::now(),
        };

        match self
            .store
            .compare_and_swap(address, &ClaimCondition::observed(current), update)
            .await
        {
            Ok(_) => {
                debug!(settlement_owner = %owner, "settlement marker taken");
                Ok(owner)
            }
            Err(StoreError::Conflict(_)) => {
                // Another instance moved the record since it was read
                warn!("lost the settlement marker race");
                match self.load_claimable(address).await {
                    Err(err) => Err(err),
                    Ok(_) => Err(SettlementError::Conflict(address.to_string())),
                }
            }
            Err(StoreError::NotFound(_)) => Err(SettlementError::NotFound(address.to_string())),
            Err(err) => Err(SettlementError::StoreUnavailable(err.to_string())),
        }
    }

    /// Returns the contract to `Pending` after a settlement that moved nothing
    async fn release_settlement(&self, address: &str, owner: &str) {
        match self
            .store
            .compare_and_swap(address, &ClaimCondition::held_by(owner), ClaimUpdate::Release)
            .await
        {
            Ok(_) => debug!(settlement_owner = owner, "settlement marker released"),
            Err(err) => error!(
                settlement_owner = owner,
                error = %err,
                "could not release settlement marker, contract stays locked until its lease expires"
            ),
        }
    }

    fn settlement_lease(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.config.settlement_lease_ms as i64)
    }

    /// Author, content and engagement checks; every call is time-bounded
    async fn validate_claim(
        &self,
        record: &ClaimMetadata,
        post_reference: &str,
    ) -> SettlementResult<ValidatedClaim> {
        validate_schedule(&record.tranche_distribution)?;

        let post = match timeout(
            self.config.post_lookup_timeout(),
            self.posts.lookup(post_reference),
        )
        .await
        {
            Ok(Ok(post)) => post,
            Ok(Err(e)) => return Err(SettlementError::PostUnavailable(e.to_string())),
            Err(_) => {
                return Err(SettlementError::PostUnavailable(format!(
                    "lookup of {post_reference} timed out"
                )))
            }
        };

        if !handles_match(&record.handle, &post.author_handle) {
            warn!(expected = %record.handle, actual = %post.author_handle, "author mismatch");
            return Err(SettlementError::AuthorMismatch {
                expected: record.handle.clone(),
                actual: post.author_handle,
            });
        }

        let satisfied = match timeout(
            self.config.content_oracle_timeout(),
            self.oracle.check(&post.text, &record.verification_text),
        )
        .await
        {
            Ok(Ok(satisfied)) => satisfied,
            Ok(Err(e)) => return Err(SettlementError::ContentOracleUnavailable(e.to_string())),
            Err(_) => {
                return Err(SettlementError::ContentOracleUnavailable(
                    "content check timed out".to_string(),
                ))
            }
        };
        if !satisfied {
            warn!("post content does not satisfy verification text");
            return Err(SettlementError::ContentMismatch);
        }

        let metrics = match timeout(self.config.metrics_timeout(), self.metrics.fetch(post_reference)).await {
            Ok(Ok(metrics)) => metrics,
            Ok(Err(e)) => return Err(SettlementError::MetricsUnavailable(e.to_string())),
            Err(_) => {
                return Err(SettlementError::MetricsUnavailable(format!(
                    "metrics for {post_reference} timed out"
                )))
            }
        };

        let evaluation = evaluate(
            metrics.engagement_value,
            &record.tranche_distribution,
            record.tranches_distributed,
        );
        if evaluation.increment() == 0 {
            let next = next_threshold(&record.tranche_distribution, record.tranches_distributed);
            warn!(
                engagement = metrics.engagement_value,
                next_threshold = ?next,
                "insufficient engagement"
            );
            return Err(SettlementError::InsufficientEngagement {
                engagement: metrics.engagement_value,
                next_threshold: next,
            });
        }

        debug!(
            engagement = metrics.engagement_value,
            qualified = evaluation.qualified,
            already_paid = evaluation.already_paid,
            "claim validated"
        );
        Ok(ValidatedClaim { metrics, evaluation })
    }

    async fn settle(
        &self,
        contract_key: &Pubkey,
        current: &ClaimMetadata,
        owner: &str,
        post_reference: &str,
        validated: ValidatedClaim,
    ) -> SettlementResult<SettlementOutcome> {
        let address = contract_key.to_string();
        let ValidatedClaim { metrics, evaluation } = validated;

        let contract = fetch_contract(
            self.ledger.as_ref(),
            &self.program_id,
            contract_key,
            self.config.ledger_read_timeout(),
        )
        .await?
        .ok_or_else(|| SettlementError::NotFound(address.clone()))?;

        if contract.tranche_count != current.number_of_tranches {
            return Err(SettlementError::TrancheCountMismatch {
                schedule: current.number_of_tranches,
                tranche_count: contract.tranche_count,
            });
        }

        // The ledger counter is the source of truth for what was paid
        if contract.paid_tranches < current.tranches_distributed {
            error!(
                ledger_paid = contract.paid_tranches,
                recorded = current.tranches_distributed,
                "claim record ahead of ledger"
            );
            return Err(SettlementError::Conflict(address));
        }
        if contract.paid_tranches > current.tranches_distributed {
            // Only the marker holder gets here, so the extra tranches were
            // paid by a settlement that died before persisting
            warn!(
                ledger_paid = contract.paid_tranches,
                recorded = current.tranches_distributed,
                "ledger ahead of claim record, resuming from ledger counter"
            );
        }

        let pending = TrancheEvaluation {
            qualified: evaluation.qualified.min(contract.tranche_count),
            already_paid: contract.paid_tranches,
        };
        let start = pending.already_paid;
        let requested = pending.increment();

        info!(
            engagement = metrics.engagement_value,
            qualified = evaluation.qualified,
            start,
            target = pending.qualified,
            "distributing tranches"
        );

        // ===== DISTRIBUTION PHASE (sequential) =====
        let progress = self
            .distribute(contract_key, &contract, pending.pending_range())
            .await;

        let mut total_distributed = start + progress.landed;
        if let Some(failure) = &progress.failure {
            warn!(
                landed = progress.landed,
                requested,
                error = %failure,
                "distribution stopped early, re-reading ledger"
            );
            total_distributed = self
                .confirmed_paid_tranches(contract_key, total_distributed)
                .await;
        }
        let distributed = total_distributed.saturating_sub(start);

        if total_distributed == current.tranches_distributed {
            // Nothing moved and nothing to reconcile: leave the record untouched
            let failure = progress
                .failure
                .unwrap_or_else(|| LedgerError::Transport("no tranche distributed".to_string()));
            return Err(distribution_error(failure));
        }

        // ===== PERSISTENCE PHASE =====
        let update = ClaimUpdate::Settle {
            tranches_distributed: total_distributed,
            post_reference: post_reference.to_string(),
            engagement_metrics: metrics.clone(),
            claimed_at: Utc::now(),
        };
        let record_persisted = match self
            .store
            .compare_and_swap(&address, &ClaimCondition::held_by(owner), update)
            .await
        {
            Ok(_) => true,
            Err(err) => {
                self.report_unpersisted(&address, total_distributed, current, &err);
                false
            }
        };

        let outcome = SettlementOutcome {
            contract_address: address.clone(),
            post_reference: post_reference.to_string(),
            engagement_value: metrics.engagement_value,
            qualified: evaluation.qualified,
            requested,
            distributed,
            total_distributed,
            signatures: progress.signatures,
            distribution_error: progress.failure.map(|e| e.to_string()),
            record_persisted,
        };

        if outcome.is_partial() {
            warn!(
                distributed = outcome.distributed,
                requested = outcome.requested,
                "partial distribution"
            );
        }
        emit(&ClaimSettled {
            contract: address,
            post_reference: outcome.post_reference.clone(),
            engagement_value: outcome.engagement_value,
            qualified: outcome.qualified,
            requested: outcome.requested,
            distributed: outcome.distributed,
            total_distributed: outcome.total_distributed,
        });
        Ok(outcome)
    }

    /// Submits one `distribute_tranche` per index, in order, stopping at the first failure
    async fn distribute(
        &self,
        contract_key: &Pubkey,
        contract: &ContractRecord,
        tranches: std::ops::Range<u64>,
    ) -> DistributionProgress {
        let mut progress = DistributionProgress {
            landed: 0,
            signatures: Vec::new(),
            failure: None,
        };
        let amount = contract.tranche_amount();

        for index in tranches {
            let Some(recipient) = usize::try_from(index)
                .ok()
                .and_then(|i| contract.recipients.get(i).copied())
            else {
                progress.failure = Some(LedgerError::Program {
                    code: TrancheProgramError::AllTranchesPaid.code(),
                });
                break;
            };

            let instruction = distribute_tranche(
                &self.program_id,
                &DistributeTrancheAccounts {
                    contract: *contract_key,
                    recipient,
                    owner: self.authority,
                },
            );

            match timeout(self.config.ledger_submit_timeout(), self.ledger.submit(instruction)).await {
                Ok(Ok(signature)) => {
                    progress.landed += 1;
                    emit(&TrancheDistributed {
                        contract: contract_key.to_string(),
                        tranche_index: index,
                        recipient: recipient.to_string(),
                        amount,
                        signature: signature.clone(),
                    });
                    progress.signatures.push(signature);
                }
                Ok(Err(err)) => {
                    if let Some(program_error) = err.program_error() {
                        warn!(tranche = index, %program_error, "program rejected distribution");
                    }
                    progress.failure = Some(err);
                    break;
                }
                Err(_) => {
                    warn!(tranche = index, "distribution timed out, outcome unknown");
                    progress.failure = Some(LedgerError::Timeout);
                    break;
                }
            }
        }
        progress
    }

    /// Re-reads `paid_tranches` after a failed or timed-out submission
    ///
    /// An instruction may have landed despite the timeout, so the ledger
    /// decides. Falls back to the locally confirmed count when the ledger
    /// cannot be read.
    async fn confirmed_paid_tranches(&self, contract_key: &Pubkey, locally_confirmed: u64) -> u64 {
        match fetch_contract(
            self.ledger.as_ref(),
            &self.program_id,
            contract_key,
            self.config.ledger_read_timeout(),
        )
        .await
        {
            Ok(Some(contract)) => {
                if contract.paid_tranches != locally_confirmed {
                    info!(
                        ledger_paid = contract.paid_tranches,
                        locally_confirmed,
                        "ledger progress differs from confirmed submissions"
                    );
                }
                contract.paid_tranches.max(locally_confirmed)
            }
            Ok(None) => {
                error!("contract account vanished during distribution");
                locally_confirmed
            }
            Err(err) => {
                error!(error = %err, "could not re-read ledger after distribution failure");
                locally_confirmed
            }
        }
    }

    fn report_unpersisted(
        &self,
        address: &str,
        ledger_paid_tranches: u64,
        current: &ClaimMetadata,
        err: &StoreError,
    ) {
        error!(
            contract = address,
            ledger_paid_tranches,
            recorded = current.tranches_distributed,
            error = %err,
            "funds moved but claim record was not persisted"
        );
        emit(&ReconciliationRequired {
            contract: address.to_string(),
            ledger_paid_tranches,
            recorded_tranches: current.tranches_distributed,
            reason: err.to_string(),
        });
    }
}

fn distribution_error(failure: LedgerError) -> SettlementError {
    let program_error = failure.program_error();
    match failure {
        LedgerError::Program { code } => SettlementError::DistributionRejected {
            code,
            message: program_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown program error".to_string()),
        },
        other => SettlementError::LedgerUnavailable(other.to_string()),
    }
}

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::config::EngineConfig;
use crate::engine::ContractLocks;
use crate::error::*;
use crate::ports::*;
use crate::state::*;
use crate::test::mocks::{authority, VERIFICATION_TEXT};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_overlap_oracle() {
        let keywords = KeywordOverlapOracle::keywords(VERIFICATION_TEXT);
        assert!(keywords.contains("promote"));
        assert!(keywords.contains("wallet"));
        assert!(!keywords.contains("the"));

        assert!(KeywordOverlapOracle::evaluate(
            "Go promote this wallet today, it is great",
            VERIFICATION_TEXT
        ));
        assert!(!KeywordOverlapOracle::evaluate(
            "Just had a sandwich for lunch",
            VERIFICATION_TEXT
        ));
        assert!(!KeywordOverlapOracle::evaluate("wallet", VERIFICATION_TEXT));
        assert!(!KeywordOverlapOracle::evaluate("   ", VERIFICATION_TEXT));
    }

    #[test]
    fn test_required_matches() {
        assert_eq!(KeywordOverlapOracle::required_matches(0), 1);
        assert_eq!(KeywordOverlapOracle::required_matches(1), 1);
        assert_eq!(KeywordOverlapOracle::required_matches(3), 1);
        assert_eq!(KeywordOverlapOracle::required_matches(4), 2);
        assert_eq!(KeywordOverlapOracle::required_matches(40), 2);
    }

    #[tokio::test]
    async fn test_oracle_trait_object() {
        let oracle: Arc<dyn ContentOracle> = Arc::new(KeywordOverlapOracle);
        let ok = oracle
            .check("Please promote our wallet launch now", "promote wallet launch")
            .await
            .unwrap();
        assert!(ok);
    }

    fn pending(address: &str) -> ClaimMetadata {
        ClaimMetadata::new_pending(address, VERIFICATION_TEXT, "influencer", vec![100, 500])
    }

    fn update() -> ClaimUpdate {
        ClaimUpdate::Settle {
            tranches_distributed: 1,
            post_reference: "post-1".to_string(),
            engagement_metrics: EngagementMetrics::from_value(150, Utc::now()),
            claimed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_memory_store_conditional_writes() {
        let store = MemoryClaimStore::new();
        assert!(store.is_empty());

        store.put_if_absent(pending("a")).await.unwrap();
        assert_eq!(
            store.put_if_absent(pending("a")).await,
            Err(StoreError::AlreadyExists("a".to_string()))
        );

        let updated = store
            .compare_and_swap("a", &ClaimCondition::pending(), update())
            .await
            .unwrap();
        assert_eq!(updated.status, ClaimStatus::Claimed);
        assert_eq!(updated.tranches_distributed, 1);
        assert_eq!(updated.post_reference.as_deref(), Some("post-1"));

        // Second swap from pending must conflict
        assert_eq!(
            store.compare_and_swap("a", &ClaimCondition::pending(), update()).await,
            Err(StoreError::Conflict("a".to_string()))
        );
        assert_eq!(
            store.compare_and_swap("missing", &ClaimCondition::pending(), update()).await,
            Err(StoreError::NotFound("missing".to_string()))
        );
    }

    fn begin(owner: &str) -> ClaimUpdate {
        ClaimUpdate::Begin {
            settlement_owner: owner.to_string(),
            started_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_settlement_marker_excludes_other_owners() {
        let store = MemoryClaimStore::new();
        store.put_if_absent(pending("a")).await.unwrap();

        let held = store
            .compare_and_swap("a", &ClaimCondition::pending(), begin("engine_1:x"))
            .await
            .unwrap();
        assert_eq!(held.status, ClaimStatus::InProgress);
        assert_eq!(held.settlement_owner.as_deref(), Some("engine_1:x"));
        assert!(held.settlement_started_at.is_some());

        // A second instance that read the record as pending loses
        assert_eq!(
            store.compare_and_swap("a", &ClaimCondition::pending(), begin("engine_2:y")).await,
            Err(StoreError::Conflict("a".to_string()))
        );
        // Only the holder may settle or release
        assert_eq!(
            store
                .compare_and_swap("a", &ClaimCondition::held_by("engine_2:y"), update())
                .await,
            Err(StoreError::Conflict("a".to_string()))
        );

        let released = store
            .compare_and_swap("a", &ClaimCondition::held_by("engine_1:x"), ClaimUpdate::Release)
            .await
            .unwrap();
        assert_eq!(released.status, ClaimStatus::Pending);
        assert_eq!(released.settlement_owner, None);
        assert_eq!(released.settlement_started_at, None);
        assert_eq!(released.tranches_distributed, 0);

        store
            .compare_and_swap("a", &ClaimCondition::pending(), begin("engine_2:y"))
            .await
            .unwrap();
        let settled = store
            .compare_and_swap("a", &ClaimCondition::held_by("engine_2:y"), update())
            .await
            .unwrap();
        assert_eq!(settled.status, ClaimStatus::Claimed);
        assert_eq!(settled.settlement_owner, None);
    }

    #[tokio::test]
    async fn test_stale_marker_takeover_uses_observed_owner() {
        let store = MemoryClaimStore::new();
        store.put_if_absent(pending("a")).await.unwrap();
        let stale = store
            .compare_and_swap(
                "a",
                &ClaimCondition::pending(),
                ClaimUpdate::Begin {
                    settlement_owner: "engine_1:x".to_string(),
                    started_at: Utc::now() - chrono::Duration::hours(1),
                },
            )
            .await
            .unwrap();

        let lease = chrono::Duration::minutes(10);
        assert!(stale.lease_expired(Utc::now(), lease));
        assert!(!pending("b").lease_expired(Utc::now(), lease));

        let observed = ClaimCondition::observed(&stale);
        assert!(observed.matches(&stale));
        store
            .compare_and_swap("a", &observed, begin("engine_2:y"))
            .await
            .unwrap();

        // A racing takeover from the same observation loses
        assert_eq!(
            store.compare_and_swap("a", &observed, begin("engine_3:z")).await,
            Err(StoreError::Conflict("a".to_string()))
        );
        let fresh = store.get("a").await.unwrap().unwrap();
        assert_eq!(fresh.settlement_owner.as_deref(), Some("engine_2:y"));
        assert!(!fresh.lease_expired(Utc::now(), lease));
    }

    #[tokio::test]
    async fn test_claim_record_json_shape() {
        let store = MemoryClaimStore::new();
        store.put_if_absent(pending("b")).await.unwrap();
        store.put_if_absent(pending("a")).await.unwrap();

        let json = store.export_json().unwrap();
        let parsed: Vec<ClaimMetadata> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].contract_address, "a");
        assert!(json.contains("\"status\": \"pending\""));
    }

    #[test]
    fn test_engagement_from_counters() {
        let metrics = EngagementMetrics::from_counters(500, 100, 30, 15, 5, Utc::now());
        assert_eq!(metrics.engagement_value, 650);

        let saturated = EngagementMetrics::from_counters(u64::MAX, 1, 0, 0, 0, Utc::now());
        assert_eq!(saturated.engagement_value, u64::MAX);
    }

    #[test]
    fn test_program_error_codes() {
        assert_eq!(TrancheProgramError::from_code(6000), Some(TrancheProgramError::AllTranchesPaid));
        assert_eq!(TrancheProgramError::from_code(6005), Some(TrancheProgramError::InvalidSigner));
        assert_eq!(TrancheProgramError::from_code(6006), None);
        assert_eq!(TrancheProgramError::from_code(42), None);
        assert_eq!(TrancheProgramError::InvalidRecipient.code(), 6001);

        let err = LedgerError::Program { code: 6001 };
        assert_eq!(err.program_error(), Some(TrancheProgramError::InvalidRecipient));
        assert_eq!(LedgerError::Timeout.program_error(), None);
    }

    #[test]
    fn test_error_classification() {
        assert!(SettlementError::MetricsUnavailable("x".into()).is_retryable());
        assert!(SettlementError::LedgerUnavailable("x".into()).is_retryable());
        assert!(!SettlementError::AlreadyClaimed("x".into()).is_retryable());
        assert!(SettlementError::InProgress("x".into()).is_retryable());
        assert_eq!(
            SettlementError::InProgress("x".into()).reason_code(),
            "SETTLEMENT_IN_PROGRESS"
        );
        assert_eq!(
            SettlementError::from(CodecError::TruncatedData { needed: 8, remaining: 2 }).reason_code(),
            "TRUNCATED_DATA"
        );
        assert_eq!(
            SettlementError::InsufficientEngagement { engagement: 40, next_threshold: Some(100) }
                .category(),
            ErrorCategory::Precondition
        );
        assert_eq!(
            SettlementError::from(ScheduleError::InvalidSchedule("empty".into())).category(),
            ErrorCategory::Format
        );
    }

    #[test]
    fn test_config_from_toml() {
        let raw = format!(
            "authority = \"{}\"\nmetrics_timeout_ms = 2500\n",
            authority()
        );
        let config = EngineConfig::from_toml_str(&raw).unwrap();
        assert_eq!(config.program_id().unwrap(), crate::ID);
        assert_eq!(config.authority().unwrap(), authority());
        assert_eq!(config.metrics_timeout(), Duration::from_millis(2500));
        assert_eq!(config.ledger_submit_timeout(), Duration::from_secs(30));
        assert_eq!(config.max_recipients, 10);
    }

    #[test]
    fn test_config_rejects_bad_values() {
        assert!(matches!(
            EngineConfig::from_toml_str("authority = \"not-a-key\""),
            Err(ConfigError::Invalid { field: "authority", .. })
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("program_id = 5"),
            Err(ConfigError::Parse(_))
        ));

        let mut config = EngineConfig::new(authority());
        config.ledger_read_timeout_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "ledger_read_timeout_ms", .. })
        ));
    }

    #[test]
    fn test_settlement_lease_covers_longest_settlement() {
        let config = EngineConfig::new(authority());
        assert_eq!(config.settlement_lease(), Duration::from_secs(600));
        assert!(config.validate().is_ok());

        // 10 recipients at 30s per submission plus a 10s read
        let mut short = config.clone();
        short.settlement_lease_ms = 310_000;
        assert!(matches!(
            short.validate(),
            Err(ConfigError::Invalid { field: "settlement_lease_ms", .. })
        ));
        short.max_recipients = 5;
        assert!(short.validate().is_ok());

        let mut long = config;
        long.settlement_lease_ms = 2 * 86_400_000;
        assert!(matches!(
            long.validate(),
            Err(ConfigError::Invalid { field: "settlement_lease_ms", .. })
        ));
    }

    #[test]
    fn test_tracing_installs_once() {
        let _ = crate::telemetry::init_tracing();
        assert!(!crate::telemetry::init_tracing());
    }

    #[tokio::test]
    async fn test_contract_locks_serialize_and_clean_up() {
        let locks = Arc::new(ContractLocks::new());
        let guard = locks.acquire("c1").await;
        assert!(locks.in_flight("c1"));
        assert_eq!(guard.contract(), "c1");

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _g = locks.acquire("c1").await;
            })
        };
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        // Other contracts are not blocked
        drop(locks.acquire("c2").await);
        assert!(!locks.in_flight("c2"));

        drop(guard);
        waiter.await.unwrap();
        assert!(!locks.in_flight("c1"));
    }
}

//! Configuration for the settlement engine

use std::str::FromStr;
use std::time::Duration;

use anchor_lang::prelude::Pubkey;
use serde::{Deserialize, Serialize};

use crate::constants::{
    MAX_RECIPIENTS, MAX_SETTLEMENT_LEASE_MS, MAX_VERIFICATION_TEXT_LEN, MIN_VERIFICATION_TEXT_LEN,
};
use crate::error::ConfigError;

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Deployed payment program (base58)
    #[serde(default = "default_program_id")]
    pub program_id: String,

    /// Signer used for `distribute_tranche` (contract owner or paymaster, base58)
    pub authority: String,

    /// Timeout for account reads
    #[serde(default = "default_ledger_read_timeout_ms")]
    pub ledger_read_timeout_ms: u64,

    /// Timeout for a single submitted instruction, confirmation included
    #[serde(default = "default_ledger_submit_timeout_ms")]
    pub ledger_submit_timeout_ms: u64,

    #[serde(default = "default_collaborator_timeout_ms")]
    pub metrics_timeout_ms: u64,

    #[serde(default = "default_collaborator_timeout_ms")]
    pub content_oracle_timeout_ms: u64,

    #[serde(default = "default_collaborator_timeout_ms")]
    pub post_lookup_timeout_ms: u64,

    /// How long a settlement may hold a contract's in-progress marker
    /// - After this, another settlement may take the contract over
    /// - Must cover one ledger read plus one submission per recipient, so a
    ///   live settlement has stopped submitting before its marker goes stale
    #[serde(default = "default_settlement_lease_ms")]
    pub settlement_lease_ms: u64,

    /// Maximum recipients per contract (program account space)
    #[serde(default = "default_max_recipients")]
    pub max_recipients: usize,

    #[serde(default = "default_min_verification_text_len")]
    pub min_verification_text_len: usize,

    #[serde(default = "default_max_verification_text_len")]
    pub max_verification_text_len: usize,
}

fn default_program_id() -> String {
    crate::ID.to_string()
}

fn default_ledger_read_timeout_ms() -> u64 {
    10_000
}

fn default_ledger_submit_timeout_ms() -> u64 {
    30_000
}

fn default_collaborator_timeout_ms() -> u64 {
    15_000
}

fn default_settlement_lease_ms() -> u64 {
    600_000
}

fn default_max_recipients() -> usize {
    MAX_RECIPIENTS
}

fn default_min_verification_text_len() -> usize {
    MIN_VERIFICATION_TEXT_LEN
}

fn default_max_verification_text_len() -> usize {
    MAX_VERIFICATION_TEXT_LEN
}

impl EngineConfig {
    /// Configuration with defaults for everything but the signing authority
    pub fn new(authority: Pubkey) -> Self {
        Self {
            program_id: default_program_id(),
            authority: authority.to_string(),
            ledger_read_timeout_ms: default_ledger_read_timeout_ms(),
            ledger_submit_timeout_ms: default_ledger_submit_timeout_ms(),
            metrics_timeout_ms: default_collaborator_timeout_ms(),
            content_oracle_timeout_ms: default_collaborator_timeout_ms(),
            post_lookup_timeout_ms: default_collaborator_timeout_ms(),
            settlement_lease_ms: default_settlement_lease_ms(),
            max_recipients: default_max_recipients(),
            min_verification_text_len: default_min_verification_text_len(),
            max_verification_text_len: default_max_verification_text_len(),
        }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.program_id()?;
        self.authority()?;
        for (field, value) in [
            ("ledger_read_timeout_ms", self.ledger_read_timeout_ms),
            ("ledger_submit_timeout_ms", self.ledger_submit_timeout_ms),
            ("metrics_timeout_ms", self.metrics_timeout_ms),
            ("content_oracle_timeout_ms", self.content_oracle_timeout_ms),
            ("post_lookup_timeout_ms", self.post_lookup_timeout_ms),
            ("settlement_lease_ms", self.settlement_lease_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "timeout must be greater than 0".to_string(),
                });
            }
        }
        if self.max_recipients == 0 || self.max_recipients > MAX_RECIPIENTS {
            return Err(ConfigError::Invalid {
                field: "max_recipients",
                reason: format!("must be between 1 and {MAX_RECIPIENTS}"),
            });
        }
        let longest_settlement = self
            .ledger_submit_timeout_ms
            .saturating_mul(self.max_recipients as u64)
            .saturating_add(self.ledger_read_timeout_ms);
        if self.settlement_lease_ms <= longest_settlement {
            return Err(ConfigError::Invalid {
                field: "settlement_lease_ms",
                reason: format!("must exceed the longest settlement ({longest_settlement} ms)"),
            });
        }
        if self.settlement_lease_ms > MAX_SETTLEMENT_LEASE_MS {
            return Err(ConfigError::Invalid {
                field: "settlement_lease_ms",
                reason: format!("must not exceed {MAX_SETTLEMENT_LEASE_MS} ms"),
            });
        }
        if self.min_verification_text_len > self.max_verification_text_len {
            return Err(ConfigError::Invalid {
                field: "min_verification_text_len",
                reason: "exceeds max_verification_text_len".to_string(),
            });
        }
        Ok(())
    }

    pub fn program_id(&self) -> Result<Pubkey, ConfigError> {
        parse_pubkey("program_id", &self.program_id)
    }

    pub fn authority(&self) -> Result<Pubkey, ConfigError> {
        parse_pubkey("authority", &self.authority)
    }

    pub fn ledger_read_timeout(&self) -> Duration {
        Duration::from_millis(self.ledger_read_timeout_ms)
    }

    pub fn ledger_submit_timeout(&self) -> Duration {
        Duration::from_millis(self.ledger_submit_timeout_ms)
    }

    pub fn metrics_timeout(&self) -> Duration {
        Duration::from_millis(self.metrics_timeout_ms)
    }

    pub fn content_oracle_timeout(&self) -> Duration {
        Duration::from_millis(self.content_oracle_timeout_ms)
    }

    pub fn post_lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.post_lookup_timeout_ms)
    }

    pub fn settlement_lease(&self) -> Duration {
        Duration::from_millis(self.settlement_lease_ms)
    }
}

fn parse_pubkey(field: &'static str, raw: &str) -> Result<Pubkey, ConfigError> {
    Pubkey::from_str(raw).map_err(|e| ConfigError::Invalid {
        field,
        reason: e.to_string(),
    })
}

use thiserror::Error;

use crate::constants::CUSTOM_ERROR_OFFSET;

/// Errors raised while decoding or encoding the binary wire format
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    // Format errors
    #[error("Invalid discriminator: expected {expected:?}, found {found:?}")]
    InvalidDiscriminator { expected: [u8; 8], found: [u8; 8] },
    #[error("Truncated data: needed {needed} bytes, {remaining} remaining")]
    TruncatedData { needed: usize, remaining: usize },
    #[error("Malformed data: {0}")]
    InvalidData(String),

    // Record invariants
    #[error("Number of recipients ({recipients}) must match tranche count ({tranche_count})")]
    RecipientCountMismatch { recipients: u64, tranche_count: u64 },
    #[error("Total amount must be greater than 0")]
    InvalidAmount,
    #[error("Tranche count must be greater than 0")]
    InvalidTrancheCount,
    #[error("Paid tranches ({paid}) exceed tranche count ({tranche_count})")]
    PaidTranchesOutOfRange { paid: u64, tranche_count: u64 },
    #[error("Too many recipients: {count} (max {max})")]
    TooManyRecipients { count: usize, max: usize },
}

/// Errors raised when validating a threshold ladder
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),
}

/// Custom errors of the deployed tranche payment program
/// - Codes start at 6000 in declaration order
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrancheProgramError {
    #[error("All tranches have been paid")]
    AllTranchesPaid,
    #[error("Invalid recipient for current tranche")]
    InvalidRecipient,
    #[error("Number of recipients must match tranche count")]
    InvalidRecipientsCount,
    #[error("Total amount must be greater than 0")]
    InvalidAmount,
    #[error("Tranche count must be greater than 0")]
    InvalidTrancheCount,
    #[error("Invalid signer - must be owner or authorized wallet")]
    InvalidSigner,
}

impl TrancheProgramError {
    pub fn from_code(code: u32) -> Option<Self> {
        match code.checked_sub(CUSTOM_ERROR_OFFSET)? {
            0 => Some(Self::AllTranchesPaid),
            1 => Some(Self::InvalidRecipient),
            2 => Some(Self::InvalidRecipientsCount),
            3 => Some(Self::InvalidAmount),
            4 => Some(Self::InvalidTrancheCount),
            5 => Some(Self::InvalidSigner),
            _ => None,
        }
    }

    pub fn code(self) -> u32 {
        CUSTOM_ERROR_OFFSET + self as u32
    }
}

/// Failures reported by the ledger collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Ledger request timed out")]
    Timeout,
    #[error("Ledger transport error: {0}")]
    Transport(String),
    #[error("Program rejected instruction with custom error {code}")]
    Program { code: u32 },
    #[error("Account {address} is owned by {owner}, not the payment program")]
    WrongOwner { address: String, owner: String },
}

impl LedgerError {
    /// Maps a custom program error code onto the known program errors
    pub fn program_error(&self) -> Option<TrancheProgramError> {
        match self {
            LedgerError::Program { code } => TrancheProgramError::from_code(*code),
            _ => None,
        }
    }
}

/// Failures reported by the metrics provider
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetricsError {
    #[error("Metrics unavailable: {0}")]
    Unavailable(String),
}

/// Failures reported by the post lookup
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PostError {
    #[error("Post not found: {0}")]
    NotFound(String),
    #[error("Post lookup failed: {0}")]
    Unavailable(String),
}

/// Failures reported by the content oracle
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("Content oracle unavailable: {0}")]
    Unavailable(String),
}

/// Failures reported by the claim-record store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Record already exists: {0}")]
    AlreadyExists(String),
    #[error("Conditional update conflict on {0}")]
    Conflict(String),
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Errors surfaced by configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Coarse classification of a settlement failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed record or caller contract violation, never retried
    Format,
    /// Claim does not satisfy its preconditions, surfaced verbatim
    Precondition,
    /// Collaborator unavailable, the caller may resubmit
    Transient,
}

/// Errors surfaced by registration and claim settlement
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettlementError {
    // Format errors
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error("Invalid contract address: {0}")]
    InvalidAddress(String),
    #[error("Invalid verification text: {0}")]
    InvalidVerificationText(String),
    #[error("Schedule has {schedule} thresholds but contract has {tranche_count} tranches")]
    TrancheCountMismatch { schedule: u64, tranche_count: u64 },
    #[error("Invalid handle: {0:?}")]
    InvalidHandle(String),
    #[error("Program rejected distribution with code {code}: {message}")]
    DistributionRejected { code: u32, message: String },

    // Precondition errors
    #[error("Contract not found: {0}")]
    NotFound(String),
    #[error("Contract already claimed: {0}")]
    AlreadyClaimed(String),
    #[error("Contract already registered: {0}")]
    AlreadyRegistered(String),
    #[error("Post author {actual} does not match expected handle {expected}")]
    AuthorMismatch { expected: String, actual: String },
    #[error("Post content does not satisfy the verification requirement")]
    ContentMismatch,
    #[error("Insufficient engagement: current value {engagement}, next threshold {next_threshold:?}")]
    InsufficientEngagement {
        engagement: u64,
        next_threshold: Option<u64>,
    },

    // Transient errors
    #[error("Metrics unavailable: {0}")]
    MetricsUnavailable(String),
    #[error("Post unavailable: {0}")]
    PostUnavailable(String),
    #[error("Content oracle unavailable: {0}")]
    ContentOracleUnavailable(String),
    #[error("Ledger unavailable: {0}")]
    LedgerUnavailable(String),
    #[error("Concurrent settlement advanced contract {0}")]
    Conflict(String),
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Settlement already in progress for {0}")]
    InProgress(String),
}

impl SettlementError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SettlementError::Codec(_)
            | SettlementError::Schedule(_)
            | SettlementError::InvalidAddress(_)
            | SettlementError::InvalidVerificationText(_)
            | SettlementError::TrancheCountMismatch { .. }
            | SettlementError::InvalidHandle(_)
            | SettlementError::DistributionRejected { .. } => ErrorCategory::Format,
            SettlementError::NotFound(_)
            | SettlementError::AlreadyClaimed(_)
            | SettlementError::AlreadyRegistered(_)
            | SettlementError::AuthorMismatch { .. }
            | SettlementError::ContentMismatch
            | SettlementError::InsufficientEngagement { .. } => ErrorCategory::Precondition,
            SettlementError::MetricsUnavailable(_)
            | SettlementError::PostUnavailable(_)
            | SettlementError::ContentOracleUnavailable(_)
            | SettlementError::LedgerUnavailable(_)
            | SettlementError::Conflict(_)
            | SettlementError::StoreUnavailable(_)
            | SettlementError::InProgress(_) => ErrorCategory::Transient,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::Transient
    }

    /// Stable machine-readable reason code
    pub fn reason_code(&self) -> &'static str {
        match self {
            SettlementError::Codec(CodecError::InvalidDiscriminator { .. }) => "INVALID_DISCRIMINATOR",
            SettlementError::Codec(CodecError::TruncatedData { .. }) => "TRUNCATED_DATA",
            SettlementError::Codec(_) => "CORRUPT_RECORD",
            SettlementError::Schedule(_) => "INVALID_SCHEDULE",
            SettlementError::InvalidAddress(_) => "INVALID_ADDRESS",
            SettlementError::InvalidVerificationText(_) => "INVALID_VERIFICATION_TEXT",
            SettlementError::TrancheCountMismatch { .. } => "TRANCHE_COUNT_MISMATCH",
            SettlementError::InvalidHandle(_) => "INVALID_HANDLE",
            SettlementError::DistributionRejected { .. } => "DISTRIBUTION_REJECTED",
            SettlementError::NotFound(_) => "NOT_FOUND",
            SettlementError::AlreadyClaimed(_) => "ALREADY_CLAIMED",
            SettlementError::AlreadyRegistered(_) => "ALREADY_REGISTERED",
            SettlementError::AuthorMismatch { .. } => "AUTHOR_MISMATCH",
            SettlementError::ContentMismatch => "CONTENT_MISMATCH",
            SettlementError::InsufficientEngagement { .. } => "INSUFFICIENT_ENGAGEMENT",
            SettlementError::MetricsUnavailable(_) => "METRICS_UNAVAILABLE",
            SettlementError::PostUnavailable(_) => "POST_UNAVAILABLE",
            SettlementError::ContentOracleUnavailable(_) => "CONTENT_ORACLE_UNAVAILABLE",
            SettlementError::LedgerUnavailable(_) => "LEDGER_UNAVAILABLE",
            SettlementError::Conflict(_) => "CONFLICT",
            SettlementError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            SettlementError::InProgress(_) => "SETTLEMENT_IN_PROGRESS",
        }
    }
}

pub type SettlementResult<T> = std::result::Result<T, SettlementError>;

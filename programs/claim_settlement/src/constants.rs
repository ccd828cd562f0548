/**
 * Protocol Constants
 *
 * Fixed values shared with the deployed tranche payment program. The
 * discriminators are part of the external protocol: they are the first
 * eight bytes of sha256("<namespace>:<name>") as generated by Anchor and
 * must never be guessed or reused across record types.
 */

/// ===== DISCRIMINATORS =====

/// Account discriminator for `PaymentContract`
/// - sha256("account:PaymentContract")[..8]
/// - Checked before any other field is parsed
pub const PAYMENT_CONTRACT_DISCRIMINATOR: [u8; 8] = [151, 55, 24, 165, 12, 206, 38, 31];

/// Instruction discriminator for `create_contract`
/// - sha256("global:create_contract")[..8]
pub const CREATE_CONTRACT_DISCRIMINATOR: [u8; 8] = [244, 48, 244, 178, 216, 88, 122, 52];

/// Instruction discriminator for `distribute_tranche`
/// - sha256("global:distribute_tranche")[..8]
pub const DISTRIBUTE_TRANCHE_DISCRIMINATOR: [u8; 8] = [4, 101, 117, 116, 122, 242, 211, 91];

/// Instruction discriminator for `close_contract`
/// - sha256("global:close_contract")[..8]
pub const CLOSE_CONTRACT_DISCRIMINATOR: [u8; 8] = [37, 244, 34, 168, 92, 202, 80, 106];

/// ===== LAYOUT CONSTANTS =====

/// Width of every discriminator prefix
pub const DISCRIMINATOR_LEN: usize = 8;

/// Width of a raw 32-byte identity
pub const PUBKEY_LEN: usize = 32;

/// Fixed part of the account layout
/// - discriminator + owner + total_amount + tranche_count + vec prefix + paid_tranches
pub const PAYMENT_CONTRACT_FIXED_LEN: usize = DISCRIMINATOR_LEN + PUBKEY_LEN + 8 + 8 + 4 + 8;

/// Maximum number of recipients the program allocates account space for
pub const MAX_RECIPIENTS: usize = 10;

/// Space the program allocates for a `PaymentContract` account
/// - Accounts are padded to this size, so decoding must tolerate trailing bytes
pub const PAYMENT_CONTRACT_SPACE: usize = 8 + 32 + 8 + 8 + 8 + PUBKEY_LEN * MAX_RECIPIENTS;

/// ===== PROGRAM ERROR CONSTANTS =====

/// First custom error code emitted by the program (`#[error_code]` offset)
pub const CUSTOM_ERROR_OFFSET: u32 = 6000;

/// ===== VERIFICATION TEXT BOUNDS =====

/// Minimum accepted length of a verification requirement
pub const MIN_VERIFICATION_TEXT_LEN: usize = 10;

/// Maximum accepted length of a verification requirement
pub const MAX_VERIFICATION_TEXT_LEN: usize = 5000;

/// ===== SETTLEMENT MARKER =====

/// Upper bound on a settlement marker lease (one day)
pub const MAX_SETTLEMENT_LEASE_MS: u64 = 86_400_000;

use std::io::ErrorKind;

use anchor_lang::prelude::{borsh, AnchorDeserialize, AnchorSerialize, Pubkey};

use crate::constants::*;
use crate::error::CodecError;

/**
 * Payment contract account record
 *
 * Decoded view of the `PaymentContract` account owned by the tranche
 * payment program. The ledger is always the source of truth for these
 * fields; this record is never written back directly.
 *
 * Layout (little-endian, no padding between fields):
 * discriminator:8 | owner:32 | total_amount:u64 | tranche_count:u64 |
 * recipients_len:u32 | recipients:32*n | paid_tranches:u64
 *
 * Invariants:
 * - total_amount > 0
 * - tranche_count > 0
 * - recipients.len() == tranche_count (recipient i receives tranche i)
 * - paid_tranches <= tranche_count
 */
#[derive(AnchorSerialize, AnchorDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct ContractRecord {
    /// Sponsor who funded the contract
    pub owner: Pubkey,

    /// Lamports locked at creation
    pub total_amount: u64,

    /// Number of installments
    pub tranche_count: u64,

    /// Recipient per tranche, in tranche order
    pub recipients: Vec<Pubkey>,

    /// Tranches already released by the program
    /// - Monotonically non-decreasing
    /// - The program always pays `recipients[paid_tranches]` next
    pub paid_tranches: u64,
}

impl ContractRecord {
    /// Decodes a raw account buffer
    ///
    /// The discriminator is checked before anything else. The body is plain
    /// borsh; trailing bytes are ignored because the program over-allocates
    /// space for ten recipients.
    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        let Some((found, mut body)) = data.split_first_chunk::<DISCRIMINATOR_LEN>() else {
            return Err(CodecError::TruncatedData {
                needed: DISCRIMINATOR_LEN,
                remaining: data.len(),
            });
        };
        if *found != PAYMENT_CONTRACT_DISCRIMINATOR {
            return Err(CodecError::InvalidDiscriminator {
                expected: PAYMENT_CONTRACT_DISCRIMINATOR,
                found: *found,
            });
        }

        let record = <Self as AnchorDeserialize>::deserialize(&mut body)
            .map_err(|e| decode_error(e, data))?;
        record.validate()?;
        Ok(record)
    }

    /// Encodes the record with its discriminator, without account padding
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        self.validate()?;
        let mut data = Vec::with_capacity(self.encoded_len());
        data.extend_from_slice(&PAYMENT_CONTRACT_DISCRIMINATOR);
        self.serialize(&mut data)
            .map_err(|e| CodecError::InvalidData(e.to_string()))?;
        Ok(data)
    }

    /// Exact encoded size for this record
    pub fn encoded_len(&self) -> usize {
        PAYMENT_CONTRACT_FIXED_LEN + PUBKEY_LEN * self.recipients.len()
    }

    /// Rejects records that break the account invariants
    /// - A corrupt record is never partially trusted
    pub fn validate(&self) -> Result<(), CodecError> {
        if self.total_amount == 0 {
            return Err(CodecError::InvalidAmount);
        }
        if self.tranche_count == 0 {
            return Err(CodecError::InvalidTrancheCount);
        }
        if self.recipients.len() as u64 != self.tranche_count {
            return Err(CodecError::RecipientCountMismatch {
                recipients: self.recipients.len() as u64,
                tranche_count: self.tranche_count,
            });
        }
        if self.paid_tranches > self.tranche_count {
            return Err(CodecError::PaidTranchesOutOfRange {
                paid: self.paid_tranches,
                tranche_count: self.tranche_count,
            });
        }
        Ok(())
    }

    /// Lamports released per tranche (integer division, as the program does)
    pub fn tranche_amount(&self) -> u64 {
        self.total_amount.checked_div(self.tranche_count).unwrap_or(0)
    }

    /// Recipient of the next tranche the program will pay
    pub fn next_recipient(&self) -> Option<Pubkey> {
        usize::try_from(self.paid_tranches)
            .ok()
            .and_then(|index| self.recipients.get(index).copied())
    }

    pub fn remaining_tranches(&self) -> u64 {
        self.tranche_count.saturating_sub(self.paid_tranches)
    }

    pub fn is_fully_paid(&self) -> bool {
        self.paid_tranches >= self.tranche_count
    }

    /// Lamports returned to the owner by `close_contract`
    pub fn close_refund(&self) -> u64 {
        self.total_amount
            .saturating_sub(self.paid_tranches.saturating_mul(self.tranche_amount()))
    }
}

/// Offset of the recipients length prefix within the account buffer
const RECIPIENTS_LEN_OFFSET: usize = DISCRIMINATOR_LEN + PUBKEY_LEN + 8 + 8;

/// Maps a borsh failure onto the codec errors
/// - Running out of input is reported with the length the header implies
fn decode_error(err: std::io::Error, data: &[u8]) -> CodecError {
    match err.kind() {
        ErrorKind::UnexpectedEof | ErrorKind::InvalidInput => CodecError::TruncatedData {
            needed: required_len(data),
            remaining: data.len(),
        },
        _ => CodecError::InvalidData(err.to_string()),
    }
}

/// Minimum buffer length implied by the recipients length prefix, if readable
fn required_len(data: &[u8]) -> usize {
    let recipients = data
        .get(RECIPIENTS_LEN_OFFSET..)
        .and_then(|mut rest| u32::deserialize(&mut rest).ok())
        .map_or(0, |len| len as usize);
    PAYMENT_CONTRACT_FIXED_LEN.saturating_add(recipients.saturating_mul(PUBKEY_LEN))
}

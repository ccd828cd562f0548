use anchor_lang::prelude::{borsh, AnchorDeserialize, AnchorSerialize, Pubkey};
use anchor_lang::solana_program::instruction::{AccountMeta, Instruction};
use anchor_lang::solana_program::system_program;

use crate::constants::*;
use crate::error::CodecError;

/**
 * Accounts for `create_contract`
 *
 * Order is part of the program interface:
 * 0. contract - new account, signer + writable
 * 1. owner - funding sponsor, signer + writable
 * 2. system program - read-only
 */
#[derive(Debug, Clone, Copy)]
pub struct CreateContractAccounts {
    /// Fresh keypair address for the payment contract account
    pub contract: Pubkey,
    /// Sponsor paying for the account and locking the funds
    pub owner: Pubkey,
}

/// Arguments of `create_contract`, borsh-encoded after the discriminator
#[derive(AnchorSerialize, AnchorDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct CreateContractArgs {
    pub total_amount: u64,
    pub tranche_count: u64,
    pub recipients: Vec<Pubkey>,
}

impl CreateContractArgs {
    /// Rejects arguments the program would reject, before anything is encoded
    pub fn validate(&self) -> Result<(), CodecError> {
        if self.recipients.len() as u64 != self.tranche_count {
            return Err(CodecError::RecipientCountMismatch {
                recipients: self.recipients.len() as u64,
                tranche_count: self.tranche_count,
            });
        }
        if self.total_amount == 0 {
            return Err(CodecError::InvalidAmount);
        }
        if self.tranche_count == 0 {
            return Err(CodecError::InvalidTrancheCount);
        }
        if self.recipients.len() > MAX_RECIPIENTS {
            return Err(CodecError::TooManyRecipients {
                count: self.recipients.len(),
                max: MAX_RECIPIENTS,
            });
        }
        Ok(())
    }

    /// total_amount:u64 | tranche_count:u64 | recipients:vec<pubkey>
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        self.validate()?;
        let mut data = Vec::with_capacity(8 + 8 + 4 + PUBKEY_LEN * self.recipients.len());
        self.serialize(&mut data)
            .map_err(|e| CodecError::InvalidData(e.to_string()))?;
        Ok(data)
    }
}

/**
 * Builds a `create_contract` instruction
 *
 * @param program_id - Deployed payment program
 * @param accounts - New contract account and funding owner
 * @param args - Amount, tranche count and ordered recipients
 *
 * Fails fast with `RecipientCountMismatch` when the recipients do not
 * line up with the tranche count.
 */
pub fn create_contract(
    program_id: &Pubkey,
    accounts: &CreateContractAccounts,
    args: &CreateContractArgs,
) -> Result<Instruction, CodecError> {
    let encoded_args = args.encode()?;

    let mut data = Vec::with_capacity(DISCRIMINATOR_LEN + encoded_args.len());
    data.extend_from_slice(&CREATE_CONTRACT_DISCRIMINATOR);
    data.extend_from_slice(&encoded_args);

    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(accounts.contract, true),
            AccountMeta::new(accounts.owner, true),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
        data,
    })
}

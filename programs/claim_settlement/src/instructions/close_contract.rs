use anchor_lang::prelude::Pubkey;
use anchor_lang::solana_program::instruction::{AccountMeta, Instruction};

use crate::constants::CLOSE_CONTRACT_DISCRIMINATOR;

/**
 * Accounts for `close_contract`
 *
 * Order is part of the program interface:
 * 0. contract - writable, closed to the owner
 * 1. owner - signer + writable, receives the undistributed remainder and rent
 */
#[derive(Debug, Clone, Copy)]
pub struct CloseContractAccounts {
    pub contract: Pubkey,
    pub owner: Pubkey,
}

/// Builds a `close_contract` instruction (no argument payload)
pub fn close_contract(program_id: &Pubkey, accounts: &CloseContractAccounts) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(accounts.contract, false),
            AccountMeta::new(accounts.owner, true),
        ],
        data: CLOSE_CONTRACT_DISCRIMINATOR.to_vec(),
    }
}

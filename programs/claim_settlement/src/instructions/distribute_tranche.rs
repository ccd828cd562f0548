use anchor_lang::prelude::Pubkey;
use anchor_lang::solana_program::instruction::{AccountMeta, Instruction};

use crate::constants::DISTRIBUTE_TRANCHE_DISCRIMINATOR;

/**
 * Accounts for `distribute_tranche`
 *
 * Order is part of the program interface:
 * 0. contract - writable
 * 1. recipient - writable, must be `recipients[paid_tranches]`
 * 2. owner - signer (contract owner or the authorized paymaster)
 *
 * There is no tranche index argument: the program pays the tranche at its
 * own `paid_tranches` counter, so these instructions are strictly sequential.
 */
#[derive(Debug, Clone, Copy)]
pub struct DistributeTrancheAccounts {
    pub contract: Pubkey,
    pub recipient: Pubkey,
    pub owner: Pubkey,
}

/// Builds a `distribute_tranche` instruction (no argument payload)
pub fn distribute_tranche(program_id: &Pubkey, accounts: &DistributeTrancheAccounts) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(accounts.contract, false),
            AccountMeta::new(accounts.recipient, false),
            AccountMeta::new_readonly(accounts.owner, true),
        ],
        data: DISTRIBUTE_TRANCHE_DISCRIMINATOR.to_vec(),
    }
}

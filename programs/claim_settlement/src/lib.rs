/*!
 * Claim Settlement Engine
 *
 * Off-chain settlement for the tranche payment program. A sponsor locks
 * lamports in a payment contract account; the influencer's post is measured
 * and every tranche whose engagement threshold has been cleared is released
 * through the program's `distribute_tranche` instruction.
 *
 * Components:
 * - Account codec: decodes the `PaymentContract` account layout (state module)
 * - Instruction codec: builds create / distribute / close instructions
 * - Tranche evaluator: maps an engagement value onto the threshold ladder
 * - Settlement engine: validates a claim, distributes tranches in order and
 *   persists the claim record with a conditional update
 *
 * Collaborators (ledger, metrics provider, post lookup, content oracle,
 * claim-record store) are injected as traits from the ports module.
 *
 * Workflow:
 * 1. Sponsor creates the payment contract on the ledger
 * 2. Contract metadata is registered (status = pending)
 * 3. Influencer claims with a post reference
 * 4. Qualified tranches are paid one by one, in ledger order
 * 5. Claim record moves to claimed with the count actually distributed
 */

use anchor_lang::prelude::*;

declare_id!("5V9gDAvbC4Hy75b4YvdG9BMNyBrT1m3seMWaypxUxp85");

pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod event;
pub mod instructions;
pub mod ports;
pub mod state;
pub mod telemetry;
pub mod utils;

#[cfg(test)]
pub mod test;

pub use config::EngineConfig;
pub use engine::{ClaimRequest, ClaimSettlementEngine, RegisterRequest, SettlementOutcome};
pub use error::*;
pub use state::*;

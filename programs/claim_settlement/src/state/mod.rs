pub mod claim_state;
pub mod contract_state;

pub use claim_state::*;
pub use contract_state::*;

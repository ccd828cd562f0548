pub mod close_contract;
pub mod create_contract;
pub mod distribute_tranche;

pub use close_contract::*;
pub use create_contract::*;
pub use distribute_tranche::*;

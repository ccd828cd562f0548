pub mod handle;
pub mod tranche;

pub use handle::*;
pub use tranche::*;

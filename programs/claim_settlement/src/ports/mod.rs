pub mod content;
pub mod ledger;
pub mod metrics;
pub mod post;
pub mod store;

pub use content::*;
pub use ledger::*;
pub use metrics::*;
pub use post::*;
pub use store::*;

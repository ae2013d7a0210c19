mod invoice;
mod ledger;
mod money;
mod party;
mod payment;
pub mod period;

pub use invoice::*;
pub use ledger::*;
pub use money::*;
pub use party::*;
pub use payment::*;

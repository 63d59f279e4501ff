mod analytics;
mod error;
mod event;
mod ledger;
mod money;
mod purpose;
mod transaction;

pub use analytics::*;
pub use error::*;
pub use event::*;
pub use ledger::*;
pub use money::*;
pub use purpose::*;
pub use transaction::*;

mod export;
mod import;
mod snapshot;

pub use export::*;
pub use import::*;
pub use snapshot::*;

// Application layer - the session around a single ledger.
// Owns the working snapshot file and builds reports for any front end.

pub mod error;
pub mod reporting;
pub mod service;

pub use error::*;
pub use reporting::*;
pub use service::*;

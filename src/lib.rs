//! Outlay keeps a ledger of capital investment transactions for a single
//! session, with summaries, monthly and per-purpose breakdowns, and JSON/CSV
//! export and import.

pub mod application;
pub mod cli;
pub mod domain;
pub mod io;
pub mod logging;

pub use application::LedgerService;
pub use domain::*;

use thiserror::Error;

use super::{Cents, MAX_AMOUNT_CENTS, Serial};

/// Rejected input to `Ledger::add`. The ledger is left unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Purpose must not be empty")]
    EmptyPurpose,

    #[error("Amount must be greater than zero (got {0} cents)")]
    NonPositiveAmount(Cents),

    #[error("Amount must not exceed {max} cents (got {0} cents)", max = MAX_AMOUNT_CENTS)]
    AmountTooLarge(Cents),

    #[error("No serial numbers left to assign")]
    SerialsExhausted,
}

/// Rejected snapshot content. Nothing from the snapshot is applied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportValidationError {
    #[error("Missing required field '{field}'{}", at(.index))]
    MissingField {
        index: Option<usize>,
        field: &'static str,
    },

    #[error("Invalid value for '{field}'{}: {reason}", at(.index))]
    InvalidField {
        index: Option<usize>,
        field: &'static str,
        reason: String,
    },

    #[error("Serial must be positive (transaction {index})")]
    NonPositiveSerial { index: usize },

    #[error("Duplicate serial #{0}")]
    DuplicateSerial(Serial),

    #[error("Transaction #{serial} has a non-positive amount ({amount_cents} cents)")]
    NonPositiveAmount { serial: Serial, amount_cents: Cents },

    #[error(
        "Transaction #{serial} exceeds the largest allowed amount ({amount_cents} cents)"
    )]
    AmountTooLarge { serial: Serial, amount_cents: Cents },

    #[error("Transaction #{0} has an empty purpose")]
    EmptyPurpose(Serial),

    #[error("Serial counter {counter} must exceed the highest serial ({max_serial})")]
    CounterNotAboveMaxSerial { counter: Serial, max_serial: Serial },
}

fn at(index: &Option<usize>) -> String {
    match index {
        Some(i) => format!(" in transaction {}", i),
        None => String::new(),
    }
}

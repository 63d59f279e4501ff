use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;

use super::{cents_to_units, Cents};

/// Ledger-assigned identifier. Unique within a ledger and never reused.
pub type Serial = u64;

/// A single capital investment payment.
/// Transactions are immutable - corrections are made by deleting and re-adding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub serial: Serial,
    /// Calendar date the money was spent
    pub date: NaiveDate,
    /// Catalog category name or free-text label
    pub purpose: String,
    /// Amount in cents (always positive), written to snapshots in currency units
    #[serde(rename = "amount", serialize_with = "serialize_units")]
    pub amount_cents: Cents,
    /// When the ledger recorded this transaction
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a transaction stamped with the current time.
    /// The serial must come from the ledger's counter.
    pub fn new(
        serial: Serial,
        date: NaiveDate,
        purpose: impl Into<String>,
        amount_cents: Cents,
    ) -> Self {
        Self {
            serial,
            date,
            purpose: purpose.into(),
            amount_cents,
            created_at: Utc::now(),
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Calendar month this transaction falls in.
    pub fn year_month(&self) -> YearMonth {
        YearMonth::from_date(self.date)
    }
}

/// A calendar month, ordered chronologically and displayed as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn serialize_units<S: serde::Serializer>(cents: &Cents, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(cents_to_units(*cents))
}

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::event::{Listener, Listeners};
use super::{
    summarize, totals_by_month, totals_by_purpose, Cents, ImportValidationError, LedgerEvent,
    MonthlyTotal, Purpose, PurposeTotal, Serial, SubscriptionId, Summary, Transaction,
    ValidationError, MAX_AMOUNT_CENTS,
};

/// Serial handed out by a fresh (or cleared) ledger.
pub const FIRST_SERIAL: Serial = 1;

/// Complete, self-describing ledger state used for export and import.
///
/// Snapshots read from outside are built by `io::parse_snapshot`, which
/// validates every field before any typed record exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub transactions: Vec<Transaction>,
    pub serial_counter: Serial,
    /// Present only on exported snapshots
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_date: Option<DateTime<Utc>>,
}

/// The ordered collection of investment transactions plus the serial counter.
///
/// Insertion order is the storage order. Every successful mutation notifies the
/// subscribed listeners; rejected operations leave state and listeners untouched.
#[derive(Debug)]
pub struct Ledger {
    transactions: Vec<Transaction>,
    serial_counter: Serial,
    listeners: Listeners,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self {
            transactions: Vec::new(),
            serial_counter: FIRST_SERIAL,
            listeners: Listeners::default(),
        }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// The serial the next successful `add` will assign.
    pub fn serial_counter(&self) -> Serial {
        self.serial_counter
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn get(&self, serial: Serial) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.serial == serial)
    }

    // ========================
    // Mutations
    // ========================

    /// Record a new transaction and return it.
    /// The purpose is stored trimmed; the amount must be strictly positive
    /// and no larger than `MAX_AMOUNT_CENTS`.
    pub fn add(
        &mut self,
        date: NaiveDate,
        purpose: impl Into<Purpose>,
        amount_cents: Cents,
    ) -> Result<Transaction, ValidationError> {
        let purpose: Purpose = purpose.into();
        let label = purpose.as_str().trim();

        if label.is_empty() {
            warn!("rejected transaction with empty purpose");
            return Err(ValidationError::EmptyPurpose);
        }
        if amount_cents <= 0 {
            warn!(amount_cents, "rejected transaction with non-positive amount");
            return Err(ValidationError::NonPositiveAmount(amount_cents));
        }
        if amount_cents > MAX_AMOUNT_CENTS {
            warn!(amount_cents, "rejected transaction above the amount limit");
            return Err(ValidationError::AmountTooLarge(amount_cents));
        }
        let next_counter = self
            .serial_counter
            .checked_add(1)
            .ok_or(ValidationError::SerialsExhausted)?;

        let transaction = Transaction::new(self.serial_counter, date, label, amount_cents);
        self.transactions.push(transaction.clone());
        self.serial_counter = next_counter;

        info!(
            serial = transaction.serial,
            %date,
            purpose = %transaction.purpose,
            amount_cents,
            "transaction added"
        );
        self.emit(LedgerEvent::Added(transaction.clone()));
        Ok(transaction)
    }

    /// Remove the transaction with the given serial.
    /// Returns whether anything was removed; the counter is never touched.
    pub fn delete(&mut self, serial: Serial) -> bool {
        let Some(position) = self.transactions.iter().position(|t| t.serial == serial) else {
            debug!(serial, "delete matched no transaction");
            return false;
        };

        self.transactions.remove(position);
        info!(serial, "transaction deleted");
        self.emit(LedgerEvent::Deleted(serial));
        true
    }

    /// Atomically overwrite the whole ledger state.
    /// On error nothing is changed.
    pub fn replace_all(
        &mut self,
        transactions: Vec<Transaction>,
        serial_counter: Serial,
    ) -> Result<(), ImportValidationError> {
        validate_state(&transactions, serial_counter)?;

        let count = transactions.len();
        self.transactions = transactions;
        self.serial_counter = serial_counter;

        info!(count, serial_counter, "ledger replaced");
        self.emit(LedgerEvent::Replaced { count });
        Ok(())
    }

    /// Replace the ledger state with the contents of a snapshot.
    pub fn restore(&mut self, snapshot: Snapshot) -> Result<(), ImportValidationError> {
        self.replace_all(snapshot.transactions, snapshot.serial_counter)
    }

    /// Reset to the empty ledger with the counter back at the first serial.
    pub fn clear(&mut self) {
        self.transactions.clear();
        self.serial_counter = FIRST_SERIAL;

        info!("ledger cleared");
        self.emit(LedgerEvent::Cleared);
    }

    /// Capture the current state, stamped with the export time.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            transactions: self.transactions.clone(),
            serial_counter: self.serial_counter,
            export_date: Some(Utc::now()),
        }
    }

    // ========================
    // Queries
    // ========================

    pub fn summary(&self) -> Summary {
        summarize(&self.transactions)
    }

    pub fn totals_by_purpose(&self) -> Vec<PurposeTotal> {
        totals_by_purpose(&self.transactions)
    }

    pub fn totals_by_month(&self) -> Vec<MonthlyTotal> {
        totals_by_month(&self.transactions)
    }

    // ========================
    // Change notification
    // ========================

    /// Register a listener called after every successful mutation.
    pub fn subscribe(&mut self, listener: impl FnMut(&LedgerEvent) + 'static) -> SubscriptionId {
        let boxed: Listener = Box::new(listener);
        self.listeners.add(boxed)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.remove(id)
    }

    fn emit(&mut self, event: LedgerEvent) {
        debug!(listeners = self.listeners.len(), ?event, "notifying listeners");
        self.listeners.notify(&event);
    }
}

/// Check the invariants a complete ledger state must satisfy:
/// positive unique serials, amounts in `1..=MAX_AMOUNT_CENTS`, non-empty
/// purposes, and a counter above every serial present.
pub fn validate_state(
    transactions: &[Transaction],
    serial_counter: Serial,
) -> Result<(), ImportValidationError> {
    let mut seen = HashSet::with_capacity(transactions.len());
    let mut max_serial: Serial = 0;

    for (index, transaction) in transactions.iter().enumerate() {
        if transaction.serial == 0 {
            return Err(ImportValidationError::NonPositiveSerial { index });
        }
        if !seen.insert(transaction.serial) {
            return Err(ImportValidationError::DuplicateSerial(transaction.serial));
        }
        if transaction.amount_cents <= 0 {
            return Err(ImportValidationError::NonPositiveAmount {
                serial: transaction.serial,
                amount_cents: transaction.amount_cents,
            });
        }
        if transaction.amount_cents > MAX_AMOUNT_CENTS {
            return Err(ImportValidationError::AmountTooLarge {
                serial: transaction.serial,
                amount_cents: transaction.amount_cents,
            });
        }
        if transaction.purpose.trim().is_empty() {
            return Err(ImportValidationError::EmptyPurpose(transaction.serial));
        }
        max_serial = max_serial.max(transaction.serial);
    }

    if serial_counter <= max_serial || serial_counter < FIRST_SERIAL {
        return Err(ImportValidationError::CounterNotAboveMaxSerial {
            counter: serial_counter,
            max_serial,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::domain::Category;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn recorded_events(ledger: &mut Ledger) -> Rc<RefCell<Vec<LedgerEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        ledger.subscribe(move |event| sink.borrow_mut().push(event.clone()));
        events
    }

    #[test]
    fn test_new_ledger_is_empty() {
        let ledger = Ledger::new();
        assert!(ledger.is_empty());
        assert_eq!(ledger.serial_counter(), 1);
    }

    #[test]
    fn test_add_assigns_serial_and_increments_counter() {
        let mut ledger = Ledger::new();

        let first = ledger
            .add(date("2024-01-05"), Category::KitchenEquipment, 5_000_000)
            .unwrap();
        let second = ledger.add(date("2024-01-06"), "Signage", 120_000).unwrap();

        assert_eq!(first.serial, 1);
        assert_eq!(first.purpose, "Kitchen Equipment");
        assert_eq!(second.serial, 2);
        assert_eq!(ledger.serial_counter(), 3);
        assert_eq!(ledger.transactions(), &[first, second]);
    }

    #[test]
    fn test_add_trims_purpose() {
        let mut ledger = Ledger::new();
        let tx = ledger.add(date("2024-01-05"), "  Signage  ", 100).unwrap();
        assert_eq!(tx.purpose, "Signage");
    }

    #[test]
    fn test_add_rejects_invalid_input_without_mutation() {
        let mut ledger = Ledger::new();
        let events = recorded_events(&mut ledger);

        assert_eq!(
            ledger.add(date("2024-01-05"), "   ", 100),
            Err(ValidationError::EmptyPurpose)
        );
        assert_eq!(
            ledger.add(date("2024-01-05"), "Insurance", 0),
            Err(ValidationError::NonPositiveAmount(0))
        );
        assert_eq!(
            ledger.add(date("2024-01-05"), "Insurance", -500),
            Err(ValidationError::NonPositiveAmount(-500))
        );
        assert_eq!(
            ledger.add(date("2024-01-05"), "Insurance", MAX_AMOUNT_CENTS + 1),
            Err(ValidationError::AmountTooLarge(MAX_AMOUNT_CENTS + 1))
        );

        assert!(ledger.is_empty());
        assert_eq!(ledger.serial_counter(), 1);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_delete_is_idempotent_and_keeps_counter() {
        let mut ledger = Ledger::new();
        ledger.add(date("2024-01-05"), "Insurance", 100).unwrap();
        ledger.add(date("2024-01-06"), "Legal Fees", 200).unwrap();

        assert!(ledger.delete(1));
        assert!(!ledger.delete(1));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.serial_counter(), 3);

        // Serials are never reused after a delete
        let tx = ledger.add(date("2024-01-07"), "Insurance", 300).unwrap();
        assert_eq!(tx.serial, 3);
    }

    #[test]
    fn test_clear_resets_counter() {
        let mut ledger = Ledger::new();
        ledger.add(date("2024-01-05"), "Insurance", 100).unwrap();
        ledger.clear();

        assert!(ledger.is_empty());
        assert_eq!(ledger.serial_counter(), FIRST_SERIAL);
    }

    #[test]
    fn test_replace_all_rejects_duplicate_serials() {
        let mut ledger = Ledger::new();
        ledger.add(date("2024-01-05"), "Insurance", 100).unwrap();
        let before = ledger.transactions().to_vec();

        let duplicated = vec![
            Transaction::new(7, date("2024-03-01"), "Insurance", 100),
            Transaction::new(7, date("2024-03-02"), "Legal Fees", 200),
        ];

        assert_eq!(
            ledger.replace_all(duplicated, 8),
            Err(ImportValidationError::DuplicateSerial(7))
        );
        assert_eq!(ledger.transactions(), before.as_slice());
        assert_eq!(ledger.serial_counter(), 2);
    }

    #[test]
    fn test_replace_all_rejects_counter_not_above_max_serial() {
        let mut ledger = Ledger::new();
        let transactions = vec![Transaction::new(5, date("2024-03-01"), "Insurance", 100)];

        assert_eq!(
            ledger.replace_all(transactions.clone(), 3),
            Err(ImportValidationError::CounterNotAboveMaxSerial {
                counter: 3,
                max_serial: 5
            })
        );
        assert_eq!(
            ledger.replace_all(transactions, 5),
            Err(ImportValidationError::CounterNotAboveMaxSerial {
                counter: 5,
                max_serial: 5
            })
        );
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_replace_all_rejects_bad_records() {
        let mut ledger = Ledger::new();

        let zero_amount = vec![Transaction::new(1, date("2024-03-01"), "Insurance", 0)];
        assert!(matches!(
            ledger.replace_all(zero_amount, 2),
            Err(ImportValidationError::NonPositiveAmount { serial: 1, .. })
        ));

        let blank_purpose = vec![Transaction::new(1, date("2024-03-01"), " ", 100)];
        assert_eq!(
            ledger.replace_all(blank_purpose, 2),
            Err(ImportValidationError::EmptyPurpose(1))
        );

        let zero_serial = vec![Transaction::new(0, date("2024-03-01"), "Insurance", 100)];
        assert_eq!(
            ledger.replace_all(zero_serial, 2),
            Err(ImportValidationError::NonPositiveSerial { index: 0 })
        );

        assert_eq!(
            ledger.replace_all(Vec::new(), 0),
            Err(ImportValidationError::CounterNotAboveMaxSerial {
                counter: 0,
                max_serial: 0
            })
        );
    }

    #[test]
    fn test_add_accepts_the_largest_amount() {
        let mut ledger = Ledger::new();
        ledger
            .add(date("2024-01-05"), "Insurance", MAX_AMOUNT_CENTS)
            .unwrap();
        ledger
            .add(date("2024-01-06"), "Insurance", MAX_AMOUNT_CENTS)
            .unwrap();

        assert_eq!(ledger.summary().total_cents, 2 * MAX_AMOUNT_CENTS);
    }

    #[test]
    fn test_replace_all_rejects_oversized_amount() {
        let mut ledger = Ledger::new();
        ledger.add(date("2024-01-05"), "Insurance", 100).unwrap();
        let before = ledger.transactions().to_vec();

        let oversized = vec![
            Transaction::new(1, date("2024-03-01"), "Insurance", 100),
            Transaction::new(2, date("2024-03-02"), "Insurance", i64::MAX),
        ];
        assert_eq!(
            ledger.replace_all(oversized, 3),
            Err(ImportValidationError::AmountTooLarge {
                serial: 2,
                amount_cents: i64::MAX
            })
        );
        assert_eq!(ledger.transactions(), before.as_slice());
        assert_eq!(ledger.serial_counter(), 2);
    }

    #[test]
    fn test_replace_all_keeps_gapped_counter() {
        let mut ledger = Ledger::new();
        let transactions = vec![
            Transaction::new(2, date("2024-03-01"), "Insurance", 100),
            Transaction::new(9, date("2024-03-02"), "Legal Fees", 200),
        ];

        ledger.replace_all(transactions, 12).unwrap();

        assert_eq!(ledger.len(), 2);
        let tx = ledger.add(date("2024-03-03"), "Insurance", 50).unwrap();
        assert_eq!(tx.serial, 12);
    }

    #[test]
    fn test_snapshot_restores_exact_state() {
        let mut ledger = Ledger::new();
        ledger.add(date("2024-01-05"), "Insurance", 100).unwrap();
        ledger.add(date("2024-01-06"), "Legal Fees", 200).unwrap();
        ledger.delete(1);

        let snapshot = ledger.snapshot();
        assert!(snapshot.export_date.is_some());

        let mut restored = Ledger::new();
        restored.restore(snapshot).unwrap();

        assert_eq!(restored.transactions(), ledger.transactions());
        assert_eq!(restored.serial_counter(), ledger.serial_counter());
    }

    #[test]
    fn test_listeners_see_each_successful_mutation() {
        let mut ledger = Ledger::new();
        let events = recorded_events(&mut ledger);

        let added = ledger.add(date("2024-01-05"), "Insurance", 100).unwrap();
        ledger.delete(99);
        ledger.delete(added.serial);
        ledger
            .replace_all(vec![Transaction::new(1, date("2024-01-05"), "Insurance", 100)], 1)
            .unwrap_err();
        let snapshot = Snapshot {
            transactions: vec![added.clone()],
            serial_counter: 4,
            export_date: None,
        };
        ledger.restore(snapshot).unwrap();
        ledger.clear();

        assert_eq!(
            *events.borrow(),
            vec![
                LedgerEvent::Added(added),
                LedgerEvent::Deleted(1),
                LedgerEvent::Replaced { count: 1 },
                LedgerEvent::Cleared,
            ]
        );
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let mut ledger = Ledger::new();
        let count = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&count);
        let id = ledger.subscribe(move |_| *counter.borrow_mut() += 1);

        ledger.add(date("2024-01-05"), "Insurance", 100).unwrap();
        assert!(ledger.unsubscribe(id));
        assert!(!ledger.unsubscribe(id));
        ledger.add(date("2024-01-06"), "Insurance", 100).unwrap();

        assert_eq!(*count.borrow(), 1);
    }
}

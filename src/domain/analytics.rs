use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use super::{Cents, Transaction, YearMonth};

/// Headline figures over a set of transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_cents: Cents,
    pub count: usize,
    /// Rounded to the nearest cent; 0 when there are no transactions
    pub average_cents: Cents,
    /// `None` when there are no transactions
    pub first_date: Option<NaiveDate>,
    /// `None` when there are no transactions
    pub last_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurposeTotal {
    pub purpose: String,
    pub total_cents: Cents,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyTotal {
    pub month: YearMonth,
    pub total_cents: Cents,
    pub count: usize,
}

/// Compute total, count, average and date range.
pub fn summarize(transactions: &[Transaction]) -> Summary {
    let total_cents = total(transactions.iter().map(|t| t.amount_cents));
    let count = transactions.len();

    Summary {
        total_cents,
        count,
        average_cents: average(total_cents, count),
        first_date: transactions.iter().map(|t| t.date).min(),
        last_date: transactions.iter().map(|t| t.date).max(),
    }
}

/// Totals per exact purpose string, largest first.
/// Equal totals keep the order in which their purpose first appeared.
pub fn totals_by_purpose(transactions: &[Transaction]) -> Vec<PurposeTotal> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Cents, usize)> = Vec::new();

    for transaction in transactions {
        let purpose = transaction.purpose.as_str();
        match index.get(purpose) {
            Some(&i) => {
                groups[i].1 = groups[i].1.saturating_add(transaction.amount_cents);
                groups[i].2 += 1;
            }
            None => {
                index.insert(purpose, groups.len());
                groups.push((purpose, transaction.amount_cents, 1));
            }
        }
    }

    // sort_by is stable, so ties stay in first-seen order
    groups.sort_by(|a, b| b.1.cmp(&a.1));

    let grand_total = total(groups.iter().map(|g| g.1));
    groups
        .into_iter()
        .map(|(purpose, total_cents, count)| PurposeTotal {
            purpose: purpose.to_string(),
            total_cents,
            count,
            percentage: percentage(total_cents, grand_total),
        })
        .collect()
}

/// Totals per calendar month, oldest first.
pub fn totals_by_month(transactions: &[Transaction]) -> Vec<MonthlyTotal> {
    let mut months: BTreeMap<YearMonth, (Cents, usize)> = BTreeMap::new();

    for transaction in transactions {
        let entry = months.entry(transaction.year_month()).or_insert((0, 0));
        entry.0 = entry.0.saturating_add(transaction.amount_cents);
        entry.1 += 1;
    }

    months
        .into_iter()
        .map(|(month, (total_cents, count))| MonthlyTotal {
            month,
            total_cents,
            count,
        })
        .collect()
}

/// Display order: newest date first, insertion order among equal dates.
pub fn sorted_by_date_desc(transactions: &[Transaction]) -> Vec<&Transaction> {
    let mut sorted: Vec<&Transaction> = transactions.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    sorted
}

/// Sum that pins at `Cents::MAX` rather than wrapping.
fn total(amounts: impl Iterator<Item = Cents>) -> Cents {
    amounts.fold(0, Cents::saturating_add)
}

fn average(total: Cents, count: usize) -> Cents {
    if count == 0 {
        return 0;
    }
    let count = count as i128;
    let total = total as i128;
    // Round half away from zero
    let rounded = if total >= 0 {
        (total * 2 + count) / (count * 2)
    } else {
        (total * 2 - count) / (count * 2)
    };
    rounded as Cents
}

fn percentage(part: Cents, whole: Cents) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

use anyhow::Result;
use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook};
use std::fmt;
use std::io::Write;

use crate::domain::{
    Ledger, Snapshot, cents_to_units, format_cents, format_cents_grouped, sorted_by_date_desc,
};
use crate::io::write_snapshot;

/// Placeholder shown when a value cannot be derived from an empty ledger.
pub const NOT_AVAILABLE: &str = "N/A";

const TRANSACTION_HEADERS: [&str; 4] = ["serial", "date", "purpose", "amount"];

/// What an export writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Full ledger snapshot
    Json,
    /// Transactions, newest first
    Csv,
    /// Metric/Value headline figures
    Summary,
    /// Workbook with a Transactions and a Summary sheet
    Xlsx,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [Self::Json, Self::Csv, Self::Summary, Self::Xlsx];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Summary => "summary",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|format| format.as_str().eq_ignore_ascii_case(s.trim()))
    }

    /// Whether the output is binary and must go to a file
    pub fn is_binary(&self) -> bool {
        matches!(self, ExportFormat::Xlsx)
    }

    /// Suggested file name for an export made on `date`.
    pub fn file_name(&self, date: NaiveDate) -> String {
        let (stem, extension) = match self {
            ExportFormat::Json => ("ledger_backup", "json"),
            ExportFormat::Csv => ("investments", "csv"),
            ExportFormat::Summary => ("investments_summary", "csv"),
            ExportFormat::Xlsx => ("investments", "xlsx"),
        };
        format!("{}_{}.{}", stem, date.format("%Y-%m-%d"), extension)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exporter for converting ledger data to files
pub struct Exporter<'a> {
    ledger: &'a Ledger,
}

impl<'a> Exporter<'a> {
    pub fn new(ledger: &'a Ledger) -> Self {
        Self { ledger }
    }

    /// Export transactions to CSV, newest first
    pub fn export_transactions_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(TRANSACTION_HEADERS)?;

        let mut count = 0;
        for transaction in sorted_by_date_desc(self.ledger.transactions()) {
            csv_writer.write_record([
                transaction.serial.to_string(),
                transaction.date.format("%Y-%m-%d").to_string(),
                transaction.purpose.clone(),
                format_cents(transaction.amount_cents),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export the headline figures as Metric/Value rows
    pub fn export_summary_csv<W: Write>(&self, writer: W, currency: &str) -> Result<usize> {
        let rows = self.summary_rows(currency);
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["Metric", "Value"])?;
        for (metric, value) in &rows {
            csv_writer.write_record([*metric, value.as_str()])?;
        }

        csv_writer.flush()?;
        Ok(rows.len())
    }

    /// Export an Excel workbook: transactions newest first on the
    /// "Transactions" sheet, Metric/Value rows on the "Summary" sheet.
    pub fn export_xlsx<W: Write>(&self, mut writer: W, currency: &str) -> Result<usize> {
        let mut workbook = Workbook::new();
        let bold = Format::new().set_bold();
        let money = Format::new().set_num_format("#,##0.00");

        let mut count = 0;
        {
            let sheet = workbook.add_worksheet();
            sheet.set_name("Transactions")?;
            for (col, header) in TRANSACTION_HEADERS.iter().enumerate() {
                sheet.write_string_with_format(0, col as u16, *header, &bold)?;
            }

            for (i, transaction) in sorted_by_date_desc(self.ledger.transactions())
                .into_iter()
                .enumerate()
            {
                let row = i as u32 + 1;
                let date = transaction.date.format("%Y-%m-%d").to_string();
                sheet.write_number(row, 0, transaction.serial as f64)?;
                sheet.write_string(row, 1, date.as_str())?;
                sheet.write_string(row, 2, transaction.purpose.as_str())?;
                sheet.write_number_with_format(
                    row,
                    3,
                    cents_to_units(transaction.amount_cents),
                    &money,
                )?;
                count += 1;
            }
        }

        {
            let sheet = workbook.add_worksheet();
            sheet.set_name("Summary")?;
            sheet.write_string_with_format(0, 0, "Metric", &bold)?;
            sheet.write_string_with_format(0, 1, "Value", &bold)?;
            for (i, (metric, value)) in self.summary_rows(currency).iter().enumerate() {
                let row = i as u32 + 1;
                sheet.write_string(row, 0, *metric)?;
                sheet.write_string(row, 1, value.as_str())?;
            }
        }

        let buffer = workbook.save_to_buffer()?;
        writer.write_all(&buffer)?;
        writer.flush()?;
        Ok(count)
    }

    /// Export the full ledger state as a JSON snapshot
    pub fn export_snapshot_json<W: Write>(&self, writer: W) -> Result<Snapshot> {
        let snapshot = self.ledger.snapshot();
        write_snapshot(&snapshot, writer)?;
        Ok(snapshot)
    }

    fn summary_rows(&self, currency: &str) -> [(&'static str, String); 4] {
        let summary = self.ledger.summary();

        let date_range = match (summary.first_date, summary.last_date) {
            (Some(first), Some(last)) => format!(
                "{} to {}",
                first.format("%Y-%m-%d"),
                last.format("%Y-%m-%d")
            ),
            _ => NOT_AVAILABLE.to_string(),
        };

        [
            (
                "Total Investment",
                format!("{}{}", currency, format_cents_grouped(summary.total_cents)),
            ),
            ("Total Transactions", summary.count.to_string()),
            (
                "Average Amount",
                format!("{}{}", currency, format_cents_grouped(summary.average_cents)),
            ),
            ("Date Range", date_range),
        ]
    }
}

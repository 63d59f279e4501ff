use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};

use crate::application::LedgerService;
use crate::domain::{format_cents, format_cents_grouped, parse_cents, Category, Purpose, Serial};
use crate::io::{ExportFormat, ImportOptions, NOT_AVAILABLE};

/// Outlay - Investment Ledger
#[derive(Parser)]
#[command(name = "outlay")]
#[command(about = "Track capital investment transactions with summaries and exports")]
#[command(version)]
pub struct Cli {
    /// Ledger snapshot file path
    #[arg(short, long, env = "OUTLAY_LEDGER", default_value = "outlay.json", global = true)]
    pub ledger: PathBuf,

    /// Currency symbol shown in front of amounts
    #[arg(long, env = "OUTLAY_CURRENCY", default_value = "₹", global = true)]
    pub currency: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new, empty ledger file
    Init,

    /// Record an investment transaction
    Add {
        /// Amount (e.g., "50000", "1,250.50")
        amount: String,

        /// Purpose from the catalog (see `outlay categories`)
        #[arg(short, long, required_unless_present = "custom", conflicts_with = "custom")]
        purpose: Option<String>,

        /// Free-text purpose instead of a catalog entry
        #[arg(long)]
        custom: Option<String>,

        /// Date of the transaction (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Delete a transaction by serial number
    Delete {
        /// Serial number of the transaction
        serial: Serial,
    },

    /// List transactions, newest first
    List {
        /// Maximum number of transactions to show
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show total, count, average and last transaction date
    Summary {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Investment breakdowns
    #[command(subcommand)]
    Report(ReportCommands),

    /// List the catalog of purposes
    Categories,

    /// Export ledger data
    Export {
        /// What to export: json (full snapshot), csv (transactions), summary, xlsx
        export_type: String,

        /// Output file (defaults to stdout)
        #[arg(short, long, conflicts_with = "dated")]
        output: Option<PathBuf>,

        /// Write to a dated file name in the current directory
        #[arg(long)]
        dated: bool,
    },

    /// Replace the ledger with a JSON snapshot
    Import {
        /// Snapshot file (defaults to stdin)
        input: Option<PathBuf>,

        /// Only validate the snapshot, do not import
        #[arg(long)]
        validate: bool,
    },

    /// Delete every transaction and restart serial numbers
    Clear {
        /// Confirm; this cannot be undone
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Totals per purpose, largest first
    Purpose {
        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Totals per month, oldest first
    Monthly {
        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let currency = self.currency.as_str();

        match self.command {
            Commands::Init => {
                LedgerService::init(&self.ledger)?;
                println!("Ledger initialized: {}", self.ledger.display());
            }

            Commands::Add {
                amount,
                purpose,
                custom,
                date,
            } => {
                let mut service = LedgerService::open(&self.ledger)?;
                let amount_cents = parse_cents(&amount)
                    .context("Invalid amount format. Use '50000' or '1,250.50'")?;
                let purpose = resolve_purpose(purpose, custom)?;
                let date = match date {
                    Some(date_str) => parse_date(&date_str)?,
                    None => Local::now().date_naive(),
                };

                let transaction = service.add_transaction(date, purpose, amount_cents)?;
                service.save()?;

                println!(
                    "Transaction added successfully: #{} {} {} {}{}",
                    transaction.serial,
                    transaction.date.format("%Y-%m-%d"),
                    transaction.purpose,
                    currency,
                    format_cents_grouped(transaction.amount_cents)
                );
            }

            Commands::Delete { serial } => {
                let mut service = LedgerService::open(&self.ledger)?;
                if service.delete_transaction(serial) {
                    service.save()?;
                    println!("Transaction #{} deleted successfully", serial);
                } else {
                    println!("No transaction #{} found", serial);
                }
            }

            Commands::List { limit } => {
                let service = LedgerService::open(&self.ledger)?;
                run_list_command(&service, limit, currency);
            }

            Commands::Summary { format } => {
                let service = LedgerService::open(&self.ledger)?;
                run_summary_command(&service, &format, currency)?;
            }

            Commands::Report(report_cmd) => {
                let service = LedgerService::open(&self.ledger)?;
                run_report_command(&service, report_cmd, currency)?;
            }

            Commands::Categories => {
                for (i, category) in Category::ALL.iter().enumerate() {
                    println!("{:>2}. {}", i + 1, category);
                }
            }

            Commands::Export {
                export_type,
                output,
                dated,
            } => {
                // Resolve the format before any output file is created
                let format = ExportFormat::from_str(&export_type)
                    .with_context(|| invalid_export_type(&export_type))?;
                let output = if dated {
                    Some(PathBuf::from(format.file_name(Local::now().date_naive())))
                } else {
                    output
                };
                if format.is_binary() && output.is_none() {
                    anyhow::bail!("The {} export is binary. Use --output PATH or --dated", format);
                }

                let service = LedgerService::open(&self.ledger)?;
                run_export_command(&service, format, output, currency)?;
            }

            Commands::Import { input, validate } => {
                let mut service = LedgerService::open(&self.ledger)?;
                run_import_command(&mut service, input, validate)?;
            }

            Commands::Clear { yes } => {
                if !yes {
                    anyhow::bail!("Clearing removes every transaction. Re-run with --yes to confirm");
                }
                let mut service = LedgerService::open(&self.ledger)?;
                service.clear();
                service.save()?;
                println!("All data cleared successfully");
            }
        }

        Ok(())
    }
}

fn resolve_purpose(purpose: Option<String>, custom: Option<String>) -> Result<Purpose> {
    match (purpose, custom) {
        (_, Some(text)) => Ok(Purpose::Custom(text)),
        (Some(name), None) => Category::from_str(&name).map(Purpose::Catalog).with_context(|| {
            format!(
                "Unknown purpose '{}'. Run `outlay categories` or use --custom",
                name
            )
        }),
        (None, None) => anyhow::bail!("A purpose is required (--purpose or --custom)"),
    }
}

fn run_list_command(service: &LedgerService, limit: Option<usize>, currency: &str) {
    let transactions = service.list_transactions(limit);
    if transactions.is_empty() {
        println!("No transactions yet. Start with `outlay add`.");
        return;
    }

    println!(
        "{:<6} {:<12} {:<30} {:>16}",
        "SERIAL", "DATE", "PURPOSE", "AMOUNT"
    );
    println!("{}", "-".repeat(67));
    for transaction in transactions {
        println!(
            "{:<6} {:<12} {:<30} {:>16}",
            format!("#{}", transaction.serial),
            transaction.date.format("%Y-%m-%d"),
            truncate(&transaction.purpose, 30),
            format!(
                "{}{}",
                currency,
                format_cents_grouped(transaction.amount_cents)
            )
        );
    }
}

fn run_summary_command(service: &LedgerService, format: &str, currency: &str) -> Result<()> {
    let summary = service.summary();

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&summary)?),
        "table" => {
            let last_date = summary
                .last_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string());

            println!(
                "Total Invested:      {}{}",
                currency,
                format_cents_grouped(summary.total_cents)
            );
            println!("Total Transactions:  {}", summary.count);
            println!("Last Transaction:    {}", last_date);
            println!(
                "Average Amount:      {}{}",
                currency,
                format_cents_grouped(summary.average_cents)
            );
        }
        _ => anyhow::bail!("Invalid format '{}'. Valid formats: table, json", format),
    }

    Ok(())
}

fn run_report_command(service: &LedgerService, cmd: ReportCommands, currency: &str) -> Result<()> {
    match cmd {
        ReportCommands::Purpose { format } => {
            let totals = service.ledger().totals_by_purpose();

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&totals)?),
                "csv" => {
                    let mut writer = csv::Writer::from_writer(std::io::stdout());
                    writer.write_record(["purpose", "total", "count", "percentage"])?;
                    for t in &totals {
                        writer.write_record([
                            t.purpose.clone(),
                            format_cents(t.total_cents),
                            t.count.to_string(),
                            format!("{:.2}", t.percentage),
                        ])?;
                    }
                    writer.flush()?;
                }
                "table" => {
                    if totals.is_empty() {
                        println!("No transactions yet.");
                        return Ok(());
                    }
                    println!("Investment by Purpose");
                    println!();
                    println!(
                        "{:<30} {:>16} {:>6} {:>8}",
                        "PURPOSE", "TOTAL", "COUNT", "SHARE"
                    );
                    println!("{}", "-".repeat(63));
                    for t in &totals {
                        println!(
                            "{:<30} {:>16} {:>6} {:>7.1}%",
                            truncate(&t.purpose, 30),
                            format!("{}{}", currency, format_cents_grouped(t.total_cents)),
                            t.count,
                            t.percentage
                        );
                    }
                }
                _ => anyhow::bail!("Invalid format '{}'. Valid formats: table, json, csv", format),
            }
        }

        ReportCommands::Monthly { format } => {
            let totals = service.ledger().totals_by_month();

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&totals)?),
                "csv" => {
                    let mut writer = csv::Writer::from_writer(std::io::stdout());
                    writer.write_record(["month", "total", "count"])?;
                    for t in &totals {
                        writer.write_record([
                            t.month.to_string(),
                            format_cents(t.total_cents),
                            t.count.to_string(),
                        ])?;
                    }
                    writer.flush()?;
                }
                "table" => {
                    if totals.is_empty() {
                        println!("No transactions yet.");
                        return Ok(());
                    }
                    println!("Monthly Investment Trend");
                    println!();
                    println!("{:<8} {:>16} {:>6}", "MONTH", "TOTAL", "COUNT");
                    println!("{}", "-".repeat(32));
                    for t in &totals {
                        println!(
                            "{:<8} {:>16} {:>6}",
                            t.month.to_string(),
                            format!("{}{}", currency, format_cents_grouped(t.total_cents)),
                            t.count
                        );
                    }
                }
                _ => anyhow::bail!("Invalid format '{}'. Valid formats: table, json, csv", format),
            }
        }
    }

    Ok(())
}

fn run_export_command(
    service: &LedgerService,
    format: ExportFormat,
    output: Option<PathBuf>,
    currency: &str,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{stdout, Write};

    let exporter = Exporter::new(service.ledger());

    // Determine output writer
    let writer: Box<dyn Write> = match &output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match format {
        ExportFormat::Json => {
            let snapshot = exporter.export_snapshot_json(writer)?;
            if let Some(path) = &output {
                eprintln!(
                    "Exported {} transactions to {}",
                    snapshot.transactions.len(),
                    path.display()
                );
            }
        }
        ExportFormat::Csv => {
            let count = exporter.export_transactions_csv(writer)?;
            if let Some(path) = &output {
                eprintln!("Exported {} transactions to {}", count, path.display());
            }
        }
        ExportFormat::Summary => {
            exporter.export_summary_csv(writer, currency)?;
            if let Some(path) = &output {
                eprintln!("Exported summary to {}", path.display());
            }
        }
        ExportFormat::Xlsx => {
            let count = exporter.export_xlsx(writer, currency)?;
            if let Some(path) = &output {
                eprintln!("Exported {} transactions to {}", count, path.display());
            }
        }
    }

    Ok(())
}

fn run_import_command(
    service: &mut LedgerService,
    input: Option<PathBuf>,
    validate: bool,
) -> Result<()> {
    use std::fs::File;
    use std::io::{stdin, BufReader, Read};

    // Determine input reader
    let reader: Box<dyn Read> = match &input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open input file: {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(stdin()),
    };

    let options = ImportOptions {
        validate_only: validate,
    };
    let result = service
        .import_snapshot(reader, options)
        .context("Error importing data")?;

    if result.applied {
        service.save()?;
        println!(
            "Successfully imported {} transactions!",
            result.imported
        );
    } else {
        println!("Validation successful");
        println!("  Transactions:   {}", result.imported);
        println!("  Serial counter: {}", result.serial_counter);
    }

    Ok(())
}

fn invalid_export_type(export_type: &str) -> String {
    let valid: Vec<&str> = ExportFormat::ALL.iter().map(|f| f.as_str()).collect();
    format!(
        "Invalid export type '{}'. Valid types: {}",
        export_type,
        valid.join(", ")
    )
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .with_context(|| format!("Invalid date format '{}'. Use YYYY-MM-DD", date_str))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_purpose() {
        assert_eq!(
            resolve_purpose(Some("rent & deposit".into()), None).unwrap(),
            Purpose::Catalog(Category::RentAndDeposit)
        );
        assert_eq!(
            resolve_purpose(None, Some("Signage".into())).unwrap(),
            Purpose::Custom("Signage".into())
        );
        assert!(resolve_purpose(Some("Groceries".into()), None).is_err());
    }

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate("Insurance", 30), "Insurance");
        assert_eq!(truncate("Marketing & Advertising", 10), "Marketi...");
        assert_eq!(truncate("₹₹₹₹₹₹", 5), "₹₹...");
    }

    #[test]
    fn test_cli_parses_add_command() {
        let cli = Cli::try_parse_from([
            "outlay",
            "--ledger",
            "books.json",
            "add",
            "50000",
            "--purpose",
            "Kitchen Equipment",
            "--date",
            "2024-01-05",
        ])
        .unwrap();

        assert_eq!(cli.ledger, PathBuf::from("books.json"));
        assert!(matches!(
            cli.command,
            Commands::Add { ref purpose, custom: None, .. } if purpose.as_deref() == Some("Kitchen Equipment")
        ));
    }

    #[test]
    fn test_ledger_flag_is_accepted_after_the_subcommand() {
        let cli = Cli::try_parse_from([
            "outlay",
            "add",
            "100",
            "--purpose",
            "Insurance",
            "--ledger",
            "x.json",
        ])
        .unwrap();

        assert_eq!(cli.ledger, PathBuf::from("x.json"));
    }

    fn ledger_in(dir: &tempfile::TempDir) -> String {
        let path = dir.path().join("ledger.json");
        LedgerService::init(&path).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_unknown_export_type_leaves_output_file_alone() {
        let dir = tempfile::TempDir::new().unwrap();
        let ledger = ledger_in(&dir);
        let backup = dir.path().join("backup.json");
        std::fs::write(&backup, "{\"keep\": true}").unwrap();

        let cli = Cli::try_parse_from([
            "outlay",
            "export",
            "pdf",
            "-o",
            backup.to_str().unwrap(),
            "--ledger",
            ledger.as_str(),
        ])
        .unwrap();
        let err = cli.run().unwrap_err();

        assert!(err.to_string().contains("Invalid export type 'pdf'"));
        assert_eq!(std::fs::read_to_string(&backup).unwrap(), "{\"keep\": true}");
    }

    #[test]
    fn test_xlsx_export_needs_a_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let ledger = ledger_in(&dir);

        let cli = Cli::try_parse_from(["outlay", "export", "xlsx", "--ledger", ledger.as_str()]).unwrap();
        assert!(cli.run().is_err());

        let workbook = dir.path().join("books.xlsx");
        let cli = Cli::try_parse_from([
            "outlay",
            "--ledger",
            ledger.as_str(),
            "export",
            "xlsx",
            "--output",
            workbook.to_str().unwrap(),
        ])
        .unwrap();
        cli.run().unwrap();

        assert!(std::fs::read(&workbook).unwrap().starts_with(b"PK"));
    }

    #[test]
    fn test_cli_requires_a_purpose() {
        assert!(Cli::try_parse_from(["outlay", "add", "100"]).is_err());
        assert!(
            Cli::try_parse_from([
                "outlay", "add", "100", "--purpose", "Insurance", "--custom", "Other"
            ])
            .is_err()
        );
    }
}

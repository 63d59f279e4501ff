// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::NaiveDate;
use outlay::application::LedgerService;
use outlay::domain::{Category, Ledger};
use tempfile::TempDir;

/// Helper to create a service backed by a fresh ledger file in a temp dir
pub fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("ledger.json");
    let service = LedgerService::init(&path)?;
    Ok((service, temp_dir))
}

/// Helper to parse a date string into a NaiveDate
pub fn parse_date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

/// Test fixture: the opening-month purchases of a new branch
pub struct OpeningPurchases;

impl OpeningPurchases {
    /// Kitchen equipment twice in January, the deposit in February (95,000 total)
    pub fn record(ledger: &mut Ledger) -> Result<()> {
        ledger.add(parse_date("2024-01-05"), Category::KitchenEquipment, 5_000_000)?;
        ledger.add(parse_date("2024-01-20"), Category::KitchenEquipment, 1_500_000)?;
        ledger.add(parse_date("2024-02-01"), Category::RentAndDeposit, 3_000_000)?;
        Ok(())
    }

    pub fn record_with_service(service: &mut LedgerService) -> Result<()> {
        service.add_transaction(parse_date("2024-01-05"), Category::KitchenEquipment, 5_000_000)?;
        service.add_transaction(parse_date("2024-01-20"), Category::KitchenEquipment, 1_500_000)?;
        service.add_transaction(parse_date("2024-02-01"), Category::RentAndDeposit, 3_000_000)?;
        Ok(())
    }
}

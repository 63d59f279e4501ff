use std::cell::Cell;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

use crate::domain::{
    sorted_by_date_desc, Cents, Ledger, Purpose, Serial, Snapshot, Summary, Transaction,
};
use crate::io::{write_snapshot, ImportOptions, ImportResult, Importer};

use super::{AppError, InvestmentReport};

const TMP_SUFFIX: &str = "tmp";

/// Application service owning one ledger session and its working snapshot file.
/// This is the primary interface for any client (CLI, TUI, etc.).
pub struct LedgerService {
    ledger: Ledger,
    path: PathBuf,
    dirty: Rc<Cell<bool>>,
}

impl LedgerService {
    /// Start a session on an in-memory ledger that will be saved to `path`.
    pub fn new(mut ledger: Ledger, path: impl Into<PathBuf>) -> Self {
        let dirty = Rc::new(Cell::new(false));
        let flag = Rc::clone(&dirty);
        ledger.subscribe(move |event| {
            debug!(?event, "ledger changed");
            flag.set(true);
        });

        Self {
            ledger,
            path: path.into(),
            dirty,
        }
    }

    /// Create a new, empty ledger file at the given path.
    pub fn init(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        if path.exists() {
            return Err(AppError::LedgerExists(path.to_path_buf()));
        }

        let mut service = Self::new(Ledger::new(), path);
        service.write()?;
        info!(path = %path.display(), "ledger initialized");
        Ok(service)
    }

    /// Load an existing ledger file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AppError::LedgerNotFound(path.to_path_buf()));
        }

        let reader = BufReader::new(File::open(path)?);
        let mut ledger = Ledger::new();
        Importer::new(&mut ledger).import_snapshot_json(reader, ImportOptions::default())?;
        debug!(path = %path.display(), transactions = ledger.len(), "ledger loaded");

        Ok(Self::new(ledger, path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// True when the ledger changed since it was loaded or last saved.
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    // ========================
    // Transaction operations
    // ========================

    /// Record a new transaction.
    pub fn add_transaction(
        &mut self,
        date: NaiveDate,
        purpose: impl Into<Purpose>,
        amount_cents: Cents,
    ) -> Result<Transaction, AppError> {
        Ok(self.ledger.add(date, purpose, amount_cents)?)
    }

    /// Delete a transaction; returns whether it existed.
    pub fn delete_transaction(&mut self, serial: Serial) -> bool {
        self.ledger.delete(serial)
    }

    /// Drop every transaction and restart serials.
    pub fn clear(&mut self) {
        self.ledger.clear();
    }

    /// Replace the ledger with the contents of a snapshot.
    pub fn import_snapshot<R: Read>(
        &mut self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult, AppError> {
        Ok(Importer::new(&mut self.ledger).import_snapshot_json(reader, options)?)
    }

    /// Transactions in display order (newest first), optionally limited.
    pub fn list_transactions(&self, limit: Option<usize>) -> Vec<&Transaction> {
        let mut sorted = sorted_by_date_desc(self.ledger.transactions());
        if let Some(limit) = limit {
            sorted.truncate(limit);
        }
        sorted
    }

    // ========================
    // Reporting
    // ========================

    pub fn summary(&self) -> Summary {
        self.ledger.summary()
    }

    pub fn report(&self) -> InvestmentReport {
        InvestmentReport {
            generated_at: Utc::now(),
            summary: self.ledger.summary(),
            by_purpose: self.ledger.totals_by_purpose(),
            by_month: self.ledger.totals_by_month(),
        }
    }

    // ========================
    // Persistence of the working file
    // ========================

    /// Write the ledger back to its file if anything changed.
    /// Returns whether the file was written.
    pub fn save(&mut self) -> Result<bool, AppError> {
        if !self.is_dirty() {
            debug!(path = %self.path.display(), "ledger unchanged, skipping save");
            return Ok(false);
        }
        self.write()?;
        Ok(true)
    }

    fn write(&mut self) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = tmp_path(&self.path);
        let written = write_synced(&tmp, &self.ledger.snapshot())
            .and_then(|()| fs::rename(&tmp, &self.path).map_err(AppError::from));
        if let Err(err) = written {
            let _ = fs::remove_file(&tmp);
            return Err(err);
        }

        self.dirty.set(false);
        debug!(path = %self.path.display(), "ledger saved");
        Ok(())
    }
}

fn write_synced(path: &Path, snapshot: &Snapshot) -> Result<(), AppError> {
    let mut file = File::create(path)?;
    write_snapshot(snapshot, &mut file)?;
    file.sync_all()?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

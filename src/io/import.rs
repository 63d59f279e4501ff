use std::io::Read;

use tracing::{info, warn};

use crate::domain::{Ledger, Serial};
use crate::io::{SnapshotError, read_snapshot};

/// Result of an import operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportResult {
    pub imported: usize,
    pub serial_counter: Serial,
    /// False when the snapshot was only validated
    pub applied: bool,
}

/// Options for import operations
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub validate_only: bool,
}

/// Importer for replacing ledger state from a snapshot
pub struct Importer<'a> {
    ledger: &'a mut Ledger,
}

impl<'a> Importer<'a> {
    pub fn new(ledger: &'a mut Ledger) -> Self {
        Self { ledger }
    }

    /// Import a full JSON snapshot. The ledger is replaced only if the whole
    /// snapshot parses and validates.
    pub fn import_snapshot_json<R: Read>(
        &mut self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult, SnapshotError> {
        let snapshot = read_snapshot(reader).inspect_err(|e| {
            warn!(error = %e, "snapshot rejected");
        })?;

        let imported = snapshot.transactions.len();
        let serial_counter = snapshot.serial_counter;

        if options.validate_only {
            info!(imported, serial_counter, "snapshot validated");
            return Ok(ImportResult {
                imported,
                serial_counter,
                applied: false,
            });
        }

        self.ledger.restore(snapshot)?;

        Ok(ImportResult {
            imported,
            serial_counter,
            applied: true,
        })
    }
}

use std::io::{Read, Write};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::{
    units_to_cents, validate_state, ImportValidationError, Serial, Snapshot, Transaction,
};

/// Snapshot bytes that are not structurally a JSON object.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Snapshot must be a JSON object, found {0}")]
    NotAnObject(&'static str),
}

/// Any reason a snapshot could not be turned into ledger state.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Invalid(#[from] ImportValidationError),
}

/// Parse and validate snapshot bytes.
pub fn parse_snapshot(bytes: &[u8]) -> Result<Snapshot, SnapshotError> {
    let value: Value = serde_json::from_slice(bytes).map_err(ParseError::from)?;
    snapshot_from_value(value)
}

/// Parse and validate a snapshot from a reader.
pub fn read_snapshot<R: Read>(reader: R) -> Result<Snapshot, SnapshotError> {
    let value: Value = serde_json::from_reader(reader).map_err(ParseError::from)?;
    snapshot_from_value(value)
}

/// Write a snapshot as pretty-printed JSON.
pub fn write_snapshot<W: Write>(snapshot: &Snapshot, mut writer: W) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(&mut writer, snapshot)?;
    writer.write_all(b"\n").map_err(serde_json::Error::io)?;
    writer.flush().map_err(serde_json::Error::io)
}

/// Build a snapshot from loosely-typed JSON, checking field presence, type and
/// range before constructing any typed transaction.
pub fn snapshot_from_value(value: Value) -> Result<Snapshot, SnapshotError> {
    let root = match value {
        Value::Object(root) => root,
        other => return Err(ParseError::NotAnObject(kind(&other)).into()),
    };

    let entries = match root.get("transactions") {
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            return Err(invalid(None, "transactions", expected("an array", other)).into());
        }
        None => return Err(missing(None, "transactions").into()),
    };

    let transactions = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| transaction_from_value(index, entry))
        .collect::<Result<Vec<_>, _>>()?;

    let serial_counter = match root.get("serial_counter") {
        Some(value) => counter_field(value)?,
        None => return Err(missing(None, "serial_counter").into()),
    };

    let export_date = match root.get("export_date") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(
            parse_timestamp(s)
                .ok_or_else(|| invalid(None, "export_date", format!("not a timestamp: {}", s)))?,
        ),
        Some(other) => {
            return Err(invalid(None, "export_date", expected("a timestamp string", other)).into());
        }
    };

    validate_state(&transactions, serial_counter)?;

    Ok(Snapshot {
        transactions,
        serial_counter,
        export_date,
    })
}

fn transaction_from_value(
    index: usize,
    value: &Value,
) -> Result<Transaction, ImportValidationError> {
    let Value::Object(fields) = value else {
        return Err(invalid(Some(index), "transaction", expected("an object", value)));
    };
    let at = Some(index);

    let serial = match required(fields, at, "serial")? {
        Value::Number(n) => match (n.as_u64(), n.as_i64()) {
            (Some(0), _) | (None, Some(_)) => {
                return Err(ImportValidationError::NonPositiveSerial { index });
            }
            (Some(serial), _) => serial,
            _ => return Err(invalid(at, "serial", format!("not an integer: {}", n))),
        },
        other => return Err(invalid(at, "serial", expected("an integer", other))),
    };

    let date = match required(fields, at, "date")? {
        Value::String(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| invalid(at, "date", format!("expected YYYY-MM-DD, got {}", s)))?,
        other => return Err(invalid(at, "date", expected("a date string", other))),
    };

    let purpose = match required(fields, at, "purpose")? {
        Value::String(s) => s.clone(),
        other => return Err(invalid(at, "purpose", expected("a string", other))),
    };

    let amount_cents = match required(fields, at, "amount")? {
        Value::Number(n) => n
            .as_f64()
            .and_then(units_to_cents)
            .ok_or_else(|| invalid(at, "amount", format!("out of range: {}", n)))?,
        other => return Err(invalid(at, "amount", expected("a number", other))),
    };

    let created_at = match required(fields, at, "created_at")? {
        Value::String(s) => parse_timestamp(s)
            .ok_or_else(|| invalid(at, "created_at", format!("not a timestamp: {}", s)))?,
        other => return Err(invalid(at, "created_at", expected("a timestamp string", other))),
    };

    Ok(Transaction::new(serial, date, purpose, amount_cents).with_created_at(created_at))
}

fn counter_field(value: &Value) -> Result<Serial, ImportValidationError> {
    match value {
        Value::Number(n) => n.as_u64().ok_or_else(|| {
            invalid(
                None,
                "serial_counter",
                format!("expected a non-negative integer, got {}", n),
            )
        }),
        other => Err(invalid(None, "serial_counter", expected("an integer", other))),
    }
}

fn required<'a>(
    fields: &'a Map<String, Value>,
    index: Option<usize>,
    field: &'static str,
) -> Result<&'a Value, ImportValidationError> {
    match fields.get(field) {
        Some(Value::Null) | None => Err(missing(index, field)),
        Some(value) => Ok(value),
    }
}

/// Accepts RFC 3339 and zone-less ISO 8601 timestamps (read as UTC).
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn missing(index: Option<usize>, field: &'static str) -> ImportValidationError {
    ImportValidationError::MissingField { index, field }
}

fn invalid(
    index: Option<usize>,
    field: &'static str,
    reason: impl Into<String>,
) -> ImportValidationError {
    ImportValidationError::InvalidField {
        index,
        field,
        reason: reason.into(),
    }
}

fn expected(what: &str, found: &Value) -> String {
    format!("expected {}, found {}", what, kind(found))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

//! Spreadsheet import reconciliation.
//!
//! Rows arrive already parsed (the spreadsheet reader is an external
//! collaborator). Each row is validated on its own; invalid rows become
//! row-level errors and the rest of the batch still merges. Rows are merged
//! strictly in input order, so when an id repeats the later row wins.
//!
//! - Constants for accepted file names and date formats.
//! - Types for candidate rows, row errors, and import history records.
//! - Pure functions: row validation, merge planning, outcome derivation.
//! - [`reconcile_import`], the mutating entry point.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::access::{require_capability, Capability};
use crate::clock::Clock;
use crate::device::{BillingStatus, FiscalDevice};
use crate::error::CoreError;
use crate::store::{DeviceStore, ImportHistoryStore, OperatorStore};
use crate::types::{CalendarDate, DbId, Timestamp};
use crate::user::User;

// ── Constants ────────────────────────────────────────────────────────

/// Spreadsheet extensions accepted by the upload widget.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["xlsx", "xls"];

/// Date formats accepted in the expiry column, tried in order.
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y"];

/// Default number of history records returned.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

// ── Types ────────────────────────────────────────────────────────────

/// One candidate row as produced by the spreadsheet reader.
///
/// Cells are kept as raw JSON values: the reader emits whatever type the
/// spreadsheet cell had. Presence and type of each column are checked by
/// [`validate_row`], so a bad cell becomes a row error instead of failing
/// the whole batch at deserialisation time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportRow {
    pub device_id: Option<Value>,
    pub name: Option<Value>,
    pub location: Option<Value>,
    pub operator_id: Option<Value>,
    pub expiry_date: Option<Value>,
    pub billing_status: Option<Value>,
}

/// A row that passed field validation but is not yet resolved against
/// existing devices and operators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRow {
    pub device_id: String,
    pub name: String,
    pub location: Option<String>,
    pub operator_id: Option<DbId>,
    pub expiry_date: CalendarDate,
    pub billing_status: Option<BillingStatus>,
}

/// Whether a merged row created a device or updated one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportAction {
    Create,
    Update,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowErrorKind {
    /// Missing required field or unparseable value.
    Validation,
    /// The row points at an operator that does not exist.
    Reference,
    /// Storage failed at or before this row; the row was not merged.
    Interrupted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    /// 1-based position of the row in the batch.
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    pub kind: RowErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportOutcome {
    Success,
    SuccessWithWarnings,
    Failure,
}

impl ImportOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::SuccessWithWarnings => "success_with_warnings",
            Self::Failure => "failure",
        }
    }
}

impl fmt::Display for ImportOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportOutcome {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "success_with_warnings" => Ok(Self::SuccessWithWarnings),
            "failure" => Ok(Self::Failure),
            other => Err(CoreError::Validation(format!(
                "Unknown import outcome '{other}'"
            ))),
        }
    }
}

/// Import history entry before it has been stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewImportRecord {
    pub filename: String,
    pub imported_at: Timestamp,
    pub actor_id: DbId,
    pub actor_name: String,
    pub rows_attempted: usize,
    pub rows_merged: usize,
    pub outcome: ImportOutcome,
    pub errors: Vec<RowError>,
}

/// A stored import history entry. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRecord {
    pub id: DbId,
    pub filename: String,
    pub imported_at: Timestamp,
    pub actor_id: DbId,
    pub actor_name: String,
    pub rows_attempted: usize,
    pub rows_merged: usize,
    pub outcome: ImportOutcome,
    pub errors: Vec<RowError>,
}

/// Result of [`reconcile_import`]: the stored history record plus how many
/// merges created versus updated a device.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub record: ImportRecord,
    pub created: usize,
    pub updated: usize,
}

// ── Pure Functions ───────────────────────────────────────────────────

/// `true` if the file name carries a spreadsheet extension
/// (case-insensitive).
pub fn is_supported_filename(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .is_some_and(|(stem, ext)| {
            !stem.is_empty() && SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str())
        })
}

/// Parse a date in any of [`DATE_FORMATS`].
pub fn parse_import_date(value: &str) -> Option<CalendarDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// Check required fields, cell types, and parse typed columns.
pub fn validate_row(row: &ImportRow) -> Result<ValidRow, String> {
    let device_id = required(cell_text(row.device_id.as_ref(), "device_id")?, "device_id")?;
    let name = required(cell_text(row.name.as_ref(), "name")?, "name")?;
    let raw_date = required(
        cell_text(row.expiry_date.as_ref(), "expiry_date")?,
        "expiry_date",
    )?;
    let expiry_date = parse_import_date(&raw_date)
        .ok_or_else(|| format!("expiry_date '{raw_date}' is not a valid date"))?;
    let billing_status = match cell_text(row.billing_status.as_ref(), "billing_status")? {
        Some(raw) => Some(raw.parse::<BillingStatus>().map_err(|_| {
            format!("billing_status '{raw}' is not one of billed, pending, not_required")
        })?),
        None => None,
    };

    Ok(ValidRow {
        device_id,
        name,
        location: cell_text(row.location.as_ref(), "location")?,
        operator_id: cell_id(row.operator_id.as_ref(), "operator_id")?,
        expiry_date,
        billing_status,
    })
}

/// Decide create vs update and build the device to store.
///
/// For updates, columns left empty keep their stored values. New devices
/// must name an operator; billing status defaults to pending.
pub fn resolve_row(
    row: ValidRow,
    existing: Option<&FiscalDevice>,
    operators: &HashSet<DbId>,
) -> Result<(ImportAction, FiscalDevice), (RowErrorKind, String)> {
    let operator_id = match (row.operator_id, existing) {
        (Some(id), _) => id,
        (None, Some(device)) => device.operator_id,
        (None, None) => {
            return Err((
                RowErrorKind::Validation,
                "operator_id is required for a new device".to_string(),
            ))
        }
    };
    if !operators.contains(&operator_id) {
        return Err((
            RowErrorKind::Reference,
            format!("operator {operator_id} does not exist"),
        ));
    }

    let (action, location, billing_status) = match existing {
        Some(device) => (
            ImportAction::Update,
            row.location.unwrap_or_else(|| device.location.clone()),
            row.billing_status.unwrap_or(device.billing_status),
        ),
        None => (
            ImportAction::Create,
            row.location.unwrap_or_default(),
            row.billing_status.unwrap_or_default(),
        ),
    };

    Ok((
        action,
        FiscalDevice {
            device_id: row.device_id,
            name: row.name,
            location,
            operator_id,
            expiry_date: row.expiry_date,
            billing_status,
        },
    ))
}

/// Outcome from merged and failed row counts.
pub fn derive_outcome(merged: usize, failed: usize) -> ImportOutcome {
    match (merged, failed) {
        (_, 0) => ImportOutcome::Success,
        (0, _) => ImportOutcome::Failure,
        _ => ImportOutcome::SuccessWithWarnings,
    }
}

// ── Reconciliation ───────────────────────────────────────────────────

/// Validate and merge a parsed batch, then append one history record.
///
/// The capability check runs before any store access. A storage failure
/// mid-batch does not roll back rows already merged: the failing row and
/// every row after it are reported as interrupted.
pub async fn reconcile_import<S>(
    store: &S,
    actor: &User,
    filename: &str,
    rows: &[ImportRow],
    clock: &dyn Clock,
) -> Result<ImportReport, CoreError>
where
    S: DeviceStore + OperatorStore + ImportHistoryStore + ?Sized,
{
    require_capability(actor.role, Capability::ImportData)?;

    if !is_supported_filename(filename) {
        return Err(CoreError::Validation(format!(
            "'{filename}' is not a spreadsheet (.xlsx or .xls)"
        )));
    }
    if rows.is_empty() {
        return Err(CoreError::Validation("Import contains no rows".into()));
    }

    // Indexes built once per batch.
    let mut devices: HashMap<String, FiscalDevice> = store
        .list_devices()
        .await?
        .into_iter()
        .map(|d| (d.device_id.clone(), d))
        .collect();
    let operators: HashSet<DbId> = store
        .list_operators()
        .await?
        .into_iter()
        .map(|o| o.id)
        .collect();

    let mut errors: Vec<RowError> = Vec::new();
    let (mut created, mut updated) = (0usize, 0usize);

    for (index, row) in rows.iter().enumerate() {
        let row_number = index + 1;

        let valid = match validate_row(row) {
            Ok(valid) => valid,
            Err(message) => {
                tracing::warn!(row = row_number, %message, "Import row rejected");
                errors.push(RowError {
                    row: row_number,
                    device_id: row_device_id(row),
                    kind: RowErrorKind::Validation,
                    message,
                });
                continue;
            }
        };

        let device_id = valid.device_id.clone();
        let (action, device) = match resolve_row(valid, devices.get(&device_id), &operators) {
            Ok(resolved) => resolved,
            Err((kind, message)) => {
                tracing::warn!(row = row_number, %device_id, %message, "Import row rejected");
                errors.push(RowError {
                    row: row_number,
                    device_id: Some(device_id),
                    kind,
                    message,
                });
                continue;
            }
        };

        match store.save_device(&device).await {
            Ok(saved) => {
                match action {
                    ImportAction::Create => created += 1,
                    ImportAction::Update => updated += 1,
                }
                devices.insert(saved.device_id.clone(), saved);
            }
            Err(e) => {
                tracing::error!(row = row_number, %device_id, error = %e, "Import interrupted");
                errors.push(RowError {
                    row: row_number,
                    device_id: Some(device_id),
                    kind: RowErrorKind::Interrupted,
                    message: format!("storage failure: {e}"),
                });
                errors.extend(rows.iter().enumerate().skip(index + 1).map(|(i, r)| RowError {
                    row: i + 1,
                    device_id: row_device_id(r),
                    kind: RowErrorKind::Interrupted,
                    message: format!("not processed: import interrupted at row {row_number}"),
                }));
                break;
            }
        }
    }

    let merged = created + updated;
    let outcome = derive_outcome(merged, errors.len());
    let record = store
        .append_import_record(&NewImportRecord {
            filename: filename.to_string(),
            imported_at: clock.now(),
            actor_id: actor.id,
            actor_name: actor.name.clone(),
            rows_attempted: rows.len(),
            rows_merged: merged,
            outcome,
            errors,
        })
        .await?;

    tracing::info!(
        import_id = record.id,
        filename = %record.filename,
        actor_id = actor.id,
        rows = rows.len(),
        merged,
        created,
        updated,
        outcome = %outcome,
        "Import reconciled"
    );

    Ok(ImportReport {
        record,
        created,
        updated,
    })
}

// ── Private helpers ──────────────────────────────────────────────────

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn required(value: Option<String>, field: &str) -> Result<String, String> {
    value.ok_or_else(|| format!("{field} is required"))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "text",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Text content of a cell. Numeric cells are accepted as written, since
/// spreadsheet readers hand serial numbers over as numbers. Blank is `None`.
fn cell_text(cell: Option<&Value>, field: &str) -> Result<Option<String>, String> {
    match cell {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(non_blank(text)),
        Some(Value::Number(number)) => Ok(Some(number.to_string())),
        Some(other) => Err(format!("{field} must be text, got {}", json_kind(other))),
    }
}

/// Numeric id in a cell, given either as a whole number or as digits.
fn cell_id(cell: Option<&Value>, field: &str) -> Result<Option<DbId>, String> {
    match cell {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => number
            .as_i64()
            .map(Some)
            .ok_or_else(|| format!("{field} '{number}' is not a whole number")),
        Some(Value::String(text)) => match non_blank(text) {
            None => Ok(None),
            Some(digits) => digits
                .parse()
                .map(Some)
                .map_err(|_| format!("{field} '{digits}' is not a numeric id")),
        },
        Some(other) => Err(format!(
            "{field} must be a numeric id, got {}",
            json_kind(other)
        )),
    }
}

/// Best-effort id for error reports, even when the row is otherwise bad.
fn row_device_id(row: &ImportRow) -> Option<String> {
    cell_text(row.device_id.as_ref(), "device_id").ok().flatten()
}

// ── Tests ────────────────────────────────────────────────────────────

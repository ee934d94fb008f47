//! `import_history` row model.
//!
//! Row-level errors are stored as a JSONB array of
//! [`fiscal_core::importer::RowError`].

use sqlx::FromRow;

use fiscal_core::error::CoreError;
use fiscal_core::importer::ImportRecord;
use fiscal_core::types::{DbId, Timestamp};

#[derive(Debug, Clone, FromRow)]
pub struct ImportRecordRow {
    pub id: DbId,
    pub filename: String,
    pub imported_at: Timestamp,
    pub actor_id: DbId,
    pub actor_name: String,
    pub rows_attempted: i32,
    pub rows_merged: i32,
    pub outcome: String,
    pub errors: serde_json::Value,
    pub created_at: Timestamp,
}

impl TryFrom<ImportRecordRow> for ImportRecord {
    type Error = CoreError;

    fn try_from(row: ImportRecordRow) -> Result<Self, Self::Error> {
        let errors = serde_json::from_value(row.errors).map_err(|e| {
            CoreError::Internal(format!("Malformed errors for import {}: {e}", row.id))
        })?;
        Ok(ImportRecord {
            id: row.id,
            filename: row.filename,
            imported_at: row.imported_at,
            actor_id: row.actor_id,
            actor_name: row.actor_name,
            rows_attempted: count(row.rows_attempted),
            rows_merged: count(row.rows_merged),
            outcome: row.outcome.parse()?,
            errors,
        })
    }
}

/// Counts are constrained non-negative by the table.
fn count(value: i32) -> usize {
    usize::try_from(value).unwrap_or(0)
}

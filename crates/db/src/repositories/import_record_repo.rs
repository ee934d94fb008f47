//! Repository for the append-only `import_history` table.

use sqlx::PgPool;

use fiscal_core::importer::NewImportRecord;

use crate::models::import_record::ImportRecordRow;

const COLUMNS: &str = "id, filename, imported_at, actor_id, actor_name, rows_attempted, \
                       rows_merged, outcome, errors, created_at";

pub struct ImportRecordRepo;

impl ImportRecordRepo {
    pub async fn create(
        pool: &PgPool,
        record: &NewImportRecord,
    ) -> Result<ImportRecordRow, sqlx::Error> {
        let errors = serde_json::to_value(&record.errors)
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
        let query = format!(
            "INSERT INTO import_history
                (filename, imported_at, actor_id, actor_name, rows_attempted, rows_merged,
                 outcome, errors)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ImportRecordRow>(&query)
            .bind(&record.filename)
            .bind(record.imported_at)
            .bind(record.actor_id)
            .bind(&record.actor_name)
            .bind(to_i32(record.rows_attempted))
            .bind(to_i32(record.rows_merged))
            .bind(record.outcome.as_str())
            .bind(errors)
            .fetch_one(pool)
            .await
    }

    /// Most recent imports first.
    pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<ImportRecordRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM import_history
             ORDER BY imported_at DESC, id DESC
             LIMIT $1"
        );
        sqlx::query_as::<_, ImportRecordRow>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}

fn to_i32(count: usize) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

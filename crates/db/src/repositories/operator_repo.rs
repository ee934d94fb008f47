//! Repository for the `operators` table.

use sqlx::PgPool;

use fiscal_core::operator::{NewOperator, Operator};
use fiscal_core::types::DbId;

use crate::models::operator::OperatorRow;

const COLUMNS: &str = "id, name, contract_number, contract_expiry_date, created_at, updated_at";

pub struct OperatorRepo;

impl OperatorRepo {
    pub async fn create(pool: &PgPool, input: &NewOperator) -> Result<OperatorRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO operators (name, contract_number, contract_expiry_date)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OperatorRow>(&query)
            .bind(&input.name)
            .bind(&input.contract_number)
            .bind(input.contract_expiry_date)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<OperatorRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM operators WHERE id = $1");
        sqlx::query_as::<_, OperatorRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All operators, soonest contract expiry first.
    pub async fn list(pool: &PgPool) -> Result<Vec<OperatorRow>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM operators ORDER BY contract_expiry_date ASC, id ASC");
        sqlx::query_as::<_, OperatorRow>(&query).fetch_all(pool).await
    }

    /// Overwrite the mutable columns. Returns `None` if the row is gone.
    pub async fn update(
        pool: &PgPool,
        operator: &Operator,
    ) -> Result<Option<OperatorRow>, sqlx::Error> {
        let query = format!(
            "UPDATE operators SET
                name = $2,
                contract_number = $3,
                contract_expiry_date = $4,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OperatorRow>(&query)
            .bind(operator.id)
            .bind(&operator.name)
            .bind(&operator.contract_number)
            .bind(operator.contract_expiry_date)
            .fetch_optional(pool)
            .await
    }

    /// Fails with a foreign key violation while devices reference the row.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM operators WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

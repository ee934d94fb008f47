//! `operators` row model.

use sqlx::FromRow;

use fiscal_core::operator::Operator;
use fiscal_core::types::{CalendarDate, DbId, Timestamp};

#[derive(Debug, Clone, FromRow)]
pub struct OperatorRow {
    pub id: DbId,
    pub name: String,
    pub contract_number: String,
    pub contract_expiry_date: CalendarDate,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<OperatorRow> for Operator {
    fn from(row: OperatorRow) -> Self {
        Operator {
            id: row.id,
            name: row.name,
            contract_number: row.contract_number,
            contract_expiry_date: row.contract_expiry_date,
        }
    }
}

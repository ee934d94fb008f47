//! `users` row model.

use sqlx::FromRow;

use fiscal_core::error::CoreError;
use fiscal_core::types::{DbId, Timestamp};
use fiscal_core::user::User;

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub role: String,
    pub last_active: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<UserRow> for User {
    type Error = CoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            role: row.role.parse()?,
            id: row.id,
            name: row.name,
            email: row.email,
            last_active: row.last_active,
        })
    }
}

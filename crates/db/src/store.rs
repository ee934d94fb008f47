//! `fiscal_core` store traits backed by PostgreSQL.

use async_trait::async_trait;
use sqlx::PgPool;

use fiscal_core::device::FiscalDevice;
use fiscal_core::error::CoreError;
use fiscal_core::importer::{ImportRecord, NewImportRecord};
use fiscal_core::operator::{NewOperator, Operator};
use fiscal_core::store::{DeviceStore, ImportHistoryStore, OperatorStore, UserStore};
use fiscal_core::types::{DbId, Timestamp};
use fiscal_core::user::{NewUser, User};

use crate::repositories::{DeviceRepo, ImportRecordRepo, OperatorRepo, UserRepo};

/// PostgreSQL error codes with a domain meaning.
const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const CHECK_VIOLATION: &str = "23514";

#[derive(Debug, Clone)]
pub struct PgRegistryStore {
    pool: PgPool,
}

impl PgRegistryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Translate a driver error into the core taxonomy.
///
/// Constraint violations become `Conflict` or `Validation`; anything else
/// is `Internal` and logged here, since the message will be sanitised
/// further up.
pub fn map_db_error(err: sqlx::Error) -> CoreError {
    if let Some(db_err) = err.as_database_error() {
        let constraint = db_err.constraint().unwrap_or("unknown");
        match db_err.code().as_deref() {
            Some(UNIQUE_VIOLATION) => {
                return CoreError::Conflict(format!("Duplicate value violates '{constraint}'"))
            }
            Some(FOREIGN_KEY_VIOLATION) => {
                return CoreError::Conflict(format!("Record is referenced via '{constraint}'"))
            }
            Some(CHECK_VIOLATION) => {
                return CoreError::Validation(format!("Value violates '{constraint}'"))
            }
            _ => {}
        }
    }
    tracing::error!(error = %err, "Database error");
    CoreError::Internal(err.to_string())
}

#[async_trait]
impl DeviceStore for PgRegistryStore {
    async fn list_devices(&self) -> Result<Vec<FiscalDevice>, CoreError> {
        DeviceRepo::list(&self.pool)
            .await
            .map_err(map_db_error)?
            .into_iter()
            .map(FiscalDevice::try_from)
            .collect()
    }

    async fn find_device(&self, device_id: &str) -> Result<Option<FiscalDevice>, CoreError> {
        DeviceRepo::find_by_id(&self.pool, device_id)
            .await
            .map_err(map_db_error)?
            .map(FiscalDevice::try_from)
            .transpose()
    }

    async fn save_device(&self, device: &FiscalDevice) -> Result<FiscalDevice, CoreError> {
        DeviceRepo::upsert(&self.pool, device)
            .await
            .map_err(map_db_error)?
            .try_into()
    }

    async fn delete_device(&self, device_id: &str) -> Result<bool, CoreError> {
        DeviceRepo::delete(&self.pool, device_id)
            .await
            .map_err(map_db_error)
    }
}

#[async_trait]
impl OperatorStore for PgRegistryStore {
    async fn list_operators(&self) -> Result<Vec<Operator>, CoreError> {
        Ok(OperatorRepo::list(&self.pool)
            .await
            .map_err(map_db_error)?
            .into_iter()
            .map(Operator::from)
            .collect())
    }

    async fn find_operator(&self, id: DbId) -> Result<Option<Operator>, CoreError> {
        Ok(OperatorRepo::find_by_id(&self.pool, id)
            .await
            .map_err(map_db_error)?
            .map(Operator::from))
    }

    async fn insert_operator(&self, input: &NewOperator) -> Result<Operator, CoreError> {
        Ok(OperatorRepo::create(&self.pool, input)
            .await
            .map_err(map_db_error)?
            .into())
    }

    async fn save_operator(&self, operator: &Operator) -> Result<Option<Operator>, CoreError> {
        Ok(OperatorRepo::update(&self.pool, operator)
            .await
            .map_err(map_db_error)?
            .map(Operator::from))
    }

    async fn delete_operator(&self, id: DbId) -> Result<bool, CoreError> {
        OperatorRepo::delete(&self.pool, id)
            .await
            .map_err(map_db_error)
    }
}

#[async_trait]
impl UserStore for PgRegistryStore {
    async fn list_users(&self) -> Result<Vec<User>, CoreError> {
        UserRepo::list(&self.pool)
            .await
            .map_err(map_db_error)?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    async fn find_user(&self, id: DbId) -> Result<Option<User>, CoreError> {
        UserRepo::find_by_id(&self.pool, id)
            .await
            .map_err(map_db_error)?
            .map(User::try_from)
            .transpose()
    }

    async fn insert_user(&self, input: &NewUser) -> Result<User, CoreError> {
        UserRepo::create(&self.pool, input)
            .await
            .map_err(map_db_error)?
            .try_into()
    }

    async fn save_user(&self, user: &User) -> Result<Option<User>, CoreError> {
        UserRepo::update(&self.pool, user)
            .await
            .map_err(map_db_error)?
            .map(User::try_from)
            .transpose()
    }

    async fn delete_user(&self, id: DbId) -> Result<bool, CoreError> {
        UserRepo::delete(&self.pool, id)
            .await
            .map_err(map_db_error)
    }

    async fn record_activity(&self, id: DbId, at: Timestamp) -> Result<(), CoreError> {
        UserRepo::touch_last_active(&self.pool, id, at)
            .await
            .map_err(map_db_error)
    }
}

#[async_trait]
impl ImportHistoryStore for PgRegistryStore {
    async fn append_import_record(
        &self,
        record: &NewImportRecord,
    ) -> Result<ImportRecord, CoreError> {
        ImportRecordRepo::create(&self.pool, record)
            .await
            .map_err(map_db_error)?
            .try_into()
    }

    async fn list_import_history(&self, limit: usize) -> Result<Vec<ImportRecord>, CoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        ImportRecordRepo::list_recent(&self.pool, limit)
            .await
            .map_err(map_db_error)?
            .into_iter()
            .map(ImportRecord::try_from)
            .collect()
    }
}

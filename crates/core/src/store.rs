//! Record-store traits.
//!
//! The core never performs I/O itself; it talks to whatever owns the records
//! through these traits. `fiscal-db` implements them over PostgreSQL and
//! [`crate::memory_store::InMemoryStore`] implements them in memory.
//!
//! Implementations are responsible for serialising concurrent writes.

use async_trait::async_trait;

use crate::device::FiscalDevice;
use crate::error::CoreError;
use crate::importer::{ImportRecord, NewImportRecord};
use crate::operator::{NewOperator, Operator};
use crate::types::{DbId, Timestamp};
use crate::user::{NewUser, User};

#[async_trait]
pub trait DeviceStore: Send + Sync {
    async fn list_devices(&self) -> Result<Vec<FiscalDevice>, CoreError>;

    async fn find_device(&self, device_id: &str) -> Result<Option<FiscalDevice>, CoreError>;

    /// Insert or overwrite the device keyed by `device_id`.
    async fn save_device(&self, device: &FiscalDevice) -> Result<FiscalDevice, CoreError>;

    /// Returns `false` if no device had that id.
    async fn delete_device(&self, device_id: &str) -> Result<bool, CoreError>;
}

#[async_trait]
pub trait OperatorStore: Send + Sync {
    async fn list_operators(&self) -> Result<Vec<Operator>, CoreError>;

    async fn find_operator(&self, id: DbId) -> Result<Option<Operator>, CoreError>;

    async fn insert_operator(&self, input: &NewOperator) -> Result<Operator, CoreError>;

    /// Overwrite an existing operator. Returns `None` if it does not exist.
    async fn save_operator(&self, operator: &Operator) -> Result<Option<Operator>, CoreError>;

    async fn delete_operator(&self, id: DbId) -> Result<bool, CoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn list_users(&self) -> Result<Vec<User>, CoreError>;

    async fn find_user(&self, id: DbId) -> Result<Option<User>, CoreError>;

    async fn insert_user(&self, input: &NewUser) -> Result<User, CoreError>;

    /// Overwrite an existing user. Returns `None` if it does not exist.
    async fn save_user(&self, user: &User) -> Result<Option<User>, CoreError>;

    async fn delete_user(&self, id: DbId) -> Result<bool, CoreError>;

    /// Stamp `last_active` after a request the user made has succeeded.
    async fn record_activity(&self, id: DbId, at: Timestamp) -> Result<(), CoreError>;
}

/// Append-only import history.
#[async_trait]
pub trait ImportHistoryStore: Send + Sync {
    async fn append_import_record(
        &self,
        record: &NewImportRecord,
    ) -> Result<ImportRecord, CoreError>;

    /// Most recent records first.
    async fn list_import_history(&self, limit: usize) -> Result<Vec<ImportRecord>, CoreError>;
}

/// Everything the registry operations need.
pub trait RegistryStore: DeviceStore + OperatorStore + UserStore + ImportHistoryStore {}

impl<T> RegistryStore for T where T: DeviceStore + OperatorStore + UserStore + ImportHistoryStore {}

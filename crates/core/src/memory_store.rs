//! In-process record store.
//!
//! Backs unit tests and embedding callers that do not need persistence.
//! A single mutex serialises every write, which is the mutual exclusion
//! the registry expects from its store.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::device::FiscalDevice;
use crate::error::CoreError;
use crate::importer::{ImportRecord, NewImportRecord};
use crate::operator::{NewOperator, Operator};
use crate::store::{DeviceStore, ImportHistoryStore, OperatorStore, UserStore};
use crate::types::{DbId, Timestamp};
use crate::user::{NewUser, User};

#[derive(Debug, Default)]
struct Tables {
    devices: BTreeMap<String, FiscalDevice>,
    operators: BTreeMap<DbId, Operator>,
    users: BTreeMap<DbId, User>,
    imports: Vec<ImportRecord>,
    next_id: DbId,
}

impl Tables {
    fn next_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with the given operators, ids kept as-is.
    pub fn with_operators(operators: Vec<Operator>) -> Self {
        let store = Self::new();
        {
            let mut tables = store.lock();
            for operator in operators {
                tables.next_id = tables.next_id.max(operator.id);
                tables.operators.insert(operator.id, operator);
            }
        }
        store
    }

    /// Add users with their ids kept as-is.
    pub fn seed_users(&self, users: Vec<User>) {
        let mut tables = self.lock();
        for user in users {
            tables.next_id = tables.next_id.max(user.id);
            tables.users.insert(user.id, user);
        }
    }

    /// Add devices without going through validation.
    pub fn seed_devices(&self, devices: Vec<FiscalDevice>) {
        let mut tables = self.lock();
        for device in devices {
            tables.devices.insert(device.device_id.clone(), device);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        // A panic while holding the lock cannot leave a table half-written:
        // every mutation below is a single map operation.
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl DeviceStore for InMemoryStore {
    async fn list_devices(&self) -> Result<Vec<FiscalDevice>, CoreError> {
        Ok(self.lock().devices.values().cloned().collect())
    }

    async fn find_device(&self, device_id: &str) -> Result<Option<FiscalDevice>, CoreError> {
        Ok(self.lock().devices.get(device_id).cloned())
    }

    async fn save_device(&self, device: &FiscalDevice) -> Result<FiscalDevice, CoreError> {
        self.lock()
            .devices
            .insert(device.device_id.clone(), device.clone());
        Ok(device.clone())
    }

    async fn delete_device(&self, device_id: &str) -> Result<bool, CoreError> {
        Ok(self.lock().devices.remove(device_id).is_some())
    }
}

#[async_trait]
impl OperatorStore for InMemoryStore {
    async fn list_operators(&self) -> Result<Vec<Operator>, CoreError> {
        Ok(self.lock().operators.values().cloned().collect())
    }

    async fn find_operator(&self, id: DbId) -> Result<Option<Operator>, CoreError> {
        Ok(self.lock().operators.get(&id).cloned())
    }

    async fn insert_operator(&self, input: &NewOperator) -> Result<Operator, CoreError> {
        let mut tables = self.lock();
        let operator = Operator {
            id: tables.next_id(),
            name: input.name.clone(),
            contract_number: input.contract_number.clone(),
            contract_expiry_date: input.contract_expiry_date,
        };
        tables.operators.insert(operator.id, operator.clone());
        Ok(operator)
    }

    async fn save_operator(&self, operator: &Operator) -> Result<Option<Operator>, CoreError> {
        let mut tables = self.lock();
        match tables.operators.get_mut(&operator.id) {
            Some(slot) => {
                *slot = operator.clone();
                Ok(Some(operator.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_operator(&self, id: DbId) -> Result<bool, CoreError> {
        let mut tables = self.lock();
        if tables.devices.values().any(|d| d.operator_id == id) {
            return Err(CoreError::Conflict(format!(
                "Operator {id} is still referenced by devices"
            )));
        }
        Ok(tables.operators.remove(&id).is_some())
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn list_users(&self) -> Result<Vec<User>, CoreError> {
        Ok(self.lock().users.values().cloned().collect())
    }

    async fn find_user(&self, id: DbId) -> Result<Option<User>, CoreError> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn insert_user(&self, input: &NewUser) -> Result<User, CoreError> {
        let mut tables = self.lock();
        if tables.users.values().any(|u| u.email == input.email) {
            return Err(CoreError::Conflict(format!(
                "Email '{}' is already in use",
                input.email
            )));
        }
        let user = User {
            id: tables.next_id(),
            name: input.name.clone(),
            email: input.email.clone(),
            role: input.role,
            last_active: None,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn save_user(&self, user: &User) -> Result<Option<User>, CoreError> {
        let mut tables = self.lock();
        if tables
            .users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(CoreError::Conflict(format!(
                "Email '{}' is already in use",
                user.email
            )));
        }
        match tables.users.get_mut(&user.id) {
            Some(slot) => {
                *slot = user.clone();
                Ok(Some(user.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_user(&self, id: DbId) -> Result<bool, CoreError> {
        Ok(self.lock().users.remove(&id).is_some())
    }

    async fn record_activity(&self, id: DbId, at: Timestamp) -> Result<(), CoreError> {
        if let Some(user) = self.lock().users.get_mut(&id) {
            user.last_active = Some(at);
        }
        Ok(())
    }
}

#[async_trait]
impl ImportHistoryStore for InMemoryStore {
    async fn append_import_record(
        &self,
        record: &NewImportRecord,
    ) -> Result<ImportRecord, CoreError> {
        let mut tables = self.lock();
        let stored = ImportRecord {
            id: tables.next_id(),
            filename: record.filename.clone(),
            imported_at: record.imported_at,
            actor_id: record.actor_id,
            actor_name: record.actor_name.clone(),
            rows_attempted: record.rows_attempted,
            rows_merged: record.rows_merged,
            outcome: record.outcome,
            errors: record.errors.clone(),
        };
        tables.imports.push(stored.clone());
        Ok(stored)
    }

    async fn list_import_history(&self, limit: usize) -> Result<Vec<ImportRecord>, CoreError> {
        Ok(self
            .lock()
            .imports
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }
}

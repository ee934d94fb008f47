//! Role-gated operations over the record store.
//!
//! Every function here takes the acting [`User`] and checks the matching
//! capability before it touches the store. Reads return classified and
//! filtered snapshots; writes validate input, check references, then
//! persist.

use serde::Serialize;

use crate::access::{require_capability, Capability};
use crate::classifier::{
    classify_devices, classify_operators, classify_users, ClassifiedDevice, ClassifiedOperator,
    ClassifiedUser,
};
use crate::clock::Clock;
use crate::dashboard::{build_dashboard, summarize_operators, summarize_roles, Dashboard, OperatorSummary, RoleSummary};
use crate::device::{BillingStatus, DevicePatch, FiscalDevice, NewDevice};
use crate::error::CoreError;
use crate::filter::{filter_records, StatusFilter};
use crate::importer::ImportRecord;
use crate::operator::{ContractStatus, NewOperator, Operator, OperatorPatch};
use crate::roles::Role;
use crate::store::RegistryStore;
use crate::types::DbId;
use crate::user::{validate_input, NewUser, User, UserPatch};

/// Search term plus status filter for a list call.
#[derive(Debug, Clone)]
pub struct ListQuery<S> {
    pub search: String,
    pub status: StatusFilter<S>,
}

impl<S> Default for ListQuery<S> {
    fn default() -> Self {
        Self {
            search: String::new(),
            status: StatusFilter::All,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OperatorListing {
    pub operators: Vec<ClassifiedOperator>,
    pub summary: OperatorSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserListing {
    pub users: Vec<ClassifiedUser>,
    pub summary: RoleSummary,
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Classified devices ordered by expiry date then id, then filtered.
pub async fn list_devices<S: RegistryStore + ?Sized>(
    store: &S,
    actor: &User,
    clock: &dyn Clock,
    query: &ListQuery<BillingStatus>,
) -> Result<Vec<ClassifiedDevice>, CoreError> {
    require_capability(actor.role, Capability::ViewDevices)?;

    let mut devices = store.list_devices().await?;
    devices.sort_by(|a, b| {
        a.expiry_date
            .cmp(&b.expiry_date)
            .then_with(|| a.device_id.cmp(&b.device_id))
    });
    let classified = classify_devices(&devices, clock.today());
    Ok(filter_records(&classified, &query.search, &query.status))
}

/// Classified operators ordered by contract expiry. The summary counts
/// every operator, not only those passing the filter.
pub async fn list_operators<S: RegistryStore + ?Sized>(
    store: &S,
    actor: &User,
    clock: &dyn Clock,
    query: &ListQuery<ContractStatus>,
) -> Result<OperatorListing, CoreError> {
    require_capability(actor.role, Capability::ViewOperators)?;

    let mut operators = store.list_operators().await?;
    operators.sort_by(|a, b| {
        a.contract_expiry_date
            .cmp(&b.contract_expiry_date)
            .then_with(|| a.id.cmp(&b.id))
    });
    let devices = store.list_devices().await?;
    let classified = classify_operators(&operators, &devices, clock.today());

    Ok(OperatorListing {
        summary: summarize_operators(&classified),
        operators: filter_records(&classified, &query.search, &query.status),
    })
}

/// Users in id order with presence derived from `clock`, then filtered.
pub async fn list_users<S: RegistryStore + ?Sized>(
    store: &S,
    actor: &User,
    clock: &dyn Clock,
    query: &ListQuery<Role>,
) -> Result<UserListing, CoreError> {
    require_capability(actor.role, Capability::ViewUsers)?;

    let mut users = store.list_users().await?;
    users.sort_by_key(|u| u.id);
    let classified = classify_users(&users, clock.now());

    Ok(UserListing {
        summary: summarize_roles(&users),
        users: filter_records(&classified, &query.search, &query.status),
    })
}

pub async fn dashboard<S: RegistryStore + ?Sized>(
    store: &S,
    actor: &User,
    clock: &dyn Clock,
    top_expiring: usize,
) -> Result<Dashboard, CoreError> {
    require_capability(actor.role, Capability::ViewDevices)?;

    let today = clock.today();
    let devices = store.list_devices().await?;
    let operators = store.list_operators().await?;
    let classified_devices = classify_devices(&devices, today);
    let classified_operators = classify_operators(&operators, &devices, today);

    Ok(build_dashboard(
        &classified_devices,
        &classified_operators,
        top_expiring,
    ))
}

pub async fn import_history<S: RegistryStore + ?Sized>(
    store: &S,
    actor: &User,
    limit: usize,
) -> Result<Vec<ImportRecord>, CoreError> {
    require_capability(actor.role, Capability::ViewDevices)?;
    store.list_import_history(limit).await
}

// ---------------------------------------------------------------------------
// Devices
// ---------------------------------------------------------------------------

pub async fn create_device<S: RegistryStore + ?Sized>(
    store: &S,
    actor: &User,
    input: NewDevice,
) -> Result<FiscalDevice, CoreError> {
    require_capability(actor.role, Capability::EditDevices)?;
    input.validate()?;

    let device = input.into_device();
    if store.find_device(&device.device_id).await?.is_some() {
        return Err(CoreError::Conflict(format!(
            "Device '{}' already exists",
            device.device_id
        )));
    }
    ensure_operator_exists(store, device.operator_id).await?;

    let saved = store.save_device(&device).await?;
    tracing::info!(device_id = %saved.device_id, actor_id = actor.id, "Device created");
    Ok(saved)
}

pub async fn update_device<S: RegistryStore + ?Sized>(
    store: &S,
    actor: &User,
    device_id: &str,
    patch: &DevicePatch,
) -> Result<FiscalDevice, CoreError> {
    require_capability(actor.role, Capability::EditDevices)?;

    let existing = find_device_or_404(store, device_id).await?;
    let updated = patch.apply(&existing)?;
    if updated.operator_id != existing.operator_id {
        ensure_operator_exists(store, updated.operator_id).await?;
    }

    let saved = store.save_device(&updated).await?;
    tracing::info!(device_id = %saved.device_id, actor_id = actor.id, "Device updated");
    Ok(saved)
}

/// Status transition: change only the billing status.
pub async fn set_billing_status<S: RegistryStore + ?Sized>(
    store: &S,
    actor: &User,
    device_id: &str,
    status: BillingStatus,
) -> Result<FiscalDevice, CoreError> {
    require_capability(actor.role, Capability::EditDevices)?;

    let mut device = find_device_or_404(store, device_id).await?;
    let previous = device.billing_status;
    device.billing_status = status;

    let saved = store.save_device(&device).await?;
    tracing::info!(
        device_id = %saved.device_id,
        from = %previous,
        to = %status,
        actor_id = actor.id,
        "Billing status changed"
    );
    Ok(saved)
}

pub async fn delete_device<S: RegistryStore + ?Sized>(
    store: &S,
    actor: &User,
    device_id: &str,
) -> Result<(), CoreError> {
    require_capability(actor.role, Capability::EditDevices)?;

    if !store.delete_device(device_id).await? {
        return Err(CoreError::not_found("FiscalDevice", device_id));
    }
    tracing::info!(%device_id, actor_id = actor.id, "Device deleted");
    Ok(())
}

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

pub async fn create_operator<S: RegistryStore + ?Sized>(
    store: &S,
    actor: &User,
    input: &NewOperator,
) -> Result<Operator, CoreError> {
    require_capability(actor.role, Capability::EditOperators)?;
    input.validate()?;

    let operator = store.insert_operator(input).await?;
    tracing::info!(operator_id = operator.id, actor_id = actor.id, "Operator created");
    Ok(operator)
}

pub async fn update_operator<S: RegistryStore + ?Sized>(
    store: &S,
    actor: &User,
    id: DbId,
    patch: &OperatorPatch,
) -> Result<Operator, CoreError> {
    require_capability(actor.role, Capability::EditOperators)?;
    patch.validate()?;

    let existing = store
        .find_operator(id)
        .await?
        .ok_or_else(|| CoreError::not_found("Operator", id))?;
    let saved = store
        .save_operator(&patch.apply(&existing))
        .await?
        .ok_or_else(|| CoreError::not_found("Operator", id))?;
    tracing::info!(operator_id = id, actor_id = actor.id, "Operator updated");
    Ok(saved)
}

/// Operators still referenced by a device cannot be deleted.
pub async fn delete_operator<S: RegistryStore + ?Sized>(
    store: &S,
    actor: &User,
    id: DbId,
) -> Result<(), CoreError> {
    require_capability(actor.role, Capability::EditOperators)?;

    if store.find_operator(id).await?.is_none() {
        return Err(CoreError::not_found("Operator", id));
    }
    let referencing = store
        .list_devices()
        .await?
        .iter()
        .filter(|d| d.operator_id == id)
        .count();
    if referencing > 0 {
        return Err(CoreError::Conflict(format!(
            "Operator {id} is still referenced by {referencing} device(s)"
        )));
    }

    if !store.delete_operator(id).await? {
        return Err(CoreError::not_found("Operator", id));
    }
    tracing::info!(operator_id = id, actor_id = actor.id, "Operator deleted");
    Ok(())
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

pub async fn create_user<S: RegistryStore + ?Sized>(
    store: &S,
    actor: &User,
    input: &NewUser,
) -> Result<User, CoreError> {
    require_capability(actor.role, Capability::EditUsers)?;
    validate_input(input)?;

    let user = store.insert_user(input).await?;
    tracing::info!(user_id = user.id, role = %user.role, actor_id = actor.id, "User created");
    Ok(user)
}

pub async fn update_user<S: RegistryStore + ?Sized>(
    store: &S,
    actor: &User,
    id: DbId,
    patch: &UserPatch,
) -> Result<User, CoreError> {
    require_capability(actor.role, Capability::EditUsers)?;
    validate_input(patch)?;

    let existing = store
        .find_user(id)
        .await?
        .ok_or_else(|| CoreError::not_found("User", id))?;
    let saved = store
        .save_user(&patch.apply(&existing))
        .await?
        .ok_or_else(|| CoreError::not_found("User", id))?;
    tracing::info!(user_id = id, actor_id = actor.id, "User updated");
    Ok(saved)
}

pub async fn delete_user<S: RegistryStore + ?Sized>(
    store: &S,
    actor: &User,
    id: DbId,
) -> Result<(), CoreError> {
    require_capability(actor.role, Capability::EditUsers)?;

    if id == actor.id {
        return Err(CoreError::Conflict("Users cannot delete themselves".into()));
    }
    if !store.delete_user(id).await? {
        return Err(CoreError::not_found("User", id));
    }
    tracing::info!(user_id = id, actor_id = actor.id, "User deleted");
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_device_or_404<S: RegistryStore + ?Sized>(
    store: &S,
    device_id: &str,
) -> Result<FiscalDevice, CoreError> {
    store
        .find_device(device_id)
        .await?
        .ok_or_else(|| CoreError::not_found("FiscalDevice", device_id))
}

async fn ensure_operator_exists<S: RegistryStore + ?Sized>(
    store: &S,
    operator_id: DbId,
) -> Result<(), CoreError> {
    match store.find_operator(operator_id).await? {
        Some(_) => Ok(()),
        None => Err(CoreError::reference("Operator", operator_id)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::UrgencyTier;
    use crate::clock::FixedClock;
    use crate::memory_store::InMemoryStore;
    use crate::store::{DeviceStore, UserStore};
    use crate::user::Presence;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn clock() -> FixedClock {
        FixedClock::on(date("2024-12-15"))
    }

    fn user(id: DbId, role: Role) -> User {
        User {
            id,
            name: format!("{role} {id}"),
            email: format!("{role}{id}@company.ru"),
            role,
            last_active: None,
        }
    }

    /// Two operators, three devices, three users (admin 10, manager 11, viewer 12).
    fn seeded() -> InMemoryStore {
        let store = InMemoryStore::with_operators(vec![
            Operator {
                id: 1,
                name: "ОФД.ру".into(),
                contract_number: "ДГ-2023-001".into(),
                contract_expiry_date: date("2025-06-15"),
            },
            Operator {
                id: 2,
                name: "Такском".into(),
                contract_number: "ТК-2023-045".into(),
                contract_expiry_date: date("2024-12-30"),
            },
        ]);
        store.seed_devices(vec![
            FiscalDevice {
                device_id: "ФН-002345".into(),
                name: "Касса 2 - Магазин Запад".into(),
                location: "г. Санкт-Петербург".into(),
                operator_id: 2,
                expiry_date: date("2025-01-15"),
                billing_status: BillingStatus::Pending,
            },
            FiscalDevice {
                device_id: "ФН-001234".into(),
                name: "Касса 1 - Магазин Центр".into(),
                location: "г. Москва".into(),
                operator_id: 1,
                expiry_date: date("2024-12-20"),
                billing_status: BillingStatus::Billed,
            },
            FiscalDevice {
                device_id: "ФН-004567".into(),
                name: "Касса 4 - Склад".into(),
                location: "г. Москва".into(),
                operator_id: 1,
                expiry_date: date("2025-03-10"),
                billing_status: BillingStatus::NotRequired,
            },
        ]);
        store.seed_users(vec![
            user(10, Role::Admin),
            user(11, Role::Manager),
            user(12, Role::Viewer),
        ]);
        store
    }

    // -- reads --

    #[tokio::test]
    async fn devices_are_listed_by_expiry_and_classified() {
        let store = seeded();
        let devices = list_devices(&store, &user(12, Role::Viewer), &clock(), &ListQuery::default())
            .await
            .unwrap();

        let ids: Vec<&str> = devices.iter().map(|d| d.device.device_id.as_str()).collect();
        assert_eq!(ids, vec!["ФН-001234", "ФН-002345", "ФН-004567"]);
        assert_eq!(devices[0].days_left, 5);
        assert_eq!(devices[0].urgency, UrgencyTier::Critical);
    }

    #[tokio::test]
    async fn device_list_applies_filter() {
        let store = seeded();
        let query = ListQuery {
            search: "москва".into(),
            status: StatusFilter::Only(BillingStatus::Billed),
        };
        let devices = list_devices(&store, &user(12, Role::Viewer), &clock(), &query)
            .await
            .unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].device.device_id, "ФН-001234");
    }

    #[tokio::test]
    async fn operator_listing_counts_devices_and_summarizes() {
        let store = seeded();
        let listing = list_operators(&store, &user(12, Role::Viewer), &clock(), &ListQuery::default())
            .await
            .unwrap();

        // Такском expires first.
        assert_eq!(listing.operators[0].operator.id, 2);
        assert_eq!(listing.operators[0].status, ContractStatus::Expiring);
        assert_eq!(listing.operators[0].device_count, 1);
        assert_eq!(listing.operators[1].device_count, 2);
        assert_eq!(listing.summary.active, 1);
        assert_eq!(listing.summary.expiring, 1);
    }

    #[tokio::test]
    async fn dashboard_counts() {
        let store = seeded();
        let board = dashboard(&store, &user(12, Role::Viewer), &clock(), 2)
            .await
            .unwrap();

        assert_eq!(board.stats.total_devices, 3);
        assert_eq!(board.stats.expiring_soon, 1);
        assert_eq!(board.stats.active_operators, 1);
        assert_eq!(board.stats.billed_count, 1);
        assert_eq!(board.expiring_devices.len(), 2);
        assert_eq!(board.expiring_devices[0].device.device_id, "ФН-001234");
    }

    #[tokio::test]
    async fn user_listing_filters_by_role() {
        let store = seeded();
        let query = ListQuery {
            search: String::new(),
            status: StatusFilter::Only(Role::Manager),
        };
        let listing = list_users(&store, &user(12, Role::Viewer), &clock(), &query)
            .await
            .unwrap();
        assert_eq!(listing.users.len(), 1);
        assert_eq!(listing.users[0].user.id, 11);
        assert_eq!(listing.summary.admin, 1);
        assert_eq!(listing.summary.viewer, 1);
    }

    #[tokio::test]
    async fn user_listing_derives_presence_from_last_activity() {
        let store = seeded();
        let now = clock().now();
        store.record_activity(10, now).await.unwrap();
        store
            .record_activity(11, now - chrono::Duration::hours(3))
            .await
            .unwrap();

        let listing = list_users(&store, &user(10, Role::Admin), &clock(), &ListQuery::default())
            .await
            .unwrap();
        let presence: Vec<(DbId, Presence)> = listing
            .users
            .iter()
            .map(|u| (u.user.id, u.presence))
            .collect();
        assert_eq!(
            presence,
            vec![
                (10, Presence::Online),
                (11, Presence::Offline),
                (12, Presence::Offline),
            ]
        );
    }

    // -- devices --

    #[tokio::test]
    async fn create_device_defaults_and_rejections() {
        let store = seeded();
        let manager = user(11, Role::Manager);
        let input = |id: &str, operator_id: DbId| NewDevice {
            device_id: id.into(),
            name: "Касса 6".into(),
            location: String::new(),
            operator_id,
            expiry_date: date("2025-05-01"),
            billing_status: BillingStatus::default(),
        };

        let created = create_device(&store, &manager, input("ФН-006789", 1)).await.unwrap();
        assert_eq!(created.billing_status, BillingStatus::Pending);

        assert_matches!(
            create_device(&store, &manager, input("ФН-006789", 1)).await,
            Err(CoreError::Conflict(_))
        );
        assert_matches!(
            create_device(&store, &manager, input("ФН-007890", 99)).await,
            Err(CoreError::Reference { entity: "Operator", .. })
        );
        assert_matches!(
            create_device(&store, &manager, input("  ", 1)).await,
            Err(CoreError::Validation(_))
        );
    }

    #[tokio::test]
    async fn viewer_cannot_edit_devices() {
        let store = seeded();
        let viewer = user(12, Role::Viewer);
        assert_matches!(
            set_billing_status(&store, &viewer, "ФН-002345", BillingStatus::Billed).await,
            Err(CoreError::PermissionDenied { role: Role::Viewer, capability: Capability::EditDevices })
        );
        let device = store.find_device("ФН-002345").await.unwrap().unwrap();
        assert_eq!(device.billing_status, BillingStatus::Pending);
    }

    #[tokio::test]
    async fn billing_transition_and_not_found() {
        let store = seeded();
        let admin = user(10, Role::Admin);
        let updated = set_billing_status(&store, &admin, "ФН-002345", BillingStatus::Billed)
            .await
            .unwrap();
        assert_eq!(updated.billing_status, BillingStatus::Billed);

        assert_matches!(
            set_billing_status(&store, &admin, "ФН-404", BillingStatus::Billed).await,
            Err(CoreError::NotFound { .. })
        );
        assert_matches!(
            delete_device(&store, &admin, "ФН-404").await,
            Err(CoreError::NotFound { .. })
        );
    }

    #[tokio::test]
    async fn update_device_checks_new_operator() {
        let store = seeded();
        let admin = user(10, Role::Admin);
        let patch = DevicePatch {
            operator_id: Some(42),
            ..Default::default()
        };
        assert_matches!(
            update_device(&store, &admin, "ФН-001234", &patch).await,
            Err(CoreError::Reference { .. })
        );

        let patch = DevicePatch {
            location: Some("г. Тверь".into()),
            ..Default::default()
        };
        let updated = update_device(&store, &admin, "ФН-001234", &patch).await.unwrap();
        assert_eq!(updated.location, "г. Тверь");
        assert_eq!(updated.name, "Касса 1 - Магазин Центр");
    }

    // -- operators --

    #[tokio::test]
    async fn operator_in_use_cannot_be_deleted() {
        let store = seeded();
        let manager = user(11, Role::Manager);
        assert_matches!(
            delete_operator(&store, &manager, 1).await,
            Err(CoreError::Conflict(_))
        );

        let spare = create_operator(
            &store,
            &manager,
            &NewOperator {
                name: "Первый ОФД".into(),
                contract_number: "ПФ-2024-003".into(),
                contract_expiry_date: date("2025-09-01"),
            },
        )
        .await
        .unwrap();
        delete_operator(&store, &manager, spare.id).await.unwrap();
        assert_matches!(
            delete_operator(&store, &manager, spare.id).await,
            Err(CoreError::NotFound { .. })
        );
    }

    // -- users --

    #[tokio::test]
    async fn manager_cannot_edit_users_and_nothing_changes() {
        let store = seeded();
        let manager = user(11, Role::Manager);
        let before = store.list_users().await.unwrap();

        let patch = UserPatch {
            role: Some(Role::Admin),
            ..Default::default()
        };
        assert_matches!(
            update_user(&store, &manager, 12, &patch).await,
            Err(CoreError::PermissionDenied { role: Role::Manager, capability: Capability::EditUsers })
        );
        assert_matches!(
            delete_user(&store, &manager, 12).await,
            Err(CoreError::PermissionDenied { .. })
        );

        assert_eq!(store.list_users().await.unwrap(), before);
    }

    #[tokio::test]
    async fn admin_manages_users() {
        let store = seeded();
        let admin = user(10, Role::Admin);

        assert_matches!(
            create_user(
                &store,
                &admin,
                &NewUser {
                    name: "Пётр".into(),
                    email: "not-an-email".into(),
                    role: Role::Viewer,
                },
            )
            .await,
            Err(CoreError::Validation(_))
        );

        let created = create_user(
            &store,
            &admin,
            &NewUser {
                name: "Пётр Смирнов".into(),
                email: "smirnov@company.ru".into(),
                role: Role::Viewer,
            },
        )
        .await
        .unwrap();
        let promoted = update_user(
            &store,
            &admin,
            created.id,
            &UserPatch {
                role: Some(Role::Manager),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(promoted.role, Role::Manager);

        assert_matches!(
            delete_user(&store, &admin, admin.id).await,
            Err(CoreError::Conflict(_))
        );
        delete_user(&store, &admin, created.id).await.unwrap();
    }
}

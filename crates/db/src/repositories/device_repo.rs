//! Repository for the `fiscal_devices` table.

use sqlx::PgPool;

use fiscal_core::device::FiscalDevice;

use crate::models::device::DeviceRow;

const COLUMNS: &str = "device_id, name, location, operator_id, expiry_date, billing_status, \
                       created_at, updated_at";

pub struct DeviceRepo;

impl DeviceRepo {
    /// All devices, soonest expiry first.
    pub async fn list(pool: &PgPool) -> Result<Vec<DeviceRow>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM fiscal_devices ORDER BY expiry_date ASC, device_id ASC");
        sqlx::query_as::<_, DeviceRow>(&query).fetch_all(pool).await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        device_id: &str,
    ) -> Result<Option<DeviceRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM fiscal_devices WHERE device_id = $1");
        sqlx::query_as::<_, DeviceRow>(&query)
            .bind(device_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert, or overwrite every mutable column when the id already exists.
    pub async fn upsert(pool: &PgPool, device: &FiscalDevice) -> Result<DeviceRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO fiscal_devices
                (device_id, name, location, operator_id, expiry_date, billing_status)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (device_id) DO UPDATE SET
                name = EXCLUDED.name,
                location = EXCLUDED.location,
                operator_id = EXCLUDED.operator_id,
                expiry_date = EXCLUDED.expiry_date,
                billing_status = EXCLUDED.billing_status,
                updated_at = NOW()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DeviceRow>(&query)
            .bind(&device.device_id)
            .bind(&device.name)
            .bind(&device.location)
            .bind(device.operator_id)
            .bind(device.expiry_date)
            .bind(device.billing_status.as_str())
            .fetch_one(pool)
            .await
    }

    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, device_id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM fiscal_devices WHERE device_id = $1")
            .bind(device_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

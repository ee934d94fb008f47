//! `fiscal_devices` row model.

use sqlx::FromRow;

use fiscal_core::device::FiscalDevice;
use fiscal_core::error::CoreError;
use fiscal_core::types::{CalendarDate, DbId, Timestamp};

#[derive(Debug, Clone, FromRow)]
pub struct DeviceRow {
    pub device_id: String,
    pub name: String,
    pub location: String,
    pub operator_id: DbId,
    pub expiry_date: CalendarDate,
    pub billing_status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<DeviceRow> for FiscalDevice {
    type Error = CoreError;

    fn try_from(row: DeviceRow) -> Result<Self, Self::Error> {
        Ok(FiscalDevice {
            billing_status: row.billing_status.parse()?,
            device_id: row.device_id,
            name: row.name,
            location: row.location,
            operator_id: row.operator_id,
            expiry_date: row.expiry_date,
        })
    }
}

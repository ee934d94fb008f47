//! Fiscal accumulator (fiscal storage device) entity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{CalendarDate, DbId};

pub const BILLING_BILLED: &str = "billed";
pub const BILLING_PENDING: &str = "pending";
pub const BILLING_NOT_REQUIRED: &str = "not_required";

/// Invoicing state of a device. Independent of how close it is to expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingStatus {
    Billed,
    #[default]
    Pending,
    NotRequired,
}

impl BillingStatus {
    pub const ALL: [BillingStatus; 3] = [
        BillingStatus::Billed,
        BillingStatus::Pending,
        BillingStatus::NotRequired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Billed => BILLING_BILLED,
            Self::Pending => BILLING_PENDING,
            Self::NotRequired => BILLING_NOT_REQUIRED,
        }
    }
}

impl fmt::Display for BillingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            BILLING_BILLED => Ok(Self::Billed),
            BILLING_PENDING => Ok(Self::Pending),
            BILLING_NOT_REQUIRED => Ok(Self::NotRequired),
            other => Err(CoreError::Validation(format!(
                "Unknown billing status '{other}'"
            ))),
        }
    }
}

/// A stored fiscal device. Derived values (days left, urgency) live in
/// [`crate::classifier::ClassifiedDevice`] and are never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalDevice {
    /// Serial number, e.g. `ФН-001234`. Immutable once created.
    pub device_id: String,
    pub name: String,
    pub location: String,
    pub operator_id: DbId,
    pub expiry_date: CalendarDate,
    pub billing_status: BillingStatus,
}

/// Input for creating a device through a direct edit action.
#[derive(Debug, Clone, Deserialize)]
pub struct NewDevice {
    pub device_id: String,
    pub name: String,
    #[serde(default)]
    pub location: String,
    pub operator_id: DbId,
    pub expiry_date: CalendarDate,
    #[serde(default)]
    pub billing_status: BillingStatus,
}

impl NewDevice {
    /// Reject blank identifiers and names.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.device_id.trim().is_empty() {
            return Err(CoreError::Validation("Device id must not be empty".into()));
        }
        if self.name.trim().is_empty() {
            return Err(CoreError::Validation("Device name must not be empty".into()));
        }
        Ok(())
    }

    pub fn into_device(self) -> FiscalDevice {
        FiscalDevice {
            device_id: self.device_id.trim().to_string(),
            name: self.name,
            location: self.location,
            operator_id: self.operator_id,
            expiry_date: self.expiry_date,
            billing_status: self.billing_status,
        }
    }
}

/// Partial update for an existing device. The id itself cannot be changed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DevicePatch {
    pub name: Option<String>,
    pub location: Option<String>,
    pub operator_id: Option<DbId>,
    pub expiry_date: Option<CalendarDate>,
    pub billing_status: Option<BillingStatus>,
}

impl DevicePatch {
    /// Apply the non-`None` fields on top of `device`.
    pub fn apply(&self, device: &FiscalDevice) -> Result<FiscalDevice, CoreError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(CoreError::Validation("Device name must not be empty".into()));
            }
        }
        Ok(FiscalDevice {
            device_id: device.device_id.clone(),
            name: self.name.clone().unwrap_or_else(|| device.name.clone()),
            location: self
                .location
                .clone()
                .unwrap_or_else(|| device.location.clone()),
            operator_id: self.operator_id.unwrap_or(device.operator_id),
            expiry_date: self.expiry_date.unwrap_or(device.expiry_date),
            billing_status: self.billing_status.unwrap_or(device.billing_status),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;

    fn device() -> FiscalDevice {
        FiscalDevice {
            device_id: "ФН-001234".into(),
            name: "Касса 1 - Магазин Центр".into(),
            location: "г. Москва".into(),
            operator_id: 1,
            expiry_date: NaiveDate::from_ymd_opt(2024, 12, 25).unwrap(),
            billing_status: BillingStatus::Billed,
        }
    }

    #[test]
    fn billing_status_round_trips_through_str() {
        for status in BillingStatus::ALL {
            assert_eq!(status.as_str().parse::<BillingStatus>().unwrap(), status);
        }
        assert_matches!("paid".parse::<BillingStatus>(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn new_device_defaults_to_pending_and_empty_location() {
        let input: NewDevice = serde_json::from_value(serde_json::json!({
            "device_id": "ФН-9",
            "name": "Касса 9",
            "operator_id": 2,
            "expiry_date": "2025-01-15"
        }))
        .unwrap();
        assert_eq!(input.billing_status, BillingStatus::Pending);
        assert_eq!(input.location, "");
    }

    #[test]
    fn new_device_requires_id_and_name() {
        let mut input = NewDevice {
            device_id: "  ".into(),
            name: "x".into(),
            location: String::new(),
            operator_id: 1,
            expiry_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            billing_status: BillingStatus::Pending,
        };
        assert_matches!(input.validate(), Err(CoreError::Validation(_)));
        input.device_id = "ФН-1".into();
        input.name = String::new();
        assert_matches!(input.validate(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn patch_keeps_id_and_unset_fields() {
        let patch = DevicePatch {
            location: Some("г. Казань".into()),
            ..Default::default()
        };
        let updated = patch.apply(&device()).unwrap();
        assert_eq!(updated.device_id, "ФН-001234");
        assert_eq!(updated.location, "г. Казань");
        assert_eq!(updated.name, "Касса 1 - Магазин Центр");
        assert_eq!(updated.billing_status, BillingStatus::Billed);
    }

    #[test]
    fn patch_rejects_blank_name() {
        let patch = DevicePatch {
            name: Some(" ".into()),
            ..Default::default()
        };
        assert_matches!(patch.apply(&device()), Err(CoreError::Validation(_)));
    }
}

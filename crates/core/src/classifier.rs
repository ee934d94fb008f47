//! Time/status classifier.
//!
//! Pure, total functions that turn stored dates into the derived values the
//! dashboard and tables display. Urgency (how soon a device expires) and
//! billing status are separate axes: a billed device can still be critical.
//! User presence is derived the same way, from the last activity stamp.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::device::{BillingStatus, FiscalDevice};
use crate::error::CoreError;
use crate::operator::{ContractStatus, Operator};
use crate::types::{CalendarDate, DbId, Timestamp};
use crate::user::{Presence, User};

/// Upper bound (inclusive) of the critical tier.
pub const CRITICAL_MAX_DAYS: i64 = 7;
/// Upper bound (inclusive) of the high tier.
pub const HIGH_MAX_DAYS: i64 = 14;
/// Upper bound (inclusive) of the medium tier.
pub const MEDIUM_MAX_DAYS: i64 = 30;
/// Contracts with this many days left or fewer are expiring.
pub const CONTRACT_EXPIRING_DAYS: i64 = 30;
/// A user active within this many minutes counts as online.
pub const ONLINE_WINDOW_MINUTES: i64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyTier {
    Critical,
    High,
    Medium,
    Low,
}

impl UrgencyTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for UrgencyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UrgencyTier {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "critical" => Ok(Self::Critical),
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(CoreError::Validation(format!(
                "Unknown urgency tier '{other}'"
            ))),
        }
    }
}

/// Whole days from `today` until `expiry`. Negative once overdue.
pub fn days_left(expiry: CalendarDate, today: CalendarDate) -> i64 {
    (expiry - today).num_days()
}

pub fn urgency_tier(days_left: i64) -> UrgencyTier {
    match days_left {
        d if d <= CRITICAL_MAX_DAYS => UrgencyTier::Critical,
        d if d <= HIGH_MAX_DAYS => UrgencyTier::High,
        d if d <= MEDIUM_MAX_DAYS => UrgencyTier::Medium,
        _ => UrgencyTier::Low,
    }
}

/// Contract status from days left.
///
/// The `Expired` branch (negative days) was never observed in historical
/// data; it is inferred from the status vocabulary.
pub fn contract_status(days_left: i64) -> ContractStatus {
    if days_left < 0 {
        ContractStatus::Expired
    } else if days_left <= CONTRACT_EXPIRING_DAYS {
        ContractStatus::Expiring
    } else {
        ContractStatus::Active
    }
}

/// A device annotated with its derived urgency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedDevice {
    #[serde(flatten)]
    pub device: FiscalDevice,
    pub days_left: i64,
    pub urgency: UrgencyTier,
}

impl ClassifiedDevice {
    pub fn billing_status(&self) -> BillingStatus {
        self.device.billing_status
    }
}

pub fn classify_device(device: &FiscalDevice, today: CalendarDate) -> ClassifiedDevice {
    let days = days_left(device.expiry_date, today);
    ClassifiedDevice {
        device: device.clone(),
        days_left: days,
        urgency: urgency_tier(days),
    }
}

pub fn classify_devices(devices: &[FiscalDevice], today: CalendarDate) -> Vec<ClassifiedDevice> {
    devices.iter().map(|d| classify_device(d, today)).collect()
}

/// An operator annotated with contract status and its live device count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedOperator {
    #[serde(flatten)]
    pub operator: Operator,
    pub days_left: i64,
    pub status: ContractStatus,
    pub device_count: usize,
}

/// Classify operators, counting referencing devices from the same snapshot
/// so `device_count` can never drift from the device collection.
pub fn classify_operators(
    operators: &[Operator],
    devices: &[FiscalDevice],
    today: CalendarDate,
) -> Vec<ClassifiedOperator> {
    let mut counts: HashMap<DbId, usize> = HashMap::new();
    for device in devices {
        *counts.entry(device.operator_id).or_default() += 1;
    }

    operators
        .iter()
        .map(|operator| {
            let days = days_left(operator.contract_expiry_date, today);
            ClassifiedOperator {
                operator: operator.clone(),
                days_left: days,
                status: contract_status(days),
                device_count: counts.get(&operator.id).copied().unwrap_or(0),
            }
        })
        .collect()
}

/// Online when the last activity lies within [`ONLINE_WINDOW_MINUTES`]
/// of `now`. Never-active users are offline.
pub fn presence(last_active: Option<Timestamp>, now: Timestamp) -> Presence {
    match last_active {
        Some(at) if (now - at).num_minutes() < ONLINE_WINDOW_MINUTES => Presence::Online,
        _ => Presence::Offline,
    }
}

/// A user annotated with presence as of the classification instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedUser {
    #[serde(flatten)]
    pub user: User,
    pub presence: Presence,
}

pub fn classify_users(users: &[User], now: Timestamp) -> Vec<ClassifiedUser> {
    users
        .iter()
        .map(|user| ClassifiedUser {
            user: user.clone(),
            presence: presence(user.last_active, now),
        })
        .collect()
}

//! Dashboard aggregation.
//!
//! Reduces classified collections into the counters, expiry histogram, and
//! alert list shown on the dashboard. All data is passed in by the caller.

use std::collections::HashSet;
use std::str::FromStr;

use serde::Serialize;

use crate::classifier::{ClassifiedDevice, ClassifiedOperator, UrgencyTier};
use crate::device::BillingStatus;
use crate::error::CoreError;
use crate::operator::ContractStatus;
use crate::roles::Role;
use crate::user::User;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Number of alert rows the dashboard shows by default.
pub const DEFAULT_TOP_EXPIRING: usize = 4;

/// Inclusive upper bounds of the first three histogram buckets; the last
/// bucket is open-ended.
pub const BUCKET_WEEK_MAX_DAYS: i64 = 7;
pub const BUCKET_MONTH_MAX_DAYS: i64 = 30;
pub const BUCKET_QUARTER_MAX_DAYS: i64 = 90;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Fixed expiry histogram buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryBucket {
    /// 0-7 days, and anything already overdue.
    Week,
    /// 8-30 days.
    Month,
    /// 31-90 days.
    Quarter,
    /// 91 days and beyond.
    Beyond,
}

impl ExpiryBucket {
    pub const ALL: [ExpiryBucket; 4] = [
        ExpiryBucket::Week,
        ExpiryBucket::Month,
        ExpiryBucket::Quarter,
        ExpiryBucket::Beyond,
    ];

    pub fn for_days(days_left: i64) -> Self {
        match days_left {
            d if d <= BUCKET_WEEK_MAX_DAYS => Self::Week,
            d if d <= BUCKET_MONTH_MAX_DAYS => Self::Month,
            d if d <= BUCKET_QUARTER_MAX_DAYS => Self::Quarter,
            _ => Self::Beyond,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Beyond => "beyond",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Week => "0-7",
            Self::Month => "8-30",
            Self::Quarter => "31-90",
            Self::Beyond => "91+",
        }
    }
}

impl FromStr for ExpiryBucket {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|bucket| bucket.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown expiry bucket '{s}'")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBucket {
    pub bucket: ExpiryBucket,
    pub label: &'static str,
    pub count: usize,
    /// Share of all devices, 0.0-100.0. Zero when there are no devices.
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_devices: usize,
    /// Devices in the critical or high urgency tier.
    pub expiring_soon: usize,
    pub active_operators: usize,
    pub billed_count: usize,
}

/// Everything the dashboard page renders.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub histogram: Vec<HistogramBucket>,
    pub expiring_devices: Vec<ClassifiedDevice>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OperatorSummary {
    pub active: usize,
    pub expiring: usize,
    pub expired: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoleSummary {
    pub admin: usize,
    pub manager: usize,
    pub viewer: usize,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

pub fn compute_stats(
    devices: &[ClassifiedDevice],
    operators: &[ClassifiedOperator],
) -> DashboardStats {
    let expiring_soon = devices
        .iter()
        .filter(|d| matches!(d.urgency, UrgencyTier::Critical | UrgencyTier::High))
        .count();
    let billed_count = devices
        .iter()
        .filter(|d| d.device.billing_status == BillingStatus::Billed)
        .count();
    let active_operators = operators
        .iter()
        .filter(|o| o.status == ContractStatus::Active)
        .map(|o| o.operator.id)
        .collect::<HashSet<_>>()
        .len();

    DashboardStats {
        total_devices: devices.len(),
        expiring_soon,
        active_operators,
        billed_count,
    }
}

/// Count devices per expiry bucket. Bucket counts always sum to the
/// number of devices.
pub fn expiry_histogram(devices: &[ClassifiedDevice]) -> Vec<HistogramBucket> {
    let mut counts = [0usize; ExpiryBucket::ALL.len()];
    for device in devices {
        counts[ExpiryBucket::for_days(device.days_left) as usize] += 1;
    }

    let total = devices.len();
    ExpiryBucket::ALL
        .iter()
        .zip(counts)
        .map(|(bucket, count)| HistogramBucket {
            bucket: *bucket,
            label: bucket.label(),
            count,
            percentage: percentage(count, total),
        })
        .collect()
}

/// The `limit` most urgent devices: ascending days left, ties by id.
pub fn soonest_expiring(devices: &[ClassifiedDevice], limit: usize) -> Vec<ClassifiedDevice> {
    let mut sorted: Vec<&ClassifiedDevice> = devices.iter().collect();
    sorted.sort_by(|a, b| {
        a.days_left
            .cmp(&b.days_left)
            .then_with(|| a.device.device_id.cmp(&b.device.device_id))
    });
    sorted.into_iter().take(limit).cloned().collect()
}

pub fn build_dashboard(
    devices: &[ClassifiedDevice],
    operators: &[ClassifiedOperator],
    top_expiring: usize,
) -> Dashboard {
    Dashboard {
        stats: compute_stats(devices, operators),
        histogram: expiry_histogram(devices),
        expiring_devices: soonest_expiring(devices, top_expiring),
    }
}

pub fn summarize_operators(operators: &[ClassifiedOperator]) -> OperatorSummary {
    let mut summary = OperatorSummary::default();
    for operator in operators {
        match operator.status {
            ContractStatus::Active => summary.active += 1,
            ContractStatus::Expiring => summary.expiring += 1,
            ContractStatus::Expired => summary.expired += 1,
        }
    }
    summary
}

pub fn summarize_roles(users: &[User]) -> RoleSummary {
    let mut summary = RoleSummary::default();
    for user in users {
        match user.role {
            Role::Admin => summary.admin += 1,
            Role::Manager => summary.manager += 1,
            Role::Viewer => summary.viewer += 1,
        }
    }
    summary
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 * 100.0 / total as f64
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

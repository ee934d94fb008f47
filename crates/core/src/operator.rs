//! Fiscal data operator (OFD) contracts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{CalendarDate, DbId};

pub const CONTRACT_ACTIVE: &str = "active";
pub const CONTRACT_EXPIRING: &str = "expiring";
pub const CONTRACT_EXPIRED: &str = "expired";

/// Contract state derived from the days left until the contract ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    Active,
    Expiring,
    Expired,
}

impl ContractStatus {
    pub const ALL: [ContractStatus; 3] = [
        ContractStatus::Active,
        ContractStatus::Expiring,
        ContractStatus::Expired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => CONTRACT_ACTIVE,
            Self::Expiring => CONTRACT_EXPIRING,
            Self::Expired => CONTRACT_EXPIRED,
        }
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            CONTRACT_ACTIVE => Ok(Self::Active),
            CONTRACT_EXPIRING => Ok(Self::Expiring),
            CONTRACT_EXPIRED => Ok(Self::Expired),
            other => Err(CoreError::Validation(format!(
                "Unknown contract status '{other}'"
            ))),
        }
    }
}

/// A stored operator. `device_count` and `status` are derived at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub id: DbId,
    pub name: String,
    pub contract_number: String,
    pub contract_expiry_date: CalendarDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewOperator {
    pub name: String,
    pub contract_number: String,
    pub contract_expiry_date: CalendarDate,
}

impl NewOperator {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_operator_fields(Some(&self.name), Some(&self.contract_number))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OperatorPatch {
    pub name: Option<String>,
    pub contract_number: Option<String>,
    pub contract_expiry_date: Option<CalendarDate>,
}

impl OperatorPatch {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_operator_fields(self.name.as_deref(), self.contract_number.as_deref())
    }

    pub fn apply(&self, operator: &Operator) -> Operator {
        Operator {
            id: operator.id,
            name: self.name.clone().unwrap_or_else(|| operator.name.clone()),
            contract_number: self
                .contract_number
                .clone()
                .unwrap_or_else(|| operator.contract_number.clone()),
            contract_expiry_date: self
                .contract_expiry_date
                .unwrap_or(operator.contract_expiry_date),
        }
    }
}

fn validate_operator_fields(
    name: Option<&str>,
    contract_number: Option<&str>,
) -> Result<(), CoreError> {
    if name.is_some_and(|n| n.trim().is_empty()) {
        return Err(CoreError::Validation("Operator name must not be empty".into()));
    }
    if contract_number.is_some_and(|c| c.trim().is_empty()) {
        return Err(CoreError::Validation(
            "Contract number must not be empty".into(),
        ));
    }
    Ok(())
}

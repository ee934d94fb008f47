//! Search + status filtering over record collections.
//!
//! A record matches when the status filter is `All` or equals the record's
//! status, and the search term is empty or a case-insensitive substring of
//! one of the record's searchable fields. Filtering is stable.

use std::str::FromStr;

use serde::Serialize;

use crate::classifier::{ClassifiedDevice, ClassifiedOperator, ClassifiedUser};
use crate::device::BillingStatus;
use crate::error::CoreError;
use crate::operator::ContractStatus;
use crate::roles::Role;

pub const STATUS_FILTER_ALL: &str = "all";

/// Either every status, or one specific status value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusFilter<S> {
    All,
    Only(S),
}

impl<S> Default for StatusFilter<S> {
    fn default() -> Self {
        Self::All
    }
}

impl<S: PartialEq> StatusFilter<S> {
    pub fn accepts(&self, status: &S) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == status,
        }
    }
}

impl<S: FromStr<Err = CoreError>> StatusFilter<S> {
    /// Parse a query value. Missing, empty, and `"all"` mean no status filter.
    pub fn parse(value: Option<&str>) -> Result<Self, CoreError> {
        match value.map(str::trim) {
            None | Some("") | Some(STATUS_FILTER_ALL) => Ok(Self::All),
            Some(other) => other.parse().map(Self::Only),
        }
    }
}

/// A record that can be searched and filtered by status.
pub trait Filterable {
    type Status: PartialEq;

    fn status(&self) -> Self::Status;

    /// Fields the search term is matched against.
    fn search_fields(&self) -> Vec<&str>;
}

impl Filterable for ClassifiedDevice {
    type Status = BillingStatus;

    fn status(&self) -> BillingStatus {
        self.device.billing_status
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.device.device_id.as_str(),
            self.device.name.as_str(),
            self.device.location.as_str(),
        ]
    }
}

impl Filterable for ClassifiedOperator {
    type Status = ContractStatus;

    fn status(&self) -> ContractStatus {
        self.status
    }

    fn search_fields(&self) -> Vec<&str> {
        // Operators have no location; the contract number takes its place.
        vec![
            self.operator.name.as_str(),
            self.operator.contract_number.as_str(),
        ]
    }
}

impl Filterable for ClassifiedUser {
    type Status = Role;

    fn status(&self) -> Role {
        self.user.role
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.user.name.as_str(), self.user.email.as_str()]
    }
}

/// `true` when `record` passes both the status filter and the search term.
/// `needle` must already be lowercased.
fn matches<T: Filterable>(record: &T, needle: &str, status: &StatusFilter<T::Status>) -> bool {
    if !status.accepts(&record.status()) {
        return false;
    }
    needle.is_empty()
        || record
            .search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
}

/// Return the records matching `search` and `status`, preserving order.
pub fn filter_records<T: Filterable + Clone>(
    records: &[T],
    search: &str,
    status: &StatusFilter<T::Status>,
) -> Vec<T> {
    let needle = search.to_lowercase();
    records
        .iter()
        .filter(|record| matches(*record, &needle, status))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify_devices;
    use crate::device::FiscalDevice;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, 15).unwrap()
    }

    fn sample() -> Vec<ClassifiedDevice> {
        let raw = [
            ("ФН-001234", "Касса 1 - Магазин Центр", "г. Москва", "2024-12-25", BillingStatus::Billed),
            ("ФН-002345", "Касса 2 - Магазин Запад", "г. Санкт-Петербург", "2025-01-15", BillingStatus::Pending),
            ("ФН-003456", "Касса 3 - Филиал Север", "г. Казань", "2024-12-28", BillingStatus::Billed),
            ("ФН-004567", "Касса 4 - Склад Центральный", "г. Москва", "2025-03-10", BillingStatus::NotRequired),
            ("ФН-005678", "Касса 5 - Магазин Восток", "г. Екатеринбург", "2024-12-22", BillingStatus::Pending),
        ];
        let devices: Vec<FiscalDevice> = raw
            .into_iter()
            .map(|(id, name, location, expiry, billing)| FiscalDevice {
                device_id: id.into(),
                name: name.into(),
                location: location.into(),
                operator_id: 1,
                expiry_date: expiry.parse().unwrap(),
                billing_status: billing,
            })
            .collect();
        classify_devices(&devices, today())
    }

    fn ids(records: &[ClassifiedDevice]) -> Vec<&str> {
        records.iter().map(|r| r.device.device_id.as_str()).collect()
    }

    #[test]
    fn empty_search_and_all_returns_everything_in_order() {
        let records = sample();
        let filtered = filter_records(&records, "", &StatusFilter::All);
        assert_eq!(filtered, records);
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let records = sample();
        let filtered = filter_records(&records, "МОСКВА", &StatusFilter::All);
        assert_eq!(ids(&filtered), vec!["ФН-001234", "ФН-004567"]);

        // Substring in the middle of the name, not a prefix.
        let filtered = filter_records(&records, "запад", &StatusFilter::All);
        assert_eq!(ids(&filtered), vec!["ФН-002345"]);

        let filtered = filter_records(&records, "фн-0034", &StatusFilter::All);
        assert_eq!(ids(&filtered), vec!["ФН-003456"]);
    }

    #[test]
    fn status_and_search_combine() {
        let records = sample();
        let filtered = filter_records(
            &records,
            "магазин",
            &StatusFilter::Only(BillingStatus::Pending),
        );
        assert_eq!(ids(&filtered), vec!["ФН-002345", "ФН-005678"]);
    }

    #[test]
    fn no_match_is_empty_not_error() {
        let records = sample();
        assert!(filter_records(&records, "Владивосток", &StatusFilter::All).is_empty());
        assert!(filter_records::<ClassifiedDevice>(&[], "x", &StatusFilter::All).is_empty());
    }

    #[test]
    fn filtering_is_idempotent() {
        let records = sample();
        let status = StatusFilter::Only(BillingStatus::Billed);
        let once = filter_records(&records, "касса", &status);
        let twice = filter_records(&once, "касса", &status);
        assert_eq!(once, twice);
    }

    #[test]
    fn parse_status_filter() {
        assert_eq!(
            StatusFilter::<BillingStatus>::parse(None).unwrap(),
            StatusFilter::All
        );
        assert_eq!(
            StatusFilter::<BillingStatus>::parse(Some("all")).unwrap(),
            StatusFilter::All
        );
        assert_eq!(
            StatusFilter::<BillingStatus>::parse(Some("not_required")).unwrap(),
            StatusFilter::Only(BillingStatus::NotRequired)
        );
        assert_matches!(
            StatusFilter::<BillingStatus>::parse(Some("overdue")),
            Err(CoreError::Validation(_))
        );
    }
}

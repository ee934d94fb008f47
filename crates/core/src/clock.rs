//! Clock provider.
//!
//! Everything that derives `days_left` takes the current date as an argument;
//! callers obtain it from a [`Clock`] so tests can pin time.

use crate::types::{CalendarDate, Timestamp};

pub trait Clock: Send + Sync {
    /// Current instant (UTC).
    fn now(&self) -> Timestamp;

    /// Current calendar date, taken from the UTC instant.
    fn today(&self) -> CalendarDate {
        self.now().date_naive()
    }
}

/// Reads wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        chrono::Utc::now()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Timestamp);

impl FixedClock {
    /// Pin the clock to midnight UTC of the given date.
    pub fn on(date: CalendarDate) -> Self {
        Self(date.and_time(chrono::NaiveTime::MIN).and_utc())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn fixed_clock_reports_pinned_date() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 15).unwrap();
        let clock = FixedClock::on(date);
        assert_eq!(clock.today(), date);
        assert_eq!(clock.now().date_naive(), date);
    }
}

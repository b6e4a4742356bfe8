//! Timestamp value object for immutable points in time.

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

/// Immutable point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Checks if this timestamp is before another.
    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }

    /// Checks if this timestamp is after another.
    pub fn is_after(&self, other: &Timestamp) -> bool {
        self.0 > other.0
    }

    /// Returns the duration from another timestamp to this one.
    ///
    /// Returns negative duration if other is after self.
    pub fn duration_since(&self, other: &Timestamp) -> Duration {
        self.0.signed_duration_since(other.0)
    }

    /// Creates a new timestamp by adding the specified number of hours.
    pub fn add_hours(&self, hours: i64) -> Self {
        Self(self.0 + Duration::hours(hours))
    }

    /// Creates a new timestamp by adding the specified number of days.
    ///
    /// Negative values subtract days.
    pub fn add_days(&self, days: i64) -> Self {
        Self(self.0 + Duration::days(days))
    }

    /// Adds calendar months, clamping to the last day of the target month
    /// (Jan 31 + 1 month = Feb 28/29).
    ///
    /// Saturates at the original timestamp if the result is unrepresentable.
    pub fn add_calendar_months(&self, months: u32) -> Self {
        Self(self.0.checked_add_months(Months::new(months)).unwrap_or(self.0))
    }

    /// Returns the timestamp as Unix seconds.
    pub fn as_unix_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Creates a timestamp from Unix seconds, `None` if out of range.
    pub fn from_unix_secs(secs: i64) -> Option<Self> {
        DateTime::<Utc>::from_timestamp(secs, 0).map(Self)
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};

    fn at(y: i32, m: u32, d: u32) -> Timestamp {
        Timestamp::from_datetime(Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap())
    }

    #[test]
    fn now_is_between_bounds() {
        let before = Utc::now();
        let ts = Timestamp::now();
        let after = Utc::now();

        assert!(ts.as_datetime() >= &before);
        assert!(ts.as_datetime() <= &after);
    }

    #[test]
    fn add_hours_moves_forward() {
        let ts = at(2026, 3, 1);
        let later = ts.add_hours(24);
        assert_eq!(later.as_datetime().day(), 2);
        assert!(later.is_after(&ts));
    }

    #[test]
    fn add_calendar_months_keeps_day_of_month() {
        let ts = at(2026, 1, 15);
        let next = ts.add_calendar_months(1);
        assert_eq!(next.as_datetime().month(), 2);
        assert_eq!(next.as_datetime().day(), 15);
    }

    #[test]
    fn add_calendar_months_clamps_month_end() {
        let ts = at(2026, 1, 31);
        let next = ts.add_calendar_months(1);
        assert_eq!(next.as_datetime().month(), 2);
        assert_eq!(next.as_datetime().day(), 28);
    }

    #[test]
    fn twelve_months_is_one_year() {
        let ts = at(2024, 2, 29);
        let next = ts.add_calendar_months(12);
        assert_eq!(next.as_datetime().year(), 2025);
        assert_eq!(next.as_datetime().month(), 2);
        assert_eq!(next.as_datetime().day(), 28);
    }

    #[test]
    fn unix_secs_roundtrip() {
        let ts = Timestamp::from_unix_secs(1_705_276_800).unwrap();
        assert_eq!(ts.as_unix_secs(), 1_705_276_800);
    }

    #[test]
    fn serializes_as_rfc3339_string() {
        let json = serde_json::to_string(&at(2024, 1, 15)).unwrap();
        assert!(json.contains("2024-01-15"));
    }

    #[test]
    fn ordering_follows_time() {
        let a = at(2026, 1, 1);
        let b = a.add_days(1);
        assert!(a < b);
        assert!(b.duration_since(&a).num_hours() == 24);
    }
}

//! Calendar-day windows in UTC.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

/// Inclusive `[start, end]` window covering one UTC calendar day.
///
/// # Examples
///
/// ```
/// use chrono::{NaiveDate, TimeZone, Utc};
/// use delivery_report_core::DayWindow;
///
/// let window = DayWindow::for_day(NaiveDate::from_ymd_opt(2025, 3, 30).unwrap());
/// assert!(window.contains(Utc.with_ymd_and_hms(2025, 3, 30, 0, 0, 0).unwrap()));
/// assert!(!window.contains(Utc.with_ymd_and_hms(2025, 3, 31, 0, 0, 0).unwrap()));
/// assert_eq!(window.report_date(), "2025-03-30");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayWindow {
    day: NaiveDate,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DayWindow {
    pub fn for_day(day: NaiveDate) -> Self {
        let start = day.and_time(NaiveTime::MIN).and_utc();
        let end = start + Duration::days(1) - Duration::nanoseconds(1);
        Self { day, start, end }
    }

    /// Window for the UTC day containing `now`.
    pub fn today(now: DateTime<Utc>) -> Self {
        Self::for_day(now.date_naive())
    }

    /// Window for the UTC day before the one containing `now`.
    pub fn yesterday(now: DateTime<Utc>) -> Self {
        Self::for_day(now.date_naive() - Duration::days(1))
    }

    pub fn day(&self) -> NaiveDate {
        self.day
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }

    /// The day formatted as `YYYY-MM-DD`.
    pub fn report_date(&self) -> String {
        self.day.format("%Y-%m-%d").to_string()
    }
}

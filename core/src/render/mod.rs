//! Pure renderers for report data.
//!
//! Nothing here performs I/O; every function returns the rendered text so
//! the caller decides whether it goes to the console, a file, or an email
//! body. Every renderer accepts empty input and produces a valid, empty
//! report.

mod export;
mod html;
mod markdown;
mod table;

pub use export::{campaign_csv, undelivered_csv};
pub use html::campaign_html;
pub use markdown::contact_report_markdown;
pub use table::{campaign_table, error_table, group_table, undelivered_table};

use crate::types::Timestamp;

/// Formats a percentage with one decimal place, e.g. `12.5%`.
///
/// ```
/// assert_eq!(delivery_report_core::render::format_rate(100.0 / 3.0), "33.3%");
/// assert_eq!(delivery_report_core::render::format_rate(0.0), "0.0%");
/// ```
pub fn format_rate(rate: f64) -> String {
    format!("{rate:.1}%")
}

/// Display form of a stored timestamp: native dates as RFC 3339 with
/// millisecond precision, text exactly as stored.
pub fn format_timestamp(timestamp: &Timestamp) -> String {
    match timestamp {
        Timestamp::Native(at) => at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        Timestamp::Text(raw) => raw.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_format_timestamp() {
        let native = Timestamp::Native(Utc.with_ymd_and_hms(2025, 3, 30, 8, 0, 0).unwrap());
        assert_eq!(format_timestamp(&native), "2025-03-30T08:00:00.000Z");
        let text = Timestamp::Text("2025-03-30 08:00:00".to_string());
        assert_eq!(format_timestamp(&text), "2025-03-30 08:00:00");
    }
}

//! Typed records for the documents the reports read.
//!
//! The upstream platform stores loosely shaped documents: identifiers are
//! sometimes ObjectIds and sometimes strings, timestamps are sometimes
//! native dates and sometimes ISO strings, error codes are sometimes
//! integers and sometimes text. The types here pin each of those down so
//! the aggregation code never has to care which form a record arrived in.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AggregationError, Result};

/// Canonical, comparable identifier.
///
/// ObjectIds and 24-character hex strings collapse to the same lowercase
/// hex form, so a membership that references a contact by string matches
/// a contact whose `_id` is an ObjectId.
///
/// # Examples
///
/// ```
/// use delivery_report_core::RecordKey;
///
/// let a = RecordKey::new("65F1C0FFEE0000000000AB12");
/// let b = RecordKey::new(" 65f1c0ffee0000000000ab12 ");
/// assert_eq!(a, b);
/// assert!(a.is_object_id());
/// assert!(!RecordKey::new("legacy-42").is_object_id());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordKey(String);

impl RecordKey {
    pub fn new(raw: impl AsRef<str>) -> Self {
        let trimmed = raw.as_ref().trim();
        if is_object_id_hex(trimmed) {
            Self(trimmed.to_ascii_lowercase())
        } else {
            Self(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` when the key is the hex form of an ObjectId.
    pub fn is_object_id(&self) -> bool {
        is_object_id_hex(&self.0)
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordKey {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

fn is_object_id_hex(raw: &str) -> bool {
    raw.len() == 24 && raw.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Carrier or platform error code.
///
/// Codes that are all digits are numeric regardless of how they were
/// stored, so `30003` and `"30003"` land in the same histogram bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorCode {
    Numeric(i64),
    Text(String),
}

impl ErrorCode {
    /// Code used when a failure entry carries no code at all.
    pub fn unknown() -> Self {
        Self::Text("unknown".to_string())
    }

    pub fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<i64>() {
            Ok(n) if !trimmed.starts_with('+') => Self::Numeric(n),
            _ => Self::Text(trimmed.to_string()),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// A point in time as stored upstream: native date or text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Timestamp {
    Native(DateTime<Utc>),
    Text(String),
}

impl Timestamp {
    /// Normalizes the stored value to a UTC instant.
    ///
    /// # Errors
    ///
    /// Returns [`AggregationError::UnparseableTimestamp`] when a text value
    /// is not in any accepted format.
    pub fn instant(&self) -> Result<DateTime<Utc>> {
        match self {
            Self::Native(at) => Ok(*at),
            Self::Text(raw) => {
                parse_timestamp(raw).ok_or_else(|| AggregationError::UnparseableTimestamp {
                    value: raw.clone(),
                })
            }
        }
    }
}

/// Parses the text timestamp forms seen in the message and campaign
/// collections. Naive values are taken as UTC.
///
/// # Examples
///
/// ```
/// use delivery_report_core::parse_timestamp;
///
/// let a = parse_timestamp("2025-03-30T12:00:00Z").unwrap();
/// let b = parse_timestamp("2025-03-30 12:00:00").unwrap();
/// let c = parse_timestamp("Sun, 30 Mar 2025 12:00:00 +0000").unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a, c);
/// assert!(parse_timestamp("yesterday").is_none());
/// ```
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"] {
        if let Ok(at) = DateTime::parse_from_str(raw, format) {
            return Some(at.with_timezone(&Utc));
        }
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return day.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    DateTime::parse_from_rfc2822(raw)
        .ok()
        .map(|at| at.with_timezone(&Utc))
}

/// Organization the contact analysis is scoped to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Organization {
    pub id: RecordKey,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactGroup {
    pub id: RecordKey,
    pub name: String,
    pub organization_id: RecordKey,
    pub active: bool,
}

/// Join row between a group and a contact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMembership {
    pub group_id: RecordKey,
    pub contact_id: RecordKey,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contact {
    pub id: RecordKey,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

impl Contact {
    /// First and last name joined by a space, trimmed.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Opt-out record. Only records bound to a channel count as an opt-out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnsubscribeRecord {
    pub contact_id: RecordKey,
    pub channel_id: Option<RecordKey>,
}

/// One coded error attached to an undeliverable contact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorDetail {
    pub code: ErrorCode,
    pub description: String,
}

/// Marks a contact as undeliverable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryFailureRecord {
    pub contact_id: RecordKey,
    pub error_details: Vec<ErrorDetail>,
    /// Free-form messages shown next to the contact in reports.
    pub error_messages: Vec<String>,
}

/// Outbound message as recorded by the SMS provider webhook.
///
/// Every field the undelivered rollups filter on is optional because the
/// upstream collection does not enforce any of them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub id: RecordKey,
    pub to: Option<String>,
    pub status: Option<String>,
    pub direction: Option<String>,
    pub error_code: Option<ErrorCode>,
    pub organization_id: Option<RecordKey>,
    pub channel_id: Option<RecordKey>,
    pub date_sent: Option<Timestamp>,
}

/// Display names for an organization/channel pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrganizationChannelInfo {
    pub organization_id: RecordKey,
    pub channel_id: RecordKey,
    pub organization_name: String,
    pub channel_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Campaign {
    pub name: String,
    pub status: String,
    pub created_at: Option<Timestamp>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_record_key_normalizes_object_id_case() {
        let upper = RecordKey::new("ABCDEF0123456789ABCDEF01");
        assert_eq!(upper.as_str(), "abcdef0123456789abcdef01");
        assert!(upper.is_object_id());
    }

    #[test]
    fn test_record_key_keeps_plain_text() {
        let key = RecordKey::new("  Legacy-ID ");
        assert_eq!(key.as_str(), "Legacy-ID");
        assert!(!key.is_object_id());
    }

    #[test]
    fn test_error_code_from_text() {
        assert_eq!(ErrorCode::from_text("30003"), ErrorCode::Numeric(30003));
        assert_eq!(
            ErrorCode::from_text("landline"),
            ErrorCode::Text("landline".to_string())
        );
        assert_eq!(ErrorCode::Numeric(21610).to_string(), "21610");
    }

    #[test]
    fn test_error_code_orders_numeric_before_text() {
        let mut codes = vec![
            ErrorCode::unknown(),
            ErrorCode::Numeric(30008),
            ErrorCode::Numeric(21610),
        ];
        codes.sort();
        assert_eq!(
            codes,
            vec![
                ErrorCode::Numeric(21610),
                ErrorCode::Numeric(30008),
                ErrorCode::unknown()
            ]
        );
    }

    #[test]
    fn test_parse_timestamp_accepts_common_forms() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 30, 8, 15, 0).unwrap();
        for raw in [
            "2025-03-30T08:15:00Z",
            "2025-03-30T08:15:00.000Z",
            "2025-03-30T08:15:00",
            "2025-03-30 08:15:00",
            "2025-03-30T08:15:00+00:00",
            "2025-03-30T10:15:00+0200",
            "Sun, 30 Mar 2025 08:15:00 +0000",
        ] {
            assert_eq!(parse_timestamp(raw), Some(expected), "failed on {raw}");
        }
    }

    #[test]
    fn test_parse_timestamp_bare_date_is_midnight() {
        let parsed = parse_timestamp("2025-03-30").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 3, 30, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_timestamp_instant_native_and_text_agree() {
        let at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let native = Timestamp::Native(at);
        let text = Timestamp::Text(at.to_rfc3339());
        assert_eq!(native.instant().unwrap(), text.instant().unwrap());
    }

    #[test]
    fn test_timestamp_instant_rejects_garbage() {
        let err = Timestamp::Text("not a date".to_string()).instant().unwrap_err();
        assert!(err.to_string().contains("not a date"));
    }

    #[test]
    fn test_contact_display_name_trims_missing_parts() {
        let contact = Contact {
            id: RecordKey::new("c1"),
            first_name: "Ada".to_string(),
            last_name: String::new(),
            phone: "+15550100".to_string(),
        };
        assert_eq!(contact.display_name(), "Ada");
    }
}

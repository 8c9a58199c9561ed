//! Undelivered-message rollups.
//!
//! Both rollups run the same staged pipeline over materialized messages:
//!
//! 1. keep undelivered outbound messages that carry every field the
//!    report needs,
//! 2. normalize `date_sent` to a UTC instant,
//! 3. (daily only) keep messages inside the report day,
//! 4. sort by grouping key, newest first,
//! 5. collapse each key to its newest message,
//! 6. left-join organization/channel display names,
//! 7. sort the rows newest first.
//!
//! The full-history rollup groups by destination number only; the daily
//! rollup groups by destination, organization and channel and also counts
//! how many failures were collapsed into each row.

use std::cmp::Reverse;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::Result;
use crate::types::{ErrorCode, Message, OrganizationChannelInfo, RecordKey, Timestamp};
use crate::window::DayWindow;

/// Delivery status the rollups select.
pub const UNDELIVERED_STATUS: &str = "undelivered";

/// Direction of messages sent through the provider API.
pub const OUTBOUND_API_DIRECTION: &str = "outbound-api";

/// One row of an undelivered report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UndeliveredRow {
    pub to: String,
    pub organization_id: RecordKey,
    pub channel_id: RecordKey,
    pub error_code: ErrorCode,
    /// `date_sent` of the newest message, as stored.
    pub date_sent: Timestamp,
    /// `date_sent` normalized to UTC.
    #[serde(skip)]
    pub sent_at: DateTime<Utc>,
    pub organization_name: String,
    pub channel_name: String,
    /// Failures collapsed into this row (daily rollup only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_count: Option<u64>,
    /// Report day as `YYYY-MM-DD` (daily rollup only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_date: Option<String>,
}

struct Candidate<'a> {
    id: &'a RecordKey,
    to: &'a str,
    organization_id: &'a RecordKey,
    channel_id: &'a RecordKey,
    error_code: &'a ErrorCode,
    date_sent: &'a Timestamp,
    sent_at: DateTime<Utc>,
}

/// Returns `true` when a message qualifies for the undelivered reports,
/// ignoring the day window.
pub fn is_eligible(message: &Message) -> bool {
    message.status.as_deref() == Some(UNDELIVERED_STATUS)
        && message.direction.as_deref() == Some(OUTBOUND_API_DIRECTION)
        && message.error_code.is_some()
        && message.organization_id.is_some()
        && message.channel_id.is_some()
        && message.to.is_some()
        && message.date_sent.is_some()
}

/// Eligible messages with normalized send times.
///
/// Without a window an unparseable text `date_sent` is an error. With a
/// window it cannot be placed inside the day, so the message is skipped
/// with a warning.
fn candidates<'a>(
    messages: &'a [Message],
    window: Option<&DayWindow>,
) -> Result<Vec<Candidate<'a>>> {
    let mut out = Vec::new();
    for message in messages.iter().filter(|message| is_eligible(message)) {
        let (Some(to), Some(organization_id), Some(channel_id)) = (
            message.to.as_deref(),
            message.organization_id.as_ref(),
            message.channel_id.as_ref(),
        ) else {
            continue;
        };
        let (Some(error_code), Some(date_sent)) =
            (message.error_code.as_ref(), message.date_sent.as_ref())
        else {
            continue;
        };
        let sent_at = match (date_sent.instant(), window) {
            (Ok(at), Some(window)) if !window.contains(at) => continue,
            (Ok(at), _) => at,
            (Err(err), Some(_)) => {
                warn!(message = %message.id, error = %err, "skipping message");
                continue;
            }
            (Err(err), None) => return Err(err),
        };
        out.push(Candidate {
            id: &message.id,
            to,
            organization_id,
            channel_id,
            error_code,
            date_sent,
            sent_at,
        });
    }
    Ok(out)
}

/// Sorts by key, newest first, then collapses each key to its first entry.
fn collapse_by<'a, K, F>(
    mut candidates: Vec<Candidate<'a>>,
    key: F,
) -> Vec<(Candidate<'a>, u64)>
where
    K: Ord,
    F: Fn(&Candidate<'a>) -> K,
{
    candidates.sort_by(|a, b| {
        key(a)
            .cmp(&key(b))
            .then_with(|| b.sent_at.cmp(&a.sent_at))
            .then_with(|| a.id.cmp(b.id))
    });

    let mut collapsed: Vec<(Candidate<'a>, u64)> = Vec::new();
    for candidate in candidates {
        if let Some((latest, count)) = collapsed.last_mut() {
            if key(latest) == key(&candidate) {
                *count += 1;
                continue;
            }
        }
        collapsed.push((candidate, 1));
    }
    collapsed
}

fn channel_directory(
    channels: &[OrganizationChannelInfo],
) -> HashMap<(&RecordKey, &RecordKey), &OrganizationChannelInfo> {
    let mut directory = HashMap::new();
    for info in channels {
        directory
            .entry((&info.organization_id, &info.channel_id))
            .or_insert(info);
    }
    directory
}

fn project(
    collapsed: Vec<(Candidate<'_>, u64)>,
    channels: &[OrganizationChannelInfo],
    window: Option<&DayWindow>,
) -> Vec<UndeliveredRow> {
    let directory = channel_directory(channels);
    let mut rows: Vec<UndeliveredRow> = collapsed
        .into_iter()
        .map(|(latest, count)| {
            let info = directory.get(&(latest.organization_id, latest.channel_id));
            UndeliveredRow {
                to: latest.to.to_string(),
                organization_id: latest.organization_id.clone(),
                channel_id: latest.channel_id.clone(),
                error_code: latest.error_code.clone(),
                date_sent: latest.date_sent.clone(),
                sent_at: latest.sent_at,
                organization_name: info
                    .map(|info| info.organization_name.clone())
                    .unwrap_or_default(),
                channel_name: info.map(|info| info.channel_name.clone()).unwrap_or_default(),
                error_count: window.map(|_| count),
                report_date: window.map(DayWindow::report_date),
            }
        })
        .collect();
    rows.sort_by_key(|row| (Reverse(row.sent_at), row.to.clone()));
    rows
}

/// Full-history rollup: one row per destination number, carrying the
/// fields of its newest undelivered message.
///
/// # Errors
///
/// Fails with [`AggregationError::UnparseableTimestamp`](crate::AggregationError)
/// if an eligible message has a text `date_sent` that cannot be parsed.
pub fn latest_by_destination(
    messages: &[Message],
    channels: &[OrganizationChannelInfo],
) -> Result<Vec<UndeliveredRow>> {
    let candidates = candidates(messages, None)?;
    debug!(eligible = candidates.len(), "full-history candidates");
    let collapsed = collapse_by(candidates, |c| c.to);
    Ok(project(collapsed, channels, None))
}

/// Daily rollup: one row per (destination, organization, channel) among
/// messages sent inside `window`, with the number of failures collapsed
/// into each row.
///
/// A text `date_sent` that cannot be parsed cannot be placed in the day,
/// so its message is skipped with a warning instead of failing the run.
pub fn daily_by_destination(
    messages: &[Message],
    channels: &[OrganizationChannelInfo],
    window: &DayWindow,
) -> Result<Vec<UndeliveredRow>> {
    let candidates = candidates(messages, Some(window))?;
    debug!(
        eligible = candidates.len(),
        day = %window.report_date(),
        "daily candidates"
    );
    let collapsed = collapse_by(candidates, |c| (c.to, c.organization_id, c.channel_id));
    Ok(project(collapsed, channels, Some(window)))
}

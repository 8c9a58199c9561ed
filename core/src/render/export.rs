//! CSV exports.

use super::format_timestamp;
use crate::campaign::CampaignRow;
use crate::error::{AggregationError, Result};
use crate::undelivered::UndeliveredRow;

/// Header of the campaign CSV.
pub const CAMPAIGN_HEADER: [&str; 3] = ["name", "status", "createdAt"];

/// Header of the undelivered CSV; the daily export appends
/// [`DAILY_EXTRA_HEADER`].
pub const UNDELIVERED_HEADER: [&str; 7] = [
    "to",
    "organizationId",
    "organizationName",
    "channelId",
    "channelName",
    "error_code",
    "date_sent",
];

pub const DAILY_EXTRA_HEADER: [&str; 2] = ["error_count", "report_date"];

/// Campaign rows as CSV. Empty input still produces the header line.
pub fn campaign_csv(rows: &[CampaignRow]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CAMPAIGN_HEADER)?;
    for row in rows {
        writer.write_record([&row.name, &row.status, &row.created_at])?;
    }
    finish(writer)
}

/// Undelivered rows as CSV. `daily` adds the failure count and report day.
pub fn undelivered_csv(rows: &[UndeliveredRow], daily: bool) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let mut header: Vec<&str> = UNDELIVERED_HEADER.to_vec();
    if daily {
        header.extend(DAILY_EXTRA_HEADER);
    }
    writer.write_record(&header)?;

    for row in rows {
        let mut record = vec![
            row.to.clone(),
            row.organization_id.to_string(),
            row.organization_name.clone(),
            row.channel_id.to_string(),
            row.channel_name.clone(),
            row.error_code.to_string(),
            format_timestamp(&row.date_sent),
        ];
        if daily {
            record.push(row.error_count.unwrap_or_default().to_string());
            record.push(row.report_date.clone().unwrap_or_default());
        }
        writer.write_record(&record)?;
    }
    finish(writer)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|err| AggregationError::Render(err.to_string()))?;
    String::from_utf8(bytes)
        .map_err(|err| AggregationError::Render(err.to_string()))
}

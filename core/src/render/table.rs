//! Console tables.

use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets};

use super::{format_rate, format_timestamp};
use crate::campaign::CampaignRow;
use crate::rollup::{ContactCounts, OrganizationRollup};
use crate::undelivered::UndeliveredRow;

/// Label of the run-total row in the group table.
pub const TOTAL_LABEL: &str = "TOTAL";

const TABLE_WIDTH: u16 = 120;

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_width(TABLE_WIDTH);
    table.set_header(header.iter().map(|name| Cell::new(*name)));
    table
}

fn align_right(table: &mut Table, columns: impl IntoIterator<Item = usize>) {
    for index in columns {
        if let Some(column) = table.column_mut(index) {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }
}

fn count_cells(label: &str, counts: &ContactCounts) -> Vec<Cell> {
    vec![
        Cell::new(label),
        Cell::new(counts.total),
        Cell::new(counts.active),
        Cell::new(counts.unsubscribed),
        Cell::new(counts.undeliverable),
        Cell::new(format_rate(counts.error_rate())),
    ]
}

/// Per-group analysis with a trailing `TOTAL` row.
pub fn group_table(organization_name: &str, rollup: &OrganizationRollup) -> String {
    let mut table = new_table(&[
        "Group Name",
        "Total Contacts",
        "Active",
        "Unsubscribed",
        "Undeliverable",
        "Error Rate",
    ]);
    for stats in &rollup.groups {
        table.add_row(count_cells(&stats.name, &stats.counts));
    }
    table.add_row(count_cells(TOTAL_LABEL, &rollup.totals));
    align_right(&mut table, 1..6);
    format!("Contact Group Analysis for {organization_name}\n{table}")
}

/// Run-level error-code histogram.
pub fn error_table(rollup: &OrganizationRollup) -> String {
    let mut table = new_table(&["Error Type", "Count", "Description"]);
    for (code, tally) in rollup.errors.iter() {
        table.add_row(vec![
            Cell::new(code),
            Cell::new(tally.count),
            Cell::new(&tally.description),
        ]);
    }
    align_right(&mut table, [1]);
    format!("Error Analysis\n{table}")
}

/// The first `limit` undelivered rows.
pub fn undelivered_table(rows: &[UndeliveredRow], limit: usize) -> String {
    let mut table = new_table(&[
        "To",
        "Organization",
        "Channel",
        "Error Code",
        "Date Sent",
        "Failures",
    ]);
    for row in rows.iter().take(limit) {
        table.add_row(vec![
            Cell::new(&row.to),
            Cell::new(display_or_id(&row.organization_name, row.organization_id.as_str())),
            Cell::new(display_or_id(&row.channel_name, row.channel_id.as_str())),
            Cell::new(&row.error_code),
            Cell::new(format_timestamp(&row.date_sent)),
            Cell::new(
                row.error_count
                    .map(|count| count.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
        ]);
    }
    align_right(&mut table, [5]);
    table.to_string()
}

/// Campaigns created on the report day.
pub fn campaign_table(rows: &[CampaignRow]) -> String {
    let mut table = new_table(&["Name", "Status", "Created At (UTC)"]);
    for row in rows {
        table.add_row(vec![
            Cell::new(&row.name),
            Cell::new(&row.status),
            Cell::new(&row.created_at),
        ]);
    }
    table.to_string()
}

fn display_or_id<'a>(name: &'a str, id: &'a str) -> &'a str {
    if name.is_empty() { id } else { name }
}

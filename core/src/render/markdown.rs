//! Markdown-like contact analysis report.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use super::format_rate;
use crate::rollup::{ContactCounts, GroupStats, OrganizationRollup};

/// Renders the detailed text report written by the file sink.
///
/// Every group lists all of its members, active ones included, each with
/// the error messages from its delivery-failure record.
pub fn contact_report_markdown(
    organization_name: &str,
    rollup: &OrganizationRollup,
    generated_at: DateTime<Utc>,
) -> String {
    let mut out = String::new();
    let _ = write_report(&mut out, organization_name, rollup, generated_at);
    out
}

fn write_report(
    out: &mut String,
    organization_name: &str,
    rollup: &OrganizationRollup,
    generated_at: DateTime<Utc>,
) -> std::fmt::Result {
    writeln!(out, "# Contact Analysis Report for {organization_name}")?;
    writeln!(out)?;
    writeln!(
        out,
        "Generated at: {}",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(out)?;

    writeln!(out, "## Summary")?;
    write_totals(out, &rollup.totals)?;
    writeln!(out, "Overall Error Rate: {}", format_rate(rollup.error_rate()))?;
    writeln!(out)?;

    writeln!(out, "## Error Analysis")?;
    for (code, tally) in rollup.errors.iter() {
        writeln!(
            out,
            "Error {code}: {} occurrences - {}",
            tally.count, tally.description
        )?;
    }
    writeln!(out)?;

    writeln!(out, "## Group Details")?;
    for group in &rollup.groups {
        write_group(out, group)?;
    }
    Ok(())
}

fn write_totals(out: &mut String, counts: &ContactCounts) -> std::fmt::Result {
    writeln!(out, "Total Contacts: {}", counts.total)?;
    writeln!(out, "Active Contacts: {}", counts.active)?;
    writeln!(out, "Unsubscribed Contacts: {}", counts.unsubscribed)?;
    writeln!(out, "Undeliverable Contacts: {}", counts.undeliverable)
}

fn write_group(out: &mut String, group: &GroupStats) -> std::fmt::Result {
    writeln!(out)?;
    writeln!(out, "### {}", group.name)?;
    writeln!(out, "Total Contacts: {}", group.counts.total)?;
    writeln!(out, "Active Contacts: {}", group.counts.active)?;
    writeln!(out, "Unsubscribed: {}", group.counts.unsubscribed)?;
    writeln!(out, "Undeliverable: {}", group.counts.undeliverable)?;
    writeln!(out, "Error Rate: {}", format_rate(group.error_rate()))?;
    writeln!(out)?;

    writeln!(out, "#### Contact Details")?;
    for contact in &group.contacts {
        writeln!(
            out,
            "- {} ({}): {}",
            contact.name,
            contact.phone,
            contact.status.as_str().to_uppercase()
        )?;
        if !contact.errors.is_empty() {
            writeln!(out, "  Errors:")?;
            for error in &contact.errors {
                writeln!(out, "  - {error}")?;
            }
        }
    }
    Ok(())
}

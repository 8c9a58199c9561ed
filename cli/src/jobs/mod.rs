//! Batch jobs.
//!
//! Every job follows the same shape: query, aggregate in process, print to
//! the console, then run its sinks. Sink failures are collected in
//! [`SinkOutcomes`] and never stop the remaining sinks.

pub mod campaigns;
pub mod contact_analysis;
pub mod daily_undelivered;
pub mod deactivated_phones;

use std::path::Path;

use delivery_report_config::{DEV_MONGO_URI, ReportConfig};
use delivery_report_core::UndeliveredRow;
use delivery_report_core::render::{undelivered_csv, undelivered_table};
use delivery_report_sinks::{SinkOutcomes, write_report};
use delivery_report_store::{ReportSink, StoreHandle};

use crate::context::JobContext;
use crate::error::Result;

/// Rows shown in the console preview when `--preview` is not given.
pub const DEFAULT_PREVIEW: usize = 10;

/// Sink names as they appear in the outcome list.
pub const STORE_SINK: &str = "store";
pub const FILE_SINK: &str = "file";
pub const EMAIL_SINK: &str = "email";

/// Prints the heading, the row count and a preview of `rows`.
pub(crate) fn print_rows(
    ctx: &mut JobContext,
    title: &str,
    rows: &[UndeliveredRow],
    preview: usize,
) -> Result<()> {
    ctx.heading(title)?;
    if rows.is_empty() {
        return ctx.notice("No undelivered messages found.");
    }
    ctx.line(format!("{} row(s)", rows.len()))?;
    if preview > 0 {
        ctx.line(undelivered_table(rows, preview))?;
        if rows.len() > preview {
            ctx.line(format!("... {} more", rows.len() - preview))?;
        }
    }
    Ok(())
}

/// Appends `rows` to `collection` in the development deployment.
///
/// The connection is only opened when there is something to insert.
pub(crate) fn store_rows(
    config: &ReportConfig,
    outcomes: &mut SinkOutcomes,
    enabled: bool,
    collection: &str,
    rows: &[UndeliveredRow],
) {
    if !enabled {
        outcomes.skipped(STORE_SINK, "disabled with --no-store");
        return;
    }
    if rows.is_empty() {
        outcomes.skipped(STORE_SINK, "no rows to insert");
        return;
    }
    let inserted = StoreHandle::from_config(config, DEV_MONGO_URI)
        .and_then(|handle| ReportSink::new(&handle).insert_rows(collection, rows));
    outcomes.record(STORE_SINK, inserted, |ids| {
        format!("{} row(s) into '{collection}'", ids.len())
    });
}

/// Writes `rows` as CSV to `path` when one was given.
pub(crate) fn export_rows(
    outcomes: &mut SinkOutcomes,
    path: Option<&Path>,
    rows: &[UndeliveredRow],
    daily: bool,
) {
    let Some(path) = path else {
        return;
    };
    let written = undelivered_csv(rows, daily)
        .map_err(|err| err.to_string())
        .and_then(|csv| write_report(path, &csv).map_err(|err| err.to_string()));
    outcomes.record(FILE_SINK, written, |bytes| {
        format!("{bytes} bytes to {}", path.display())
    });
}

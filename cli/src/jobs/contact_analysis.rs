//! Contact analysis for one organization.

use std::path::PathBuf;

use delivery_report_core::render::{
    contact_report_markdown, error_table, format_rate, group_table,
};
use delivery_report_core::{Organization, OrganizationRollup, ReportSummary, rollup_organization};
use delivery_report_sinks::{SinkOutcomes, write_report};
use delivery_report_store::{ReportQuery, ReportSink, StoreHandle};
use tracing::info;

use super::{FILE_SINK, STORE_SINK};
use crate::context::JobContext;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct ContactAnalysisOptions {
    pub organization_id: String,
    /// Markdown report destination.
    pub output: Option<PathBuf>,
    pub store: bool,
    /// Configuration key of the connection string to read from and
    /// store into.
    pub uri_key: String,
}

pub fn run(ctx: &mut JobContext, options: &ContactAnalysisOptions) -> Result<SinkOutcomes> {
    let handle = StoreHandle::from_config(&ctx.config, &options.uri_key)?;
    let collections = ctx.config.collections().clone();
    let query = ReportQuery::new(&handle, &collections);

    let organization = query.find_organization(&options.organization_id)?;
    let records = query.rollup_records(&organization.id)?;
    let rollup = rollup_organization(&organization.id, &records.input());
    info!(
        organization = %organization.name,
        groups = rollup.groups.len(),
        contacts = rollup.totals.total,
        "contact analysis complete"
    );

    print_rollup(ctx, &organization, &rollup)?;

    let store = options.store.then_some(&handle);
    let outcomes = run_sinks(ctx, options, store, &organization, &rollup);
    ctx.outcomes(&outcomes)?;
    Ok(outcomes)
}

/// Store and file sinks. `store` is the deployment to save the summary
/// into, or `None` when storing is disabled.
pub(crate) fn run_sinks(
    ctx: &JobContext,
    options: &ContactAnalysisOptions,
    store: Option<&StoreHandle>,
    organization: &Organization,
    rollup: &OrganizationRollup,
) -> SinkOutcomes {
    let mut outcomes = SinkOutcomes::new();
    match store {
        Some(handle) => {
            let summary = ReportSummary::from_rollup(organization, rollup, ctx.now);
            let collection = &ctx.config.collections().contact_reports;
            let saved = ReportSink::new(handle).insert_summary(collection, &summary);
            outcomes.record(STORE_SINK, saved, |id| format!("id {id}"));
        }
        None => outcomes.skipped(STORE_SINK, "disabled with --no-store"),
    }

    if let Some(path) = options.output.as_deref() {
        let report = contact_report_markdown(&organization.name, rollup, ctx.now);
        outcomes.record(FILE_SINK, write_report(path, &report), |bytes| {
            format!("{bytes} bytes to {}", path.display())
        });
    }
    outcomes
}

/// Console rendering of the rollup.
pub(crate) fn print_rollup(
    ctx: &mut JobContext,
    organization: &Organization,
    rollup: &OrganizationRollup,
) -> Result<()> {
    ctx.heading(&format!("Contact Analysis: {}", organization.name))?;
    if rollup.groups.is_empty() {
        ctx.notice("No active contact groups found.")?;
    }
    ctx.line(group_table(&organization.name, rollup))?;

    let totals = rollup.totals;
    ctx.heading("Overall Statistics")?;
    ctx.line(format!("Total Contacts: {}", totals.total))?;
    ctx.line(format!("Active: {}", totals.active))?;
    ctx.line(format!("Unsubscribed: {}", totals.unsubscribed))?;
    ctx.line(format!("Undeliverable: {}", totals.undeliverable))?;
    ctx.line(format!("Error Rate: {}", format_rate(rollup.error_rate())))?;

    if !rollup.errors.is_empty() {
        ctx.line(error_table(rollup))?;
    }
    Ok(())
}

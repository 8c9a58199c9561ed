//! Daily rollup of undelivered messages per destination, organization and
//! channel.

use std::path::PathBuf;

use chrono::NaiveDate;
use delivery_report_config::PROD_MONGO_URI;
use delivery_report_core::{DayWindow, daily_by_destination};
use delivery_report_sinks::SinkOutcomes;
use delivery_report_store::{ReportQuery, StoreHandle};
use tracing::info;

use super::{export_rows, print_rows, store_rows};
use crate::context::JobContext;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct DailyUndeliveredOptions {
    /// Report day; yesterday (UTC) when absent.
    pub date: Option<NaiveDate>,
    /// CSV destination.
    pub output: Option<PathBuf>,
    pub store: bool,
    pub preview: usize,
}

impl DailyUndeliveredOptions {
    pub fn window(&self, ctx: &JobContext) -> DayWindow {
        self.date
            .map(DayWindow::for_day)
            .unwrap_or_else(|| DayWindow::yesterday(ctx.now))
    }
}

pub fn run(ctx: &mut JobContext, options: &DailyUndeliveredOptions) -> Result<SinkOutcomes> {
    let window = options.window(ctx);
    let collections = ctx.config.collections().clone();
    info!(day = %window.report_date(), "daily undelivered report");

    let rows = {
        let source = StoreHandle::from_config(&ctx.config, PROD_MONGO_URI)?;
        let query = ReportQuery::new(&source, &collections);
        let messages = query.undelivered_messages(Some(&window))?;
        let channels = query.organization_channels()?;
        info!(
            messages = messages.len(),
            channels = channels.len(),
            "loaded undelivered messages"
        );
        daily_by_destination(&messages, &channels, &window)?
    };
    info!(rows = rows.len(), "daily rollup complete");

    let title = format!("Undelivered Messages for {}", window.report_date());
    print_rows(ctx, &title, &rows, options.preview)?;

    let mut outcomes = SinkOutcomes::new();
    store_rows(
        &ctx.config,
        &mut outcomes,
        options.store,
        &collections.daily_undelivered_reports,
        &rows,
    );
    export_rows(&mut outcomes, options.output.as_deref(), &rows, true);

    ctx.outcomes(&outcomes)?;
    Ok(outcomes)
}

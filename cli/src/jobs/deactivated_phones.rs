//! Full-history rollup of undelivered messages, one row per destination.
//!
//! Reads from production and appends the rows to the development
//! deployment.

use std::path::PathBuf;

use delivery_report_config::PROD_MONGO_URI;
use delivery_report_core::latest_by_destination;
use delivery_report_sinks::SinkOutcomes;
use delivery_report_store::{ReportQuery, StoreHandle};
use tracing::info;

use super::{export_rows, print_rows, store_rows};
use crate::context::JobContext;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct DeactivatedPhonesOptions {
    /// CSV destination.
    pub output: Option<PathBuf>,
    pub store: bool,
    pub preview: usize,
}

pub fn run(ctx: &mut JobContext, options: &DeactivatedPhonesOptions) -> Result<SinkOutcomes> {
    let collections = ctx.config.collections().clone();
    let rows = {
        let source = StoreHandle::from_config(&ctx.config, PROD_MONGO_URI)?;
        let query = ReportQuery::new(&source, &collections);
        let messages = query.undelivered_messages(None)?;
        let channels = query.organization_channels()?;
        info!(
            messages = messages.len(),
            channels = channels.len(),
            "loaded undelivered messages"
        );
        latest_by_destination(&messages, &channels)?
    };
    info!(rows = rows.len(), "deactivated phone rollup complete");

    print_rows(ctx, "Deactivated Phones", &rows, options.preview)?;

    let mut outcomes = SinkOutcomes::new();
    store_rows(
        &ctx.config,
        &mut outcomes,
        options.store,
        &collections.deactivated_phone_report,
        &rows,
    );
    export_rows(&mut outcomes, options.output.as_deref(), &rows, false);

    ctx.outcomes(&outcomes)?;
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::fixtures::context;

    #[test]
    fn test_run_without_connection_string_fails() {
        let (mut ctx, buffer) = context();
        let options = DeactivatedPhonesOptions {
            output: None,
            store: true,
            preview: 5,
        };
        let err = run(&mut ctx, &options).unwrap_err();
        assert_eq!(err.to_string(), "configuration missing: PROD_MONGO_URI");
        assert!(buffer.contents().is_empty());
    }
}

//! Campaigns created on one day, exported as CSV and emailed.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use delivery_report_config::PROD_MONGO_URI;
use delivery_report_core::render::{campaign_csv, campaign_html, campaign_table};
use delivery_report_core::{CampaignRow, DayWindow, campaigns_created_in};
use delivery_report_sinks::{
    EmailReport, EmailSettings, EmailSink, SinkError, SinkOutcomes, default_campaign_path,
    write_report,
};
use delivery_report_store::{ReportQuery, StoreHandle};
use tracing::info;

use super::{EMAIL_SINK, FILE_SINK};
use crate::context::JobContext;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct CampaignOptions {
    /// Report day; today (UTC) when absent.
    pub date: Option<NaiveDate>,
    /// CSV destination; `campaign_report_{day}.csv` when absent.
    pub output: Option<PathBuf>,
    pub email: bool,
}

impl CampaignOptions {
    pub fn window(&self, ctx: &JobContext) -> DayWindow {
        self.date
            .map(DayWindow::for_day)
            .unwrap_or_else(|| DayWindow::today(ctx.now))
    }
}

/// Subject line of the campaign email for `window`.
pub fn email_subject(window: &DayWindow) -> String {
    format!("Daily Campaign Report - {}", window.report_date())
}

pub fn run(ctx: &mut JobContext, options: &CampaignOptions) -> Result<SinkOutcomes> {
    let window = options.window(ctx);
    let rows = {
        let source = StoreHandle::from_config(&ctx.config, PROD_MONGO_URI)?;
        let query = ReportQuery::new(&source, ctx.config.collections());
        let campaigns = query.campaigns(&window)?;
        campaigns_created_in(&campaigns, &window)?
    };
    info!(day = %window.report_date(), campaigns = rows.len(), "campaign selection complete");

    print_campaigns(ctx, &window, &rows)?;

    let outcomes = run_sinks(ctx, options, &window, &rows)?;
    ctx.outcomes(&outcomes)?;
    Ok(outcomes)
}

/// File sink, then email sink with the written file as attachment.
pub(crate) fn run_sinks(
    ctx: &JobContext,
    options: &CampaignOptions,
    window: &DayWindow,
    rows: &[CampaignRow],
) -> Result<SinkOutcomes> {
    let csv = campaign_csv(rows)?;
    let mut outcomes = SinkOutcomes::new();

    let path = options
        .output
        .clone()
        .unwrap_or_else(|| default_campaign_path(window.day()));
    outcomes.record(FILE_SINK, write_report(&path, &csv), |bytes| {
        format!("{bytes} bytes to {}", path.display())
    });

    if options.email {
        let attachment = attachment_name(&path, window);
        send_email(ctx, &mut outcomes, window, rows, attachment, csv);
    } else {
        outcomes.skipped(EMAIL_SINK, "disabled with --no-email");
    }
    Ok(outcomes)
}

/// File name of the CSV as attached to the email.
pub(crate) fn attachment_name(path: &Path, window: &DayWindow) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| {
            default_campaign_path(window.day())
                .to_string_lossy()
                .into_owned()
        })
}

pub(crate) fn print_campaigns(
    ctx: &mut JobContext,
    window: &DayWindow,
    rows: &[CampaignRow],
) -> Result<()> {
    ctx.heading(&format!("Campaigns Created on {}", window.report_date()))?;
    if rows.is_empty() {
        return ctx.notice("No campaigns created today.");
    }
    ctx.line(campaign_table(rows))
}

/// Email sink. Incomplete settings skip the sink instead of failing it.
fn send_email(
    ctx: &JobContext,
    outcomes: &mut SinkOutcomes,
    window: &DayWindow,
    rows: &[CampaignRow],
    attachment: String,
    csv: String,
) {
    let settings = match EmailSettings::from_config(&ctx.config) {
        Ok(settings) => settings,
        Err(err @ SinkError::Unconfigured { .. }) => {
            outcomes.skipped(EMAIL_SINK, err.to_string());
            return;
        }
        Err(err) => {
            outcomes.failed(EMAIL_SINK, err);
            return;
        }
    };
    let recipient = settings.recipient.clone();
    let report = EmailReport::with_csv(email_subject(window), campaign_html(rows), attachment, csv);
    let sent = EmailSink::new(settings).and_then(|sink| sink.send(&report));
    outcomes.record(EMAIL_SINK, sent, |status| {
        format!("to {recipient} (status {status})")
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::fixtures::{context, context_with};
    use delivery_report_config::{EMAIL_RECIPIENT, EMAIL_SENDER};
    use delivery_report_sinks::SinkStatus;

    fn options(date: Option<NaiveDate>) -> CampaignOptions {
        CampaignOptions {
            date,
            output: None,
            email: true,
        }
    }

    #[test]
    fn test_window_defaults_to_today() {
        let (ctx, _) = context();
        let window = options(None).window(&ctx);
        assert_eq!(window.report_date(), "2025-03-31");
        assert_eq!(email_subject(&window), "Daily Campaign Report - 2025-03-31");
    }

    #[test]
    fn test_print_campaigns() {
        let (mut ctx, buffer) = context();
        let window = options(None).window(&ctx);
        let rows = vec![CampaignRow {
            name: "Spring Sale".to_string(),
            status: "scheduled".to_string(),
            created_at: "2025-03-31 07:00:00".to_string(),
        }];
        print_campaigns(&mut ctx, &window, &rows).unwrap();
        print_campaigns(&mut ctx, &window, &[]).unwrap();

        let text = buffer.contents();
        assert!(text.contains("Campaigns Created on 2025-03-31"));
        assert!(text.contains("Spring Sale"));
        assert!(text.contains("No campaigns created today."));
    }

    #[test]
    fn test_unconfigured_email_is_skipped() {
        let (ctx, _) = context();
        let window = options(None).window(&ctx);
        let mut outcomes = SinkOutcomes::new();
        let csv = "name,status,createdAt\n".to_string();
        send_email(&ctx, &mut outcomes, &window, &[], "r.csv".to_string(), csv);

        match outcomes.get(EMAIL_SINK) {
            Some(SinkStatus::Skipped(reason)) => {
                assert!(reason.contains("SENDGRID_API_KEY"));
                assert!(reason.contains("EMAIL_RECIPIENT"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_incomplete_email_settings_skip_only_email() {
        let (ctx, _) = context_with(&[
            (EMAIL_SENDER, "reports@example.com"),
            (EMAIL_RECIPIENT, "ops@example.com"),
        ]);
        let window = options(None).window(&ctx);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exports/campaigns.csv");
        let options = CampaignOptions {
            date: None,
            output: Some(path.clone()),
            email: true,
        };
        let rows = vec![CampaignRow {
            name: "Spring Sale".to_string(),
            status: "scheduled".to_string(),
            created_at: "2025-03-31 07:00:00".to_string(),
        }];

        let outcomes = run_sinks(&ctx, &options, &window, &rows).unwrap();

        assert_eq!(outcomes.failed_count(), 0);
        assert!(matches!(outcomes.get(FILE_SINK), Some(SinkStatus::Written(_))));
        match outcomes.get(EMAIL_SINK) {
            Some(SinkStatus::Skipped(reason)) => {
                assert!(reason.contains("SENDGRID_API_KEY"));
                assert!(reason.contains("EMAIL_SENDER_NAME"));
                assert!(!reason.contains("EMAIL_RECIPIENT"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        let csv = std::fs::read_to_string(&path).unwrap();
        assert_eq!(csv, "name,status,createdAt\nSpring Sale,scheduled,2025-03-31 07:00:00\n");
    }

    #[test]
    fn test_attachment_named_after_written_file() {
        let (ctx, _) = context();
        let window = options(None).window(&ctx);
        assert_eq!(
            attachment_name(Path::new("/tmp/exports/march.csv"), &window),
            "march.csv"
        );
        assert_eq!(
            attachment_name(&default_campaign_path(window.day()), &window),
            "campaign_report_2025-03-31.csv"
        );
        assert_eq!(attachment_name(Path::new("/"), &window), "campaign_report_2025-03-31.csv");
    }

    #[test]
    fn test_run_without_connection_string_fails() {
        let (mut ctx, _) = context();
        let err = run(&mut ctx, &options(None)).unwrap_err();
        assert_eq!(err.to_string(), "configuration missing: PROD_MONGO_URI");
    }
}

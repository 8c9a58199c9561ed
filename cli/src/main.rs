//! `delivery-report`: batch reports over the messaging platform's MongoDB
//! deployments.
//!
//! Every job failure is reported as a diagnostic and the process still
//! exits with status 0.

mod context;
mod error;
mod jobs;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use delivery_report_config::{PROD_MONGO_URI, ReportConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::context::JobContext;
use crate::error::JobError;
use crate::jobs::DEFAULT_PREVIEW;
use crate::jobs::campaigns::CampaignOptions;
use crate::jobs::contact_analysis::ContactAnalysisOptions;
use crate::jobs::daily_undelivered::DailyUndeliveredOptions;
use crate::jobs::deactivated_phones::DeactivatedPhonesOptions;

const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "delivery-report")]
#[command(about = "Contact, deliverability and campaign reports for the messaging platform")]
#[command(version = PACKAGE_VERSION)]
struct Cli {
    /// YAML file overriding database and collection names.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify an organization's contacts per group and tally delivery errors.
    ContactAnalysis(ContactAnalysisArgs),
    /// Latest undelivered message per destination number, across all history.
    DeactivatedPhones(DeactivatedPhonesArgs),
    /// Undelivered messages of one day per destination, organization and channel.
    DailyUndelivered(DailyUndeliveredArgs),
    /// Campaigns created on one day, written as CSV and emailed.
    CampaignsToday(CampaignsTodayArgs),
}

#[derive(Args)]
struct ContactAnalysisArgs {
    /// Organization ObjectId (24 hex characters).
    #[arg(long)]
    organization_id: String,

    /// Write the detailed text report to this file.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Do not save the summary to the database.
    #[arg(long)]
    no_store: bool,

    /// Configuration key holding the connection string.
    #[arg(long, default_value = PROD_MONGO_URI)]
    uri_key: String,
}

#[derive(Args)]
struct DeactivatedPhonesArgs {
    /// Write the rows as CSV to this file.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Do not insert the rows into the development database.
    #[arg(long)]
    no_store: bool,

    /// Number of rows shown on the console.
    #[arg(long, default_value_t = DEFAULT_PREVIEW)]
    preview: usize,
}

#[derive(Args)]
struct DailyUndeliveredArgs {
    /// Report day as YYYY-MM-DD (default: yesterday, UTC).
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Write the rows as CSV to this file.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Do not insert the rows into the development database.
    #[arg(long)]
    no_store: bool,

    /// Number of rows shown on the console.
    #[arg(long, default_value_t = DEFAULT_PREVIEW)]
    preview: usize,
}

#[derive(Args)]
struct CampaignsTodayArgs {
    /// Report day as YYYY-MM-DD (default: today, UTC).
    #[arg(long)]
    date: Option<NaiveDate>,

    /// CSV destination (default: campaign_report_{day}.csv).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Do not send the report email.
    #[arg(long)]
    no_email: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match ReportConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            report(&JobError::from(err));
            return;
        }
    };

    let mut ctx = JobContext::stdout(config);
    let (job, result) = match cli.command {
        Command::ContactAnalysis(args) => (
            "contact-analysis",
            jobs::contact_analysis::run(
                &mut ctx,
                &ContactAnalysisOptions {
                    organization_id: args.organization_id,
                    output: args.output,
                    store: !args.no_store,
                    uri_key: args.uri_key,
                },
            ),
        ),
        Command::DeactivatedPhones(args) => (
            "deactivated-phones",
            jobs::deactivated_phones::run(
                &mut ctx,
                &DeactivatedPhonesOptions {
                    output: args.output,
                    store: !args.no_store,
                    preview: args.preview,
                },
            ),
        ),
        Command::DailyUndelivered(args) => (
            "daily-undelivered",
            jobs::daily_undelivered::run(
                &mut ctx,
                &DailyUndeliveredOptions {
                    date: args.date,
                    output: args.output,
                    store: !args.no_store,
                    preview: args.preview,
                },
            ),
        ),
        Command::CampaignsToday(args) => (
            "campaigns-today",
            jobs::campaigns::run(
                &mut ctx,
                &CampaignOptions {
                    date: args.date,
                    output: args.output,
                    email: !args.no_email,
                },
            ),
        ),
    };

    match result {
        Ok(outcomes) => info!(
            job,
            failed_sinks = outcomes.failed_count(),
            "job finished"
        ),
        Err(err) => report(&err),
    }
}

/// Logs to stderr; `RUST_LOG` overrides the default level.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn report(err: &JobError) {
    error!("{err}");
    if let JobError::NotFound {
        sample: Some(sample),
        ..
    } = err
    {
        error!("sample document: {sample}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_contact_analysis_defaults() {
        let cli = Cli::try_parse_from([
            "delivery-report",
            "contact-analysis",
            "--organization-id",
            "64a1f0c2e4b0a1b2c3d4e5f6",
        ])
        .unwrap();
        match cli.command {
            Command::ContactAnalysis(args) => {
                assert_eq!(args.uri_key, "PROD_MONGO_URI");
                assert!(!args.no_store);
                assert!(args.output.is_none());
            }
            _ => panic!("expected contact-analysis"),
        }
    }

    #[test]
    fn test_parse_daily_date_and_global_flags() {
        let cli = Cli::try_parse_from([
            "delivery-report",
            "daily-undelivered",
            "--date",
            "2025-03-30",
            "--preview",
            "3",
            "-v",
            "--config",
            "reports.yaml",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("reports.yaml")));
        match cli.command {
            Command::DailyUndelivered(args) => {
                assert_eq!(args.date, NaiveDate::from_ymd_opt(2025, 3, 30));
                assert_eq!(args.preview, 3);
            }
            _ => panic!("expected daily-undelivered"),
        }
    }

    #[test]
    fn test_bad_date_is_rejected() {
        let parsed = Cli::try_parse_from([
            "delivery-report",
            "campaigns-today",
            "--date",
            "30/03/2025",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_missing_organization_id_is_rejected() {
        assert!(Cli::try_parse_from(["delivery-report", "contact-analysis"]).is_err());
    }
}

//! Per-run state handed to every job.

use std::io::{self, Write};

use chrono::{DateTime, Utc};
use colored::Colorize;
use delivery_report_config::ReportConfig;
use delivery_report_sinks::{SinkOutcomes, SinkStatus};

use crate::error::Result;

/// Configuration, clock and console writer for one job run.
pub struct JobContext {
    pub config: ReportConfig,
    /// Reference instant; report windows and timestamps derive from it.
    pub now: DateTime<Utc>,
    out: Box<dyn Write>,
}

impl JobContext {
    pub fn new(config: ReportConfig, now: DateTime<Utc>, out: Box<dyn Write>) -> Self {
        Self { config, now, out }
    }

    /// Context writing to stdout at the current time.
    pub fn stdout(config: ReportConfig) -> Self {
        Self::new(config, Utc::now(), Box::new(io::stdout()))
    }

    pub fn heading(&mut self, text: &str) -> Result<()> {
        writeln!(self.out, "\n{}", text.bold().cyan())?;
        Ok(())
    }

    pub fn line(&mut self, text: impl AsRef<str>) -> Result<()> {
        writeln!(self.out, "{}", text.as_ref())?;
        Ok(())
    }

    pub fn notice(&mut self, text: &str) -> Result<()> {
        writeln!(self.out, "{}", text.yellow())?;
        Ok(())
    }

    /// Prints one line per sink outcome.
    pub fn outcomes(&mut self, outcomes: &SinkOutcomes) -> Result<()> {
        if outcomes.is_empty() {
            return Ok(());
        }
        self.heading("Outputs")?;
        for outcome in outcomes.iter() {
            let line = outcome.to_string();
            let line = match outcome.status {
                SinkStatus::Written(_) => line.green(),
                SinkStatus::Skipped(_) => line.yellow(),
                SinkStatus::Failed(_) => line.red(),
            };
            writeln!(self.out, "  {line}")?;
        }
        self.out.flush()?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::SharedBuffer;
    use super::*;
    use delivery_report_config::FileConfig;

    #[test]
    fn test_outcomes_are_printed_in_order() {
        colored::control::set_override(false);
        let buffer = SharedBuffer::default();
        let config = ReportConfig::from_lookup(FileConfig::default(), |_| None);
        let mut ctx = JobContext::new(config, Utc::now(), Box::new(buffer.clone()));

        let mut outcomes = SinkOutcomes::new();
        outcomes.written("file", "120 bytes");
        outcomes.skipped("store", "disabled with --no-store");
        ctx.outcomes(&outcomes).unwrap();

        let text = buffer.contents();
        let file = text.find("file: written (120 bytes)").unwrap();
        let store = text.find("store: skipped (disabled with --no-store)").unwrap();
        assert!(file < store);
    }

    #[test]
    fn test_no_outcomes_prints_nothing() {
        let buffer = SharedBuffer::default();
        let config = ReportConfig::from_lookup(FileConfig::default(), |_| None);
        let mut ctx = JobContext::new(config, Utc::now(), Box::new(buffer.clone()));
        ctx.outcomes(&SinkOutcomes::new()).unwrap();
        assert!(buffer.contents().is_empty());
    }
}

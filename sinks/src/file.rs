//! File sink.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::info;

use crate::error::Result;

/// Default path of the campaign CSV for `day`.
///
/// ```
/// use chrono::NaiveDate;
/// use delivery_report_sinks::default_campaign_path;
///
/// let day = NaiveDate::from_ymd_opt(2025, 3, 30).unwrap();
/// assert_eq!(
///     default_campaign_path(day).to_str(),
///     Some("campaign_report_2025-03-30.csv")
/// );
/// ```
pub fn default_campaign_path(day: NaiveDate) -> PathBuf {
    PathBuf::from(format!("campaign_report_{}.csv", day.format("%Y-%m-%d")))
}

/// Writes `contents` to `path`, creating missing parent directories.
///
/// Returns the number of bytes written.
pub fn write_report(path: &Path, contents: &str) -> Result<usize> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, contents)?;
    info!(path = %path.display(), bytes = contents.len(), "report written");
    Ok(contents.len())
}

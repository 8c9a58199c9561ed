//! Sink independence: a misconfigured or failing sink never stops the
//! others from running.

use delivery_report_config::{
    EMAIL_RECIPIENT, EMAIL_SENDER, FileConfig, PROD_MONGO_URI, ReportConfig,
};
use delivery_report_sinks::{
    EmailSettings, SinkError, SinkOutcomes, SinkStatus, default_campaign_path, write_report,
};

fn partial_email_config() -> ReportConfig {
    ReportConfig::from_lookup(FileConfig::default(), |key| match key {
        PROD_MONGO_URI => Some("mongodb://localhost:27017".to_string()),
        EMAIL_SENDER => Some("reports@example.com".to_string()),
        EMAIL_RECIPIENT => Some("ops@example.com".to_string()),
        _ => None,
    })
}

#[test]
fn test_incomplete_email_settings_skip_only_email() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join(default_campaign_path(
        chrono::NaiveDate::from_ymd_opt(2025, 3, 30).unwrap(),
    ));
    let mut outcomes = SinkOutcomes::new();

    let written = write_report(&csv_path, "name,status,createdAt\n");
    outcomes.record("file", written, |bytes| format!("{bytes} bytes"));

    match EmailSettings::from_config(&partial_email_config()) {
        Ok(_) => panic!("email settings should be incomplete"),
        Err(err @ SinkError::Unconfigured { .. }) => outcomes.skipped("email", err.to_string()),
        Err(err) => outcomes.failed("email", err),
    }

    assert!(csv_path.exists());
    assert_eq!(outcomes.failed_count(), 0);
    assert_eq!(
        outcomes.get("file"),
        Some(&SinkStatus::Written("22 bytes".to_string()))
    );
    match outcomes.get("email") {
        Some(SinkStatus::Skipped(reason)) => {
            assert!(reason.contains("SENDGRID_API_KEY"));
            assert!(reason.contains("EMAIL_SENDER_NAME"));
            assert!(!reason.contains("EMAIL_RECIPIENT"));
        }
        other => panic!("unexpected email outcome: {other:?}"),
    }
}

#[test]
fn test_file_failure_is_recorded_not_raised() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "").unwrap();

    let mut outcomes = SinkOutcomes::new();
    outcomes.record(
        "file",
        write_report(&blocker.join("report.md"), "# report\n"),
        |bytes| bytes.to_string(),
    );
    outcomes.written("store", "id 64a1f0c2e4b0a1b2c3d4e5f6");

    assert_eq!(outcomes.failed_count(), 1);
    assert!(matches!(outcomes.get("store"), Some(SinkStatus::Written(_))));
}

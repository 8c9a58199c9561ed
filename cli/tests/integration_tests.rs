use std::fs;
use std::path::Path;
use std::process::{Command, Output};

const ENV_KEYS: [&str; 8] = [
    "PROD_MONGO_URI",
    "DEV_MONGO_URI",
    "PROD_MONGO_DB",
    "DEV_MONGO_DB",
    "SENDGRID_API_KEY",
    "EMAIL_SENDER",
    "EMAIL_SENDER_NAME",
    "EMAIL_RECIPIENT",
];

/// Runs the binary in `dir` with none of the configuration keys set, so
/// neither the caller's environment nor a stray `.env` leaks in.
fn run_in(dir: &Path, args: &[&str]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_delivery-report"));
    command.args(args).current_dir(dir).env("NO_COLOR", "1");
    for key in ENV_KEYS {
        command.env_remove(key);
    }
    command.env_remove("RUST_LOG");
    command.output().expect("failed to run delivery-report")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn help_lists_every_job() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(dir.path(), &["--help"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for job in [
        "contact-analysis",
        "deactivated-phones",
        "daily-undelivered",
        "campaigns-today",
    ] {
        assert!(stdout.contains(job), "help should list {job}");
    }
}

#[test]
fn missing_connection_string_is_reported_with_status_zero() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(dir.path(), &["deactivated-phones", "--no-store"]);

    assert!(output.status.success());
    assert!(stderr(&output).contains("configuration missing: PROD_MONGO_URI"));
}

#[test]
fn contact_analysis_honours_uri_key() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(
        dir.path(),
        &[
            "contact-analysis",
            "--organization-id",
            "64a1f0c2e4b0a1b2c3d4e5f6",
            "--uri-key",
            "DEV_MONGO_URI",
        ],
    );

    assert!(output.status.success());
    assert!(stderr(&output).contains("configuration missing: DEV_MONGO_URI"));
}

#[test]
fn unreadable_config_file_is_reported_with_status_zero() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("reports.yaml"), "collections: [not, a, map]\n").unwrap();

    let output = run_in(
        dir.path(),
        &["campaigns-today", "--no-email", "--config", "reports.yaml"],
    );

    assert!(output.status.success());
    let stderr = stderr(&output);
    assert!(stderr.contains("invalid configuration: YAML error"), "{stderr}");
    assert!(!stderr.contains("configuration missing"), "{stderr}");
    // Only the config file itself: the job never reached the file sink.
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn dotenv_values_are_picked_up() {
    let dir = tempfile::tempdir().unwrap();
    // Nothing listens on port 9, so the ping fails fast with a connection error.
    fs::write(
        dir.path().join(".env"),
        "PROD_MONGO_URI=mongodb://127.0.0.1:9/?serverSelectionTimeoutMS=200\n",
    )
    .unwrap();

    let output = run_in(dir.path(), &["daily-undelivered", "--date", "2025-03-30"]);

    assert!(output.status.success());
    let stderr = stderr(&output);
    assert!(!stderr.contains("configuration missing"), "{stderr}");
    assert!(stderr.contains("connection error"), "{stderr}");
}

#[test]
fn invalid_date_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_in(dir.path(), &["daily-undelivered", "--date", "yesterday"]);
    assert!(!output.status.success());
}

//! Output sinks for the delivery report jobs.
//!
//! - [`write_report`]: rendered report to a local file.
//! - [`EmailSink`]: HTML body plus attachment through SendGrid.
//! - [`SinkOutcomes`]: what each sink of a run did.
//!
//! The store sink lives with the rest of the database code in
//! `delivery-report-store`.

mod email;
mod error;
mod file;
mod outcome;

pub use email::{
    Address, Attachment, Content, EmailReport, EmailSettings, EmailSink, MailPayload,
    Personalization, build_payload,
};
pub use error::{Result, SinkError};
pub use file::{default_campaign_path, write_report};
pub use outcome::{SinkOutcome, SinkOutcomes, SinkStatus};

//! Typed records, aggregation pipelines and renderers for the delivery
//! reports.
//!
//! Everything in this crate works over records that have already been
//! fetched from the store; nothing here performs I/O.
//!
//! - [`types`]: typed forms of the stored documents, including the
//!   canonical [`RecordKey`], [`ErrorCode`] and [`Timestamp`].
//! - [`DayWindow`]: the UTC calendar day a daily job covers.
//! - [`rollup_organization`]: per-group and run-level contact statistics
//!   with an error-code histogram.
//! - [`latest_by_destination`] / [`daily_by_destination`]: undelivered
//!   message rollups keyed by destination number.
//! - [`campaigns_created_in`]: same-day campaign selection.
//! - [`ReportSummary`]: the persisted shape of a contact analysis run.
//! - [`render`]: console tables, Markdown report, HTML email body and CSV.
//!
//! # Example
//!
//! ```
//! use delivery_report_core::*;
//!
//! let org = RecordKey::new("64a000000000000000000001");
//! let groups = vec![ContactGroup {
//!     id: RecordKey::new("g1"),
//!     name: "Patients".to_string(),
//!     organization_id: org.clone(),
//!     active: true,
//! }];
//! let memberships = vec![GroupMembership {
//!     group_id: RecordKey::new("g1"),
//!     contact_id: RecordKey::new("c1"),
//!     active: true,
//! }];
//! let contacts = vec![Contact {
//!     id: RecordKey::new("c1"),
//!     first_name: "Ada".to_string(),
//!     last_name: "Lovelace".to_string(),
//!     phone: "+15550100".to_string(),
//! }];
//!
//! let rollup = rollup_organization(
//!     &org,
//!     &RollupInput {
//!         groups: &groups,
//!         memberships: &memberships,
//!         contacts: &contacts,
//!         ..RollupInput::default()
//!     },
//! );
//! assert_eq!(rollup.totals.total, 1);
//! assert_eq!(rollup.totals.active, 1);
//! assert_eq!(render::format_rate(rollup.error_rate()), "0.0%");
//! ```

mod campaign;
mod error;
mod rollup;
mod summary;
pub mod render;
pub mod types;
mod undelivered;
mod window;

pub use campaign::{CREATED_AT_FORMAT, CampaignRow, campaigns_created_in};
pub use error::{AggregationError, Result};
pub use rollup::{
    ContactCounts, ContactDetail, ContactStatus, ErrorHistogram, ErrorTally, GroupStats,
    OrganizationRollup, RollupInput, UNKNOWN_ERROR_DESCRIPTION, percentage, rollup_organization,
};
pub use summary::{
    CONTACT_ANALYSIS_REPORT_TYPE, ContactIssue, ErrorAnalysisEntry, GroupDetail, ReportSummary,
    SummaryBlock,
};
pub use types::*;
pub use undelivered::{
    OUTBOUND_API_DIRECTION, UNDELIVERED_STATUS, UndeliveredRow, daily_by_destination,
    is_eligible, latest_by_destination,
};
pub use window::DayWindow;

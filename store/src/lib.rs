//! MongoDB access for the delivery report jobs.
//!
//! # Architecture
//!
//! - **`connection`**: [`StoreHandle`], a ping-verified connection that
//!   releases itself on drop.
//! - **`convert`**: BSON documents to typed records and back, including
//!   identifier normalization.
//! - **`query`**: [`ReportQuery`], the record-set fetches each job needs.
//! - **`sink`**: [`ReportSink`], append-only report writes.
//!
//! Only the synchronous driver API is used; every job runs one query at a
//! time.
//!
//! # Quick start
//!
//! ```no_run
//! use delivery_report_config::{ReportConfig, DEV_MONGO_URI, PROD_MONGO_URI};
//! use delivery_report_core::{DayWindow, daily_by_destination};
//! use delivery_report_store::{ReportQuery, ReportSink, StoreHandle};
//!
//! let config = ReportConfig::load(None).unwrap();
//! let prod = StoreHandle::from_config(&config, PROD_MONGO_URI).unwrap();
//! let query = ReportQuery::new(&prod, config.collections());
//!
//! let window = DayWindow::yesterday(chrono::Utc::now());
//! let messages = query.undelivered_messages(Some(&window)).unwrap();
//! let channels = query.organization_channels().unwrap();
//! let rows = daily_by_destination(&messages, &channels, &window).unwrap();
//!
//! let dev = StoreHandle::from_config(&config, DEV_MONGO_URI).unwrap();
//! ReportSink::new(&dev)
//!     .insert_rows(&config.collections().daily_undelivered_reports, &rows)
//!     .unwrap();
//! ```

mod connection;
pub mod convert;
mod error;
mod query;
mod sink;

pub use connection::{StoreHandle, redact_uri};
pub use error::{Result, StoreError};
pub use query::{ReportQuery, RollupRecords, SAMPLE_LIMIT};
pub use sink::ReportSink;

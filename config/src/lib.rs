//! Configuration for the delivery report jobs.
//!
//! Two layers are merged into a [`ReportConfig`]:
//!
//! - environment values (after loading `.env` with `dotenv`): connection
//!   strings, optional database-name overrides and email credentials;
//! - an optional YAML [`FileConfig`] overriding database, collection and
//!   endpoint names.
//!
//! Environment access goes through a key lookup so callers and tests can
//! supply values without touching the process environment.

mod error;
mod file;
mod settings;

pub use error::{ConfigError, Result};
pub use file::{CollectionNames, DatabaseNames, EmailEndpoint, FileConfig};
pub use settings::{
    DEV_MONGO_DB, DEV_MONGO_URI, EMAIL_KEYS, EMAIL_RECIPIENT, EMAIL_SENDER, EMAIL_SENDER_NAME,
    ENV_KEYS, PROD_MONGO_DB, PROD_MONGO_URI, ReportConfig, SENDGRID_API_KEY,
};

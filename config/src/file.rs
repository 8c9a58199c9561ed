//! Optional YAML override file.
//!
//! Every field has a default, so a file only needs the names it changes.
//!
//! # Example YAML
//!
//! ```yaml
//! databases:
//!   production: treply
//!   development: treply_dev
//! collections:
//!   messages: twilio_messages
//! email:
//!   sendgrid_endpoint: "https://api.sendgrid.com/v3/mail/send"
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Database names on the two deployments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseNames {
    /// Database read by every job.
    pub production: String,
    /// Database the undelivered jobs write their rows to.
    pub development: String,
}

impl Default for DatabaseNames {
    fn default() -> Self {
        Self {
            production: "treply".to_string(),
            development: "treply_dev".to_string(),
        }
    }
}

/// Collection names used by the jobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionNames {
    pub organizations: String,
    pub contact_groups: String,
    pub group_memberships: String,
    pub contacts: String,
    pub unsubscribed_contacts: String,
    /// Delivery-failure records.
    pub invalid_contacts: String,
    pub messages: String,
    /// Organization/channel display-name directory.
    pub organization_channels: String,
    pub campaigns: String,
    /// Destination of contact analysis summaries.
    pub contact_reports: String,
    pub deactivated_phone_report: String,
    pub daily_undelivered_reports: String,
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            organizations: "organizations".to_string(),
            contact_groups: "contactgroups".to_string(),
            group_memberships: "contactgroups_mappings".to_string(),
            contacts: "contacts".to_string(),
            unsubscribed_contacts: "unsubscribed_contacts".to_string(),
            invalid_contacts: "invalid_contacts".to_string(),
            messages: "test_twilio_messages".to_string(),
            organization_channels: "organization_channel_report_bak".to_string(),
            campaigns: "campaigns".to_string(),
            contact_reports: "contacts_analysis_report".to_string(),
            deactivated_phone_report: "deactivated_phone_report".to_string(),
            daily_undelivered_reports: "daily_undelivered_reports".to_string(),
        }
    }
}

/// Email delivery endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailEndpoint {
    pub sendgrid_endpoint: String,
}

impl Default for EmailEndpoint {
    fn default() -> Self {
        Self {
            sendgrid_endpoint: "https://api.sendgrid.com/v3/mail/send".to_string(),
        }
    }
}

/// Contents of the `--config` file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub databases: DatabaseNames,
    pub collections: CollectionNames,
    pub email: EmailEndpoint,
}

impl FileConfig {
    /// Loads overrides from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::ConfigError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::ConfigError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Writes the configuration as YAML, e.g. to seed an override file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::ConfigError::IoError) if the file cannot
    /// be written, or [`YamlError`](crate::ConfigError::YamlError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }
}

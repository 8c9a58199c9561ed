//! Resolved configuration for one job run.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::file::{CollectionNames, FileConfig};

/// Connection string of the production deployment.
pub const PROD_MONGO_URI: &str = "PROD_MONGO_URI";
/// Connection string of the development deployment.
pub const DEV_MONGO_URI: &str = "DEV_MONGO_URI";
/// Optional production database-name override.
pub const PROD_MONGO_DB: &str = "PROD_MONGO_DB";
/// Optional development database-name override.
pub const DEV_MONGO_DB: &str = "DEV_MONGO_DB";
pub const SENDGRID_API_KEY: &str = "SENDGRID_API_KEY";
pub const EMAIL_SENDER: &str = "EMAIL_SENDER";
pub const EMAIL_SENDER_NAME: &str = "EMAIL_SENDER_NAME";
pub const EMAIL_RECIPIENT: &str = "EMAIL_RECIPIENT";

/// Keys read from the environment.
pub const ENV_KEYS: [&str; 8] = [
    PROD_MONGO_URI,
    DEV_MONGO_URI,
    PROD_MONGO_DB,
    DEV_MONGO_DB,
    SENDGRID_API_KEY,
    EMAIL_SENDER,
    EMAIL_SENDER_NAME,
    EMAIL_RECIPIENT,
];

/// Keys the email sink needs, in reporting order.
pub const EMAIL_KEYS: [&str; 4] = [
    SENDGRID_API_KEY,
    EMAIL_SENDER,
    EMAIL_SENDER_NAME,
    EMAIL_RECIPIENT,
];

/// File overrides plus environment values.
///
/// Environment values are captured once at construction; empty values are
/// treated as absent.
///
/// # Examples
///
/// ```
/// use delivery_report_config::{FileConfig, ReportConfig, PROD_MONGO_URI};
///
/// let config = ReportConfig::from_lookup(FileConfig::default(), |key| {
///     (key == PROD_MONGO_URI).then(|| "mongodb://localhost:27017".to_string())
/// });
/// assert_eq!(config.require(PROD_MONGO_URI).unwrap(), "mongodb://localhost:27017");
/// assert!(config.value("DEV_MONGO_URI").is_none());
/// assert_eq!(config.production_database(), "treply");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReportConfig {
    file: FileConfig,
    values: BTreeMap<String, String>,
}

impl ReportConfig {
    /// Loads `.env` if present, reads the process environment and applies
    /// the optional override file.
    ///
    /// # Errors
    ///
    /// Fails only if `config_path` is given and cannot be loaded.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        match dotenv::dotenv() {
            Ok(path) => debug!(path = %path.display(), "loaded .env"),
            Err(err) => debug!(error = %err, "no .env loaded"),
        }
        let file = match config_path {
            Some(path) => {
                debug!(path = %path.display(), "loading configuration overrides");
                FileConfig::load(path)?
            }
            None => FileConfig::default(),
        };
        Ok(Self::from_lookup(file, |key| std::env::var(key).ok()))
    }

    /// Builds a configuration from `file` and a key lookup.
    pub fn from_lookup(file: FileConfig, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let values = ENV_KEYS
            .iter()
            .filter_map(|&key| {
                let value = lookup(key)?;
                let value = value.trim();
                (!value.is_empty()).then(|| (key.to_string(), value.to_string()))
            })
            .collect();
        Self { file, values }
    }

    /// Returns the value for `key`, if set.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Returns the value for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when the key is absent or empty.
    pub fn require(&self, key: &str) -> Result<&str> {
        self.value(key).ok_or_else(|| ConfigError::Missing {
            key: key.to_string(),
        })
    }

    /// The subset of `keys` that is not set, in the given order.
    pub fn missing<'k>(&self, keys: &[&'k str]) -> Vec<&'k str> {
        keys.iter()
            .copied()
            .filter(|key| self.value(key).is_none())
            .collect()
    }

    /// Production database name. `PROD_MONGO_DB` wins over the file.
    pub fn production_database(&self) -> &str {
        self.value(PROD_MONGO_DB)
            .unwrap_or(self.file.databases.production.as_str())
    }

    /// Development database name. `DEV_MONGO_DB` wins over the file.
    pub fn development_database(&self) -> &str {
        self.value(DEV_MONGO_DB)
            .unwrap_or(self.file.databases.development.as_str())
    }

    /// Database name to use with the connection string named `uri_key`.
    pub fn database_for(&self, uri_key: &str) -> &str {
        if uri_key == DEV_MONGO_URI {
            self.development_database()
        } else {
            self.production_database()
        }
    }

    pub fn collections(&self) -> &CollectionNames {
        &self.file.collections
    }

    pub fn sendgrid_endpoint(&self) -> &str {
        &self.file.email.sendgrid_endpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_require_reports_missing_key() {
        let config = ReportConfig::from_lookup(FileConfig::default(), lookup(&[]));
        let err = config.require(PROD_MONGO_URI).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { ref key } if key == PROD_MONGO_URI));
        assert_eq!(err.to_string(), "missing configuration value 'PROD_MONGO_URI'");
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let config = ReportConfig::from_lookup(
            FileConfig::default(),
            lookup(&[(SENDGRID_API_KEY, "   "), (EMAIL_SENDER, "reports@example.com")]),
        );
        assert_eq!(
            config.missing(&EMAIL_KEYS),
            vec![SENDGRID_API_KEY, EMAIL_SENDER_NAME, EMAIL_RECIPIENT]
        );
    }

    #[test]
    fn test_unknown_keys_are_not_captured() {
        let config =
            ReportConfig::from_lookup(FileConfig::default(), lookup(&[("HOME", "/root")]));
        assert!(config.value("HOME").is_none());
    }

    #[test]
    fn test_database_precedence() {
        let mut file = FileConfig::default();
        file.databases.production = "from_file".to_string();
        file.databases.development = "dev_from_file".to_string();

        let config = ReportConfig::from_lookup(file.clone(), lookup(&[]));
        assert_eq!(config.production_database(), "from_file");
        assert_eq!(config.database_for(DEV_MONGO_URI), "dev_from_file");

        let config = ReportConfig::from_lookup(file, lookup(&[(PROD_MONGO_DB, "from_env")]));
        assert_eq!(config.production_database(), "from_env");
        assert_eq!(config.database_for(PROD_MONGO_URI), "from_env");
        assert_eq!(config.database_for("SOME_OTHER_URI"), "from_env");
    }

    #[test]
    fn test_values_are_trimmed() {
        let config = ReportConfig::from_lookup(
            FileConfig::default(),
            lookup(&[(EMAIL_RECIPIENT, " ops@example.com\n")]),
        );
        assert_eq!(config.value(EMAIL_RECIPIENT), Some("ops@example.com"));
    }
}

//! Email sink (SendGrid v3 `mail/send`).

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use delivery_report_config::{
    EMAIL_KEYS, EMAIL_RECIPIENT, EMAIL_SENDER, EMAIL_SENDER_NAME, ReportConfig, SENDGRID_API_KEY,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Result, SinkError};

/// Credentials and addresses for sending a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailSettings {
    pub api_key: String,
    pub sender: String,
    pub sender_name: String,
    pub recipient: String,
    pub endpoint: String,
}

impl EmailSettings {
    /// Reads the email settings.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Unconfigured`] naming every missing key.
    pub fn from_config(config: &ReportConfig) -> Result<Self> {
        let missing = config.missing(&EMAIL_KEYS);
        if !missing.is_empty() {
            return Err(SinkError::Unconfigured {
                missing: missing.into_iter().map(String::from).collect(),
            });
        }
        let get = |key| config.value(key).unwrap_or_default().to_string();
        Ok(Self {
            api_key: get(SENDGRID_API_KEY),
            sender: get(EMAIL_SENDER),
            sender_name: get(EMAIL_SENDER_NAME),
            recipient: get(EMAIL_RECIPIENT),
            endpoint: config.sendgrid_endpoint().to_string(),
        })
    }
}

/// One email with an HTML body and a single attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailReport {
    pub subject: String,
    pub html: String,
    pub attachment_name: String,
    pub attachment_type: String,
    pub attachment: Vec<u8>,
}

impl EmailReport {
    /// A report with a CSV attachment.
    pub fn with_csv(
        subject: impl Into<String>,
        html: impl Into<String>,
        filename: impl Into<String>,
        csv: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            subject: subject.into(),
            html: html.into(),
            attachment_name: filename.into(),
            attachment_type: "text/csv".to_string(),
            attachment: csv.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MailPayload {
    pub personalizations: Vec<Personalization>,
    pub from: Address,
    pub subject: String,
    pub content: Vec<Content>,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Serialize)]
pub struct Personalization {
    pub to: Vec<Address>,
}

#[derive(Debug, Serialize)]
pub struct Address {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Content {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct Attachment {
    /// Base64 of the attachment bytes.
    pub content: String,
    pub filename: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub disposition: String,
}

/// Builds the request body for `report`.
pub fn build_payload(settings: &EmailSettings, report: &EmailReport) -> MailPayload {
    MailPayload {
        personalizations: vec![Personalization {
            to: vec![Address {
                email: settings.recipient.clone(),
                name: None,
            }],
        }],
        from: Address {
            email: settings.sender.clone(),
            name: Some(settings.sender_name.clone()),
        },
        subject: report.subject.clone(),
        content: vec![Content {
            kind: "text/html".to_string(),
            value: report.html.clone(),
        }],
        attachments: vec![Attachment {
            content: BASE64.encode(&report.attachment),
            filename: report.attachment_name.clone(),
            kind: report.attachment_type.clone(),
            disposition: "attachment".to_string(),
        }],
    }
}

/// Sends reports through the configured endpoint.
pub struct EmailSink {
    settings: EmailSettings,
    client: reqwest::blocking::Client,
}

impl EmailSink {
    pub fn new(settings: EmailSettings) -> Result<Self> {
        let client = reqwest::blocking::Client::builder().build()?;
        Ok(Self { settings, client })
    }

    /// Sends `report` and returns the provider's status code.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::HttpError`] on transport failure and
    /// [`SinkError::Rejected`] for any non-2xx answer.
    pub fn send(&self, report: &EmailReport) -> Result<u16> {
        let payload = build_payload(&self.settings, report);
        debug!(
            endpoint = %self.settings.endpoint,
            recipient = %self.settings.recipient,
            attachment = %report.attachment_name,
            "sending email"
        );
        let response = self
            .client
            .post(&self.settings.endpoint)
            .bearer_auth(&self.settings.api_key)
            .json(&payload)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(SinkError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        info!(
            status = status.as_u16(),
            recipient = %self.settings.recipient,
            "email sent"
        );
        Ok(status.as_u16())
    }
}

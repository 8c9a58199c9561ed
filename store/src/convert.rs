//! Conversion between BSON documents and typed records.
//!
//! Decoding is lenient about optional fields: an absent or mistyped
//! optional field becomes its default. Only fields a record cannot exist
//! without (its identifiers) fail the conversion.
//!
//! Identifiers stored as ObjectIds and as strings both decode to the same
//! [`RecordKey`]. On the way back, keys that look like ObjectIds are
//! written as ObjectIds where the persisted shape calls for one.

use chrono::{DateTime, Utc};
use delivery_report_core::{
    Campaign, Contact, ContactGroup, DeliveryFailureRecord, ErrorCode, ErrorDetail,
    GroupMembership, Message, Organization, OrganizationChannelInfo, RecordKey, ReportSummary,
    Timestamp, UNKNOWN_ERROR_DESCRIPTION, UndeliveredRow, UnsubscribeRecord,
};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{self, Bson, Document, doc};

use crate::error::{Result, StoreError};

/// Display name used when an organization has no `legalEntityName`.
pub const UNKNOWN_ORGANIZATION_NAME: &str = "Unknown";

/// Canonical key for an identifier stored as an ObjectId or a string.
///
/// Integers are accepted as well since some legacy documents carry them.
pub fn key_from_bson(value: &Bson) -> Option<RecordKey> {
    match value {
        Bson::ObjectId(oid) => Some(RecordKey::new(oid.to_hex())),
        Bson::String(s) if !s.trim().is_empty() => Some(RecordKey::new(s)),
        Bson::Int32(n) => Some(RecordKey::new(n.to_string())),
        Bson::Int64(n) => Some(RecordKey::new(n.to_string())),
        _ => None,
    }
}

/// The forms a key may be stored in, for `$in` filters.
pub fn key_variants(key: &RecordKey) -> Vec<Bson> {
    let text = Bson::String(key.as_str().to_string());
    match ObjectId::parse_str(key.as_str()) {
        Ok(oid) if key.is_object_id() => vec![Bson::ObjectId(oid), text],
        _ => vec![text],
    }
}

/// Stored form of a key: an ObjectId when it parses as one.
pub fn key_to_bson(key: &RecordKey) -> Bson {
    match ObjectId::parse_str(key.as_str()) {
        Ok(oid) if key.is_object_id() => Bson::ObjectId(oid),
        _ => Bson::String(key.as_str().to_string()),
    }
}

pub fn error_code_from_bson(value: &Bson) -> Option<ErrorCode> {
    match value {
        Bson::Int32(n) => Some(ErrorCode::Numeric(i64::from(*n))),
        Bson::Int64(n) => Some(ErrorCode::Numeric(*n)),
        Bson::Double(f) if f.fract() == 0.0 && f.is_finite() => {
            Some(ErrorCode::Numeric(*f as i64))
        }
        Bson::Double(f) => Some(ErrorCode::Text(f.to_string())),
        Bson::String(s) if !s.trim().is_empty() => Some(ErrorCode::from_text(s)),
        _ => None,
    }
}

/// Stored form of a code: a 32-bit integer when it fits, as the message
/// provider writes them.
pub fn error_code_to_bson(code: &ErrorCode) -> Bson {
    match code {
        ErrorCode::Numeric(n) => i32::try_from(*n).map_or(Bson::Int64(*n), Bson::Int32),
        ErrorCode::Text(s) => Bson::String(s.clone()),
    }
}

pub fn timestamp_from_bson(value: &Bson) -> Option<Timestamp> {
    match value {
        Bson::DateTime(at) => native_instant(*at).map(Timestamp::Native),
        Bson::String(s) if !s.trim().is_empty() => Some(Timestamp::Text(s.clone())),
        _ => None,
    }
}

/// Stored form of a timestamp: native dates stay dates, text stays text.
pub fn timestamp_to_bson(timestamp: &Timestamp) -> Bson {
    match timestamp {
        Timestamp::Native(at) => Bson::DateTime(instant_to_bson(*at)),
        Timestamp::Text(s) => Bson::String(s.clone()),
    }
}

pub fn instant_to_bson(at: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(at.timestamp_millis())
}

fn native_instant(at: bson::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(at.timestamp_millis())
}

fn string_field(doc: &Document, field: &str) -> String {
    match doc.get(field) {
        Some(Bson::String(s)) => s.clone(),
        Some(Bson::Int32(n)) => n.to_string(),
        Some(Bson::Int64(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn optional_string(doc: &Document, field: &str) -> Option<String> {
    match doc.get(field) {
        Some(Bson::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn bool_field(doc: &Document, field: &str) -> bool {
    matches!(doc.get(field), Some(Bson::Boolean(true)))
}

fn optional_key(doc: &Document, field: &str) -> Option<RecordKey> {
    doc.get(field).and_then(key_from_bson)
}

fn required_key(doc: &Document, field: &str, collection: &str) -> Result<RecordKey> {
    optional_key(doc, field).ok_or_else(|| StoreError::ConversionError {
        collection: collection.to_string(),
        message: format!("missing or invalid '{field}'"),
    })
}

pub fn organization(doc: &Document, collection: &str) -> Result<Organization> {
    let name = optional_string(doc, "legalEntityName")
        .unwrap_or_else(|| UNKNOWN_ORGANIZATION_NAME.to_string());
    Ok(Organization {
        id: required_key(doc, "_id", collection)?,
        name,
    })
}

pub fn contact_group(doc: &Document, collection: &str) -> Result<ContactGroup> {
    Ok(ContactGroup {
        id: required_key(doc, "_id", collection)?,
        name: string_field(doc, "name"),
        organization_id: required_key(doc, "organizationId", collection)?,
        active: bool_field(doc, "active"),
    })
}

pub fn group_membership(doc: &Document, collection: &str) -> Result<GroupMembership> {
    Ok(GroupMembership {
        group_id: required_key(doc, "groupId", collection)?,
        contact_id: required_key(doc, "contactId", collection)?,
        active: bool_field(doc, "active"),
    })
}

pub fn contact(doc: &Document, collection: &str) -> Result<Contact> {
    Ok(Contact {
        id: required_key(doc, "_id", collection)?,
        first_name: string_field(doc, "firstName"),
        last_name: string_field(doc, "lastName"),
        phone: string_field(doc, "phoneNumber"),
    })
}

pub fn unsubscribe(doc: &Document, collection: &str) -> Result<UnsubscribeRecord> {
    Ok(UnsubscribeRecord {
        contact_id: required_key(doc, "contactId", collection)?,
        channel_id: optional_key(doc, "channelId"),
    })
}

pub fn delivery_failure(doc: &Document, collection: &str) -> Result<DeliveryFailureRecord> {
    let error_details = match doc.get("errorDetails") {
        Some(Bson::Array(entries)) => entries
            .iter()
            .filter_map(Bson::as_document)
            .map(error_detail)
            .collect(),
        _ => Vec::new(),
    };
    let error_messages = match doc.get("errorMessages") {
        Some(Bson::Array(entries)) => entries
            .iter()
            .filter_map(|entry| match entry {
                Bson::String(s) => Some(s.clone()),
                Bson::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        _ => Vec::new(),
    };
    Ok(DeliveryFailureRecord {
        contact_id: required_key(doc, "contactId", collection)?,
        error_details,
        error_messages,
    })
}

fn error_detail(entry: &Document) -> ErrorDetail {
    ErrorDetail {
        code: entry
            .get("code")
            .and_then(error_code_from_bson)
            .unwrap_or_else(ErrorCode::unknown),
        description: optional_string(entry, "description")
            .unwrap_or_else(|| UNKNOWN_ERROR_DESCRIPTION.to_string()),
    }
}

pub fn message(doc: &Document, collection: &str) -> Result<Message> {
    Ok(Message {
        id: required_key(doc, "_id", collection)?,
        to: optional_string(doc, "to"),
        status: optional_string(doc, "status"),
        direction: optional_string(doc, "direction"),
        error_code: doc.get("error_code").and_then(error_code_from_bson),
        organization_id: optional_key(doc, "organizationId"),
        channel_id: optional_key(doc, "channelId"),
        date_sent: doc.get("date_sent").and_then(timestamp_from_bson),
    })
}

pub fn organization_channel(doc: &Document, collection: &str) -> Result<OrganizationChannelInfo> {
    Ok(OrganizationChannelInfo {
        organization_id: required_key(doc, "organizationId", collection)?,
        channel_id: required_key(doc, "channelId", collection)?,
        organization_name: string_field(doc, "organizationName"),
        channel_name: string_field(doc, "channelName"),
    })
}

/// Campaigns never fail to decode; a missing `createdAt` is kept as `None`.
pub fn campaign(doc: &Document, _collection: &str) -> Result<Campaign> {
    Ok(Campaign {
        name: string_field(doc, "name"),
        status: string_field(doc, "status"),
        created_at: doc.get("createdAt").and_then(timestamp_from_bson),
    })
}

/// Persisted form of a contact analysis run.
pub fn summary_to_document(summary: &ReportSummary) -> Document {
    let error_analysis: Vec<Bson> = summary
        .error_analysis
        .iter()
        .map(|entry| {
            Bson::Document(doc! {
                "errorCode": error_code_to_bson(&entry.error_code),
                "count": count_to_bson(entry.count),
                "description": entry.description.as_str(),
            })
        })
        .collect();

    let group_details: Vec<Bson> = summary
        .group_details
        .iter()
        .map(|group| {
            let issues: Vec<Bson> = group
                .contacts_with_issues
                .iter()
                .map(|issue| {
                    Bson::Document(doc! {
                        "id": issue.id.as_str(),
                        "name": issue.name.as_str(),
                        "phone": issue.phone.as_str(),
                        "status": issue.status.as_str(),
                        "errors": issue.errors.clone(),
                    })
                })
                .collect();
            Bson::Document(doc! {
                "name": group.name.as_str(),
                "totalContacts": count_to_bson(group.total_contacts),
                "activeContacts": count_to_bson(group.active_contacts),
                "unsubscribed": count_to_bson(group.unsubscribed),
                "undeliverable": count_to_bson(group.undeliverable),
                "errorRate": group.error_rate,
                "contactsWithIssues": issues,
            })
        })
        .collect();

    let totals = &summary.summary;
    doc! {
        "organizationId": key_to_bson(&summary.organization_id),
        "organizationName": summary.organization_name.as_str(),
        "reportType": summary.report_type.as_str(),
        "generatedAt": instant_to_bson(summary.generated_at),
        "summary": {
            "totalContacts": count_to_bson(totals.total_contacts),
            "activeContacts": count_to_bson(totals.active_contacts),
            "unsubscribedContacts": count_to_bson(totals.unsubscribed_contacts),
            "undeliverableContacts": count_to_bson(totals.undeliverable_contacts),
            "errorRate": totals.error_rate,
        },
        "errorAnalysis": error_analysis,
        "groupDetails": group_details,
    }
}

/// Persisted form of an undelivered row. Identifiers are written the way
/// [`key_to_bson`] stores keys; `date_sent` keeps its stored representation.
pub fn row_to_document(row: &UndeliveredRow) -> Document {
    let mut doc = doc! {
        "to": row.to.as_str(),
        "date_sent": timestamp_to_bson(&row.date_sent),
        "organizationId": key_to_bson(&row.organization_id),
        "channelId": key_to_bson(&row.channel_id),
        "error_code": error_code_to_bson(&row.error_code),
        "organizationName": row.organization_name.as_str(),
        "channelName": row.channel_name.as_str(),
    };
    if let Some(count) = row.error_count {
        doc.insert("error_count", count_to_bson(count));
    }
    if let Some(day) = &row.report_date {
        doc.insert("report_date", day.as_str());
    }
    doc
}

fn count_to_bson(count: u64) -> Bson {
    Bson::Int64(i64::try_from(count).unwrap_or(i64::MAX))
}

//! Integration tests for decoding stored documents and encoding reports.
//!
//! These run without a server: documents are built in memory in the
//! shapes the upstream collections actually hold, decoded, aggregated and
//! encoded back.

use chrono::{NaiveDate, TimeZone, Utc};
use delivery_report_core::{
    ContactStatus, DayWindow, ErrorCode, Organization, ReportSummary, daily_by_destination,
    latest_by_destination, rollup_organization,
};
use delivery_report_store::RollupRecords;
use delivery_report_store::convert::{self, instant_to_bson};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document, doc};

const ORG: &str = "64a000000000000000000001";
const GROUP: &str = "64a000000000000000000002";
const ALICE: &str = "64a00000000000000000000a";
const BOB: &str = "64a00000000000000000000b";
const CAROL: &str = "64a00000000000000000000c";

fn oid(hex: &str) -> ObjectId {
    ObjectId::parse_str(hex).unwrap()
}

fn decode_all<T>(
    docs: &[Document],
    decode: fn(&Document, &str) -> delivery_report_store::Result<T>,
) -> Vec<T> {
    docs.iter().map(|d| decode(d, "test").unwrap()).collect()
}

/// Mixed identifier forms: the group points at the organization by
/// string, memberships point at contacts by string, failure and opt-out
/// records use ObjectIds.
fn records() -> RollupRecords {
    let groups = [doc! {
        "_id": oid(GROUP),
        "name": "Patients",
        "organizationId": ORG,
        "active": true,
    }];
    let memberships: Vec<Document> = [ALICE, BOB, CAROL]
        .iter()
        .map(|contact| doc! { "groupId": GROUP, "contactId": *contact, "active": true })
        .collect();
    let contacts = [
        doc! { "_id": oid(ALICE), "firstName": "Alice", "lastName": "Ng", "phoneNumber": "+1555" },
        doc! { "_id": oid(BOB), "firstName": "Bob", "phoneNumber": "+1666" },
        doc! { "_id": oid(CAROL), "lastName": "Diaz" },
    ];
    let unsubscribes = [doc! { "contactId": oid(BOB), "channelId": "ch-1" }];
    let failures = [doc! {
        "contactId": oid(CAROL),
        "errorDetails": [ { "code": 30003, "description": "Unreachable handset" } ],
        "errorMessages": [ "Unreachable handset" ],
    }];

    RollupRecords {
        groups: decode_all(&groups, convert::contact_group),
        memberships: decode_all(&memberships, convert::group_membership),
        contacts: decode_all(&contacts, convert::contact),
        unsubscribes: decode_all(&unsubscribes, convert::unsubscribe),
        failures: decode_all(&failures, convert::delivery_failure),
    }
}

#[test]
fn test_mixed_identifier_forms_join() {
    let records = records();
    let org = convert::key_from_bson(&Bson::ObjectId(oid(ORG))).unwrap();
    let rollup = rollup_organization(&org, &records.input());

    assert_eq!(rollup.groups.len(), 1);
    assert_eq!(rollup.totals.total, 3);
    assert_eq!(rollup.totals.active, 1);
    assert_eq!(rollup.totals.unsubscribed, 1);
    assert_eq!(rollup.totals.undeliverable, 1);

    let statuses: Vec<ContactStatus> = rollup.groups[0]
        .contacts
        .iter()
        .map(|contact| contact.status)
        .collect();
    assert_eq!(
        statuses,
        vec![
            ContactStatus::Active,
            ContactStatus::Unsubscribed,
            ContactStatus::Undeliverable
        ]
    );
    assert_eq!(rollup.groups[0].contacts[2].name, "Diaz");
}

#[test]
fn test_summary_document_shape() {
    let records = records();
    let organization = convert::organization(
        &doc! { "_id": oid(ORG), "legalEntityName": "Acme Clinics" },
        "organizations",
    )
    .unwrap();
    let rollup = rollup_organization(&organization.id, &records.input());
    let generated_at = Utc.with_ymd_and_hms(2025, 3, 30, 12, 0, 0).unwrap();
    let summary = ReportSummary::from_rollup(&organization, &rollup, generated_at);

    let document = convert::summary_to_document(&summary);
    assert_eq!(document.get_object_id("organizationId").unwrap(), oid(ORG));
    assert_eq!(document.get_str("reportType").unwrap(), "contact_analysis");
    assert_eq!(
        document.get_datetime("generatedAt").unwrap().timestamp_millis(),
        generated_at.timestamp_millis()
    );

    let totals = document.get_document("summary").unwrap();
    assert_eq!(totals.get_i64("totalContacts").unwrap(), 3);
    assert_eq!(totals.get_i64("undeliverableContacts").unwrap(), 1);
    let rate = totals.get_f64("errorRate").unwrap();
    assert!((rate - 100.0 / 3.0).abs() < 1e-9);

    let errors = document.get_array("errorAnalysis").unwrap();
    let first = errors[0].as_document().unwrap();
    assert_eq!(first.get_i32("errorCode").unwrap(), 30003);
    assert_eq!(first.get_str("description").unwrap(), "Unreachable handset");

    let groups = document.get_array("groupDetails").unwrap();
    let issues = groups[0]
        .as_document()
        .unwrap()
        .get_array("contactsWithIssues")
        .unwrap();
    assert_eq!(issues.len(), 2);
    let json = Bson::Array(issues.clone()).into_relaxed_extjson();
    assert_eq!(json[0]["status"], "unsubscribed");
    assert_eq!(json[1]["errors"][0], "Unreachable handset");
}

#[test]
fn test_native_and_text_dates_roll_up_alike() {
    let day = NaiveDate::from_ymd_opt(2025, 3, 29).unwrap();
    let window = DayWindow::for_day(day);
    let native = Utc.with_ymd_and_hms(2025, 3, 29, 9, 0, 0).unwrap();

    let messages = [
        doc! {
            "_id": oid("64a0000000000000000000f1"),
            "to": "+15550100",
            "status": "undelivered",
            "direction": "outbound-api",
            "error_code": 30003,
            "organizationId": oid(ORG),
            "channelId": "ch-1",
            "date_sent": instant_to_bson(native),
        },
        doc! {
            "_id": oid("64a0000000000000000000f2"),
            "to": "+15550100",
            "status": "undelivered",
            "direction": "outbound-api",
            "error_code": "30005",
            "organizationId": ORG,
            "channelId": "ch-1",
            "date_sent": "2025-03-29T18:30:00Z",
        },
    ];
    let channels = [doc! {
        "organizationId": ORG,
        "channelId": "ch-1",
        "organizationName": "Acme Clinics",
        "channelName": "Main line",
    }];
    let messages = decode_all(&messages, convert::message);
    let channels = decode_all(&channels, convert::organization_channel);

    let daily = daily_by_destination(&messages, &channels, &window).unwrap();
    assert_eq!(daily.len(), 1);
    assert_eq!(daily[0].error_count, Some(2));
    assert_eq!(daily[0].error_code, ErrorCode::Numeric(30005));
    assert_eq!(daily[0].organization_name, "Acme Clinics");

    let latest = latest_by_destination(&messages, &channels).unwrap();
    let document = convert::row_to_document(&latest[0]);
    assert_eq!(document.get_str("date_sent").unwrap(), "2025-03-29T18:30:00Z");
    assert_eq!(document.get_object_id("organizationId").unwrap(), oid(ORG));
    assert_eq!(document.get_str("channelId").unwrap(), "ch-1");
    assert_eq!(document.get_str("channelName").unwrap(), "Main line");
    assert!(!document.contains_key("report_date"));

    let document = convert::row_to_document(&daily[0]);
    assert_eq!(document.get_str("report_date").unwrap(), "2025-03-29");
    assert_eq!(document.get_i64("error_count").unwrap(), 2);
}

#[test]
fn test_campaign_decoding_keeps_missing_created_at() {
    let campaigns = [
        doc! { "name": "spring", "status": "running", "createdAt": "2025-03-30T10:00:00Z" },
        doc! { "name": "legacy" },
    ];
    let campaigns = decode_all(&campaigns, convert::campaign);
    assert!(campaigns[0].created_at.is_some());
    assert!(campaigns[1].created_at.is_none());
    assert_eq!(campaigns[1].status, "");

    let window = DayWindow::for_day(NaiveDate::from_ymd_opt(2025, 3, 30).unwrap());
    let rows = delivery_report_core::campaigns_created_in(&campaigns, &window).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].created_at, "2025-03-30 10:00:00");
}

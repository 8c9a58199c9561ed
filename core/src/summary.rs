//! Persisted shape of a contact analysis run.
//!
//! A [`ReportSummary`] is built once per run from an
//! [`OrganizationRollup`] and never modified afterwards. Field names are
//! camelCase to match the documents already in the report collection.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::rollup::{ContactStatus, GroupStats, OrganizationRollup};
use crate::types::{ErrorCode, Organization, RecordKey};

/// Report type tag stored with every contact analysis document.
pub const CONTACT_ANALYSIS_REPORT_TYPE: &str = "contact_analysis";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub organization_id: RecordKey,
    pub organization_name: String,
    pub report_type: String,
    pub generated_at: DateTime<Utc>,
    pub summary: SummaryBlock,
    pub error_analysis: Vec<ErrorAnalysisEntry>,
    pub group_details: Vec<GroupDetail>,
}

/// Run-level totals. `error_rate` is stored unrounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryBlock {
    pub total_contacts: u64,
    pub active_contacts: u64,
    pub unsubscribed_contacts: u64,
    pub undeliverable_contacts: u64,
    pub error_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorAnalysisEntry {
    pub error_code: ErrorCode,
    pub count: u64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDetail {
    pub name: String,
    pub total_contacts: u64,
    pub active_contacts: u64,
    pub unsubscribed: u64,
    pub undeliverable: u64,
    pub error_rate: f64,
    pub contacts_with_issues: Vec<ContactIssue>,
}

/// A non-active contact listed under its group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactIssue {
    pub id: RecordKey,
    pub name: String,
    pub phone: String,
    pub status: ContactStatus,
    pub errors: Vec<String>,
}

impl ReportSummary {
    /// Snapshots a rollup for `organization` at `generated_at`.
    pub fn from_rollup(
        organization: &Organization,
        rollup: &OrganizationRollup,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let totals = rollup.totals;
        Self {
            organization_id: organization.id.clone(),
            organization_name: organization.name.clone(),
            report_type: CONTACT_ANALYSIS_REPORT_TYPE.to_string(),
            generated_at,
            summary: SummaryBlock {
                total_contacts: totals.total,
                active_contacts: totals.active,
                unsubscribed_contacts: totals.unsubscribed,
                undeliverable_contacts: totals.undeliverable,
                error_rate: rollup.error_rate(),
            },
            error_analysis: rollup
                .errors
                .iter()
                .map(|(code, tally)| ErrorAnalysisEntry {
                    error_code: code.clone(),
                    count: tally.count,
                    description: tally.description.clone(),
                })
                .collect(),
            group_details: rollup.groups.iter().map(group_detail).collect(),
        }
    }
}

fn group_detail(stats: &GroupStats) -> GroupDetail {
    GroupDetail {
        name: stats.name.clone(),
        total_contacts: stats.counts.total,
        active_contacts: stats.counts.active,
        unsubscribed: stats.counts.unsubscribed,
        undeliverable: stats.counts.undeliverable,
        error_rate: stats.error_rate(),
        contacts_with_issues: stats
            .contacts_with_issues()
            .map(|contact| ContactIssue {
                id: contact.id.clone(),
                name: contact.name.clone(),
                phone: contact.phone.clone(),
                status: contact.status,
                errors: contact.errors.clone(),
            })
            .collect(),
    }
}

//! Group/contact rollup for one organization.
//!
//! Works over materialized record sets: the caller fetches groups,
//! memberships, contacts, unsubscribe records and delivery-failure records
//! and hands them over as a [`RollupInput`]. The rollup walks each active
//! group of the organization, resolves its active members, classifies
//! every contact and sums the classifications per group and per run.
//!
//! Classification precedence is fixed: an opt-out wins over a delivery
//! failure, and a contact without either record is active.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::types::{
    Contact, ContactGroup, DeliveryFailureRecord, ErrorCode, ErrorDetail, GroupMembership,
    RecordKey, UnsubscribeRecord,
};

/// Description used for codes whose entries carry no description.
pub const UNKNOWN_ERROR_DESCRIPTION: &str = "Unknown error";

/// Deliverability status of one contact within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    Active,
    Unsubscribed,
    Undeliverable,
}

impl ContactStatus {
    /// Applies the classification precedence.
    ///
    /// ```
    /// use delivery_report_core::ContactStatus;
    ///
    /// assert_eq!(ContactStatus::classify(true, true), ContactStatus::Unsubscribed);
    /// assert_eq!(ContactStatus::classify(false, true), ContactStatus::Undeliverable);
    /// assert_eq!(ContactStatus::classify(false, false), ContactStatus::Active);
    /// ```
    pub fn classify(unsubscribed: bool, has_delivery_failure: bool) -> Self {
        if unsubscribed {
            Self::Unsubscribed
        } else if has_delivery_failure {
            Self::Undeliverable
        } else {
            Self::Active
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Unsubscribed => "unsubscribed",
            Self::Undeliverable => "undeliverable",
        }
    }
}

impl fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `count / total * 100`, or `0.0` when `total` is zero.
pub fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// Classification counts for a group or a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContactCounts {
    pub total: u64,
    pub active: u64,
    pub unsubscribed: u64,
    pub undeliverable: u64,
}

impl ContactCounts {
    pub fn record(&mut self, status: ContactStatus) {
        self.total += 1;
        match status {
            ContactStatus::Active => self.active += 1,
            ContactStatus::Unsubscribed => self.unsubscribed += 1,
            ContactStatus::Undeliverable => self.undeliverable += 1,
        }
    }

    /// Adds another set of counts into this one.
    pub fn absorb(&mut self, other: &ContactCounts) {
        self.total += other.total;
        self.active += other.active;
        self.unsubscribed += other.unsubscribed;
        self.undeliverable += other.undeliverable;
    }

    /// Undeliverable share of the total, in percent.
    pub fn error_rate(&self) -> f64 {
        percentage(self.undeliverable, self.total)
    }
}

/// Running count and representative description for one error code.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorTally {
    pub count: u64,
    pub description: String,
    source: RecordKey,
}

/// Error-code histogram, ordered by code.
///
/// The description kept for a code comes from the smallest contact key
/// that reported it, so the result does not depend on record order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorHistogram {
    entries: BTreeMap<ErrorCode, ErrorTally>,
}

impl ErrorHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one error entry reported by `contact`.
    pub fn record(&mut self, detail: &ErrorDetail, contact: &RecordKey) {
        let description = if detail.description.trim().is_empty() {
            UNKNOWN_ERROR_DESCRIPTION.to_string()
        } else {
            detail.description.clone()
        };
        match self.entries.get_mut(&detail.code) {
            Some(tally) => {
                tally.count += 1;
                if *contact < tally.source {
                    tally.description = description;
                    tally.source = contact.clone();
                }
            }
            None => {
                self.entries.insert(
                    detail.code.clone(),
                    ErrorTally {
                        count: 1,
                        description,
                        source: contact.clone(),
                    },
                );
            }
        }
    }

    pub fn get(&self, code: &ErrorCode) -> Option<&ErrorTally> {
        self.entries.get(code)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ErrorCode, &ErrorTally)> {
        self.entries.iter()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.entries.values().map(|tally| tally.count).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One classified contact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactDetail {
    pub id: RecordKey,
    pub name: String,
    pub phone: String,
    pub status: ContactStatus,
    /// Human-readable error messages from the delivery-failure record.
    pub errors: Vec<String>,
    /// Coded entries from the delivery-failure record.
    pub error_details: Vec<ErrorDetail>,
}

/// Statistics for one group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupStats {
    pub group_id: RecordKey,
    pub name: String,
    pub counts: ContactCounts,
    pub errors: ErrorHistogram,
    /// Every resolved member, in membership order.
    pub contacts: Vec<ContactDetail>,
}

impl GroupStats {
    fn new(group: &ContactGroup) -> Self {
        Self {
            group_id: group.id.clone(),
            name: group.name.clone(),
            counts: ContactCounts::default(),
            errors: ErrorHistogram::new(),
            contacts: Vec::new(),
        }
    }

    pub fn error_rate(&self) -> f64 {
        self.counts.error_rate()
    }

    /// Members that are not active.
    pub fn contacts_with_issues(&self) -> impl Iterator<Item = &ContactDetail> {
        self.contacts
            .iter()
            .filter(|contact| contact.status != ContactStatus::Active)
    }
}

/// Result of the organization rollup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrganizationRollup {
    pub groups: Vec<GroupStats>,
    pub totals: ContactCounts,
    pub errors: ErrorHistogram,
}

impl OrganizationRollup {
    pub fn error_rate(&self) -> f64 {
        self.totals.error_rate()
    }
}

/// Record sets the rollup joins over.
#[derive(Debug, Clone, Copy, Default)]
pub struct RollupInput<'a> {
    pub groups: &'a [ContactGroup],
    pub memberships: &'a [GroupMembership],
    pub contacts: &'a [Contact],
    pub unsubscribes: &'a [UnsubscribeRecord],
    pub failures: &'a [DeliveryFailureRecord],
}

/// Computes per-group and run-level statistics for `organization`.
///
/// Groups that are inactive or owned by another organization are ignored,
/// as are inactive memberships and memberships whose contact does not
/// exist. A contact listed twice in one group is counted once.
pub fn rollup_organization(
    organization: &RecordKey,
    input: &RollupInput<'_>,
) -> OrganizationRollup {
    let contacts: HashMap<&RecordKey, &Contact> = input
        .contacts
        .iter()
        .map(|contact| (&contact.id, contact))
        .collect();
    let unsubscribed: HashSet<&RecordKey> = input
        .unsubscribes
        .iter()
        .filter(|record| record.channel_id.is_some())
        .map(|record| &record.contact_id)
        .collect();
    let mut failures: HashMap<&RecordKey, &DeliveryFailureRecord> = HashMap::new();
    for record in input.failures {
        failures.entry(&record.contact_id).or_insert(record);
    }

    let mut rollup = OrganizationRollup::default();

    for group in input
        .groups
        .iter()
        .filter(|group| group.active && &group.organization_id == organization)
    {
        let mut stats = GroupStats::new(group);
        let mut seen: HashSet<&RecordKey> = HashSet::new();

        for membership in input
            .memberships
            .iter()
            .filter(|membership| membership.active && membership.group_id == group.id)
        {
            if !seen.insert(&membership.contact_id) {
                continue;
            }
            let Some(contact) = contacts.get(&membership.contact_id) else {
                debug!(
                    group = %group.name,
                    contact = %membership.contact_id,
                    "membership references a missing contact"
                );
                continue;
            };

            let failure = failures.get(&contact.id).copied();
            let status =
                ContactStatus::classify(unsubscribed.contains(&contact.id), failure.is_some());
            let (errors, error_details) = match (status, failure) {
                (ContactStatus::Undeliverable, Some(record)) => {
                    for detail in &record.error_details {
                        stats.errors.record(detail, &contact.id);
                        rollup.errors.record(detail, &contact.id);
                    }
                    (record.error_messages.clone(), record.error_details.clone())
                }
                _ => (Vec::new(), Vec::new()),
            };

            stats.counts.record(status);
            stats.contacts.push(ContactDetail {
                id: contact.id.clone(),
                name: contact.display_name(),
                phone: contact.phone.clone(),
                status,
                errors,
                error_details,
            });
        }

        debug!(
            group = %stats.name,
            total = stats.counts.total,
            undeliverable = stats.counts.undeliverable,
            "group rolled up"
        );
        rollup.totals.absorb(&stats.counts);
        rollup.groups.push(stats);
    }

    rollup
}

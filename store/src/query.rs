//! Record-set queries for the report jobs.
//!
//! [`ReportQuery`] wraps a [`StoreHandle`] and the configured collection
//! names. Queries only narrow what is fetched; the exact selection rules
//! (activity flags, day windows, dedup) are applied in-process by the
//! aggregation code, which keeps the two forms of every identifier and
//! timestamp behind one normalization step.
//!
//! # Example
//!
//! ```no_run
//! use delivery_report_config::{ReportConfig, PROD_MONGO_URI};
//! use delivery_report_store::{ReportQuery, StoreHandle};
//!
//! let config = ReportConfig::load(None).unwrap();
//! let handle = StoreHandle::from_config(&config, PROD_MONGO_URI).unwrap();
//! let query = ReportQuery::new(&handle, config.collections());
//!
//! let organization = query.find_organization("64a1f0c2e4b0a1b2c3d4e5f6").unwrap();
//! let records = query.rollup_records(&organization.id).unwrap();
//! println!("{} groups", records.groups.len());
//! ```

use delivery_report_config::CollectionNames;
use delivery_report_core::{
    Campaign, Contact, ContactGroup, DayWindow, DeliveryFailureRecord, GroupMembership, Message,
    OUTBOUND_API_DIRECTION, Organization, OrganizationChannelInfo, RecordKey, RollupInput,
    UNDELIVERED_STATUS, UnsubscribeRecord,
};
use chrono::Duration;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document, doc};
use tracing::{debug, info, warn};

use crate::connection::StoreHandle;
use crate::convert::{self, instant_to_bson, key_variants};
use crate::error::{Result, StoreError};

/// Longest sample document rendered into a not-found diagnostic.
pub const SAMPLE_LIMIT: usize = 500;

/// Record sets the contact rollup joins over.
#[derive(Debug, Clone, Default)]
pub struct RollupRecords {
    pub groups: Vec<ContactGroup>,
    pub memberships: Vec<GroupMembership>,
    pub contacts: Vec<Contact>,
    pub unsubscribes: Vec<UnsubscribeRecord>,
    pub failures: Vec<DeliveryFailureRecord>,
}

impl RollupRecords {
    pub fn input(&self) -> RollupInput<'_> {
        RollupInput {
            groups: &self.groups,
            memberships: &self.memberships,
            contacts: &self.contacts,
            unsubscribes: &self.unsubscribes,
            failures: &self.failures,
        }
    }
}

/// Read-side access to the report collections.
pub struct ReportQuery<'a> {
    handle: &'a StoreHandle,
    collections: &'a CollectionNames,
}

impl<'a> ReportQuery<'a> {
    pub fn new(handle: &'a StoreHandle, collections: &'a CollectionNames) -> Self {
        Self {
            handle,
            collections,
        }
    }

    /// Looks up an organization by the hex form of its ObjectId.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidIdentifier`] if `raw_id` is not an ObjectId.
    /// - [`StoreError::NotFound`] if no organization has that id; the
    ///   error carries the collection size and a truncated sample.
    pub fn find_organization(&self, raw_id: &str) -> Result<Organization> {
        let name = &self.collections.organizations;
        let oid = ObjectId::parse_str(raw_id.trim())
            .map_err(|_| StoreError::InvalidIdentifier(raw_id.to_string()))?;
        let collection = self.handle.collection(name);

        let total = collection.count_documents(doc! {}).run()?;
        debug!(collection = %name, total, "organization count");

        match collection.find_one(doc! { "_id": oid }).run()? {
            Some(found) => {
                let organization = convert::organization(&found, name)?;
                info!(organization = %organization.name, "found organization");
                Ok(organization)
            }
            None => {
                let sample = if total > 0 {
                    collection
                        .find_one(doc! {})
                        .run()?
                        .map(|sample| truncate(&sample.to_string(), SAMPLE_LIMIT))
                } else {
                    None
                };
                Err(StoreError::NotFound {
                    collection: name.clone(),
                    id: oid.to_hex(),
                    total,
                    sample,
                })
            }
        }
    }

    /// Fetches every record set the rollup of `organization` needs.
    pub fn rollup_records(&self, organization: &RecordKey) -> Result<RollupRecords> {
        let groups = self.contact_groups(organization)?;
        let memberships = self.group_memberships(&groups)?;
        let contact_ids: Vec<RecordKey> = memberships
            .iter()
            .map(|membership| membership.contact_id.clone())
            .collect();
        let contacts = self.contacts(&contact_ids)?;
        let unsubscribes = self.unsubscribes(&contact_ids)?;
        let failures = self.delivery_failures(&contact_ids)?;
        info!(
            groups = groups.len(),
            memberships = memberships.len(),
            contacts = contacts.len(),
            unsubscribes = unsubscribes.len(),
            failures = failures.len(),
            "fetched rollup records"
        );
        Ok(RollupRecords {
            groups,
            memberships,
            contacts,
            unsubscribes,
            failures,
        })
    }

    /// Active groups whose `organizationId` is either form of `organization`.
    pub fn contact_groups(&self, organization: &RecordKey) -> Result<Vec<ContactGroup>> {
        let filter = doc! {
            "organizationId": { "$in": key_variants(organization) },
            "active": true,
        };
        self.fetch(&self.collections.contact_groups, filter, convert::contact_group)
    }

    /// Memberships referencing any of `groups`.
    pub fn group_memberships(&self, groups: &[ContactGroup]) -> Result<Vec<GroupMembership>> {
        let ids: Vec<RecordKey> = groups.iter().map(|group| group.id.clone()).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let filter = doc! { "groupId": { "$in": all_variants(&ids) } };
        self.fetch(&self.collections.group_memberships, filter, convert::group_membership)
    }

    pub fn contacts(&self, ids: &[RecordKey]) -> Result<Vec<Contact>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let filter = doc! { "_id": { "$in": all_variants(ids) } };
        self.fetch(&self.collections.contacts, filter, convert::contact)
    }

    /// Opt-out records of `ids` that are bound to a channel.
    pub fn unsubscribes(&self, ids: &[RecordKey]) -> Result<Vec<UnsubscribeRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let filter = doc! {
            "contactId": { "$in": all_variants(ids) },
            "channelId": { "$exists": true },
        };
        self.fetch(&self.collections.unsubscribed_contacts, filter, convert::unsubscribe)
    }

    pub fn delivery_failures(&self, ids: &[RecordKey]) -> Result<Vec<DeliveryFailureRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let filter = doc! { "contactId": { "$in": all_variants(ids) } };
        self.fetch(&self.collections.invalid_contacts, filter, convert::delivery_failure)
    }

    /// Undelivered outbound messages, optionally narrowed to `window`.
    ///
    /// Native `date_sent` values are filtered by range; text values by an
    /// ISO day prefix, and are windowed exactly after normalization.
    pub fn undelivered_messages(&self, window: Option<&DayWindow>) -> Result<Vec<Message>> {
        let mut filter = doc! {
            "status": UNDELIVERED_STATUS,
            "direction": OUTBOUND_API_DIRECTION,
        };
        if let Some(window) = window {
            filter.insert("$or", window_clause("date_sent", window));
        }
        self.fetch(&self.collections.messages, filter, convert::message)
    }

    pub fn organization_channels(&self) -> Result<Vec<OrganizationChannelInfo>> {
        self.fetch(
            &self.collections.organization_channels,
            doc! {},
            convert::organization_channel,
        )
    }

    /// Campaigns whose `createdAt` may fall inside `window`.
    pub fn campaigns(&self, window: &DayWindow) -> Result<Vec<Campaign>> {
        let filter = doc! { "$or": window_clause("createdAt", window) };
        self.fetch(&self.collections.campaigns, filter, convert::campaign)
    }

    /// Runs `filter` against `collection` and decodes every match.
    ///
    /// Documents that fail to decode are skipped with a warning; driver
    /// errors abort the query.
    fn fetch<T>(
        &self,
        collection: &str,
        filter: Document,
        decode: fn(&Document, &str) -> Result<T>,
    ) -> Result<Vec<T>> {
        debug!(collection, %filter, "find");
        let cursor = self.handle.collection(collection).find(filter).run()?;
        let mut records = Vec::new();
        let mut skipped = 0usize;
        for document in cursor {
            match decode(&document?, collection) {
                Ok(record) => records.push(record),
                Err(err) => {
                    skipped += 1;
                    debug!(error = %err, "skipping document");
                }
            }
        }
        if skipped > 0 {
            warn!(collection, skipped, "skipped undecodable documents");
        }
        debug!(collection, fetched = records.len(), "fetched");
        Ok(records)
    }
}

fn all_variants(ids: &[RecordKey]) -> Vec<Bson> {
    let mut seen = std::collections::HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(*id))
        .flat_map(key_variants)
        .collect()
}

/// `$or` arms matching native dates inside `window` or any text value.
/// `$or` arms selecting `field` inside `window`: native dates by range,
/// text dates by an ISO day prefix. The neighbouring days are included
/// so strings carrying a UTC offset reach the in-process window check.
fn window_clause(field: &str, window: &DayWindow) -> Vec<Bson> {
    vec![
        Bson::Document(doc! {
            field: {
                "$gte": instant_to_bson(window.start()),
                "$lte": instant_to_bson(window.end()),
            }
        }),
        Bson::Document(doc! { field: { "$regex": day_prefix_pattern(window) } }),
    ]
}

fn day_prefix_pattern(window: &DayWindow) -> String {
    let days: Vec<String> = [-1, 0, 1]
        .into_iter()
        .map(|offset| {
            (window.day() + Duration::days(offset))
                .format("%Y-%m-%d")
                .to_string()
        })
        .collect();
    format!("^({})", days.join("|"))
}

fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

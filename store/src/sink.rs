//! Report writes.
//!
//! Reports are append-only: every run inserts new documents and nothing
//! is ever updated.

use delivery_report_core::{ReportSummary, UndeliveredRow};
use mongodb::bson::Bson;
use tracing::info;

use crate::connection::StoreHandle;
use crate::convert::{row_to_document, summary_to_document};
use crate::error::Result;

/// Write-side access to one deployment.
pub struct ReportSink<'a> {
    handle: &'a StoreHandle,
}

impl<'a> ReportSink<'a> {
    pub fn new(handle: &'a StoreHandle) -> Self {
        Self { handle }
    }

    /// Inserts a contact analysis summary and returns its identifier.
    pub fn insert_summary(&self, collection: &str, summary: &ReportSummary) -> Result<String> {
        let result = self
            .handle
            .collection(collection)
            .insert_one(summary_to_document(summary))
            .run()?;
        let id = id_to_string(&result.inserted_id);
        info!(
            database = self.handle.database_name(),
            collection,
            id = %id,
            "saved report"
        );
        Ok(id)
    }

    /// Inserts undelivered rows and returns their identifiers in row order.
    ///
    /// An empty slice performs no write.
    pub fn insert_rows(&self, collection: &str, rows: &[UndeliveredRow]) -> Result<Vec<String>> {
        if rows.is_empty() {
            info!(collection, "no rows to insert");
            return Ok(Vec::new());
        }
        let documents: Vec<_> = rows.iter().map(row_to_document).collect();
        let result = self
            .handle
            .collection(collection)
            .insert_many(documents)
            .run()?;

        let mut indexed: Vec<(usize, String)> = result
            .inserted_ids
            .iter()
            .map(|(index, id)| (*index, id_to_string(id)))
            .collect();
        indexed.sort_unstable_by_key(|(index, _)| *index);
        let ids: Vec<String> = indexed.into_iter().map(|(_, id)| id).collect();
        info!(
            database = self.handle.database_name(),
            collection,
            inserted = ids.len(),
            "inserted rows"
        );
        Ok(ids)
    }
}

fn id_to_string(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}

//! Same-day campaign selection.

use serde::Serialize;
use tracing::warn;

use crate::error::Result;
use crate::types::Campaign;
use crate::window::DayWindow;

/// Display format for campaign creation times.
pub const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Campaign row as shown in the CSV export and the email table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignRow {
    pub name: String,
    pub status: String,
    pub created_at: String,
}

/// Keeps campaigns created inside `window`, in stored order.
///
/// Campaigns without a creation time are skipped, as are campaigns whose
/// text `createdAt` cannot be parsed (with a warning).
pub fn campaigns_created_in(
    campaigns: &[Campaign],
    window: &DayWindow,
) -> Result<Vec<CampaignRow>> {
    let mut rows = Vec::new();
    for campaign in campaigns {
        let Some(created_at) = campaign.created_at.as_ref() else {
            continue;
        };
        let instant = match created_at.instant() {
            Ok(instant) => instant,
            Err(err) => {
                warn!(campaign = %campaign.name, error = %err, "skipping campaign");
                continue;
            }
        };
        if window.contains(instant) {
            rows.push(CampaignRow {
                name: campaign.name.clone(),
                status: campaign.status.clone(),
                created_at: instant.format(CREATED_AT_FORMAT).to_string(),
            });
        }
    }
    Ok(rows)
}

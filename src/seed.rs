use chrono::Utc;
use tracing::info;

use crate::campaign::NewCampaign;
use crate::database::Database;
use crate::error::Error;

const DEFAULT_CAMPAIGNS: [&str; 2] = ["summer launch", "black friday"];

/// Fills an empty store with the default campaigns. Leaves existing data alone.
pub async fn seed(db: &dyn Database) -> Result<(), Error> {
    let mut session = db.open_session().await?;

    let existing = session.campaigns().fetch_campaigns().await?;
    if !existing.is_empty() {
        info!(count = existing.len(), "campaigns already present, skipping seed");
        return Ok(());
    }

    let now = Utc::now();
    for name in DEFAULT_CAMPAIGNS {
        let campaign = NewCampaign {
            name: name.to_string(),
            due_date: Some(now),
            created_at: now,
        };

        let campaign = session.campaigns().insert_campaign(campaign).await?;
        info!(campaign_id = ?campaign.campaign_id, "seeded campaign: {}", campaign.name);
    }

    Ok(())
}

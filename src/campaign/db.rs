use std::ops::Range;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use rand::Rng;
use sqlx::FromRow;

use crate::database::{MemoryCampaignStore, SqliteCampaignStore};
use crate::error::Error;

use super::{Campaign, CampaignId, NewCampaign};

const SELECT_CAMPAIGNS: &str = "SELECT campaign_id, name, due_date, created_at FROM campaigns";
const SELECT_CAMPAIGN_BY_ID: &str =
    "SELECT campaign_id, name, due_date, created_at FROM campaigns WHERE campaign_id = ?";
const INSERT_CAMPAIGN: &str = "INSERT INTO campaigns (name, due_date, created_at) VALUES (?, ?, ?)";
const UPDATE_CAMPAIGN: &str = "UPDATE campaigns SET name = ?, due_date = ? WHERE campaign_id = ?";
const DELETE_CAMPAIGN: &str = "DELETE FROM campaigns WHERE campaign_id = ?";

const MEMORY_ID_RANGE: Range<i64> = 100..1000;
const MEMORY_ID_ATTEMPTS: usize = 16;

#[async_trait]
pub trait CampaignStore: Send {
    /// Stores the campaign under a newly generated id.
    async fn insert_campaign(&mut self, campaign: NewCampaign) -> Result<Campaign, Error>;

    async fn fetch_campaigns(&mut self) -> Result<Vec<Campaign>, Error>;

    async fn fetch_campaign_by_id(
        &mut self,
        campaign_id: CampaignId,
    ) -> Result<Option<Campaign>, Error>;

    /// Overwrites the name and due date. Returns false if no campaign matched.
    async fn update_campaign(&mut self, campaign: &Campaign) -> Result<bool, Error>;

    /// Returns false if no campaign matched.
    async fn delete_campaign(&mut self, campaign_id: CampaignId) -> Result<bool, Error>;
}

#[derive(FromRow)]
struct CampaignRow {
    campaign_id: i64,
    name: String,
    due_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<CampaignRow> for Campaign {
    fn from(row: CampaignRow) -> Campaign {
        Campaign {
            campaign_id: CampaignId::new(row.campaign_id),
            name: row.name,
            due_date: row.due_date,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl CampaignStore for SqliteCampaignStore {
    #[tracing::instrument(skip(self))]
    async fn insert_campaign(&mut self, campaign: NewCampaign) -> Result<Campaign, Error> {
        let result = sqlx::query(INSERT_CAMPAIGN)
            .bind(campaign.name.as_str())
            .bind(campaign.due_date)
            .bind(campaign.created_at)
            .execute(&mut *self.conn)
            .await?;

        Ok(campaign.with_id(CampaignId::new(result.last_insert_rowid())))
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_campaigns(&mut self) -> Result<Vec<Campaign>, Error> {
        let campaigns: Vec<Campaign> = sqlx::query_as::<_, CampaignRow>(SELECT_CAMPAIGNS)
            .fetch(&mut *self.conn)
            .map_ok(Campaign::from)
            .try_collect()
            .await?;

        Ok(campaigns)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_campaign_by_id(
        &mut self,
        campaign_id: CampaignId,
    ) -> Result<Option<Campaign>, Error> {
        let campaign = sqlx::query_as::<_, CampaignRow>(SELECT_CAMPAIGN_BY_ID)
            .bind(campaign_id.value())
            .fetch_optional(&mut *self.conn)
            .await?
            .map(Campaign::from);

        Ok(campaign)
    }

    #[tracing::instrument(skip(self))]
    async fn update_campaign(&mut self, campaign: &Campaign) -> Result<bool, Error> {
        let result = sqlx::query(UPDATE_CAMPAIGN)
            .bind(campaign.name.as_str())
            .bind(campaign.due_date)
            .bind(campaign.campaign_id.value())
            .execute(&mut *self.conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_campaign(&mut self, campaign_id: CampaignId) -> Result<bool, Error> {
        let result = sqlx::query(DELETE_CAMPAIGN)
            .bind(campaign_id.value())
            .execute(&mut *self.conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CampaignStore for MemoryCampaignStore {
    #[tracing::instrument(skip(self))]
    async fn insert_campaign(&mut self, campaign: NewCampaign) -> Result<Campaign, Error> {
        let mut campaigns = self.campaigns.lock().await;
        let campaign = campaign.with_id(next_memory_id(&campaigns));
        campaigns.push(campaign.clone());

        Ok(campaign)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_campaigns(&mut self) -> Result<Vec<Campaign>, Error> {
        let campaigns = self.campaigns.lock().await;

        Ok(campaigns.clone())
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_campaign_by_id(
        &mut self,
        campaign_id: CampaignId,
    ) -> Result<Option<Campaign>, Error> {
        let campaigns = self.campaigns.lock().await;
        let campaign = campaigns
            .iter()
            .find(|campaign| campaign.campaign_id == campaign_id)
            .cloned();

        Ok(campaign)
    }

    #[tracing::instrument(skip(self))]
    async fn update_campaign(&mut self, campaign: &Campaign) -> Result<bool, Error> {
        let mut campaigns = self.campaigns.lock().await;
        let existing = campaigns
            .iter_mut()
            .find(|existing| existing.campaign_id == campaign.campaign_id);

        match existing {
            Some(existing) => {
                existing.name = campaign.name.clone();
                existing.due_date = campaign.due_date;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn delete_campaign(&mut self, campaign_id: CampaignId) -> Result<bool, Error> {
        let mut campaigns = self.campaigns.lock().await;
        let index = campaigns
            .iter()
            .position(|campaign| campaign.campaign_id == campaign_id);

        match index {
            Some(index) => {
                campaigns.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Picks a random unused id, or one past the largest id if the draws keep colliding.
fn next_memory_id(campaigns: &[Campaign]) -> CampaignId {
    let is_taken = |value: i64| {
        campaigns
            .iter()
            .any(|campaign| campaign.campaign_id.value() == value)
    };

    let mut rng = rand::thread_rng();
    for _ in 0..MEMORY_ID_ATTEMPTS {
        let value = rng.gen_range(MEMORY_ID_RANGE);
        if !is_taken(value) {
            return CampaignId::new(value);
        }
    }

    let largest = campaigns
        .iter()
        .map(|campaign| campaign.campaign_id.value())
        .max()
        .unwrap_or(0);

    CampaignId::new(largest.max(MEMORY_ID_RANGE.end - 1) + 1)
}

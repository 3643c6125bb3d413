use chrono::{DateTime, Utc};

use crate::database::Session;
use crate::error::Error;

use super::{Campaign, CampaignId, NewCampaign};

#[tracing::instrument(skip(session))]
pub async fn create_campaign(
    session: &mut Session,
    name: String,
    due_date: Option<DateTime<Utc>>,
) -> Result<Campaign, Error> {
    let campaign = NewCampaign {
        name,
        due_date,
        created_at: Utc::now(),
    };

    let campaign = session.campaigns().insert_campaign(campaign).await?;

    Ok(campaign)
}

#[tracing::instrument(skip(session))]
pub async fn get_campaigns(session: &mut Session) -> Result<Vec<Campaign>, Error> {
    let campaigns = session.campaigns().fetch_campaigns().await?;

    Ok(campaigns)
}

#[tracing::instrument(skip(session))]
pub async fn get_campaign_by_id(
    session: &mut Session,
    campaign_id: CampaignId,
) -> Result<Campaign, Error> {
    let campaign = session
        .campaigns()
        .fetch_campaign_by_id(campaign_id)
        .await?
        .ok_or(Error::CampaignNotFound { campaign_id })?;

    Ok(campaign)
}

#[tracing::instrument(skip(session))]
pub async fn update_campaign(
    session: &mut Session,
    campaign_id: CampaignId,
    name: String,
    due_date: Option<DateTime<Utc>>,
) -> Result<Campaign, Error> {
    let mut campaign = get_campaign_by_id(session, campaign_id).await?;
    campaign.name = name;
    campaign.due_date = due_date;

    // the campaign may have been deleted since it was fetched
    if !session.campaigns().update_campaign(&campaign).await? {
        return Err(Error::CampaignNotFound { campaign_id });
    }

    Ok(campaign)
}

#[tracing::instrument(skip(session))]
pub async fn delete_campaign(session: &mut Session, campaign_id: CampaignId) -> Result<(), Error> {
    if !session.campaigns().delete_campaign(campaign_id).await? {
        return Err(Error::CampaignNotFound { campaign_id });
    }

    Ok(())
}

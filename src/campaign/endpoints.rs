use actix_web::web::{Json, Path};
use actix_web::{delete, get, post, put, HttpResponse};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::database::Session;
use crate::error::Error;

use super::{manager, Campaign, CampaignId};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CreateCampaignBody {
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_due_date")]
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct UpdateCampaignBody {
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_due_date")]
    pub due_date: Option<DateTime<Utc>>,
}

/// Accepts RFC 3339 timestamps, and timestamps without an offset read as UTC.
fn deserialize_due_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Option::<String>::deserialize(deserializer)? {
        Some(value) => value,
        None => return Ok(None),
    };

    if let Ok(due_date) = value.parse::<DateTime<Utc>>() {
        return Ok(Some(due_date));
    }

    let due_date = value
        .parse::<NaiveDateTime>()
        .map_err(|err| D::Error::custom(format!("invalid due_date {:?}: {}", value, err)))?;

    Ok(Some(Utc.from_utc_datetime(&due_date)))
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CampaignBody {
    pub campaign_id: CampaignId,
    pub name: String,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl CampaignBody {
    pub fn render(campaign: Campaign) -> CampaignBody {
        CampaignBody {
            campaign_id: campaign.campaign_id,
            name: campaign.name,
            due_date: campaign.due_date,
            created_at: campaign.created_at,
        }
    }
}

/// The envelope every successful campaign response is wrapped in.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DataBody<T> {
    pub data: T,
}

impl<T> DataBody<T> {
    pub fn new(data: T) -> DataBody<T> {
        DataBody { data }
    }
}

#[post("/campaigns")]
#[tracing::instrument(skip(session))]
pub async fn create_campaign(
    mut session: Session,
    body: Json<CreateCampaignBody>,
) -> Result<HttpResponse, Error> {
    let body = body.into_inner();

    let campaign = manager::create_campaign(&mut session, body.name, body.due_date).await?;

    Ok(HttpResponse::Created().json(DataBody::new(CampaignBody::render(campaign))))
}

#[get("/campaigns")]
#[tracing::instrument(skip(session))]
pub async fn get_campaigns(
    mut session: Session,
) -> Result<Json<DataBody<Vec<CampaignBody>>>, Error> {
    let campaigns = manager::get_campaigns(&mut session).await?;

    let body = campaigns.into_iter().map(CampaignBody::render).collect();

    Ok(Json(DataBody::new(body)))
}

#[get("/campaigns/{campaign_id}")]
#[tracing::instrument(skip(session))]
pub async fn get_campaign_by_id(
    mut session: Session,
    params: Path<CampaignId>,
) -> Result<Json<DataBody<CampaignBody>>, Error> {
    let campaign_id = params.into_inner();

    let campaign = manager::get_campaign_by_id(&mut session, campaign_id).await?;

    Ok(Json(DataBody::new(CampaignBody::render(campaign))))
}

#[put("/campaigns/{campaign_id}")]
#[tracing::instrument(skip(session))]
pub async fn update_campaign(
    mut session: Session,
    params: Path<CampaignId>,
    body: Json<UpdateCampaignBody>,
) -> Result<Json<DataBody<CampaignBody>>, Error> {
    let campaign_id = params.into_inner();
    let body = body.into_inner();

    let campaign =
        manager::update_campaign(&mut session, campaign_id, body.name, body.due_date).await?;

    Ok(Json(DataBody::new(CampaignBody::render(campaign))))
}

#[delete("/campaigns/{campaign_id}")]
#[tracing::instrument(skip(session))]
pub async fn delete_campaign(
    mut session: Session,
    params: Path<CampaignId>,
) -> Result<HttpResponse, Error> {
    let campaign_id = params.into_inner();

    manager::delete_campaign(&mut session, campaign_id).await?;

    Ok(HttpResponse::NoContent().finish())
}

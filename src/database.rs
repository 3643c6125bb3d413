use std::str::FromStr;
use std::sync::Arc;

use actix_web::dev::Payload;
use actix_web::web::Data;
use actix_web::{FromRequest, HttpRequest};
use async_trait::async_trait;
use futures::future::LocalBoxFuture;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Sqlite;
use tokio::sync::Mutex;
use tracing::info;

use crate::campaign::db::CampaignStore;
use crate::campaign::Campaign;
use crate::error::Error;

const CREATE_CAMPAIGNS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS campaigns (
        campaign_id INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT NOT NULL,
        due_date    TEXT,
        created_at  TEXT NOT NULL
    )";

#[async_trait]
pub trait Database: Send + Sync {
    /// Prepares the backing storage so that sessions can be opened.
    async fn initialize(&self) -> Result<(), Error>;

    async fn open_session(&self) -> Result<Session, Error>;
}

/// Store access scoped to a single request.
///
/// A session is acquired when a handler asks for one and is released when the
/// handler returns and the session is dropped. For the sqlite database this
/// holds a pooled connection for that duration.
pub struct Session {
    campaigns: Box<dyn CampaignStore>,
}

impl Session {
    pub fn new(campaigns: Box<dyn CampaignStore>) -> Session {
        Session { campaigns }
    }

    pub fn campaigns(&mut self) -> &mut dyn CampaignStore {
        self.campaigns.as_mut()
    }
}

impl FromRequest for Session {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Session, Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let db = req.app_data::<Data<dyn Database>>().cloned();
        Box::pin(async move {
            let db = db.ok_or_else(|| {
                Error::ExistentialState("no database registered with the app".into())
            })?;
            db.open_session().await
        })
    }
}

#[derive(Debug, Clone)]
pub struct SqliteDatabase {
    pool: SqlitePool,
}

pub struct SqliteCampaignStore {
    pub(crate) conn: PoolConnection<Sqlite>,
}

impl SqliteDatabase {
    pub async fn connect(url: &str, max_connections: u32) -> Result<SqliteDatabase, Error> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        let mut pool_options = SqlitePoolOptions::new().max_connections(max_connections);
        if url.contains(":memory:") || url.contains("mode=memory") {
            // an in-memory database is gone once its last connection closes,
            // so hold one open even while the pool is idle
            pool_options = pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        info!("connecting to db: {}", url);
        let pool = pool_options.connect_with(options).await?;

        Ok(SqliteDatabase { pool })
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    #[tracing::instrument(skip(self))]
    async fn initialize(&self) -> Result<(), Error> {
        sqlx::query(CREATE_CAMPAIGNS_TABLE)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn open_session(&self) -> Result<Session, Error> {
        let conn = self.pool.acquire().await?;

        Ok(Session::new(Box::new(SqliteCampaignStore { conn })))
    }
}

/// Keeps every campaign in a shared list for the life of the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    campaigns: Arc<Mutex<Vec<Campaign>>>,
}

pub struct MemoryCampaignStore {
    pub(crate) campaigns: Arc<Mutex<Vec<Campaign>>>,
}

impl MemoryDatabase {
    pub fn new() -> MemoryDatabase {
        MemoryDatabase::default()
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn initialize(&self) -> Result<(), Error> {
        Ok(())
    }

    async fn open_session(&self) -> Result<Session, Error> {
        Ok(Session::new(Box::new(MemoryCampaignStore {
            campaigns: Arc::clone(&self.campaigns),
        })))
    }
}

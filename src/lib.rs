use std::net::TcpListener;
use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::web::{self, Data, JsonConfig, PathConfig};
use actix_web::{get, App, HttpServer, ResponseError};
use serde::Serialize;
use tracing::info;
use tracing_actix_web::TracingLogger;

pub mod campaign;
pub mod database;
pub mod error;
pub mod seed;
pub mod settings;
pub mod typedid;

pub use campaign::{CampaignBody, CreateCampaignBody, DataBody, UpdateCampaignBody};
pub use database::{Database, MemoryDatabase, SqliteDatabase};
pub use error::Error;
pub use settings::{Settings, Storage};

#[derive(Serialize)]
struct IndexBody {
    message: &'static str,
}

#[get("/")]
async fn index() -> web::Json<IndexBody> {
    web::Json(IndexBody {
        message: "Hello World",
    })
}

pub fn app(
    db: Data<dyn Database>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(JsonConfig::default().error_handler(|err, _req| {
            // format json errors with custom format
            Error::InvalidJson(err).into()
        }))
        .app_data(PathConfig::default().error_handler(|err, _req| {
            // format path errors with custom format
            Error::InvalidPath(err).into()
        }))
        .app_data(db)
        .wrap(TracingLogger::default())
        .service(index)
        .service(campaign::endpoints::get_campaigns)
        .service(campaign::endpoints::get_campaign_by_id)
        .service(campaign::endpoints::create_campaign)
        .service(campaign::endpoints::update_campaign)
        .service(campaign::endpoints::delete_campaign)
        .default_service(web::to(|| async { Error::PathNotFound.error_response() }))
}

/// Opens the configured store, creating and seeding it as needed.
pub async fn connect(settings: &Settings) -> Result<Arc<dyn Database>, Error> {
    let db: Arc<dyn Database> = match settings.storage {
        Storage::Memory => Arc::new(MemoryDatabase::new()),
        Storage::Sqlite => Arc::new(
            SqliteDatabase::connect(&settings.database_url, settings.max_connections).await?,
        ),
    };

    db.initialize().await?;

    if settings.seed {
        seed::seed(db.as_ref()).await?;
    }

    Ok(db)
}

pub fn serve(listener: TcpListener, db: Arc<dyn Database>) -> Result<Server, Error> {
    let db = Data::from(db);
    let server = HttpServer::new(move || app(db.clone()))
        .listen(listener)?
        .run();

    Ok(server)
}

pub async fn run(settings: Settings) -> Result<(), Error> {
    let db = connect(&settings).await?;

    let listener = TcpListener::bind((settings.host.as_str(), settings.port))?;
    info!("listening on: {}", listener.local_addr()?);

    serve(listener, db)?.await?;

    Ok(())
}

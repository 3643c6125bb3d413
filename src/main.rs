use campaign_server::{Error, Settings};
use tracing::info;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> Result<(), Error> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log)),
        )
        .with_span_events(FmtSpan::NEW)
        .compact()
        .init();

    info!(storage = ?settings.storage, "starting campaign server");

    campaign_server::run(settings).await
}

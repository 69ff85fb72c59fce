//! Folio Server - portfolio content API

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use folio_server::{
    api,
    config::AppConfig,
    repository::{DocumentStore, Datastore, MemoryStore, PgDocumentStore, Repository},
    services::{blob::HttpBlobStore, email::SmtpMailer, Services},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("folio_server={},tower_http=debug", config.logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting Folio Server v{}", env!("CARGO_PKG_VERSION"));

    let timeout = Duration::from_millis(config.database.timeout_ms);
    let primary: Option<Arc<dyn DocumentStore>> = match &config.database.url {
        Some(url) => {
            let store = PgDocumentStore::connect_lazy(url, &config.database)?;
            match tokio::time::timeout(timeout, store.ensure_indexes()).await {
                Ok(Ok(())) => tracing::info!("Database migrations completed"),
                Ok(Err(e)) => tracing::warn!(error = %e, "Database unavailable at startup, serving from fallback store"),
                Err(_) => tracing::warn!("Database did not answer within {:?}, serving from fallback store", timeout),
            }
            Some(Arc::new(store))
        }
        None => {
            tracing::warn!("No database configured, running on the in-memory store");
            None
        }
    };

    let store = Datastore::new(primary, Arc::new(MemoryStore::seeded()), timeout);
    let repository = Repository::new(store);
    let services = Services::new(
        repository,
        &config,
        Arc::new(SmtpMailer::new(config.email.clone())),
        Arc::new(HttpBlobStore::new(&config.blob)?),
    )?;

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };
    let app = api::router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

//! Track Votes API Entry Point
//!
//! Serves vote casting, retraction and leaderboards over HTTP, backed by
//! PostgreSQL.

use std::env;
use std::sync::Arc;

use dotenv::dotenv;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use track_votes_api::{
    ApiConfig, AppState, HeaderIdentityProvider, HttpTrackCatalog, TrackCatalog, UnconfiguredCatalog,
    config::create_cors_layer, create_app, run_server,
};
use track_votes_ledger::{SystemClock, VoteLedger};
use track_votes_repository::{PostgresTracksRepository, PostgresVotesRepository, postgres};

/// Initialize tracing/logging.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("track_votes=info"));

    let json = env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_target(true).with_thread_ids(true))
            .init();

        info!(
            service_name = "track-votes-api",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with JSON format"
        );
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .init();

        info!(
            service_name = "track-votes-api",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with console output"
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    init_tracing();

    info!("Starting track votes server");

    let config = ApiConfig::from_env().inspect_err(|e| error!(error = %e, "Invalid configuration"))?;

    let pool = postgres::connect(&config.database_url, config.database_max_connections).await?;
    postgres::run_migrations(&pool).await?;
    info!("Database connected and migrated");

    let votes = Arc::new(PostgresVotesRepository::new(pool.clone()));
    let tracks = Arc::new(PostgresTracksRepository::new(pool));
    let ledger = Arc::new(VoteLedger::new(votes, config.quota_policy()));

    if config.reconcile_on_startup {
        let corrected = ledger.reconcile().await?;
        info!(corrected, "Startup reconciliation finished");
    }

    let catalog: Arc<dyn TrackCatalog> = match &config.catalog_url {
        Some(url) => Arc::new(HttpTrackCatalog::new(url.clone())?),
        None => Arc::new(UnconfiguredCatalog),
    };

    let state = AppState {
        ledger,
        tracks,
        catalog,
        identity: Arc::new(HeaderIdentityProvider::new(config.identity_header.clone())),
        clock: Arc::new(SystemClock),
    };
    let cors = create_cors_layer(config.cors_origins.clone(), config.identity_header.clone());
    let app = create_app(state, cors);

    if let Err(e) = run_server(app, config.socket_addr()).await {
        error!(error = %e, "Server error");
        return Err(e);
    }
    Ok(())
}

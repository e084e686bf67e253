// region:    --- Imports
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use silent_auction::config::ServerConfig;
use silent_auction::database::DatabaseManager;
use silent_auction::handlers;
use silent_auction::store::{PostgresAuctionStore, SharedStore};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "silent_auction=info,tower_http=info".into()),
        )
        .without_time()
        .with_target(false)
        .init();

    let config = ServerConfig::from_env()?;

    let db_manager = Arc::new(DatabaseManager::connect(&config).await?);

    if let Err(e) = db_manager.initialize_database(config.reset_database).await {
        error!("{:<12} --> database initialization failed: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> database initialized", "Main");

    let store: SharedStore = Arc::new(PostgresAuctionStore::new(db_manager));

    let routes_all = handlers::router(store)
        .layer(cors_layer(&config.cors_origins))
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(config.bind_address()).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("{:<12} --> ignoring invalid CORS origin {:?}", "Main", origin);
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(allowed))
}
// endregion: --- Main

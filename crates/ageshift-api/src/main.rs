//! Ageshift headless host entry point.

use std::error::Error;
use std::sync::Arc;

use ageshift_api::config::{GameConfig, Settings};
use ageshift_api::fetcher::FsAssetFetcher;
use ageshift_api::headless::{LoggingAudioBackend, LoggingDirector};
use ageshift_api::routes;
use ageshift_api::store::JsonFileProgressStore;
use ageshift_api::wiring::{self, Collaborators};
use ageshift_core::progress::SystemClock;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Ageshift host");

    // Read configuration from environment and game data.
    let settings = Settings::from_env()?;
    let game = GameConfig::load(&settings.game_config).await?;
    let addr = settings.bind_addr()?;

    // Assemble the engine. No rumble device is attached to a headless host.
    let collaborators = Collaborators {
        fetcher: Arc::new(FsAssetFetcher::new(&settings.assets_dir)),
        progress: Arc::new(JsonFileProgressStore::new(
            &settings.save_path,
            Arc::new(SystemClock),
        )),
        audio: Some(Arc::new(LoggingAudioBackend)),
        haptics: None,
        director: Some(Arc::new(LoggingDirector)),
        dialogue: None,
    };
    let app_state = wiring::start(&game, collaborators, settings.tick()).await?;

    // Build router.
    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/ages", routes::ages::router())
        .nest("/api/v1/progress", routes::progress::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server.
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}

use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use word_assassin::{auth, config::EngineConfig, state::AppState, ws};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "word_assassin=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Word Assassin engine...");

    let config = EngineConfig::from_env();
    let addr = config.bind_addr;
    tracing::info!(
        "Storage: {:?} in {}, kill scan cutoff {} chars",
        config.storage,
        config.data_dir.display(),
        config.max_message_chars
    );

    let bridge_auth = Arc::new(auth::BridgeAuth::new(config.bridge_token.clone()));
    let state = Arc::new(AppState::new(config));

    // Bridge WebSocket behind the shared-token check
    let bridge_routes = Router::new()
        .route("/ws", get(ws::ws_handler))
        .layer(middleware::from_fn_with_state(
            bridge_auth,
            auth::bridge_auth_middleware,
        ));

    let app = Router::new()
        .merge(bridge_routes)
        .route("/health", get(|| async { "ok" }))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

//! QuizBattle API server: the HTTP control surface plus the mounted
//! `quizbattle-realtime` WebSocket endpoint, sharing one `AppState`.

use std::net::SocketAddr;

use axum::Router;
use tokio::signal;
use tower_http::cors::CorsLayer;

mod config;
mod error;
mod logging;
mod middleware;
mod routes;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize logging (JSON in production, pretty in development)
    let is_production = logging::is_production();
    logging::init_logging(is_production);

    tracing::info!(
        production = is_production,
        railway = logging::is_railway(),
        "Starting QuizBattle API server"
    );

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    // Create application state
    let state = AppState::new(&config).await?;

    // Build CORS layer
    let cors = build_cors_layer(&config);

    // Build router: the HTTP control surface and the WebSocket endpoint are
    // two differently-typed `Router<S>`s over the same logical state; bind
    // each to its own `AppState` projection and merge once both are `Router<()>`.
    let ws_router: Router<()> = quizbattle_realtime::handlers::router().with_state(state.realtime.clone());
    let app = routes::create_router(state, cors).merge(ws_router);

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(address = %addr, "API server listening");
    tracing::info!(url = %format!("http://localhost:{}/docs", config.port), "API docs available");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!("API server shut down gracefully");
    Ok(())
}

/// Build CORS layer based on configuration
fn build_cors_layer(config: &Config) -> CorsLayer {
    use http::{HeaderValue, Method, header};
    use std::time::Duration;

    let origin = config.frontend_url.parse::<HeaderValue>().expect("Invalid frontend URL for CORS");

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::COOKIE,
        ])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}

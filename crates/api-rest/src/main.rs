//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! Useful for deployments where agents push records and operators work through HTTP only. The
//! workspace's main `scout-run` binary runs the same server alongside the interactive console.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{build_router, settings::Settings};

/// Main entry point for the Scout REST API server
///
/// Starts the REST API server on the configured address (default: 0.0.0.0:3000).
/// See [`api_rest::settings`] for the environment variables read at startup.
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - any setting cannot be parsed,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("scout_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env()?;
    let state = settings.build_state();

    tracing::info!(
        "-- Starting Scout REST API on {} (backend: {})",
        settings.rest_addr,
        state.bridge.backend()
    );

    let listener = tokio::net::TcpListener::bind(&settings.rest_addr).await?;
    axum::serve(listener, build_router(state)).await?;

    Ok(())
}

//! Combined Scout binary.
//!
//! Runs the REST API (ingestion bridge and operator endpoints) and the interactive operator
//! console in one process, sharing a single session store and pending queue.

mod console;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{build_router, settings::Settings};

/// Main entry point for the Scout application
///
/// Starts the REST server and the operator console concurrently. Closing the console (`quit` or
/// end of input) leaves the REST server running until the process is stopped.
///
/// # Environment Variables
/// See [`api_rest::settings`]. A `.env` file in the working directory is loaded first if present.
///
/// # Errors
/// Returns an error if settings cannot be parsed, the REST address cannot be bound, or either
/// task fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("scout_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("scout_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings = Settings::from_env()?;
    let state = settings.build_state();

    tracing::info!("++ Starting Scout REST on {}", settings.rest_addr);
    tracing::info!("++ Committing to {}", state.bridge.backend());

    let listener = tokio::net::TcpListener::bind(&settings.rest_addr).await?;
    let app = build_router(state.clone());
    let rest_server = tokio::spawn(async move { axum::serve(listener, app).await });
    let console = console::run(state);

    let (rest_result, console_result) = tokio::join!(rest_server, console);
    console_result?;
    rest_result??;

    Ok(())
}

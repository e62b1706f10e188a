//! pdfxl API server

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use pdfxl_api::{app, storage, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pdfxl_api=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    let config = Config::from_env();
    info!(?config, "Initializing pdfxl API...");

    let state = Arc::new(AppState::new(config).await?);

    match state.config.output_retention {
        Some(max_age) => {
            storage::spawn_sweeper(state.config.output_dir.clone(), max_age);
            info!(retention_secs = max_age.as_secs(), "Output sweeper started");
        }
        None => info!("Output retention disabled"),
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.port));
    let router = app(state);

    info!("Starting pdfxl API on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

//! Application state for the conversion API

use anyhow::{Context, Result};

use crate::config::Config;

pub struct AppState {
    pub config: Config,
}

impl AppState {
    /// Create the upload and output directories if needed
    pub async fn new(config: Config) -> Result<Self> {
        for dir in [&config.upload_dir, &config.output_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create directory {}", dir.display()))?;
        }

        tracing::info!(
            upload_dir = %config.upload_dir.display(),
            output_dir = %config.output_dir.display(),
            "Storage directories ready"
        );

        Ok(Self { config })
    }
}

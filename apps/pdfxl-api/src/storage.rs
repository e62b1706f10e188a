//! Output retention
//!
//! Converted files are handed to the client and then left in the output
//! directory. A background task removes the ones older than the retention
//! period.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tokio::task::JoinHandle;

/// Longest pause between two sweeps
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(600);

/// Delete regular files in `dir` last modified more than `max_age` ago.
/// Returns how many were removed.
pub async fn sweep_outputs(dir: &Path, max_age: Duration) -> io::Result<usize> {
    let now = SystemTime::now();
    let mut removed = 0;

    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let metadata = match entry.metadata().await {
            Ok(metadata) if metadata.is_file() => metadata,
            _ => continue,
        };
        let age = metadata
            .modified()
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .unwrap_or_default();
        if age <= max_age {
            continue;
        }

        match tokio::fs::remove_file(entry.path()).await {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %entry.path().display(), error = %e, "Failed to remove output")
            }
        }
    }
    Ok(removed)
}

/// Sweep `dir` periodically for as long as the runtime lives
pub fn spawn_sweeper(dir: PathBuf, max_age: Duration) -> JoinHandle<()> {
    let period = max_age.clamp(Duration::from_secs(1), MAX_SWEEP_INTERVAL);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            match sweep_outputs(&dir, max_age).await {
                Ok(0) => {}
                Ok(removed) => tracing::info!(removed, "Swept expired outputs"),
                Err(e) => tracing::warn!(error = %e, "Output sweep failed"),
            }
        }
    })
}

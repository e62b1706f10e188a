//! Server configuration read from the environment

use std::path::PathBuf;
use std::time::Duration;

/// 200 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_OUTPUT_RETENTION_SECS: u64 = 3600;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Where uploads live while they are converted
    pub upload_dir: PathBuf,
    /// Where converted files are written
    pub output_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// Age after which output files are swept; `None` keeps them forever
    pub output_retention: Option<Duration>,
    /// Base URL advertised in robots.txt and sitemap.xml
    pub public_base_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            upload_dir: PathBuf::from("uploads"),
            output_dir: PathBuf::from("outputs"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            output_retention: Some(Duration::from_secs(DEFAULT_OUTPUT_RETENTION_SECS)),
            public_base_url: None,
        }
    }
}

fn parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    /// Build from `PORT`, `UPLOAD_DIR`, `OUTPUT_DIR`, `MAX_UPLOAD_BYTES`,
    /// `OUTPUT_RETENTION_SECS` and `PUBLIC_BASE_URL`. Unset or unparsable
    /// values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let output_retention = match parsed::<u64>("OUTPUT_RETENTION_SECS") {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.output_retention,
        };

        Self {
            port: parsed("PORT").unwrap_or(defaults.port),
            upload_dir: non_empty("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            output_dir: non_empty("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            max_upload_bytes: parsed("MAX_UPLOAD_BYTES").unwrap_or(defaults.max_upload_bytes),
            output_retention,
            public_base_url: non_empty("PUBLIC_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.max_upload_bytes, 209_715_200);
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.output_dir, PathBuf::from("outputs"));
        assert_eq!(config.output_retention, Some(Duration::from_secs(3600)));
        assert!(config.public_base_url.is_none());
    }
}

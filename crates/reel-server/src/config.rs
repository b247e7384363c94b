use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    pub storage_dir: PathBuf,
    /// Public URL of the `/static` mount, used to build play URLs.
    pub public_base_url: String,
    pub default_cover_url: String,
    pub request_timeout: Duration,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let jwt_secret = get("REEL_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("REEL_JWT_SECRET is unset or still a placeholder");
        }

        let host = var("REEL_HOST", "0.0.0.0");
        let port: u16 = var("REEL_PORT", "8080").parse().context("REEL_PORT")?;
        let ttl_hours: i64 = var("REEL_TOKEN_TTL_HOURS", "720")
            .parse()
            .context("REEL_TOKEN_TTL_HOURS")?;
        let timeout_secs: u64 = var("REEL_REQUEST_TIMEOUT_SECS", "10")
            .parse()
            .context("REEL_REQUEST_TIMEOUT_SECS")?;
        let max_upload_mb: usize = var("REEL_MAX_UPLOAD_MB", "256")
            .parse()
            .context("REEL_MAX_UPLOAD_MB")?;
        let public_base_url = var("REEL_PUBLIC_BASE_URL", &format!("http://localhost:{}/static", port));

        Ok(Self {
            db_path: var("REEL_DB_PATH", "reel.db").into(),
            storage_dir: var("REEL_STORAGE_DIR", "./reel-storage").into(),
            default_cover_url: var("REEL_DEFAULT_COVER_URL", ""),
            jwt_secret,
            host,
            port,
            token_ttl: chrono::Duration::hours(ttl_hours),
            public_base_url,
            request_timeout: Duration::from_secs(timeout_secs),
            max_upload_bytes: max_upload_mb * 1024 * 1024,
        })
    }
}

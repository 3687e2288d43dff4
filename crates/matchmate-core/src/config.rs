use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};

use matchmate_client::DEFAULT_BASE_URL;

pub const DEFAULT_BATCH_SIZE: u32 = 20;
/// randomuser.me refuses anything above this.
pub const MAX_BATCH_SIZE: u32 = 5000;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub db_path: PathBuf,
    pub batch_size: u32,
    pub http_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_BASE_URL.to_string(),
            db_path: PathBuf::from("matchmate.db"),
            batch_size: DEFAULT_BATCH_SIZE,
            http_timeout: Duration::from_secs(15),
        }
    }
}

impl Config {
    /// Read `MATCHMATE_*` variables from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_url = lookup("MATCHMATE_API_URL").unwrap_or(defaults.api_url);
        let db_path = lookup("MATCHMATE_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let batch_size = match lookup("MATCHMATE_BATCH_SIZE") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .with_context(|| format!("MATCHMATE_BATCH_SIZE is not a number: '{}'", raw))?,
            None => defaults.batch_size,
        };
        if batch_size == 0 || batch_size > MAX_BATCH_SIZE {
            bail!("MATCHMATE_BATCH_SIZE must be between 1 and {}, got {}", MAX_BATCH_SIZE, batch_size);
        }

        let http_timeout = match lookup("MATCHMATE_HTTP_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.trim().parse().with_context(|| {
                format!("MATCHMATE_HTTP_TIMEOUT_SECS is not a number: '{}'", raw)
            })?),
            None => defaults.http_timeout,
        };

        Ok(Self {
            api_url,
            db_path,
            batch_size,
            http_timeout,
        })
    }
}

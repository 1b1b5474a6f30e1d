use crate::poll::PollConfig;
use crate::retry::{Backoff, RetryPolicy};
use crate::transport::TransportOptions;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default public API endpoint.
pub const DEFAULT_HOST: &str = "https://cloudapi.cloud.couchbase.com";

/// Request retry parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per request (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
    /// Overall window for all attempts of one request, in seconds.
    pub timeout_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            base_delay_secs: 2.0,
            max_delay_secs: 32,
            timeout_secs: 10 * 60,
        }
    }
}

/// Long-running operation polling parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollSettings {
    /// Wait before the first status check, in seconds.
    pub initial_delay_secs: f64,
    /// Base delay in seconds between checks.
    pub base_delay_secs: f64,
    /// Maximum delay between checks, in seconds.
    pub max_delay_secs: u64,
    /// Hard bound on one poll loop, in seconds.
    pub timeout_secs: u64,
    /// Optional cap on unsuccessful checks.
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            initial_delay_secs: 60.0,
            base_delay_secs: 60.0,
            max_delay_secs: 20 * 60,
            timeout_secs: 60 * 60,
            max_attempts: None,
        }
    }
}

/// Global configuration loaded from `~/.config/capella/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapellaConfig {
    /// API base URL.
    pub host: String,
    /// Upper bound for one HTTP request, in seconds.
    pub request_timeout_secs: u64,
    /// Connect timeout, in seconds.
    pub connect_timeout_secs: u64,
    /// Items requested per page on list endpoints.
    pub page_size: u32,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    /// Optional polling policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub poll: Option<PollSettings>,
}

impl Default for CapellaConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            request_timeout_secs: 60,
            connect_timeout_secs: 15,
            page_size: crate::pagination::DEFAULT_PER_PAGE,
            retry: None,
            poll: None,
        }
    }
}

impl CapellaConfig {
    pub fn transport_options(&self) -> TransportOptions {
        TransportOptions {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            timeout: Duration::from_secs(self.request_timeout_secs),
            ..TransportOptions::default()
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let r = self.retry.clone().unwrap_or_default();
        RetryPolicy {
            max_attempts: r.max_attempts.max(1),
            backoff: Backoff::new(
                Duration::from_secs_f64(r.base_delay_secs.max(0.0)),
                Duration::from_secs(r.max_delay_secs),
            ),
            timeout: Duration::from_secs(r.timeout_secs),
            throttled_only: false,
        }
    }

    pub fn poll_config(&self) -> PollConfig {
        let p = self.poll.clone().unwrap_or_default();
        PollConfig {
            initial_delay: Duration::from_secs_f64(p.initial_delay_secs.max(0.0)),
            backoff: Backoff::new(
                Duration::from_secs_f64(p.base_delay_secs.max(0.0)),
                Duration::from_secs(p.max_delay_secs),
            ),
            timeout: Duration::from_secs(p.timeout_secs),
            max_attempts: p.max_attempts,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("capella")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<CapellaConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = CapellaConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from(&path)
}

/// Load configuration from an explicit path.
pub fn load_from(path: &Path) -> Result<CapellaConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg: CapellaConfig =
        toml::from_str(&data).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg)
}

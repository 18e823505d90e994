//! Service configuration
//!
//! Loaded from a JSON file (`CONFIG_PATH`). Resource URLs may be given inline
//! or pulled from an environment variable named by `url_env`; secrets such as
//! the bot token only ever come from the environment.

use chrono::{DateTime, Utc};
use pagewatch::{DEFAULT_USER_AGENT, FetchOptions, ResourceSpec, TlsPolicy, default_selector};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "pagewatch.config.json";

/// Every three minutes, at second zero
pub const DEFAULT_SCHEDULE: &str = "0 */3 * * * *";

#[derive(Debug, Deserialize)]
pub struct WatcherConfig {
    #[serde(default = "default_schedule")]
    pub schedule: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Explicit opt-in for pages with broken certificates
    #[serde(default)]
    pub accept_invalid_certs: bool,

    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    #[serde(default)]
    pub alarm: AlarmConfig,

    #[serde(default)]
    pub gif: GifConfig,

    pub resources: Vec<ResourceEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceEntry {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    /// Environment variable holding the URL; wins over `url` when set
    #[serde(default)]
    pub url_env: Option<String>,
    #[serde(default = "default_selector")]
    pub selector: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlarmConfig {
    #[serde(default = "default_true")]
    pub bell: bool,
    #[serde(default = "default_sound_path")]
    pub sound_path: Option<PathBuf>,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            bell: true,
            sound_path: default_sound_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GifConfig {
    #[serde(default = "default_gif_tag")]
    pub tag: String,
    /// Used when no Giphy key is configured or Giphy fails
    #[serde(default)]
    pub fallback_clips: Vec<String>,
}

impl Default for GifConfig {
    fn default() -> Self {
        Self {
            tag: default_gif_tag(),
            fallback_clips: Vec::new(),
        }
    }
}

fn default_schedule() -> String {
    DEFAULT_SCHEDULE.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_true() -> bool {
    true
}

fn default_sound_path() -> Option<PathBuf> {
    Some(PathBuf::from("goose-urgent.wav"))
}

fn default_gif_tag() -> String {
    "goose".to_string()
}

pub fn load_config(path: impl AsRef<Path>) -> Result<WatcherConfig, WatcherError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| WatcherError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let config: WatcherConfig =
        serde_json::from_str(&content).map_err(|source| WatcherError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    validate_schedule(&config.schedule)?;
    Ok(config)
}

impl WatcherConfig {
    /// Resolves every entry to a concrete [`ResourceSpec`], in file order.
    ///
    /// `lookup` reads environment variables; pass `|k| std::env::var(k).ok()`.
    pub fn resolve_resources(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Vec<ResourceSpec>, WatcherError> {
        self.resources
            .iter()
            .map(|entry| {
                let from_env = entry.url_env.as_deref().and_then(|var| lookup(var));
                let url = match (from_env, &entry.url, &entry.url_env) {
                    (Some(url), _, _) => url,
                    (None, Some(url), _) => url.clone(),
                    (None, None, Some(var)) => {
                        return Err(WatcherError::MissingEnv {
                            resource: entry.name.clone(),
                            var: var.clone(),
                        });
                    }
                    (None, None, None) => {
                        return Err(WatcherError::MissingUrl(entry.name.clone()));
                    }
                };

                Ok(ResourceSpec::new(&entry.name, url).with_selector(&entry.selector))
            })
            .collect()
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            user_agent: self.user_agent.clone(),
            tls: if self.accept_invalid_certs {
                TlsPolicy::AcceptInvalidCerts
            } else {
                TlsPolicy::Strict
            },
            timeout: self.request_timeout_secs.map(Duration::from_secs),
        }
    }
}

pub fn validate_schedule(expression: &str) -> Result<(), WatcherError> {
    cron::Schedule::from_str(expression)
        .map(|_| ())
        .map_err(|e| WatcherError::Schedule {
            expression: expression.to_string(),
            reason: e.to_string(),
        })
}

/// Next time the schedule fires after now
pub fn next_tick(expression: &str) -> Option<DateTime<Utc>> {
    cron::Schedule::from_str(expression)
        .ok()?
        .upcoming(Utc)
        .next()
}

#[derive(Debug, thiserror::Error)]
pub enum WatcherError {
    #[error("Could not read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Could not parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Resource {0} has neither `url` nor `url_env`")]
    MissingUrl(String),

    #[error("Resource {resource} reads its url from {var}, which is not set")]
    MissingEnv { resource: String, var: String },

    #[error("Invalid schedule `{expression}`: {reason}")]
    Schedule { expression: String, reason: String },

    #[error(transparent)]
    Watch(#[from] pagewatch::ConfigError),

    #[error("Scheduler error: {0}")]
    Scheduler(String),
}

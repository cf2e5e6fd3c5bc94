//! Configuration for the notifier.
//!
//! Settings come in two layers, mirroring how the orchestrator stores them:
//! a global section (credentials, server url, defaults) and a per-job
//! section (room and switches). [`NotifierConfig::resolve`] merges them
//! into the flat view the dispatcher consumes.
//!
//! ```toml
//! [global]
//! auth_token = "..."
//! build_server_url = "https://ci.example.com"
//! default_room = "builds"
//!
//! [job]
//! smart_notifications = true
//!
//! [job.notify]
//! aborted = false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::culprits::ResolverLimits;
use crate::error::ConfigError;
use crate::filter::ResultFilter;

/// Sender name used when neither job nor global config sets one.
pub const DEFAULT_SEND_AS: &str = "Build Server";

/// Environment variable overriding `global.auth_token`.
pub const ENV_AUTH_TOKEN: &str = "HERALD_AUTH_TOKEN";
/// Environment variable overriding `global.build_server_url`.
pub const ENV_BUILD_SERVER_URL: &str = "HERALD_BUILD_SERVER_URL";
/// Environment variable overriding `job.room`.
pub const ENV_ROOM: &str = "HERALD_ROOM";

/// Server-wide settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GlobalConfig {
    pub auth_token: String,
    /// Base url of the CI server; build urls are appended to it.
    pub build_server_url: String,
    pub send_as: Option<String>,
    pub default_room: Option<String>,
}

/// Per-job settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct JobConfig {
    pub room: Option<String>,
    pub send_as: Option<String>,
    pub start_notification: bool,
    pub smart_notifications: bool,
    pub notify: ResultFilter,
}

/// Delivery tuning for the outbound chat call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Chat API base url; `None` uses the service default.
    pub api_url: Option<String>,
    pub timeout_ms: u64,
    /// Extra attempts after the first one (0 = no retries).
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    /// Ask the chat service to alert room members.
    pub notify_room: bool,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            timeout_ms: 10_000,
            max_retries: 2,
            backoff_base_ms: 500,
            notify_room: false,
        }
    }
}

/// Complete configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HeraldConfig {
    pub global: GlobalConfig,
    pub job: JobConfig,
    pub delivery: DeliveryConfig,
    pub limits: ResolverLimits,
}

impl HeraldConfig {
    /// Parse a TOML document.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&text)?;
        config.apply_env();
        Ok(config)
    }

    /// Apply `HERALD_*` environment overrides.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(token) = get(ENV_AUTH_TOKEN) {
            self.global.auth_token = token;
        }
        if let Some(url) = get(ENV_BUILD_SERVER_URL) {
            self.global.build_server_url = url;
        }
        if let Some(room) = get(ENV_ROOM) {
            self.job.room = Some(room);
        }
    }

    pub fn resolve(&self) -> Result<NotifierConfig, ConfigError> {
        NotifierConfig::resolve(&self.global, &self.job, self.limits)
    }
}

/// Flattened settings for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifierConfig {
    pub room: String,
    pub send_as: String,
    pub auth_token: String,
    /// Always empty or ending in `/`.
    pub server_url: String,
    pub start_notification: bool,
    pub smart_notifications: bool,
    pub notify: ResultFilter,
    pub limits: ResolverLimits,
}

impl NotifierConfig {
    /// Merge global and job settings.
    ///
    /// A blank job room falls back to the default room, and a blank sender
    /// falls back to the global sender and then to [`DEFAULT_SEND_AS`].
    pub fn resolve(
        global: &GlobalConfig,
        job: &JobConfig,
        limits: ResolverLimits,
    ) -> Result<Self, ConfigError> {
        let room = non_blank(job.room.as_deref())
            .or_else(|| non_blank(global.default_room.as_deref()))
            .ok_or(ConfigError::MissingRoom)?;

        let send_as = non_blank(job.send_as.as_deref())
            .or_else(|| non_blank(global.send_as.as_deref()))
            .unwrap_or(DEFAULT_SEND_AS);

        Ok(Self {
            room: room.to_string(),
            send_as: send_as.to_string(),
            auth_token: global.auth_token.trim().to_string(),
            server_url: normalize_server_url(&global.build_server_url)?,
            start_notification: job.start_notification,
            smart_notifications: job.smart_notifications,
            notify: job.notify,
            limits,
        })
    }
}

/// Trim and make sure a non-empty url ends with `/`.
pub fn normalize_server_url(url: &str) -> Result<String, ConfigError> {
    let url = url.trim();
    if url.is_empty() {
        return Ok(String::new());
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::InvalidServerUrl(url.to_string()));
    }
    if url.ends_with('/') {
        Ok(url.to_string())
    } else {
        Ok(format!("{}/", url))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

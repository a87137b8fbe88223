//! Client configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;

use crate::error::ConfigError;
use crate::net::reconnect::ReconnectPolicy;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:6543";
pub const DEFAULT_IDENTITY_PATH: &str = ".clicker/identity.json";
pub const DEFAULT_ANIMATION_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// HTTP base for request/response calls.
    pub api_url: Url,
    /// WebSocket base for live channels, derived from `api_url`.
    pub ws_url: Url,
    pub identity_path: PathBuf,
    /// How long a click/feed pose lasts before it settles back.
    pub animation: Duration,
    pub reconnect: ReconnectPolicy,
}

impl ClientConfig {
    /// Config for `api_url` with every other setting at its default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidApiUrl`] unless `api_url` is an absolute
    /// `http://` or `https://` URL.
    pub fn new(api_url: &str) -> Result<Self, ConfigError> {
        let (api_url, ws_url) = parse_api_url(api_url)?;
        Ok(Self {
            api_url,
            ws_url,
            identity_path: PathBuf::from(DEFAULT_IDENTITY_PATH),
            animation: Duration::from_millis(DEFAULT_ANIMATION_MS),
            reconnect: ReconnectPolicy::default(),
        })
    }

    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `CLICKER_API_URL`: default `http://127.0.0.1:6543`
    /// - `CLICKER_IDENTITY_PATH`: default `.clicker/identity.json`
    /// - `CLICKER_ANIMATION_MS`: default 500
    /// - `CLICKER_RECONNECT_MAX_RETRIES`: default 5, `0` disables reconnect
    /// - `CLICKER_RECONNECT_BASE_MS`: default 1000
    /// - `CLICKER_RECONNECT_MAX_MS`: default 10000
    ///
    /// Unparseable numbers fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if `CLICKER_API_URL` is not an http(s) URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("CLICKER_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_owned());
        let mut config = Self::new(&api_url)?;

        if let Some(path) = lookup("CLICKER_IDENTITY_PATH").filter(|p| !p.trim().is_empty()) {
            config.identity_path = PathBuf::from(path);
        }
        config.animation = Duration::from_millis(parse_or(&lookup, "CLICKER_ANIMATION_MS", DEFAULT_ANIMATION_MS));

        let defaults = ReconnectPolicy::default();
        config.reconnect = ReconnectPolicy {
            max_retries: parse_or(&lookup, "CLICKER_RECONNECT_MAX_RETRIES", defaults.max_retries),
            base_delay: Duration::from_millis(parse_or(
                &lookup,
                "CLICKER_RECONNECT_BASE_MS",
                duration_ms(defaults.base_delay),
            )),
            max_delay: Duration::from_millis(parse_or(
                &lookup,
                "CLICKER_RECONNECT_MAX_MS",
                duration_ms(defaults.max_delay),
            )),
        };

        Ok(config)
    }

    /// Point both bases at `api_url`, keeping every other setting.
    ///
    /// # Errors
    ///
    /// Same as [`ClientConfig::new`].
    pub fn with_api_url(mut self, api_url: &str) -> Result<Self, ConfigError> {
        let (api_url, ws_url) = parse_api_url(api_url)?;
        self.api_url = api_url;
        self.ws_url = ws_url;
        Ok(self)
    }

    #[must_use]
    pub fn with_identity_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.identity_path = path.into();
        self
    }

    #[must_use]
    pub fn with_animation(mut self, animation: Duration) -> Self {
        self.animation = animation;
        self
    }

    #[must_use]
    pub fn with_reconnect(mut self, reconnect: ReconnectPolicy) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// HTTP endpoint under the API base, one path segment per item.
    ///
    /// Segments are percent-encoded, so usernames can be passed verbatim.
    #[must_use]
    pub fn api_endpoint(&self, segments: &[&str]) -> Url {
        join_segments(&self.api_url, segments)
    }

    /// WebSocket endpoint under the channel base.
    #[must_use]
    pub fn ws_endpoint(&self, segments: &[&str]) -> Url {
        join_segments(&self.ws_url, segments)
    }
}

fn parse_api_url(raw: &str) -> Result<(Url, Url), ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let ws = if let Some(rest) = trimmed.strip_prefix("http://") {
        format!("ws://{rest}")
    } else if let Some(rest) = trimmed.strip_prefix("https://") {
        format!("wss://{rest}")
    } else {
        return Err(ConfigError::InvalidApiUrl(raw.to_owned()));
    };

    let api_url = Url::parse(trimmed).map_err(|_| ConfigError::InvalidApiUrl(raw.to_owned()))?;
    let ws_url = Url::parse(&ws).map_err(|_| ConfigError::InvalidApiUrl(raw.to_owned()))?;
    if api_url.cannot_be_a_base() || api_url.host_str().is_none() {
        return Err(ConfigError::InvalidApiUrl(raw.to_owned()));
    }
    Ok((api_url, ws_url))
}

fn join_segments(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

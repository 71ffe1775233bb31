use std::path::PathBuf;
use std::time::Duration;

use eyre::Result;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::NotesError;
use crate::output::OutputFormat;
use crate::retry::RetryPolicy;
use crate::summarize::{Model, SummaryLanguage};

pub const GOOGLE_API_KEY_VAR: &str = "GOOGLE_API_KEY";
pub const PROXY_USERNAME_VAR: &str = "WEBSHARE_USERNAME";
pub const PROXY_PASSWORD_VAR: &str = "WEBSHARE_PASSWORD";

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub default_model: Option<Model>,
    pub default_words: Option<u32>,
    pub default_summary_language: Option<SummaryLanguage>,
    pub default_format: Option<OutputFormat>,
    pub default_caption_lang: Option<String>,
    pub max_retries: Option<u32>,
    pub initial_delay_secs: Option<f64>,
}

impl Config {
    /// Load config from ~/.config/ytnotes/config.toml if it exists
    pub fn load() -> Result<Self> {
        let path = config_path();
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            debug!("No config file found at {}", path.display());
            Ok(Config::default())
        }
    }

    /// Retry policy with any configured overrides applied
    pub fn retry_policy(&self) -> RetryPolicy {
        let mut policy = RetryPolicy::default();
        if let Some(max_retries) = self.max_retries {
            policy.max_attempts = max_retries;
        }
        if let Some(delay) = self
            .initial_delay_secs
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        {
            policy.initial_delay = delay;
        } else if let Some(secs) = self.initial_delay_secs {
            warn!("Ignoring initial_delay_secs = {secs}: not a usable delay");
        }
        policy
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("ytnotes")
        .join("config.toml")
}

/// Credentials for the rotating upstream proxy used for caption requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyCredentials {
    pub username: String,
    pub password: String,
}

/// Secrets read once at startup and handed to the clients that need them
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub google_api_key: Option<String>,
    pub proxy: Option<ProxyCredentials>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let proxy = match (get(PROXY_USERNAME_VAR), get(PROXY_PASSWORD_VAR)) {
            (Some(username), Some(password)) => Some(ProxyCredentials { username, password }),
            (None, None) => None,
            _ => {
                warn!("Only one of {PROXY_USERNAME_VAR}/{PROXY_PASSWORD_VAR} is set; proxy disabled");
                None
            }
        };

        Self {
            google_api_key: get(GOOGLE_API_KEY_VAR),
            proxy,
        }
    }

    pub fn google_api_key(&self) -> crate::Result<&str> {
        self.google_api_key
            .as_deref()
            .ok_or_else(|| NotesError::MissingApiKey {
                env_var: GOOGLE_API_KEY_VAR.to_string(),
            })
    }
}

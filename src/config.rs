use std::env;
use std::time::Duration;

use crate::error::{ForgeError, Result};

pub const DEFAULT_QUEUE_URL: &str = "https://queue.fal.run";
pub const DEFAULT_MODEL_ID: &str = "fal-ai/ideogram/v2";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

#[derive(Debug, Clone)]
pub struct FalConfig {
    pub api_key: Option<String>,
    pub queue_base_url: String,
    pub model_id: String,
    pub poll_interval: Duration,
}

impl Default for FalConfig {
    fn default() -> Self {
        FalConfig {
            api_key: None,
            queue_base_url: DEFAULT_QUEUE_URL.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl FalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `FAL_KEY` (or `VITE_FAL_KEY`), `FAL_QUEUE_URL`, `FAL_MODEL_ID` and
    /// `FAL_POLL_INTERVAL_MS`. Unset or blank variables keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let api_key = non_empty_env("FAL_KEY").or_else(|| non_empty_env("VITE_FAL_KEY"));
        let queue_base_url = non_empty_env("FAL_QUEUE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.queue_base_url);
        let model_id = non_empty_env("FAL_MODEL_ID").unwrap_or(defaults.model_id);
        let poll_interval = non_empty_env("FAL_POLL_INTERVAL_MS")
            .and_then(|ms| ms.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.poll_interval);

        FalConfig {
            api_key,
            queue_base_url,
            model_id,
            poll_interval,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_queue_base_url(mut self, url: impl Into<String>) -> Self {
        self.queue_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// The credential, or a configuration error when none was supplied.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ForgeError::Config("FAL_KEY (or VITE_FAL_KEY) not set".into()))
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

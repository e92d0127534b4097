//! Delivery configuration.
//!
//! Every timer and window in the popup/showcase lifecycle is configurable;
//! the defaults mirror the production constants (1 s display delay, 15 s
//! auto-close, 5 s countdown window, 10 s rotation interval, 1 h cap).

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeliveryConfig {
    /// Delay between scheduling and showing the popup, in milliseconds.
    pub display_delay_ms: u64,
    /// Grace period after display before the impression is counted.
    pub impression_grace_ms: u64,
    /// Total time the popup stays visible without interaction.
    pub auto_close_ms: u64,
    /// The countdown indicator becomes visible this long before auto-close.
    pub countdown_window_ms: u64,
    /// Delay after closing before state is cleared (close animation).
    pub cleanup_delay_ms: u64,
    /// Showcase carousel auto-advance interval.
    pub rotation_interval_ms: u64,
    /// Frequency-cap window per partition, in seconds.
    pub cap_window_secs: i64,
    /// A login within this window resets the authenticated partition.
    pub fresh_login_window_secs: i64,
    /// Manual media retries allowed after all candidates fail.
    pub media_retry_budget: u32,
    /// Upload root path segment used when generating media URL candidates.
    pub upload_root: String,
    /// Subfolder under the upload root where ad media normally lives.
    pub media_subfolder: String,
    /// Port the API listens on during local development.
    pub local_api_port: u16,
    /// Remote API base URL; absent when running against the local store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            display_delay_ms: 1_000,
            impression_grace_ms: 500,
            auto_close_ms: 15_000,
            countdown_window_ms: 5_000,
            cleanup_delay_ms: 300,
            rotation_interval_ms: 10_000,
            cap_window_secs: 3_600,
            fresh_login_window_secs: 30,
            media_retry_budget: 3,
            upload_root: "uploads".to_string(),
            media_subfolder: "advertisements".to_string(),
            local_api_port: 5000,
            api_base: None,
        }
    }
}

impl DeliveryConfig {
    pub fn display_delay(&self) -> Duration {
        Duration::from_millis(self.display_delay_ms)
    }

    pub fn impression_grace(&self) -> Duration {
        Duration::from_millis(self.impression_grace_ms)
    }

    pub fn auto_close(&self) -> Duration {
        Duration::from_millis(self.auto_close_ms)
    }

    /// Time from display until the countdown indicator appears.
    pub fn countdown_start(&self) -> Duration {
        Duration::from_millis(self.auto_close_ms.saturating_sub(self.countdown_window_ms))
    }

    pub fn cleanup_delay(&self) -> Duration {
        Duration::from_millis(self.cleanup_delay_ms)
    }

    pub fn rotation_interval(&self) -> Duration {
        Duration::from_millis(self.rotation_interval_ms)
    }

    pub fn cap_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.cap_window_secs)
    }

    pub fn fresh_login_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.fresh_login_window_secs)
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<DeliveryConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<DeliveryConfig, ConfigError> {
    let config: DeliveryConfig = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_config(config: &DeliveryConfig) -> Result<(), ConfigError> {
    if config.auto_close_ms == 0 {
        return Err(ConfigError::Validation {
            message: "autoCloseMs must be positive".to_string(),
        });
    }
    if config.countdown_window_ms > config.auto_close_ms {
        return Err(ConfigError::Validation {
            message: "countdownWindowMs must not exceed autoCloseMs".to_string(),
        });
    }
    if config.impression_grace_ms >= config.auto_close_ms {
        return Err(ConfigError::Validation {
            message: "impressionGraceMs must be shorter than autoCloseMs".to_string(),
        });
    }
    if config.cap_window_secs <= 0 {
        return Err(ConfigError::Validation {
            message: "capWindowSecs must be positive".to_string(),
        });
    }
    if config.rotation_interval_ms == 0 {
        return Err(ConfigError::Validation {
            message: "rotationIntervalMs must be positive".to_string(),
        });
    }
    Ok(())
}

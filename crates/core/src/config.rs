//! Settings file: device identity and polling cadence.
//!
//! The file keeps the layout of the vendor tool's `appsettings.json`, so an
//! existing file can be reused as-is:
//!
//! ```json
//! {
//!   "MouseConfiguration": {
//!     "DeviceName": "Sora V2",
//!     "DeviceVid": 6421,
//!     "DevicePidWireless": 44572,
//!     "DevicePidWired": 44561,
//!     "DeviceUsagePage": 65440
//!   },
//!   "Polling": { "IntervalSeconds": 60, "ExchangeTimeoutMs": 2000 }
//! }
//! ```

use crate::device::DeviceIdentity;
use crate::error::{Error, Result};
use crate::poller::PollerConfig;
use crate::{pids, SORA_USAGE_PAGE, SORA_VID};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Settings file looked up in the working directory when none is given.
pub const DEFAULT_SETTINGS_FILE: &str = "appsettings.json";

/// Device section of the settings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MouseConfiguration {
    pub device_name: String,
    pub device_vid: u16,
    pub device_pid_wireless: u16,
    pub device_pid_wired: u16,
    pub device_usage_page: u16,
}

impl Default for MouseConfiguration {
    fn default() -> Self {
        Self {
            device_name: "Sora V2".into(),
            device_vid: SORA_VID,
            device_pid_wireless: pids::SORA_V2_WIRELESS,
            device_pid_wired: pids::SORA_V2_WIRED,
            device_usage_page: SORA_USAGE_PAGE,
        }
    }
}

/// Polling section of the settings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PollingSettings {
    pub interval_seconds: u64,
    pub exchange_timeout_ms: u64,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            interval_seconds: 60,
            exchange_timeout_ms: 2000,
        }
    }
}

/// Whole settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Settings {
    pub mouse_configuration: MouseConfiguration,
    #[serde(default)]
    pub polling: PollingSettings,
}

impl Settings {
    /// Parse and validate settings from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Settings =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read settings from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("read {}: {e}", path.display())))?;
        let settings = Self::from_json_str(&json)?;
        info!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    /// Read an explicit settings file, or `appsettings.json` from the working
    /// directory if present, or fall back to built-in Sora V2 settings.
    ///
    /// An explicit path that cannot be read is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        let default_path = PathBuf::from(DEFAULT_SETTINGS_FILE);
        if default_path.exists() {
            Self::load(&default_path)
        } else {
            debug!("No settings file found, using built-in defaults");
            Ok(Self::default())
        }
    }

    /// Reject values that would make the monitor unusable.
    pub fn validate(&self) -> Result<()> {
        if self.mouse_configuration.device_name.trim().is_empty() {
            return Err(Error::Config("DeviceName must not be empty".into()));
        }
        if self.polling.interval_seconds == 0 {
            return Err(Error::Config("IntervalSeconds must be at least 1".into()));
        }
        if self.polling.exchange_timeout_ms == 0 {
            return Err(Error::Config("ExchangeTimeoutMs must be at least 1".into()));
        }
        Ok(())
    }

    /// Device identity built from the wireless and wired product IDs.
    pub fn identity(&self) -> Result<DeviceIdentity> {
        let mouse = &self.mouse_configuration;
        DeviceIdentity::new(
            mouse.device_name.clone(),
            mouse.device_vid,
            [mouse.device_pid_wireless, mouse.device_pid_wired],
            mouse.device_usage_page,
        )
    }

    /// Poll cadence and exchange bound.
    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            interval: Duration::from_secs(self.polling.interval_seconds),
            exchange_timeout: Duration::from_millis(self.polling.exchange_timeout_ms),
        }
    }
}

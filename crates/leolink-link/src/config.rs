//! Link configuration.
//!
//! Built programmatically or loaded from a TOML file:
//!
//! ```toml
//! team_id = 3171
//! remote_node_id = "PAYLOAD"
//! log_root = "logs"
//!
//! [device]
//! baud_rate = 9600
//! frame_prefix = "<"
//! frame_suffix = ">"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use leolink_device::DeviceConfig;
use leolink_frame::Envelope;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Ground-station link configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Team identifier stamped into every command.
    #[serde(default = "default_team_id")]
    pub team_id: u32,

    /// Team name shown when the sender comes up.
    #[serde(default = "default_team_name")]
    pub team_name: String,

    /// Node identifier of the payload radio.
    #[serde(default = "default_remote_node_id")]
    pub remote_node_id: String,

    /// Directory that holds one sub-directory per session.
    #[serde(default = "default_log_root")]
    pub log_root: PathBuf,

    /// Foreground tick interval in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Frames buffered between the device thread and the poller.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// `fdatasync` the session log after every record.
    #[serde(default = "default_true")]
    pub sync_writes: bool,

    /// Write `summary.json` when a non-empty session closes.
    #[serde(default = "default_true")]
    pub summary: bool,

    #[serde(default)]
    pub device: DeviceSettings,
}

/// Device and framing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSettings {
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    #[serde(default = "default_max_payload_len")]
    pub max_payload_len: usize,

    #[serde(default = "default_frame_prefix")]
    pub frame_prefix: String,

    #[serde(default = "default_frame_suffix")]
    pub frame_suffix: String,
}

fn default_team_id() -> u32 {
    3171
}

fn default_team_name() -> String {
    "LeoNUS".to_string()
}

fn default_remote_node_id() -> String {
    "PAYLOAD".to_string()
}

fn default_log_root() -> PathBuf {
    PathBuf::from("logs")
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn default_queue_capacity() -> usize {
    256
}

fn default_true() -> bool {
    true
}

fn default_baud_rate() -> u32 {
    leolink_device::DEFAULT_BAUD_RATE
}

fn default_read_timeout_ms() -> u64 {
    100
}

fn default_max_payload_len() -> usize {
    leolink_device::DEFAULT_MAX_PAYLOAD_LEN
}

fn default_frame_prefix() -> String {
    "<".to_string()
}

fn default_frame_suffix() -> String {
    ">".to_string()
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            team_id: default_team_id(),
            team_name: default_team_name(),
            remote_node_id: default_remote_node_id(),
            log_root: default_log_root(),
            poll_interval_ms: default_poll_interval_ms(),
            queue_capacity: default_queue_capacity(),
            sync_writes: true,
            summary: true,
            device: DeviceSettings::default(),
        }
    }
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            baud_rate: default_baud_rate(),
            read_timeout_ms: default_read_timeout_ms(),
            max_payload_len: default_max_payload_len(),
            frame_prefix: default_frame_prefix(),
            frame_suffix: default_frame_suffix(),
        }
    }
}

impl LinkConfig {
    /// Load and validate configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.team_id == 0 {
            return Err(ConfigError::Invalid("team_id must be non-zero".into()));
        }
        if self.remote_node_id.trim().is_empty() {
            return Err(ConfigError::Invalid("remote_node_id must be set".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll_interval_ms must be positive".into()));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid("queue_capacity must be positive".into()));
        }
        if self.device.baud_rate == 0 {
            return Err(ConfigError::Invalid("device.baud_rate must be positive".into()));
        }
        if self.device.frame_prefix.is_empty() || self.device.frame_suffix.is_empty() {
            return Err(ConfigError::Invalid(
                "device.frame_prefix and device.frame_suffix must be non-empty".into(),
            ));
        }
        if self.device.read_timeout_ms == 0 {
            return Err(ConfigError::Invalid("device.read_timeout_ms must be positive".into()));
        }
        let envelope_len = self.device.frame_prefix.len() + self.device.frame_suffix.len();
        if self.device.max_payload_len <= envelope_len {
            return Err(ConfigError::Invalid(format!(
                "device.max_payload_len ({}) leaves no room for a payload",
                self.device.max_payload_len
            )));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Frame envelope described by the device settings.
    pub fn envelope(&self) -> Result<Envelope, ConfigError> {
        Envelope::new(
            self.device.frame_prefix.as_bytes(),
            self.device.frame_suffix.as_bytes(),
        )
        .map_err(|err| ConfigError::Invalid(err.to_string()))
    }

    /// Settings for the device backends.
    pub fn device_config(&self) -> Result<DeviceConfig, ConfigError> {
        let envelope = self.envelope()?;
        Ok(DeviceConfig {
            baud_rate: self.device.baud_rate,
            read_timeout: Duration::from_millis(self.device.read_timeout_ms),
            terminator: envelope.terminator(),
            max_payload_len: self.device.max_payload_len,
        })
    }
}

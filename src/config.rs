// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Startup configuration.
//!
//! Secrets (network credentials, bridge address and key) are read once from
//! the environment. On a host the operating system owns the network, so the
//! WiFi entries are optional and only reported in the network status line. Everything else is a compile-time default carried by
//! [`LightDialSettings`] and [`RangeStreamSettings`], adjustable through
//! `with_*` builders.

use std::fmt;
use std::time::Duration;

use crate::channel::CommitPolicy;
use crate::clock::TimestampSource;
use crate::error::ConfigError;
use crate::link::ReconnectionPolicy;
#[cfg(feature = "http")]
use crate::protocol::BridgeConfig;
use crate::protocol::StreamConfig;
use crate::types::Distance;

/// Environment variable holding the network name.
pub const ENV_WIFI_SSID: &str = "SENSE_RELAY_WIFI_SSID";
/// Environment variable holding the network password.
pub const ENV_WIFI_PASS: &str = "SENSE_RELAY_WIFI_PASS";
/// Environment variable holding the bridge address.
pub const ENV_BRIDGE_HOST: &str = "SENSE_RELAY_BRIDGE_HOST";
/// Environment variable holding the bridge API key.
pub const ENV_BRIDGE_KEY: &str = "SENSE_RELAY_BRIDGE_KEY";
/// Environment variable holding the listener host.
pub const ENV_STREAM_HOST: &str = "SENSE_RELAY_STREAM_HOST";
/// Environment variable holding the listener port.
pub const ENV_STREAM_PORT: &str = "SENSE_RELAY_STREAM_PORT";
/// Environment variable holding the reporting device name.
pub const ENV_DEVICE: &str = "SENSE_RELAY_DEVICE";
/// Environment variable selecting the timestamp source.
pub const ENV_TIMESTAMPS: &str = "SENSE_RELAY_TIMESTAMPS";

/// Credentials and addresses supplied from outside the program.
///
/// `Debug` output redacts the password and API key.
///
/// # Examples
///
/// ```
/// use sense_relay::config::Secrets;
///
/// let secrets = Secrets::from_lookup(|key| match key {
///     "SENSE_RELAY_WIFI_SSID" => Some("home".to_string()),
///     "SENSE_RELAY_WIFI_PASS" => Some("hunter2".to_string()),
///     _ => None,
/// });
///
/// assert_eq!(secrets.wifi_ssid(), Some("home"));
/// assert!(!format!("{secrets:?}").contains("hunter2"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Secrets {
    wifi_ssid: Option<String>,
    wifi_pass: Option<String>,
    bridge_host: Option<String>,
    bridge_key: Option<String>,
}

impl Secrets {
    /// Loads secrets from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads secrets through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &'static str| lookup(key).filter(|v| !v.is_empty());

        Self {
            wifi_ssid: optional(ENV_WIFI_SSID),
            wifi_pass: optional(ENV_WIFI_PASS),
            bridge_host: optional(ENV_BRIDGE_HOST),
            bridge_key: optional(ENV_BRIDGE_KEY),
        }
    }

    /// Returns the network name, if configured.
    #[must_use]
    pub fn wifi_ssid(&self) -> Option<&str> {
        self.wifi_ssid.as_deref()
    }

    /// Returns true if a network password is configured.
    #[must_use]
    pub fn has_wifi_pass(&self) -> bool {
        self.wifi_pass.is_some()
    }

    /// Logs the network the loop publishes over, once the link is up.
    pub fn log_network_status(&self, peer: &str) {
        tracing::info!(
            ssid = self.wifi_ssid().unwrap_or("<host network>"),
            secured = self.has_wifi_pass(),
            peer,
            "Network status"
        );
    }

    /// Builds the bridge configuration for `light_id`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the bridge host or key is unset.
    #[cfg(feature = "http")]
    pub fn bridge(&self, light_id: u32) -> Result<BridgeConfig, ConfigError> {
        let host = self
            .bridge_host
            .as_deref()
            .ok_or(ConfigError::Missing(ENV_BRIDGE_HOST))?;
        let key = self
            .bridge_key
            .as_deref()
            .ok_or(ConfigError::Missing(ENV_BRIDGE_KEY))?;
        Ok(BridgeConfig::new(host, key).with_light(light_id))
    }
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("wifi_ssid", &self.wifi_ssid)
            .field("wifi_pass", &self.wifi_pass.as_ref().map(|_| "<redacted>"))
            .field("bridge_host", &self.bridge_host)
            .field("bridge_key", &self.bridge_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Where the range stream sends readings and how it labels them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamTarget {
    /// Listener address.
    pub stream: StreamConfig,
    /// Name reported in every reading.
    pub device: String,
    /// Source of the `time` field.
    pub timestamps: TimestampSource,
}

impl StreamTarget {
    /// Default listener host.
    pub const DEFAULT_HOST: &'static str = "10.18.159.239";
    /// Default listener port.
    pub const DEFAULT_PORT: u16 = 8080;
    /// Default device name.
    pub const DEFAULT_DEVICE: &'static str = "nano33iot";

    /// Loads the target from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the port or timestamp mode is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the target through `lookup`, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the port or timestamp mode is malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup(ENV_STREAM_HOST).unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let port = match lookup(ENV_STREAM_PORT) {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                key: ENV_STREAM_PORT,
                message: e.to_string(),
            })?,
            None => Self::DEFAULT_PORT,
        };
        let device = lookup(ENV_DEVICE).unwrap_or_else(|| Self::DEFAULT_DEVICE.to_string());
        let timestamps = match lookup(ENV_TIMESTAMPS).as_deref() {
            None | Some("wall") => TimestampSource::WallClock,
            Some("uptime") => TimestampSource::uptime(),
            Some("none") => TimestampSource::None,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: ENV_TIMESTAMPS,
                    message: format!("expected none, uptime or wall, got {other:?}"),
                });
            }
        };

        Ok(Self {
            stream: StreamConfig::new(host, port),
            device,
            timestamps,
        })
    }
}

/// Tunables for the light dial loop.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use sense_relay::channel::CommitPolicy;
/// use sense_relay::config::LightDialSettings;
///
/// let settings = LightDialSettings::default()
///     .with_update_threshold(8)
///     .with_commit_policy(CommitPolicy::Always);
/// assert_eq!(settings.loop_delay, Duration::from_millis(100));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightDialSettings {
    /// Bridge light ID.
    pub light_id: u32,
    /// Digital pin of the toggle switch.
    pub switch_pin: u8,
    /// Analog pin of the brightness potentiometer.
    pub brightness_pin: u8,
    /// Analog pin of the color temperature potentiometer.
    pub color_temp_pin: u8,
    /// Lowest published brightness.
    pub min_brightness: u8,
    /// Highest published brightness.
    pub max_brightness: u8,
    /// Lowest published color temperature (mireds).
    pub min_color_temp: u16,
    /// Highest published color temperature (mireds).
    pub max_color_temp: u16,
    /// Pause after each publish.
    pub debounce: Duration,
    /// Dead band for brightness and color temperature.
    pub update_threshold: u32,
    /// Pause at the end of every tick.
    pub loop_delay: Duration,
    /// When a channel's published value advances.
    pub commit_policy: CommitPolicy,
    /// Retry budget for the network link.
    pub reconnection: ReconnectionPolicy,
    /// Half period of the fail-stop blink.
    pub fault_blink: Duration,
}

impl Default for LightDialSettings {
    fn default() -> Self {
        Self {
            light_id: 1,
            switch_pin: 2,
            brightness_pin: 0,
            color_temp_pin: 1,
            min_brightness: 1,
            max_brightness: 254,
            min_color_temp: 153,
            max_color_temp: 500,
            debounce: Duration::from_millis(50),
            update_threshold: 5,
            loop_delay: Duration::from_millis(100),
            commit_policy: CommitPolicy::default(),
            reconnection: ReconnectionPolicy::default(),
            fault_blink: Duration::from_millis(300),
        }
    }
}

impl LightDialSettings {
    /// Sets the bridge light ID.
    #[must_use]
    pub fn with_light(mut self, light_id: u32) -> Self {
        self.light_id = light_id;
        self
    }

    /// Sets the dead band for brightness and color temperature.
    #[must_use]
    pub fn with_update_threshold(mut self, threshold: u32) -> Self {
        self.update_threshold = threshold;
        self
    }

    /// Sets the commit policy.
    #[must_use]
    pub fn with_commit_policy(mut self, policy: CommitPolicy) -> Self {
        self.commit_policy = policy;
        self
    }

    /// Sets the network retry budget.
    #[must_use]
    pub fn with_reconnection(mut self, policy: ReconnectionPolicy) -> Self {
        self.reconnection = policy;
        self
    }
}

/// Tunables for the range stream loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeStreamSettings {
    /// Dead band for distance readings, in millimetres.
    pub change_threshold: u32,
    /// Readings at or beyond this distance are ignored.
    pub max_distance: Distance,
    /// Sensor response timeout.
    pub sensor_timeout: Duration,
    /// Interval between continuous measurements.
    pub sensor_period: Duration,
    /// When the published distance advances.
    pub commit_policy: CommitPolicy,
    /// Half period of the fail-stop blink.
    pub fault_blink: Duration,
}

impl Default for RangeStreamSettings {
    fn default() -> Self {
        Self {
            change_threshold: 2,
            max_distance: Distance::from_mm(250),
            sensor_timeout: Duration::from_millis(500),
            sensor_period: Duration::from_millis(50),
            commit_policy: CommitPolicy::default(),
            fault_blink: Duration::from_millis(300),
        }
    }
}

impl RangeStreamSettings {
    /// Sets the dead band.
    #[must_use]
    pub fn with_change_threshold(mut self, threshold: u32) -> Self {
        self.change_threshold = threshold;
        self
    }

    /// Sets the maximum distance.
    #[must_use]
    pub fn with_max_distance(mut self, max: Distance) -> Self {
        self.max_distance = max;
        self
    }

    /// Sets the commit policy.
    #[must_use]
    pub fn with_commit_policy(mut self, policy: CommitPolicy) -> Self {
        self.commit_policy = policy;
        self
    }
}

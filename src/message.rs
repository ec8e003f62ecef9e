// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed wire messages.
//!
//! Every outbound payload is a serde record, so field names and quoting are
//! fixed by the type rather than by string templates.
//!
//! | Message | Peer | Example |
//! |---------|------|---------|
//! | [`LightCommand`] | bridge | `{"bri":128}` |
//! | [`LightState`] | bridge | `{"on":true,"bri":128,"ct":300}` |
//! | [`SensorReading`] | TCP listener | `{"device":"nano","time":"1234","sensor":87}` |
//!
//! # Examples
//!
//! ```
//! use sense_relay::message::LightCommand;
//! use sense_relay::types::{Brightness, PowerState};
//!
//! let cmd = LightCommand::Power(PowerState::On);
//! assert_eq!(cmd.field(), "on");
//! assert_eq!(cmd.to_body().unwrap(), r#"{"on":true}"#);
//!
//! let cmd = LightCommand::Brightness(Brightness::new(128).unwrap());
//! assert_eq!(cmd.to_body().unwrap(), r#"{"bri":128}"#);
//! ```

use serde::{Deserialize, Serialize};

use crate::types::{Brightness, ColorTemp, PowerState};

/// A single-field update for a light's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightCommand {
    /// Switch the light on or off.
    #[serde(rename = "on")]
    Power(PowerState),
    /// Set the brightness.
    #[serde(rename = "bri")]
    Brightness(Brightness),
    /// Set the color temperature.
    #[serde(rename = "ct")]
    ColorTemp(ColorTemp),
}

impl LightCommand {
    /// Returns the JSON field this command sets.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Power(_) => "on",
            Self::Brightness(_) => "bri",
            Self::ColorTemp(_) => "ct",
        }
    }

    /// Serializes the command into a request body.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_body(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// A full light state, sent in one request.
///
/// An "off" state carries only the `on` field; brightness and color
/// temperature are left untouched on the bridge.
///
/// # Examples
///
/// ```
/// use sense_relay::message::LightState;
/// use sense_relay::types::{Brightness, ColorTemp};
///
/// let off = LightState::off();
/// assert_eq!(off.to_body().unwrap(), r#"{"on":false}"#);
///
/// let on = LightState::on(Brightness::MAX, ColorTemp::CANDLE);
/// assert_eq!(on.to_body().unwrap(), r#"{"on":true,"bri":254,"ct":500}"#);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightState {
    /// Whether the light is on.
    pub on: PowerState,
    /// Brightness, only sent while on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bri: Option<Brightness>,
    /// Color temperature, only sent while on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ct: Option<ColorTemp>,
}

impl LightState {
    /// Creates an "off" state.
    #[must_use]
    pub const fn off() -> Self {
        Self {
            on: PowerState::Off,
            bri: None,
            ct: None,
        }
    }

    /// Creates an "on" state with brightness and color temperature.
    #[must_use]
    pub const fn on(bri: Brightness, ct: ColorTemp) -> Self {
        Self {
            on: PowerState::On,
            bri: Some(bri),
            ct: Some(ct),
        }
    }

    /// Serializes the state into a request body.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_body(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// One reading streamed to the TCP listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Name of the reporting device.
    pub device: String,
    /// Timestamp, omitted when the device has no clock.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// The reading itself.
    pub sensor: i32,
}

impl SensorReading {
    /// Creates a reading.
    #[must_use]
    pub fn new(device: impl Into<String>, time: Option<String>, sensor: i32) -> Self {
        Self {
            device: device.into(),
            time,
            sensor,
        }
    }

    /// Serializes the reading as a newline-terminated JSON line.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

/// One entry of the bridge's reply to a state change.
///
/// The bridge answers with a JSON array where each element is either
/// `{"success":{...}}` or `{"error":{...}}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BridgeReplyEntry {
    /// An attribute was updated. Maps the attribute path to its new value.
    Success(serde_json::Map<String, serde_json::Value>),
    /// The bridge refused part of the request.
    Error(BridgeFault),
}

/// Details of a refused bridge request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BridgeFault {
    /// Numeric error type.
    #[serde(rename = "type")]
    pub kind: u32,
    /// The resource the error refers to.
    #[serde(default)]
    pub address: String,
    /// Human readable description.
    #[serde(default)]
    pub description: String,
}

/// Parses a bridge reply body, returning the error entries it contains.
///
/// Bodies that are not a reply array yield no errors.
#[must_use]
pub fn reply_faults(body: &str) -> Vec<BridgeFault> {
    serde_json::from_str::<Vec<BridgeReplyEntry>>(body)
        .map(|entries| {
            entries
                .into_iter()
                .filter_map(|entry| match entry {
                    BridgeReplyEntry::Error(fault) => Some(fault),
                    BridgeReplyEntry::Success(_) => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

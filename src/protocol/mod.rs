// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Network clients the loops publish through.
//!
//! - [`BridgeClient`]: HTTP `PUT` of light state to a smart-light bridge
//! - [`StreamClient`]: newline-delimited JSON over a TCP session
//!
//! The loops depend on the [`LightSink`] and [`ReadingSink`] traits rather
//! than on the clients, so tests can swap in recording fakes.

#[cfg(feature = "http")]
mod bridge;
mod stream;

#[cfg(feature = "http")]
pub use bridge::{BridgeClient, BridgeConfig};
pub use stream::{StreamClient, StreamConfig};

use crate::error::ProtocolError;
use crate::message::{BridgeFault, LightCommand, LightState, SensorReading, reply_faults};

/// Reply from the bridge to a state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeResponse {
    status: u16,
    body: String,
}

impl BridgeResponse {
    /// Creates a response from its status and body.
    #[must_use]
    pub fn new(status: u16, body: String) -> Self {
        Self { status, body }
    }

    /// Returns the HTTP status code.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns the raw response body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns the error entries the bridge reported in the body.
    ///
    /// The bridge answers 200 even when it refuses part of a request, so
    /// these are informational and do not make the send fail.
    #[must_use]
    pub fn faults(&self) -> Vec<BridgeFault> {
        reply_faults(&self.body)
    }
}

/// Destination for light state updates.
#[allow(async_fn_in_trait)]
pub trait LightSink {
    /// Sends a single-field update.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::Status` for a non-2xx reply, or a transport
    /// error if no reply was received.
    async fn send_command(&self, command: &LightCommand) -> Result<BridgeResponse, ProtocolError>;

    /// Sends a full state in one request.
    ///
    /// # Errors
    ///
    /// Same as [`LightSink::send_command`].
    async fn send_state(&self, state: &LightState) -> Result<BridgeResponse, ProtocolError>;
}

/// Destination for streamed sensor readings.
#[allow(async_fn_in_trait)]
pub trait ReadingSink {
    /// Writes one reading.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::NotConnected` without a session, or the
    /// transport error that broke it.
    async fn send_reading(&mut self, reading: &SensorReading) -> Result<(), ProtocolError>;

    /// Returns whatever inbound bytes are available without waiting.
    ///
    /// # Errors
    ///
    /// Returns the transport error if reading failed.
    fn drain_incoming(&mut self) -> Result<Option<String>, ProtocolError>;
}

impl ProtocolError {
    /// Returns true if the error means the peer was never reached, as
    /// opposed to the peer refusing the request.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        match self {
            #[cfg(feature = "http")]
            Self::Http(e) => e.is_connect() || e.is_timeout(),
            Self::Io(_) | Self::ConnectionFailed(_) | Self::NotConnected | Self::Timeout(_) => true,
            Self::Status { .. } | Self::InvalidAddress(_) | Self::Encode(_) => false,
        }
    }
}

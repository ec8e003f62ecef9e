// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP client for a smart-light bridge.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;

use crate::error::ProtocolError;
use crate::message::{LightCommand, LightState};
use crate::protocol::{BridgeResponse, LightSink};

// ============================================================================
// BridgeConfig
// ============================================================================

/// Configuration for a bridge-controlled light.
///
/// # Examples
///
/// ```
/// use sense_relay::protocol::BridgeConfig;
/// use std::time::Duration;
///
/// let config = BridgeConfig::new("192.168.1.2", "s3cr3t-key")
///     .with_light(3)
///     .with_timeout(Duration::from_secs(5));
///
/// assert_eq!(
///     config.state_url(),
///     "http://192.168.1.2/api/s3cr3t-key/lights/3/state"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    host: String,
    port: u16,
    use_https: bool,
    api_key: String,
    light_id: u32,
    timeout: Duration,
}

impl BridgeConfig {
    /// Default HTTP port.
    pub const DEFAULT_PORT: u16 = 80;
    /// Default HTTPS port.
    pub const DEFAULT_HTTPS_PORT: u16 = 443;
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
    /// Default light ID.
    pub const DEFAULT_LIGHT_ID: u32 = 1;

    /// Creates a configuration for the bridge at `host` using `api_key`.
    #[must_use]
    pub fn new(host: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Self::DEFAULT_PORT,
            use_https: false,
            api_key: api_key.into(),
            light_id: Self::DEFAULT_LIGHT_ID,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Sets a custom port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Enables HTTPS.
    ///
    /// If port hasn't been explicitly set, it will be changed to 443.
    #[must_use]
    pub fn with_https(mut self) -> Self {
        self.use_https = true;
        if self.port == Self::DEFAULT_PORT {
            self.port = Self::DEFAULT_HTTPS_PORT;
        }
        self
    }

    /// Sets the controlled light.
    #[must_use]
    pub fn with_light(mut self, light_id: u32) -> Self {
        self.light_id = light_id;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the controlled light.
    #[must_use]
    pub fn light_id(&self) -> u32 {
        self.light_id
    }

    /// Returns the timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns `host:port`, the address a reachability probe should dial.
    #[must_use]
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Builds the base URL from this configuration.
    #[must_use]
    pub fn base_url(&self) -> String {
        let scheme = if self.use_https { "https" } else { "http" };
        let port_suffix =
            if (self.use_https && self.port == 443) || (!self.use_https && self.port == 80) {
                String::new()
            } else {
                format!(":{}", self.port)
            };
        format!("{scheme}://{}{port_suffix}", self.host)
    }

    /// Builds the light state URL.
    #[must_use]
    pub fn state_url(&self) -> String {
        format!(
            "{}/api/{}/lights/{}/state",
            self.base_url(),
            urlencoding::encode(&self.api_key),
            self.light_id
        )
    }

    /// Creates a `BridgeClient` from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the host is empty or the HTTP client cannot be created.
    pub fn into_client(self) -> Result<BridgeClient, ProtocolError> {
        if self.host.is_empty() {
            return Err(ProtocolError::InvalidAddress(
                "bridge host is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(ProtocolError::Http)?;

        Ok(BridgeClient {
            state_url: self.state_url(),
            light_id: self.light_id,
            client,
        })
    }
}

// ============================================================================
// BridgeClient
// ============================================================================

/// HTTP client that writes one light's state on the bridge.
///
/// Every update is a `PUT` of a JSON object to
/// `/api/{key}/lights/{id}/state`. Any 2xx status counts as delivered.
///
/// # Examples
///
/// ```no_run
/// use sense_relay::message::LightCommand;
/// use sense_relay::protocol::BridgeConfig;
/// use sense_relay::types::PowerState;
///
/// # async fn example() -> sense_relay::Result<()> {
/// let client = BridgeConfig::new("192.168.1.2", "key").into_client()?;
/// if client.send(&LightCommand::Power(PowerState::On)).await {
///     println!("light is on");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BridgeClient {
    state_url: String,
    light_id: u32,
    client: Client,
}

impl BridgeClient {
    /// Returns the URL updates are sent to.
    #[must_use]
    pub fn state_url(&self) -> &str {
        &self.state_url
    }

    /// Sends a command and reports whether it was delivered.
    ///
    /// Failures are logged and swallowed.
    pub async fn send(&self, command: &LightCommand) -> bool {
        match self.send_command(command).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(
                    light = self.light_id,
                    field = command.field(),
                    error = %e,
                    "Failed to send light command"
                );
                false
            }
        }
    }

    /// Sends the full state in one request and reports whether it was
    /// delivered.
    pub async fn update_light(&self, state: &LightState) -> bool {
        match self.send_state(state).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(light = self.light_id, error = %e, "Failed to update light");
                false
            }
        }
    }

    async fn put(&self, body: String) -> Result<BridgeResponse, ProtocolError> {
        tracing::debug!(url = %self.state_url, body = %body, "Sending light state");

        let response = self
            .client
            .put(&self.state_url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(ProtocolError::Http)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(ProtocolError::Http)?;

        tracing::debug!(status, body = %body, "Received bridge response");

        if !(200..300).contains(&status) {
            return Err(ProtocolError::Status { status, body });
        }

        let response = BridgeResponse::new(status, body);
        for fault in response.faults() {
            tracing::warn!(
                kind = fault.kind,
                address = %fault.address,
                description = %fault.description,
                "Bridge reported an error"
            );
        }
        Ok(response)
    }
}

impl LightSink for BridgeClient {
    async fn send_command(&self, command: &LightCommand) -> Result<BridgeResponse, ProtocolError> {
        self.put(command.to_body()?).await
    }

    async fn send_state(&self, state: &LightState) -> Result<BridgeResponse, ProtocolError> {
        self.put(state.to_body()?).await
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! TCP client streaming newline-delimited JSON readings.

use std::io::ErrorKind;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::error::ProtocolError;
use crate::link::Link;
use crate::message::SensorReading;
use crate::protocol::ReadingSink;

/// Where readings are streamed to.
///
/// # Examples
///
/// ```
/// use sense_relay::protocol::StreamConfig;
///
/// let config = StreamConfig::new("10.18.159.239", 8080);
/// assert_eq!(config.addr(), "10.18.159.239:8080");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    host: String,
    port: u16,
    connect_timeout: Duration,
}

impl StreamConfig {
    /// Default connect timeout.
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Creates a configuration for `host:port`.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Sets the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Returns `host:port`.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// A TCP session to the reading listener.
///
/// The session is opened lazily through [`Link::connect`] and dropped as soon
/// as a write fails or the peer closes, so [`Link::is_connected`] reflects the
/// last observed state.
#[derive(Debug)]
pub struct StreamClient {
    config: StreamConfig,
    stream: Option<TcpStream>,
}

impl StreamClient {
    /// Creates a disconnected client.
    #[must_use]
    pub fn new(config: StreamConfig) -> Self {
        Self {
            config,
            stream: None,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }
}

impl Link for StreamClient {
    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn connect(&mut self) -> Result<(), ProtocolError> {
        let addr = self.config.addr();
        tracing::info!(addr = %addr, "Connecting to listener");

        let stream = tokio::time::timeout(self.config.connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| {
                ProtocolError::Timeout(
                    u64::try_from(self.config.connect_timeout.as_millis()).unwrap_or(u64::MAX),
                )
            })?
            .map_err(|e| ProtocolError::ConnectionFailed(format!("{addr}: {e}")))?;

        stream.set_nodelay(true)?;
        self.stream = Some(stream);
        Ok(())
    }

    fn mark_down(&mut self) {
        self.stream = None;
    }

    fn describe(&self) -> String {
        format!("listener {}", self.config.addr())
    }
}

impl ReadingSink for StreamClient {
    async fn send_reading(&mut self, reading: &SensorReading) -> Result<(), ProtocolError> {
        let line = reading.to_line()?;
        let stream = self.stream.as_mut().ok_or(ProtocolError::NotConnected)?;

        tracing::debug!(line = %line.trim_end(), "Sending reading");

        if let Err(e) = stream.write_all(line.as_bytes()).await {
            self.stream = None;
            return Err(ProtocolError::Io(e));
        }
        Ok(())
    }

    fn drain_incoming(&mut self) -> Result<Option<String>, ProtocolError> {
        let Some(stream) = self.stream.as_ref() else {
            return Ok(None);
        };

        let mut received = Vec::new();
        let mut buf = [0_u8; 512];
        let mut closed = false;
        loop {
            match stream.try_read(&mut buf) {
                Ok(0) => {
                    closed = true;
                    break;
                }
                Ok(n) => received.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => {
                    self.stream = None;
                    return Err(ProtocolError::Io(e));
                }
            }
        }

        if closed {
            tracing::info!(addr = %self.config.addr(), "Listener closed the connection");
            self.stream = None;
        }

        if received.is_empty() {
            Ok(None)
        } else {
            Ok(Some(String::from_utf8_lossy(&received).into_owned()))
        }
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `sense_relay` library.
//!
//! Failures are split by where they come from: value validation, network
//! transport, configuration loading, and one-time hardware setup.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error occurred during network communication.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while loading configuration.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Unrecoverable failure while bringing up hardware or the network.
    #[error("setup error: {0}")]
    Setup(#[from] SetupError),
}

/// Errors related to value validation and constraints.
///
/// These errors occur when attempting to create constrained types
/// with invalid values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: i32,
        /// Maximum allowed value.
        max: i32,
        /// The actual value that was provided.
        actual: i32,
    },

    /// A range was declared with its bounds swapped or collapsed.
    #[error("empty range [{start}, {end}]")]
    EmptyRange {
        /// Declared start of the range.
        start: i32,
        /// Declared end of the range.
        end: i32,
    },

    /// An input line held a token that is not `name=<integer>`.
    #[error("invalid assignment: {0}")]
    InvalidAssignment(String),
}

/// Errors related to network communication (HTTP bridge and TCP stream).
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP request failed before a status was received.
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Socket-level failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer answered with a non-success HTTP status.
    #[error("unexpected HTTP status {status}")]
    Status {
        /// The status code returned by the peer.
        status: u16,
        /// The response body, kept for logging.
        body: String,
    },

    /// Connection to the peer failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// An operation needed an open connection but none was established.
    #[error("not connected")]
    NotConnected,

    /// Request timed out.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// A message could not be serialized.
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors related to loading configuration and secrets.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("missing required setting {0}")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed.
    #[error("invalid value for {key}: {message}")]
    Invalid {
        /// The setting name.
        key: &'static str,
        /// Description of the parsing failure.
        message: String,
    },
}

/// Unrecoverable failures during startup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SetupError {
    /// The ranging sensor did not respond to initialisation.
    #[error("failed to detect and initialize sensor: {0}")]
    SensorInit(String),

    /// The network link could not be brought up within the retry budget.
    #[error("network link did not come up after {attempts} attempts")]
    LinkUnavailable {
        /// How many connection attempts were made.
        attempts: u32,
    },
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

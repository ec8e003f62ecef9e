// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Network link supervision.
//!
//! A [`Link`] is whatever must be up before a loop may publish: the WiFi
//! association for the light dial, the TCP session for the range stream.
//! [`connect_with_policy`] brings a link up with a bounded number of
//! attempts, blinking an [`Indicator`] while it waits. [`fail_stop`] is the
//! terminal state after an unrecoverable setup failure.

use std::convert::Infallible;
use std::time::Duration;

use tokio::net::TcpStream;

use crate::error::{ProtocolError, SetupError};
use crate::input::Indicator;

/// A connection that the loop checks every tick.
#[allow(async_fn_in_trait)]
pub trait Link {
    /// Returns whether the link is currently usable.
    fn is_connected(&self) -> bool;

    /// Makes one attempt to bring the link up.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the attempt failed.
    async fn connect(&mut self) -> Result<(), ProtocolError>;

    /// Records that traffic over the link failed at the transport level.
    fn mark_down(&mut self) {}

    /// Short description for status logs.
    fn describe(&self) -> String {
        "link".to_string()
    }
}

/// Retry budget for bringing a link up.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use sense_relay::link::ReconnectionPolicy;
///
/// let policy = ReconnectionPolicy::default();
/// assert_eq!(policy.max_attempts, 20);
///
/// let policy = ReconnectionPolicy::new()
///     .with_max_attempts(3)
///     .with_retry_delay(Duration::from_millis(100))
///     .with_cooldown(Duration::from_secs(1));
/// assert_eq!(policy.retry_delay, Duration::from_millis(100));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectionPolicy {
    /// Attempts allowed after the first one before giving up.
    pub max_attempts: u32,
    /// Delay between attempts.
    pub retry_delay: Duration,
    /// Pause after a failed reconnect inside the main loop.
    pub cooldown: Duration,
}

impl ReconnectionPolicy {
    /// Default number of retries (~10 s with the default delay).
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 20;
    /// Default delay between attempts.
    pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);
    /// Default pause after a failed in-loop reconnect.
    pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5);

    /// Creates a policy with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of retries.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the delay between attempts.
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Sets the pause after a failed in-loop reconnect.
    #[must_use]
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }
}

impl Default for ReconnectionPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            retry_delay: Self::DEFAULT_RETRY_DELAY,
            cooldown: Self::DEFAULT_COOLDOWN,
        }
    }
}

/// Brings `link` up, retrying per `policy`.
///
/// The indicator blinks once per attempt and stays lit once connected.
/// Returns the number of failed attempts before success.
///
/// # Errors
///
/// Returns `SetupError::LinkUnavailable` when the retry budget is spent.
pub async fn connect_with_policy<L, I>(
    link: &mut L,
    policy: &ReconnectionPolicy,
    indicator: &mut I,
) -> Result<u32, SetupError>
where
    L: Link,
    I: Indicator,
{
    tracing::info!(link = %link.describe(), "Connecting");
    let mut attempts = 0;
    loop {
        match link.connect().await {
            Ok(()) if link.is_connected() => break,
            Ok(()) => tracing::debug!(attempt = attempts, "Link not up yet"),
            Err(e) => tracing::debug!(attempt = attempts, error = %e, "Link attempt failed"),
        }
        indicator.set(attempts % 2 == 1);
        tokio::time::sleep(policy.retry_delay).await;
        attempts += 1;
        if attempts > policy.max_attempts {
            tracing::warn!(link = %link.describe(), attempts, "Link connection timeout");
            return Err(SetupError::LinkUnavailable { attempts });
        }
    }
    indicator.set(true);
    tracing::info!(link = %link.describe(), attempts, "Link established");
    Ok(attempts)
}

/// Blinks `indicator` forever.
///
/// Entered after an unrecoverable setup failure; never returns.
pub async fn fail_stop<I: Indicator>(indicator: &mut I, half_period: Duration) -> Infallible {
    tracing::error!("Halting after fatal setup failure");
    loop {
        indicator.set(true);
        tokio::time::sleep(half_period).await;
        indicator.set(false);
        tokio::time::sleep(half_period).await;
    }
}

/// Link that counts as up while `addr` accepts TCP connections.
///
/// Stands in for WiFi association on a host: the operating system owns the
/// network, so the useful question is whether the peer is reachable.
#[derive(Debug, Clone)]
pub struct ReachabilityLink {
    addr: String,
    timeout: Duration,
    up: bool,
}

impl ReachabilityLink {
    /// Default probe timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Creates a link probing `addr` (`host:port`).
    #[must_use]
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            timeout: Self::DEFAULT_TIMEOUT,
            up: false,
        }
    }

    /// Sets the probe timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Link for ReachabilityLink {
    fn is_connected(&self) -> bool {
        self.up
    }

    async fn connect(&mut self) -> Result<(), ProtocolError> {
        let probe = tokio::time::timeout(self.timeout, TcpStream::connect(&self.addr)).await;
        match probe {
            Ok(Ok(_stream)) => {
                self.up = true;
                Ok(())
            }
            Ok(Err(e)) => {
                self.up = false;
                Err(ProtocolError::Io(e))
            }
            Err(_) => {
                self.up = false;
                Err(ProtocolError::Timeout(
                    u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                ))
            }
        }
    }

    fn mark_down(&mut self) {
        self.up = false;
    }

    fn describe(&self) -> String {
        format!("reachability of {}", self.addr)
    }
}

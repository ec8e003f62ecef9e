// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Timestamps attached to streamed readings.

use chrono::{SecondsFormat, Utc};
use tokio::time::Instant;

/// Where the `time` field of a streamed reading comes from.
///
/// # Examples
///
/// ```
/// use sense_relay::clock::TimestampSource;
///
/// assert_eq!(TimestampSource::None.stamp(), None);
///
/// let wall = TimestampSource::WallClock.stamp().unwrap();
/// assert!(wall.ends_with('Z'));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampSource {
    /// Readings carry no timestamp.
    None,
    /// Milliseconds elapsed since `start`, as a decimal string.
    Uptime {
        /// The instant uptime is counted from.
        start: Instant,
    },
    /// Synchronised wall-clock time as RFC 3339 UTC with millisecond precision.
    #[default]
    WallClock,
}

impl TimestampSource {
    /// Creates an uptime source starting now.
    #[must_use]
    pub fn uptime() -> Self {
        Self::Uptime {
            start: Instant::now(),
        }
    }

    /// Produces the timestamp for a reading taken now.
    #[must_use]
    pub fn stamp(&self) -> Option<String> {
        match self {
            Self::None => None,
            Self::Uptime { start } => Some(start.elapsed().as_millis().to_string()),
            Self::WallClock => Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }
}

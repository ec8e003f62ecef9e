// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-channel publish gating.
//!
//! A channel remembers the last value it published and decides whether a new
//! reading is worth sending. Numeric channels use a dead band
//! ([`ThresholdChannel`]); the on/off switch publishes on every state change
//! ([`SwitchChannel`]).
//!
//! # Examples
//!
//! ```
//! use sense_relay::channel::{CommitPolicy, ThresholdChannel};
//!
//! let mut bri = ThresholdChannel::new(5);
//! assert!(bri.exceeds(100)); // nothing published yet
//! bri.record(100, true, CommitPolicy::OnSuccess);
//!
//! assert!(!bri.exceeds(105)); // inside the dead band
//! assert!(bri.exceeds(106));
//! ```

/// When a channel advances its published value after a send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommitPolicy {
    /// Advance only after the peer confirmed the update. A failed send leaves
    /// the old value in place, so the next tick retries.
    #[default]
    OnSuccess,
    /// Advance after every attempt, delivered or not.
    Always,
}

impl CommitPolicy {
    /// Returns whether a send with the given outcome should be committed.
    #[must_use]
    pub const fn should_commit(self, delivered: bool) -> bool {
        match self {
            Self::OnSuccess => delivered,
            Self::Always => true,
        }
    }
}

/// A numeric channel gated by an absolute-difference threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdChannel {
    threshold: u32,
    published: Option<i32>,
}

impl ThresholdChannel {
    /// Creates a channel that has not published anything yet.
    #[must_use]
    pub const fn new(threshold: u32) -> Self {
        Self {
            threshold,
            published: None,
        }
    }

    /// Creates a channel that behaves as if `value` was already published.
    #[must_use]
    pub const fn with_published(threshold: u32, value: i32) -> Self {
        Self {
            threshold,
            published: Some(value),
        }
    }

    /// Returns the dead band width.
    #[must_use]
    pub const fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Returns the last committed value.
    #[must_use]
    pub const fn published(&self) -> Option<i32> {
        self.published
    }

    /// Returns true when `value` is far enough from the published value to
    /// be sent. Always true before the first commit.
    #[must_use]
    pub fn exceeds(&self, value: i32) -> bool {
        match self.published {
            None => true,
            Some(old) => {
                (i64::from(value) - i64::from(old)).unsigned_abs() > u64::from(self.threshold)
            }
        }
    }

    /// Records the outcome of a send of `value`.
    ///
    /// Returns true if the published value was advanced.
    pub fn record(&mut self, value: i32, delivered: bool, policy: CommitPolicy) -> bool {
        if policy.should_commit(delivered) {
            self.published = Some(value);
            true
        } else {
            false
        }
    }
}

/// A boolean channel that publishes on every change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwitchChannel {
    published: Option<bool>,
}

impl SwitchChannel {
    /// Creates a channel that has not published anything yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { published: None }
    }

    /// Returns the last committed state.
    #[must_use]
    pub const fn published(&self) -> Option<bool> {
        self.published
    }

    /// Returns true when `state` differs from the published state.
    #[must_use]
    pub fn differs(&self, state: bool) -> bool {
        self.published != Some(state)
    }

    /// Records the outcome of a send of `state`.
    ///
    /// Returns true if the published state was advanced.
    pub fn record(&mut self, state: bool, delivered: bool, policy: CommitPolicy) -> bool {
        if policy.should_commit(delivered) {
            self.published = Some(state);
            true
        } else {
            false
        }
    }
}

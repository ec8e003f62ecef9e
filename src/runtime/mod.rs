// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The sampler-publisher loops.
//!
//! Each loop owns its inputs, its network client and the per-channel
//! published state. One call to `tick` samples, gates, publishes and
//! returns a [`TickReport`]; `run` repeats ticks at a fixed period forever.
//!
//! - [`LightDial`]: toggle switch and potentiometers to a light bridge
//! - [`RangeStream`]: distance sensor to a TCP listener

#[cfg(feature = "http")]
mod light_dial;
mod range_stream;

#[cfg(feature = "http")]
pub use light_dial::{LightDial, LightDialState};
pub use range_stream::{RangeStream, RangeStreamState};

/// One publish attempt made during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Publication {
    /// The channel that published (`on`, `bri`, `ct` or `sensor`).
    pub field: &'static str,
    /// The value sent. Power is reported as 1 (on) or 0 (off).
    pub value: i32,
    /// Whether the peer confirmed the update.
    pub delivered: bool,
}

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// The link was down at the start of the tick, so sampling was skipped.
    pub link_down: bool,
    /// Publish attempts, in the order they were made.
    pub publications: Vec<Publication>,
}

impl TickReport {
    fn record(&mut self, field: &'static str, value: i32, delivered: bool) {
        self.publications.push(Publication {
            field,
            value,
            delivered,
        });
    }

    /// Returns the publications for `field`.
    #[must_use]
    pub fn for_field(&self, field: &str) -> Vec<Publication> {
        self.publications
            .iter()
            .filter(|p| p.field == field)
            .copied()
            .collect()
    }

    /// Returns true if nothing was published.
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.publications.is_empty()
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Distance reported by a time-of-flight ranging sensor.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A distance in millimetres.
///
/// Ranging sensors report out-of-range targets as large sentinel values
/// (8190/8191 mm on common parts), so callers gate on [`Distance::is_within`]
/// before using a reading.
///
/// # Examples
///
/// ```
/// use sense_relay::types::Distance;
///
/// let d = Distance::from_mm(120);
/// assert!(d.is_within(Distance::from_mm(250)));
/// assert!(!Distance::from_mm(260).is_within(Distance::from_mm(250)));
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Distance(u16);

impl Distance {
    /// Creates a distance from millimetres.
    #[must_use]
    pub const fn from_mm(mm: u16) -> Self {
        Self(mm)
    }

    /// Returns the distance in millimetres.
    #[must_use]
    pub const fn mm(&self) -> u16 {
        self.0
    }

    /// Returns true if this distance is strictly closer than `limit`.
    #[must_use]
    pub const fn is_within(&self, limit: Self) -> bool {
        self.0 < limit.0
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}mm", self.0)
    }
}

impl From<Distance> for i32 {
    fn from(value: Distance) -> Self {
        i32::from(value.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_exclusive() {
        let limit = Distance::from_mm(250);
        assert!(Distance::from_mm(249).is_within(limit));
        assert!(!Distance::from_mm(250).is_within(limit));
    }

    #[test]
    fn distance_display() {
        assert_eq!(Distance::from_mm(42).to_string(), "42mm");
    }
}

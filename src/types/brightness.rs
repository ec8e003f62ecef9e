// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Brightness type for the bridge `bri` field.
//!
//! The bridge accepts brightness levels from 1 (dimmest the lamp can go
//! while still on) to 254 (full brightness).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Brightness level on the bridge scale (1-254).
///
/// # Examples
///
/// ```
/// use sense_relay::types::Brightness;
///
/// let bri = Brightness::new(128).unwrap();
/// assert_eq!(bri.value(), 128);
///
/// assert_eq!(Brightness::MIN.value(), 1);
/// assert_eq!(Brightness::MAX.value(), 254);
///
/// // Zero is not a valid "on" brightness
/// assert!(Brightness::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Brightness(u8);

impl Brightness {
    /// Dimmest level.
    pub const MIN: Self = Self(1);

    /// Full brightness.
    pub const MAX: Self = Self(254);

    /// Creates a new brightness value.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if value is outside [1, 254].
    pub fn new(value: u8) -> Result<Self, ValueError> {
        if !(Self::MIN.0..=Self::MAX.0).contains(&value) {
            return Err(ValueError::OutOfRange {
                min: i32::from(Self::MIN.0),
                max: i32::from(Self::MAX.0),
                actual: i32::from(value),
            });
        }
        Ok(Self(value))
    }

    /// Creates a brightness value, clamping to the valid range.
    ///
    /// # Examples
    ///
    /// ```
    /// use sense_relay::types::Brightness;
    ///
    /// assert_eq!(Brightness::clamped(0).value(), 1);
    /// assert_eq!(Brightness::clamped(255).value(), 254);
    /// ```
    #[must_use]
    pub const fn clamped(value: u8) -> Self {
        if value < Self::MIN.0 {
            Self::MIN
        } else if value > Self::MAX.0 {
            Self::MAX
        } else {
            Self(value)
        }
    }

    /// Creates a brightness value from any integer, saturating at the bounds.
    ///
    /// # Examples
    ///
    /// ```
    /// use sense_relay::types::Brightness;
    ///
    /// assert_eq!(Brightness::saturating(-7).value(), 1);
    /// assert_eq!(Brightness::saturating(128).value(), 128);
    /// assert_eq!(Brightness::saturating(4000).value(), 254);
    /// ```
    #[must_use]
    pub fn saturating(value: i32) -> Self {
        let narrowed = u8::try_from(value.clamp(0, i32::from(u8::MAX))).unwrap_or(u8::MAX);
        Self::clamped(narrowed)
    }

    /// Returns the raw bridge value.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Brightness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for Brightness {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Brightness> for u8 {
    fn from(value: Brightness) -> Self {
        value.0
    }
}

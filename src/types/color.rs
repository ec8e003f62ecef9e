// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Color temperature type for the bridge `ct` field.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Color temperature in mireds (153-500).
///
/// The bridge uses mireds for color temperature, where lower values are
/// cooler (bluer) and higher values are warmer.
///
/// - 153 (6500K) - Cool daylight
/// - 250 (4000K) - Neutral white
/// - 500 (2000K) - Warm candlelight
///
/// # Examples
///
/// ```
/// use sense_relay::types::ColorTemp;
///
/// let ct = ColorTemp::new(250).unwrap();
/// assert_eq!(ct.value(), 250);
/// assert_eq!(ct.to_kelvin(), 4000);
///
/// assert!(ColorTemp::new(600).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct ColorTemp(u16);

impl ColorTemp {
    /// Minimum color temperature (coolest, ~6500K).
    pub const MIN: u16 = 153;

    /// Maximum color temperature (warmest, ~2000K).
    pub const MAX: u16 = 500;

    /// Cool daylight (~6500K).
    pub const COOL: Self = Self(153);

    /// Neutral white (~4000K).
    pub const NEUTRAL: Self = Self(250);

    /// Candlelight (~2000K).
    pub const CANDLE: Self = Self(500);

    /// Creates a new color temperature value.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if value is outside [153, 500].
    pub fn new(value: u16) -> Result<Self, ValueError> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(ValueError::OutOfRange {
                min: i32::from(Self::MIN),
                max: i32::from(Self::MAX),
                actual: i32::from(value),
            });
        }
        Ok(Self(value))
    }

    /// Creates a color temperature, clamping to the valid range.
    #[must_use]
    pub const fn clamped(value: u16) -> Self {
        if value < Self::MIN {
            Self(Self::MIN)
        } else if value > Self::MAX {
            Self(Self::MAX)
        } else {
            Self(value)
        }
    }

    /// Creates a color temperature from any integer, saturating at the bounds.
    #[must_use]
    pub fn saturating(value: i32) -> Self {
        let narrowed = u16::try_from(value.clamp(0, i32::from(u16::MAX))).unwrap_or(u16::MAX);
        Self::clamped(narrowed)
    }

    /// Returns the color temperature value in mireds.
    #[must_use]
    pub const fn value(&self) -> u16 {
        self.0
    }

    /// Returns the approximate color temperature in Kelvin.
    #[must_use]
    pub fn to_kelvin(&self) -> u16 {
        #[allow(clippy::cast_possible_truncation)]
        let kelvin = (1_000_000 / u32::from(self.0)) as u16;
        kelvin
    }
}

impl Default for ColorTemp {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl fmt::Display for ColorTemp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} mired ({}K)", self.0, self.to_kelvin())
    }
}

impl TryFrom<u16> for ColorTemp {
    type Error = ValueError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ColorTemp> for u16 {
    fn from(value: ColorTemp) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_temp_bounds() {
        assert!(ColorTemp::new(152).is_err());
        assert!(ColorTemp::new(153).is_ok());
        assert!(ColorTemp::new(500).is_ok());
        assert!(ColorTemp::new(501).is_err());
    }

    #[test]
    fn color_temp_clamped() {
        assert_eq!(ColorTemp::clamped(0).value(), 153);
        assert_eq!(ColorTemp::clamped(320).value(), 320);
        assert_eq!(ColorTemp::clamped(900).value(), 500);
    }

    #[test]
    fn color_temp_kelvin() {
        assert_eq!(ColorTemp::COOL.to_kelvin(), 6535);
        assert_eq!(ColorTemp::CANDLE.to_kelvin(), 2000);
    }

    #[test]
    fn color_temp_saturating() {
        assert_eq!(ColorTemp::saturating(-1).value(), 153);
        assert_eq!(ColorTemp::saturating(326).value(), 326);
        assert_eq!(ColorTemp::saturating(i32::MAX).value(), 500);
    }

    #[test]
    fn color_temp_display() {
        assert_eq!(ColorTemp::NEUTRAL.to_string(), "250 mired (4000K)");
    }

    #[test]
    fn color_temp_serializes_as_number() {
        assert_eq!(serde_json::to_string(&ColorTemp::NEUTRAL).unwrap(), "250");
        let back: ColorTemp = serde_json::from_str("500").unwrap();
        assert_eq!(back.value(), 500);
        assert!(serde_json::from_str::<ColorTemp>("100").is_err());
    }
}

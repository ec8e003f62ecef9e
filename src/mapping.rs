// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Linear scaling from raw input ranges to output ranges.
//!
//! Potentiometers are read through a 10-bit ADC, so their raw values span
//! [`ANALOG_MIN`]..=[`ANALOG_MAX`]. [`RangeMap`] rescales a raw value into the
//! range a channel publishes (brightness, mireds) with integer arithmetic that
//! truncates toward zero, the same rounding that microcontroller `map()`
//! helpers use.

use std::ops::RangeInclusive;

use crate::error::ValueError;

/// Lowest raw value produced by the analog inputs.
pub const ANALOG_MIN: i32 = 0;

/// Highest raw value produced by the analog inputs.
pub const ANALOG_MAX: i32 = 1023;

/// Linear mapping from a source range onto a target range.
///
/// Inputs outside the source range are clamped before scaling, so the
/// result always lies inside the target range and the mapping is
/// monotonic.
///
/// # Examples
///
/// ```
/// use sense_relay::mapping::RangeMap;
///
/// let bri = RangeMap::analog(1..=254).unwrap();
/// assert_eq!(bri.apply(0), 1);
/// assert_eq!(bri.apply(1023), 254);
/// assert_eq!(bri.apply(5000), 254);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeMap {
    from_min: i32,
    from_max: i32,
    to_min: i32,
    to_max: i32,
}

impl RangeMap {
    /// Creates a mapping between two inclusive ranges.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::EmptyRange` if the source range has fewer than two
    /// points or the target range is reversed.
    pub fn new(from: RangeInclusive<i32>, to: RangeInclusive<i32>) -> Result<Self, ValueError> {
        let (from_min, from_max) = from.into_inner();
        let (to_min, to_max) = to.into_inner();
        if from_min >= from_max {
            return Err(ValueError::EmptyRange {
                start: from_min,
                end: from_max,
            });
        }
        if to_min > to_max {
            return Err(ValueError::EmptyRange {
                start: to_min,
                end: to_max,
            });
        }
        Ok(Self {
            from_min,
            from_max,
            to_min,
            to_max,
        })
    }

    /// Creates a mapping from the 10-bit analog range onto `to`.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::EmptyRange` if `to` is reversed.
    pub fn analog(to: RangeInclusive<i32>) -> Result<Self, ValueError> {
        Self::new(ANALOG_MIN..=ANALOG_MAX, to)
    }

    /// Maps a raw value into the target range.
    #[must_use]
    pub fn apply(&self, raw: i32) -> i32 {
        let x = i64::from(raw.clamp(self.from_min, self.from_max));
        let span_in = i64::from(self.from_max) - i64::from(self.from_min);
        let span_out = i64::from(self.to_max) - i64::from(self.to_min);
        let scaled = (x - i64::from(self.from_min)) * span_out / span_in + i64::from(self.to_min);
        // Clamped input keeps `scaled` within [to_min, to_max].
        #[allow(clippy::cast_possible_truncation)]
        let out = scaled as i32;
        out
    }

    /// Returns the target range.
    #[must_use]
    pub fn target(&self) -> RangeInclusive<i32> {
        self.to_min..=self.to_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brightness_endpoints() {
        let map = RangeMap::analog(1..=254).unwrap();
        assert_eq!(map.apply(0), 1);
        assert_eq!(map.apply(1023), 254);
    }

    #[test]
    fn color_temp_endpoints() {
        let map = RangeMap::analog(153..=500).unwrap();
        assert_eq!(map.apply(0), 153);
        assert_eq!(map.apply(1023), 500);
        // (512 * 347) / 1023 + 153 = 173 + 153
        assert_eq!(map.apply(512), 326);
    }

    #[test]
    fn out_of_range_inputs_are_clamped() {
        let map = RangeMap::analog(1..=254).unwrap();
        assert_eq!(map.apply(-40), 1);
        assert_eq!(map.apply(i32::MAX), 254);
        assert_eq!(map.apply(i32::MIN), 1);
    }

    #[test]
    fn mapping_is_monotonic_and_bounded() {
        for to in [1..=254, 153..=500, 0..=0, -10..=10] {
            let map = RangeMap::analog(to.clone()).unwrap();
            let mut previous = map.apply(ANALOG_MIN);
            for raw in ANALOG_MIN..=ANALOG_MAX {
                let out = map.apply(raw);
                assert!(out >= previous, "not monotonic at {raw}");
                assert!(to.contains(&out), "{out} escaped {to:?}");
                previous = out;
            }
        }
    }

    #[test]
    fn rejects_empty_ranges() {
        assert_eq!(
            RangeMap::new(5..=5, 0..=10).unwrap_err(),
            ValueError::EmptyRange { start: 5, end: 5 }
        );
        assert!(RangeMap::analog(10..=0).is_err());
    }
}

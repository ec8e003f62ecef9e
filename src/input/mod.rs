// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Physical inputs sampled by the loops.
//!
//! The loops never touch hardware directly. They read through these traits,
//! which board support code (or the host-side [`InputPanel`]) implements.
//!
//! - [`DigitalInput`] - a GPIO level
//! - [`AnalogInput`] - a 10-bit ADC reading
//! - [`RangeSensor`] - a time-of-flight distance sensor
//! - [`Indicator`] - a status LED used to signal fatal setup failures

mod panel;

use std::time::Duration;

pub use panel::{InputPanel, PanelAnalog, PanelDigital, PanelRangeSensor, parse_assignments};

use crate::error::SetupError;
use crate::types::Distance;

/// A digital pin.
pub trait DigitalInput {
    /// Returns true if the pin reads a high level.
    fn is_high(&mut self) -> bool;
}

/// An analog pin read through the ADC.
pub trait AnalogInput {
    /// Returns the raw conversion result, nominally in `0..=1023`.
    fn read(&mut self) -> i32;
}

/// A ranging sensor that measures distance continuously.
pub trait RangeSensor {
    /// Detects and configures the sensor.
    ///
    /// # Errors
    ///
    /// Returns `SetupError::SensorInit` if the sensor does not respond.
    fn init(&mut self, timeout: Duration) -> Result<(), SetupError>;

    /// Starts back-to-back measurements every `period`.
    fn start_continuous(&mut self, period: Duration);

    /// Returns the latest measurement, or `None` if the read timed out.
    fn read_range(&mut self) -> Option<Distance>;
}

/// A status light.
pub trait Indicator {
    /// Turns the light on or off.
    fn set(&mut self, lit: bool);
}

/// Indicator that reports its transitions through `tracing`.
///
/// Used on hosts without a status LED. Only changes are logged, so a steady
/// light produces one line.
#[derive(Debug, Clone, Default)]
pub struct LogIndicator {
    lit: Option<bool>,
}

impl LogIndicator {
    /// Creates an indicator in an unknown state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the last state set, if any.
    #[must_use]
    pub fn is_lit(&self) -> Option<bool> {
        self.lit
    }
}

impl Indicator for LogIndicator {
    fn set(&mut self, lit: bool) {
        if self.lit != Some(lit) {
            tracing::debug!(lit, "Indicator");
            self.lit = Some(lit);
        }
    }
}

/// Raw values sampled from the light dial's inputs in one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialSample {
    /// Whether the toggle switch is closed.
    pub switch_closed: bool,
    /// Raw brightness potentiometer reading.
    pub brightness_raw: i32,
    /// Raw color temperature potentiometer reading.
    pub color_temp_raw: i32,
}

/// Source of [`DialSample`]s.
pub trait DialInputs {
    /// Reads all dial inputs once.
    fn sample(&mut self) -> DialSample;
}

/// The light dial's pins: a pulled-up toggle switch and two potentiometers.
///
/// The switch pin is wired with a pull-up, so a closed switch reads low.
#[derive(Debug)]
pub struct DialPins<S, B, C> {
    switch: S,
    brightness: B,
    color_temp: C,
}

impl<S, B, C> DialPins<S, B, C>
where
    S: DigitalInput,
    B: AnalogInput,
    C: AnalogInput,
{
    /// Bundles the three inputs.
    pub fn new(switch: S, brightness: B, color_temp: C) -> Self {
        Self {
            switch,
            brightness,
            color_temp,
        }
    }
}

impl<S, B, C> DialInputs for DialPins<S, B, C>
where
    S: DigitalInput,
    B: AnalogInput,
    C: AnalogInput,
{
    fn sample(&mut self) -> DialSample {
        DialSample {
            switch_closed: !self.switch.is_high(),
            brightness_raw: self.brightness.read(),
            color_temp_raw: self.color_temp.read(),
        }
    }
}

/// Exponential blend of a previous value with a new reading.
///
/// # Examples
///
/// ```
/// use sense_relay::input::Smoother;
///
/// let s = Smoother::default();
/// assert_eq!(s.blend(100, 200), 110);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Smoother {
    retain: f64,
}

impl Smoother {
    /// Creates a smoother keeping `retain` of the previous value (0.0-1.0).
    #[must_use]
    pub fn new(retain: f64) -> Self {
        Self {
            retain: retain.clamp(0.0, 1.0),
        }
    }

    /// Blends `previous` with `reading`, truncating toward zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn blend(&self, previous: i32, reading: i32) -> i32 {
        let reading = f64::from(reading);
        let mixed = reading + (f64::from(previous) - reading) * self.retain;
        mixed as i32
    }
}

impl Default for Smoother {
    fn default() -> Self {
        Self::new(0.9)
    }
}

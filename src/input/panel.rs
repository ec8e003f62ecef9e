// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host-side stand-in for physical inputs.
//!
//! An [`InputPanel`] holds the latest value of every pin and of the ranging
//! sensor. A feeder task (stdin, a test) writes into it; the loop reads
//! through the [`PanelDigital`], [`PanelAnalog`] and [`PanelRangeSensor`]
//! handles, which implement the normal input traits.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::{AnalogInput, DigitalInput, RangeSensor};
use crate::error::{SetupError, ValueError};
use crate::types::Distance;

#[derive(Debug)]
struct PanelValues {
    digital: HashMap<u8, bool>,
    analog: HashMap<u8, i32>,
    sensor_present: bool,
    range: Option<Distance>,
}

/// Shared latest-value store for simulated inputs.
///
/// Cloning yields another handle to the same values.
///
/// # Examples
///
/// ```
/// use sense_relay::input::{AnalogInput, DigitalInput, InputPanel};
///
/// let panel = InputPanel::new();
/// let mut switch = panel.digital(2);
/// let mut pot = panel.analog(0);
///
/// // Unset digital pins float high (pull-up)
/// assert!(switch.is_high());
///
/// panel.set_digital(2, false);
/// panel.set_analog(0, 512);
/// assert!(!switch.is_high());
/// assert_eq!(pot.read(), 512);
/// ```
#[derive(Debug, Clone)]
pub struct InputPanel {
    values: Arc<Mutex<PanelValues>>,
}

impl InputPanel {
    /// Creates a panel with a detected ranging sensor and no readings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: Arc::new(Mutex::new(PanelValues {
                digital: HashMap::new(),
                analog: HashMap::new(),
                sensor_present: true,
                range: None,
            })),
        }
    }

    /// Returns a handle reading digital pin `pin`.
    #[must_use]
    pub fn digital(&self, pin: u8) -> PanelDigital {
        PanelDigital {
            panel: self.clone(),
            pin,
        }
    }

    /// Returns a handle reading analog pin `pin`.
    #[must_use]
    pub fn analog(&self, pin: u8) -> PanelAnalog {
        PanelAnalog {
            panel: self.clone(),
            pin,
        }
    }

    /// Returns a handle acting as the ranging sensor.
    #[must_use]
    pub fn range_sensor(&self) -> PanelRangeSensor {
        PanelRangeSensor {
            panel: self.clone(),
        }
    }

    /// Sets the level of a digital pin.
    pub fn set_digital(&self, pin: u8, high: bool) {
        self.values.lock().digital.insert(pin, high);
    }

    /// Sets the raw value of an analog pin.
    pub fn set_analog(&self, pin: u8, raw: i32) {
        self.values.lock().analog.insert(pin, raw);
    }

    /// Sets the latest distance measured by the ranging sensor.
    pub fn set_range(&self, distance: Option<Distance>) {
        self.values.lock().range = distance;
    }

    /// Marks the ranging sensor as present or absent on the bus.
    pub fn set_sensor_present(&self, present: bool) {
        self.values.lock().sensor_present = present;
    }
}

impl Default for InputPanel {
    fn default() -> Self {
        Self::new()
    }
}

/// Digital pin handle backed by an [`InputPanel`].
#[derive(Debug, Clone)]
pub struct PanelDigital {
    panel: InputPanel,
    pin: u8,
}

impl DigitalInput for PanelDigital {
    fn is_high(&mut self) -> bool {
        self.panel
            .values
            .lock()
            .digital
            .get(&self.pin)
            .copied()
            .unwrap_or(true)
    }
}

/// Analog pin handle backed by an [`InputPanel`].
#[derive(Debug, Clone)]
pub struct PanelAnalog {
    panel: InputPanel,
    pin: u8,
}

impl AnalogInput for PanelAnalog {
    fn read(&mut self) -> i32 {
        self.panel
            .values
            .lock()
            .analog
            .get(&self.pin)
            .copied()
            .unwrap_or(0)
    }
}

/// Ranging sensor handle backed by an [`InputPanel`].
#[derive(Debug, Clone)]
pub struct PanelRangeSensor {
    panel: InputPanel,
}

impl RangeSensor for PanelRangeSensor {
    fn init(&mut self, _timeout: Duration) -> Result<(), SetupError> {
        if self.panel.values.lock().sensor_present {
            Ok(())
        } else {
            Err(SetupError::SensorInit("no device answered".to_string()))
        }
    }

    fn start_continuous(&mut self, period: Duration) {
        tracing::debug!(period_ms = period.as_millis(), "Simulated sensor ranging");
    }

    fn read_range(&mut self) -> Option<Distance> {
        self.panel.values.lock().range
    }
}

/// Parses a line of `name=value` assignments separated by whitespace.
///
/// # Errors
///
/// Returns `ValueError::InvalidAssignment` naming the offending token if it
/// has no `=` or its value is not an integer.
///
/// # Examples
///
/// ```
/// use sense_relay::input::parse_assignments;
///
/// let parsed = parse_assignments("switch=1 bri=512").unwrap();
/// assert_eq!(parsed, vec![("switch", 1), ("bri", 512)]);
/// assert!(parse_assignments("bri").is_err());
/// ```
pub fn parse_assignments(line: &str) -> Result<Vec<(&str, i32)>, ValueError> {
    line.split_whitespace()
        .enumerate()
        .map(|(position, token)| {
            let invalid = || ValueError::InvalidAssignment(format!("token {position}: {token}"));
            let (name, value) = token.split_once('=').ok_or_else(invalid)?;
            let value = value.parse::<i32>().map_err(|_| invalid())?;
            Ok((name, value))
        })
        .collect()
}

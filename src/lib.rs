// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sense Relay - threshold-gated sampler/publisher loops.
//!
//! A loop polls physical inputs at a fixed period, maps raw readings into
//! the range the receiving side expects, and publishes a value only when it
//! moved by more than a per-channel threshold since the last one sent.
//!
//! # Loops
//!
//! - **Light dial**: a toggle switch and two potentiometers drive a light
//!   through a bridge's REST API (`PUT /api/{key}/lights/{id}/state`).
//! - **Range stream**: a time-of-flight sensor streams distances to a TCP
//!   listener as newline-delimited JSON.
//!
//! # Quick Start
//!
//! ## Light Dial
//!
//! ```no_run
//! use sense_relay::config::{LightDialSettings, Secrets};
//! use sense_relay::input::{DialPins, Indicator, InputPanel};
//! use sense_relay::link::ReachabilityLink;
//! use sense_relay::runtime::LightDial;
//!
//! struct Led;
//!
//! impl Indicator for Led {
//!     fn set(&mut self, _lit: bool) {}
//! }
//!
//! #[tokio::main]
//! async fn main() -> sense_relay::Result<()> {
//!     let settings = LightDialSettings::default();
//!     let bridge = Secrets::from_env().bridge(settings.light_id)?;
//!     let link = ReachabilityLink::new(bridge.socket_addr());
//!
//!     let panel = InputPanel::new();
//!     let pins = DialPins::new(
//!         panel.digital(settings.switch_pin),
//!         panel.analog(settings.brightness_pin),
//!         panel.analog(settings.color_temp_pin),
//!     );
//!
//!     let mut dial = LightDial::new(pins, bridge.into_client()?, link, Led, settings)?;
//!     dial.start().await?;
//!     dial.tick().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Range Stream
//!
//! ```no_run
//! use sense_relay::config::{RangeStreamSettings, StreamTarget};
//! use sense_relay::input::{Indicator, InputPanel};
//! use sense_relay::protocol::StreamClient;
//! use sense_relay::runtime::RangeStream;
//!
//! struct Led;
//!
//! impl Indicator for Led {
//!     fn set(&mut self, _lit: bool) {}
//! }
//!
//! #[tokio::main]
//! async fn main() -> sense_relay::Result<()> {
//!     let target = StreamTarget::from_env()?;
//!     let panel = InputPanel::new();
//!
//!     let mut stream = RangeStream::new(
//!         panel.range_sensor(),
//!         StreamClient::new(target.stream),
//!         Led,
//!         RangeStreamSettings::default(),
//!         target.device,
//!         target.timestamps,
//!     );
//!     stream.start()?;
//!     stream.tick().await;
//!     Ok(())
//! }
//! ```
//!
//! # Delivery
//!
//! By default a channel only advances its published value once the peer
//! confirmed the update, so a rejected send is retried on the next tick.
//! [`CommitPolicy::Always`] advances after every attempt instead.

pub mod channel;
pub mod clock;
pub mod config;
pub mod error;
pub mod input;
pub mod link;
pub mod mapping;
pub mod message;
pub mod protocol;
pub mod runtime;
pub mod types;

pub use channel::{CommitPolicy, SwitchChannel, ThresholdChannel};
pub use clock::TimestampSource;
pub use error::{ConfigError, Error, ProtocolError, Result, SetupError, ValueError};
pub use mapping::RangeMap;
pub use message::{LightCommand, LightState, SensorReading};
#[cfg(feature = "http")]
pub use protocol::{BridgeClient, BridgeConfig};
pub use protocol::{StreamClient, StreamConfig};
#[cfg(feature = "http")]
pub use runtime::LightDial;
pub use runtime::{RangeStream, TickReport};
pub use types::{Brightness, ColorTemp, Distance, PowerState};

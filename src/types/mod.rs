// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for published channels.
//!
//! Each type ensures values are within their valid ranges at construction
//! time, so a message built from them is always accepted by the peer.
//!
//! # Types
//!
//! - [`PowerState`] - On/Off state of the light
//! - [`Brightness`] - Bridge brightness level (1-254)
//! - [`ColorTemp`] - Color temperature in mireds (153-500)
//! - [`Distance`] - Ranging sensor distance in millimetres

mod brightness;
mod color;
mod distance;
mod power;

pub use brightness::Brightness;
pub use color::ColorTemp;
pub use distance::Distance;
pub use power::PowerState;

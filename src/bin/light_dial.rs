// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Light dial on a host.
//!
//! Reads simulated inputs from stdin, one line at a time:
//!
//! ```text
//! switch=1 bri=512 ct=0
//! bri=800
//! switch=0
//! ```
//!
//! `switch=1` closes the switch. `bri` and `ct` are raw 10-bit readings.
//! Log verbosity follows `RUST_LOG`.

use std::process::ExitCode;

use sense_relay::config::{LightDialSettings, Secrets};
use sense_relay::input::{DialPins, InputPanel, LogIndicator, parse_assignments};
use sense_relay::link::{ReachabilityLink, fail_stop};
use sense_relay::runtime::LightDial;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let settings = LightDialSettings::default();
    let mut led = LogIndicator::new();

    let secrets = Secrets::from_env();
    let bridge = match secrets.bridge(settings.light_id) {
        Ok(bridge) => bridge,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    let peer = bridge.socket_addr();
    let link = ReachabilityLink::new(peer.clone()).with_timeout(bridge.timeout());
    let client = match bridge.into_client() {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "Cannot create bridge client");
            return ExitCode::FAILURE;
        }
    };

    let panel = InputPanel::new();
    tokio::spawn(feed_inputs(panel.clone(), settings.clone()));

    let pins = DialPins::new(
        panel.digital(settings.switch_pin),
        panel.analog(settings.brightness_pin),
        panel.analog(settings.color_temp_pin),
    );
    let fault_blink = settings.fault_blink;
    let mut dial = match LightDial::new(pins, client, link, led.clone(), settings) {
        Ok(dial) => dial,
        Err(e) => {
            tracing::error!(error = %e, "Invalid light dial settings");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = dial.start().await {
        tracing::error!(error = %e, "Bridge unreachable");
        match fail_stop(&mut led, fault_blink).await {}
    }
    secrets.log_network_status(&peer);

    dial.sync_all().await;
    match dial.run().await {}
}

async fn feed_inputs(panel: InputPanel, settings: LightDialSettings) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                tracing::debug!("Input closed, holding last values");
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read input");
                return;
            }
        };

        let assignments = match parse_assignments(&line) {
            Ok(assignments) => assignments,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring input line");
                continue;
            }
        };

        for (name, value) in assignments {
            match name {
                // Pulled up: a closed switch reads low.
                "switch" => panel.set_digital(settings.switch_pin, value == 0),
                "bri" => panel.set_analog(settings.brightness_pin, value),
                "ct" => panel.set_analog(settings.color_temp_pin, value),
                other => tracing::warn!(input = other, "Unknown input"),
            }
        }
    }
}

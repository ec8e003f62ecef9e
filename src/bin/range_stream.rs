// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Range stream on a host.
//!
//! Reads simulated distances from stdin, one per line, in millimetres.
//! `none` makes the sensor time out. Log verbosity follows `RUST_LOG`.

use std::process::ExitCode;

use sense_relay::config::{RangeStreamSettings, Secrets, StreamTarget};
use sense_relay::input::{InputPanel, LogIndicator};
use sense_relay::link::fail_stop;
use sense_relay::protocol::StreamClient;
use sense_relay::runtime::RangeStream;
use sense_relay::types::Distance;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let settings = RangeStreamSettings::default();
    let mut led = LogIndicator::new();

    let target = match StreamTarget::from_env() {
        Ok(target) => target,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    let peer = target.stream.addr();
    tracing::info!(addr = %peer, device = %target.device, "Streaming target");

    let panel = InputPanel::new();
    tokio::spawn(feed_inputs(panel.clone()));

    let fault_blink = settings.fault_blink;
    let mut stream = RangeStream::new(
        panel.range_sensor(),
        StreamClient::new(target.stream),
        led.clone(),
        settings,
        target.device,
        target.timestamps,
    );

    if let Err(e) = stream.start() {
        tracing::error!(error = %e, "Failed to detect and initialize sensor");
        match fail_stop(&mut led, fault_blink).await {}
    }
    Secrets::from_env().log_network_status(&peer);

    match stream.run().await {}
}

async fn feed_inputs(panel: InputPanel) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read input");
                return;
            }
        };

        match line.trim() {
            "" => {}
            "none" => panel.set_range(None),
            raw => match raw.parse::<u16>() {
                Ok(mm) => panel.set_range(Some(Distance::from_mm(mm))),
                Err(e) => tracing::warn!(input = raw, error = %e, "Ignoring input line"),
            },
        }
    }
}

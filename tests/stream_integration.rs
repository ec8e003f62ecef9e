// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the range stream against a local TCP listener.

use std::time::Duration;

use sense_relay::clock::TimestampSource;
use sense_relay::config::RangeStreamSettings;
use sense_relay::error::SetupError;
use sense_relay::input::{InputPanel, LogIndicator, PanelRangeSensor};
use sense_relay::link::Link;
use sense_relay::message::SensorReading;
use sense_relay::protocol::{StreamClient, StreamConfig};
use sense_relay::runtime::RangeStream;
use sense_relay::types::Distance;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpListener;
use tokio::net::tcp::OwnedReadHalf;

type PanelStream = RangeStream<PanelRangeSensor, StreamClient, LogIndicator>;

async fn listener() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

fn stream_to(port: u16, panel: &InputPanel, timestamps: TimestampSource) -> PanelStream {
    RangeStream::new(
        panel.range_sensor(),
        StreamClient::new(StreamConfig::new("127.0.0.1", port)),
        LogIndicator::new(),
        RangeStreamSettings::default(),
        "bench",
        timestamps,
    )
}

async fn next_reading(lines: &mut Lines<BufReader<OwnedReadHalf>>) -> SensorReading {
    let line = tokio::time::timeout(Duration::from_secs(2), lines.next_line())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    serde_json::from_str(&line).unwrap()
}

#[tokio::test]
async fn first_tick_connects_then_readings_flow() {
    let (listener, port) = listener().await;
    let panel = InputPanel::new();
    let mut stream = stream_to(port, &panel, TimestampSource::None);
    stream.start().unwrap();

    panel.set_range(Some(Distance::from_mm(120)));
    let first = stream.tick().await;
    assert!(first.link_down);
    assert!(first.is_quiet());

    let (peer, _) = listener.accept().await.unwrap();
    let (read_half, _write_half) = peer.into_split();
    let mut lines = BufReader::new(read_half).lines();

    let report = stream.tick().await;
    assert_eq!(report.for_field("sensor")[0].value, 120);
    let reading = next_reading(&mut lines).await;
    assert_eq!(reading, SensorReading::new("bench", None, 120));

    // Within 2 mm: held back. Beyond the limit: ignored.
    panel.set_range(Some(Distance::from_mm(122)));
    assert!(stream.tick().await.is_quiet());
    panel.set_range(Some(Distance::from_mm(260)));
    assert!(stream.tick().await.is_quiet());

    panel.set_range(Some(Distance::from_mm(90)));
    stream.tick().await;
    assert_eq!(next_reading(&mut lines).await.sensor, 90);
}

#[tokio::test]
async fn readings_carry_wall_clock_time() {
    let (listener, port) = listener().await;
    let panel = InputPanel::new();
    let mut stream = stream_to(port, &panel, TimestampSource::WallClock);
    stream.start().unwrap();

    stream.tick().await;
    let (peer, _) = listener.accept().await.unwrap();
    let mut lines = BufReader::new(peer.into_split().0).lines();

    panel.set_range(Some(Distance::from_mm(42)));
    stream.tick().await;
    let reading = next_reading(&mut lines).await;
    let time = reading.time.unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(&time).is_ok(), "{time}");
}

#[tokio::test]
async fn closed_listener_is_reconnected() {
    let (listener, port) = listener().await;
    let panel = InputPanel::new();
    let mut stream = stream_to(port, &panel, TimestampSource::None);
    stream.start().unwrap();

    stream.tick().await;
    let (mut peer, _) = listener.accept().await.unwrap();
    peer.write_all(b"welcome\n").await.unwrap();
    peer.shutdown().await.unwrap();
    drop(peer);

    // Inbound bytes and the close are noticed on a later tick.
    for _ in 0..50 {
        stream.tick().await;
        if !stream.client().is_connected() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(!stream.client().is_connected());

    assert!(stream.tick().await.link_down);
    let (peer, _) = listener.accept().await.unwrap();
    let mut lines = BufReader::new(peer.into_split().0).lines();

    panel.set_range(Some(Distance::from_mm(30)));
    stream.tick().await;
    assert_eq!(next_reading(&mut lines).await.sensor, 30);
}

#[test]
fn missing_sensor_fails_start() {
    let panel = InputPanel::new();
    panel.set_sensor_present(false);
    let mut stream = stream_to(9, &panel, TimestampSource::None);
    let err = stream.start().unwrap_err();
    assert!(matches!(err, SetupError::SensorInit(_)));
}

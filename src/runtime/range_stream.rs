// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Range stream loop: distance sensor to a TCP listener.

use std::convert::Infallible;

use crate::channel::ThresholdChannel;
use crate::clock::TimestampSource;
use crate::config::RangeStreamSettings;
use crate::error::SetupError;
use crate::input::{Indicator, RangeSensor, Smoother};
use crate::link::Link;
use crate::message::SensorReading;
use crate::protocol::ReadingSink;
use crate::runtime::TickReport;
use crate::types::Distance;

/// Published state of the range stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeStreamState {
    /// Last published distance in millimetres.
    pub distance: ThresholdChannel,
    /// Last smoothed distance, for diagnostics only. Blends the previously
    /// published reading (0 before the first) with the new one.
    pub smoothed: Option<i32>,
}

impl RangeStreamState {
    /// Creates an empty state with the given dead band.
    #[must_use]
    pub fn new(threshold: u32) -> Self {
        Self {
            distance: ThresholdChannel::new(threshold),
            smoothed: None,
        }
    }
}

/// Streams distance readings as newline-delimited JSON.
///
/// A reading goes out when it is closer than the maximum distance and moved
/// by more than the change threshold since the last published one. The raw
/// reading is sent; the smoothed value is only logged.
#[derive(Debug)]
pub struct RangeStream<R, C, N> {
    sensor: R,
    client: C,
    indicator: N,
    settings: RangeStreamSettings,
    device: String,
    timestamps: TimestampSource,
    smoother: Smoother,
    state: RangeStreamState,
}

impl<R, C, N> RangeStream<R, C, N>
where
    R: RangeSensor,
    C: Link + ReadingSink,
    N: Indicator,
{
    /// Creates a range stream reporting as `device`.
    pub fn new(
        sensor: R,
        client: C,
        indicator: N,
        settings: RangeStreamSettings,
        device: impl Into<String>,
        timestamps: TimestampSource,
    ) -> Self {
        Self {
            sensor,
            client,
            indicator,
            state: RangeStreamState::new(settings.change_threshold),
            settings,
            device: device.into(),
            timestamps,
            smoother: Smoother::default(),
        }
    }

    /// Returns the published state.
    #[must_use]
    pub fn state(&self) -> &RangeStreamState {
        &self.state
    }

    /// Returns the client.
    #[must_use]
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Initializes the sensor and starts continuous ranging.
    ///
    /// The first connection to the listener is made by the first tick.
    ///
    /// # Errors
    ///
    /// Returns `SetupError::SensorInit` if the sensor does not respond.
    pub fn start(&mut self) -> Result<(), SetupError> {
        self.sensor.init(self.settings.sensor_timeout)?;
        self.sensor.start_continuous(self.settings.sensor_period);
        self.indicator.set(true);
        tracing::info!(device = %self.device, "Sensor ranging");
        Ok(())
    }

    /// Runs ticks forever, one per sensor period.
    pub async fn run(&mut self) -> Infallible {
        loop {
            self.tick().await;
            tokio::time::sleep(self.settings.sensor_period).await;
        }
    }

    /// Makes one pass: ensure the session, read, maybe publish, drain replies.
    pub async fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();

        if !self.client.is_connected() {
            tracing::info!(link = %self.client.describe(), "Connecting");
            match self.client.connect().await {
                Ok(()) => tracing::info!(link = %self.client.describe(), "Connected"),
                Err(e) => tracing::warn!(link = %self.client.describe(), error = %e, "Connection failed"),
            }
            report.link_down = true;
            return report;
        }

        match self.sensor.read_range() {
            Some(distance) => self.publish(distance, &mut report).await,
            None => tracing::debug!("Sensor read timed out"),
        }

        match self.client.drain_incoming() {
            Ok(Some(text)) => tracing::info!(received = %text.trim_end(), "Listener sent data"),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Failed to read from listener"),
        }

        report
    }

    async fn publish(&mut self, distance: Distance, report: &mut TickReport) {
        let mm = i32::from(distance);

        if distance.is_within(self.settings.max_distance) && self.state.distance.exceeds(mm) {
            let last = self.state.distance.published().unwrap_or(0);
            let smoothed = self.smoother.blend(last, mm);
            self.state.smoothed = Some(smoothed);
            tracing::debug!(raw = mm, smoothed, "Distance changed");

            let reading = SensorReading::new(self.device.clone(), self.timestamps.stamp(), mm);
            let delivered = match self.client.send_reading(&reading).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to send reading");
                    if e.is_transport() {
                        self.client.mark_down();
                    }
                    false
                }
            };
            self.state
                .distance
                .record(mm, delivered, self.settings.commit_policy);
            report.record("sensor", mm, delivered);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::time::Duration;

    use super::*;
    use crate::channel::CommitPolicy;
    use crate::error::ProtocolError;

    struct Readings(VecDeque<Option<u16>>);

    impl RangeSensor for Readings {
        fn init(&mut self, _timeout: Duration) -> Result<(), SetupError> {
            Ok(())
        }

        fn start_continuous(&mut self, _period: Duration) {}

        fn read_range(&mut self) -> Option<Distance> {
            self.0.pop_front().flatten().map(Distance::from_mm)
        }
    }

    fn readings(values: &[Option<u16>]) -> Readings {
        Readings(values.iter().copied().collect())
    }

    #[derive(Default)]
    struct Session {
        up: bool,
        refuse: bool,
        fail_sends: u32,
        lines: Vec<String>,
        inbox: Option<String>,
    }

    impl Link for Session {
        fn is_connected(&self) -> bool {
            self.up
        }

        async fn connect(&mut self) -> Result<(), ProtocolError> {
            if self.refuse {
                return Err(ProtocolError::ConnectionFailed("refused".into()));
            }
            self.up = true;
            Ok(())
        }

        fn mark_down(&mut self) {
            self.up = false;
        }
    }

    impl ReadingSink for Session {
        async fn send_reading(&mut self, reading: &SensorReading) -> Result<(), ProtocolError> {
            if self.fail_sends > 0 {
                self.fail_sends -= 1;
                return Err(ProtocolError::Io(std::io::Error::from(
                    std::io::ErrorKind::BrokenPipe,
                )));
            }
            self.lines.push(reading.to_line().unwrap());
            Ok(())
        }

        fn drain_incoming(&mut self) -> Result<Option<String>, ProtocolError> {
            Ok(self.inbox.take())
        }
    }

    struct Dark;

    impl Indicator for Dark {
        fn set(&mut self, _lit: bool) {}
    }

    fn stream(values: &[Option<u16>], session: Session) -> RangeStream<Readings, Session, Dark> {
        RangeStream::new(
            readings(values),
            session,
            Dark,
            RangeStreamSettings::default(),
            "bench",
            TimestampSource::None,
        )
    }

    fn connected() -> Session {
        Session {
            up: true,
            ..Session::default()
        }
    }

    #[tokio::test]
    async fn publishes_first_reading_then_only_changes() {
        let mut s = stream(&[Some(100), Some(102), Some(103)], connected());
        assert_eq!(s.tick().await.for_field("sensor").len(), 1);
        assert!(s.tick().await.is_quiet());
        assert_eq!(s.tick().await.for_field("sensor")[0].value, 103);
        assert_eq!(
            s.client().lines,
            vec![
                "{\"device\":\"bench\",\"sensor\":100}\n",
                "{\"device\":\"bench\",\"sensor\":103}\n",
            ]
        );
    }

    #[tokio::test]
    async fn far_readings_never_publish() {
        let mut s = stream(&[Some(260), Some(250), Some(10_000)], connected());
        for _ in 0..3 {
            assert!(s.tick().await.is_quiet());
        }
        assert!(s.client().lines.is_empty());
        assert_eq!(s.state().distance.published(), None);
    }

    #[tokio::test]
    async fn missing_reading_skips_tick() {
        let mut s = stream(&[None, Some(42)], connected());
        assert!(s.tick().await.is_quiet());
        assert_eq!(s.tick().await.for_field("sensor")[0].value, 42);
    }

    #[tokio::test]
    async fn down_session_gets_one_attempt_per_tick() {
        let mut s = stream(
            &[Some(42), Some(42)],
            Session {
                refuse: true,
                ..Session::default()
            },
        );
        let report = s.tick().await;
        assert!(report.link_down);
        assert!(report.is_quiet());

        s.client.refuse = false;
        assert!(s.tick().await.link_down);
        assert!(s.client().is_connected());
        // Both readings are still queued: skipped ticks do not sample.
        assert_eq!(s.tick().await.for_field("sensor")[0].value, 42);
    }

    #[tokio::test]
    async fn failed_send_marks_session_down_and_retries() {
        let mut s = stream(
            &[Some(80), Some(80), Some(80)],
            Session {
                up: true,
                fail_sends: 1,
                ..Session::default()
            },
        );
        let first = s.tick().await;
        assert!(!first.for_field("sensor")[0].delivered);
        assert!(!s.client().is_connected());

        assert!(s.tick().await.link_down);
        let third = s.tick().await;
        assert!(third.for_field("sensor")[0].delivered);
    }

    #[tokio::test]
    async fn always_policy_drops_failed_reading() {
        let mut s = RangeStream::new(
            readings(&[Some(80), Some(80)]),
            Session {
                up: true,
                fail_sends: 1,
                ..Session::default()
            },
            Dark,
            RangeStreamSettings::default().with_commit_policy(CommitPolicy::Always),
            "bench",
            TimestampSource::None,
        );
        s.tick().await;
        assert_eq!(s.state().distance.published(), Some(80));
        s.client.up = true;
        assert!(s.tick().await.is_quiet());
    }

    #[tokio::test]
    async fn smoothing_blends_last_published_reading() {
        let mut s = stream(&[Some(100), Some(150), Some(151), Some(200)], connected());
        s.tick().await;
        // Nothing published yet, so the blend starts from zero.
        assert_eq!(s.state().smoothed, Some(10));
        s.tick().await;
        assert_eq!(s.state().smoothed, Some(105));
        // Inside the dead band: neither published nor smoothed.
        s.tick().await;
        assert_eq!(s.state().smoothed, Some(105));
        s.tick().await;
        assert_eq!(s.state().smoothed, Some(155));
    }

    #[tokio::test]
    async fn inbound_bytes_are_drained() {
        let mut s = stream(
            &[None],
            Session {
                up: true,
                inbox: Some("ack\n".into()),
                ..Session::default()
            },
        );
        s.tick().await;
        assert_eq!(s.client().inbox, None);
    }

    #[tokio::test(start_paused = true)]
    async fn run_polls_once_per_sensor_period() {
        let mut s = stream(&[None; 10], connected());
        let start = tokio::time::Instant::now();
        // Reads at 0, 50, 100 and 150 ms.
        let outcome = tokio::time::timeout(Duration::from_millis(175), s.run()).await;
        assert!(outcome.is_err());
        assert_eq!(start.elapsed(), Duration::from_millis(175));
        assert_eq!(s.sensor.0.len(), 6);
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Light dial loop: switch and potentiometers to a bridge-controlled light.

use std::convert::Infallible;

use crate::channel::{SwitchChannel, ThresholdChannel};
use crate::config::LightDialSettings;
use crate::error::{SetupError, ValueError};
use crate::input::{DialInputs, Indicator};
use crate::link::{Link, connect_with_policy};
use crate::mapping::RangeMap;
use crate::message::{LightCommand, LightState};
use crate::protocol::LightSink;
use crate::runtime::TickReport;
use crate::types::{Brightness, ColorTemp, PowerState};

/// Published state of the light dial's channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightDialState {
    /// Last published on/off state.
    pub power: SwitchChannel,
    /// Whether the switch currently asks for the light to be on.
    pub light_on: bool,
    /// Last published brightness.
    pub brightness: ThresholdChannel,
    /// Last published color temperature.
    pub color_temp: ThresholdChannel,
}

impl LightDialState {
    /// Creates an empty state with the given dead band.
    #[must_use]
    pub fn new(threshold: u32) -> Self {
        Self {
            power: SwitchChannel::new(),
            light_on: false,
            brightness: ThresholdChannel::new(threshold),
            color_temp: ThresholdChannel::new(threshold),
        }
    }
}

/// Polls a toggle switch and two potentiometers and pushes changes to a
/// light.
///
/// Per tick:
/// 1. If the link is down, reconnect; on failure wait out the cooldown and
///    skip the tick.
/// 2. Publish `on` whenever the switch differs from the published state.
/// 3. While the light is on, publish `bri` and `ct` when their mapped value
///    moved by more than the threshold. Skipped once a transport failure
///    earlier in the tick marked the link down.
///
/// Every publish is followed by the debounce delay. [`LightDial::run`] adds
/// the loop delay between ticks.
#[derive(Debug)]
pub struct LightDial<D, S, L, N> {
    inputs: D,
    sink: S,
    link: L,
    indicator: N,
    settings: LightDialSettings,
    brightness_map: RangeMap,
    color_temp_map: RangeMap,
    state: LightDialState,
}

impl<D, S, L, N> LightDial<D, S, L, N>
where
    D: DialInputs,
    S: LightSink,
    L: Link,
    N: Indicator,
{
    /// Creates a light dial.
    ///
    /// # Errors
    ///
    /// Returns `ValueError` if the brightness or color temperature bounds in
    /// `settings` are outside what the bridge accepts or are reversed.
    pub fn new(
        inputs: D,
        sink: S,
        link: L,
        indicator: N,
        settings: LightDialSettings,
    ) -> Result<Self, ValueError> {
        let min_bri = Brightness::new(settings.min_brightness)?;
        let max_bri = Brightness::new(settings.max_brightness)?;
        let min_ct = ColorTemp::new(settings.min_color_temp)?;
        let max_ct = ColorTemp::new(settings.max_color_temp)?;

        let brightness_map =
            RangeMap::analog(i32::from(min_bri.value())..=i32::from(max_bri.value()))?;
        let color_temp_map =
            RangeMap::analog(i32::from(min_ct.value())..=i32::from(max_ct.value()))?;

        Ok(Self {
            inputs,
            sink,
            link,
            indicator,
            state: LightDialState::new(settings.update_threshold),
            settings,
            brightness_map,
            color_temp_map,
        })
    }

    /// Returns the published state.
    #[must_use]
    pub fn state(&self) -> &LightDialState {
        &self.state
    }

    /// Returns the sink.
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Returns the link.
    #[must_use]
    pub fn link(&self) -> &L {
        &self.link
    }

    /// Brings the link up for the first time.
    ///
    /// # Errors
    ///
    /// Returns `SetupError::LinkUnavailable` if the retry budget is spent.
    pub async fn start(&mut self) -> Result<(), SetupError> {
        connect_with_policy(
            &mut self.link,
            &self.settings.reconnection,
            &mut self.indicator,
        )
        .await?;
        tracing::info!(light = self.settings.light_id, "Ready to control light");
        Ok(())
    }

    /// Runs ticks forever, pausing the loop delay between them.
    pub async fn run(&mut self) -> Infallible {
        loop {
            self.tick().await;
            tokio::time::sleep(self.settings.loop_delay).await;
        }
    }

    /// Samples the inputs once and publishes whatever changed.
    pub async fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();

        if !self.link.is_connected() {
            tracing::warn!(link = %self.link.describe(), "Connection lost, attempting to reconnect");
            let reconnected = connect_with_policy(
                &mut self.link,
                &self.settings.reconnection,
                &mut self.indicator,
            )
            .await;
            if reconnected.is_err() {
                tokio::time::sleep(self.settings.reconnection.cooldown).await;
                report.link_down = true;
                return report;
            }
        }

        let sample = self.inputs.sample();
        let brightness = self.brightness_map.apply(sample.brightness_raw);
        let color_temp = self.color_temp_map.apply(sample.color_temp_raw);
        let policy = self.settings.commit_policy;

        if self.state.power.differs(sample.switch_closed) {
            self.state.light_on = sample.switch_closed;
            let power = PowerState::from(sample.switch_closed);
            let delivered = self.publish(&LightCommand::Power(power)).await;
            if delivered {
                tracing::info!(state = %power, "Light power state changed");
            }
            self.state
                .power
                .record(sample.switch_closed, delivered, policy);
            report.record("on", i32::from(sample.switch_closed), delivered);
            tokio::time::sleep(self.settings.debounce).await;
        }

        if self.link.is_connected()
            && self.state.light_on
            && self.state.brightness.exceeds(brightness)
        {
            let bri = Brightness::saturating(brightness);
            let delivered = self.publish(&LightCommand::Brightness(bri)).await;
            if delivered {
                tracing::info!(brightness = %bri, "Brightness updated");
            }
            self.state.brightness.record(brightness, delivered, policy);
            report.record("bri", brightness, delivered);
            tokio::time::sleep(self.settings.debounce).await;
        }

        if self.link.is_connected()
            && self.state.light_on
            && self.state.color_temp.exceeds(color_temp)
        {
            let ct = ColorTemp::saturating(color_temp);
            let delivered = self.publish(&LightCommand::ColorTemp(ct)).await;
            if delivered {
                tracing::info!(color_temp = %ct, "Color temperature updated");
            }
            self.state.color_temp.record(color_temp, delivered, policy);
            report.record("ct", color_temp, delivered);
            tokio::time::sleep(self.settings.debounce).await;
        }

        report
    }

    /// Pushes the full current state in a single request.
    ///
    /// Samples the inputs and sends `{"on":false}` or
    /// `{"on":true,"bri":..,"ct":..}`. On success every channel is
    /// committed, so the next tick only publishes real changes.
    pub async fn sync_all(&mut self) -> bool {
        let sample = self.inputs.sample();
        let brightness = self.brightness_map.apply(sample.brightness_raw);
        let color_temp = self.color_temp_map.apply(sample.color_temp_raw);
        self.state.light_on = sample.switch_closed;

        let state = if sample.switch_closed {
            LightState::on(
                Brightness::saturating(brightness),
                ColorTemp::saturating(color_temp),
            )
        } else {
            LightState::off()
        };

        let delivered = match self.sink.send_state(&state).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to update light");
                if e.is_transport() {
                    self.link.mark_down();
                }
                false
            }
        };

        let policy = self.settings.commit_policy;
        self.state
            .power
            .record(sample.switch_closed, delivered, policy);
        if sample.switch_closed {
            self.state.brightness.record(brightness, delivered, policy);
            self.state.color_temp.record(color_temp, delivered, policy);
        }
        delivered
    }

    async fn publish(&mut self, command: &LightCommand) -> bool {
        match self.sink.send_command(command).await {
            Ok(response) => {
                tracing::debug!(
                    field = command.field(),
                    status = response.status(),
                    "Light command accepted"
                );
                true
            }
            Err(e) => {
                tracing::warn!(field = command.field(), error = %e, "Failed to send light command");
                if e.is_transport() {
                    self.link.mark_down();
                }
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::time::Duration;

    use parking_lot::Mutex;
    use tokio::time::Instant;

    use super::*;
    use crate::channel::CommitPolicy;
    use crate::error::ProtocolError;
    use crate::input::DialSample;
    use crate::link::ReconnectionPolicy;
    use crate::protocol::BridgeResponse;

    struct Script {
        samples: VecDeque<DialSample>,
        taken: Arc<Mutex<usize>>,
    }

    impl Script {
        fn new(samples: &[(bool, i32, i32)]) -> Self {
            Self {
                samples: samples
                    .iter()
                    .map(|&(switch_closed, brightness_raw, color_temp_raw)| DialSample {
                        switch_closed,
                        brightness_raw,
                        color_temp_raw,
                    })
                    .collect(),
                taken: Arc::default(),
            }
        }
    }

    impl DialInputs for Script {
        fn sample(&mut self) -> DialSample {
            *self.taken.lock() += 1;
            if self.samples.len() > 1 {
                self.samples.pop_front().unwrap()
            } else {
                *self.samples.front().unwrap()
            }
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<String>>,
        statuses: Mutex<VecDeque<u16>>,
    }

    impl RecordingSink {
        /// Status 0 stands for a request that never got a reply.
        fn failing_once(status: u16) -> Self {
            let sink = Self::default();
            sink.statuses.lock().push_back(status);
            sink
        }

        fn bodies(&self) -> Vec<String> {
            self.sent.lock().clone()
        }

        fn reply(&self, body: String) -> Result<BridgeResponse, ProtocolError> {
            self.sent.lock().push(body);
            let status = self.statuses.lock().pop_front().unwrap_or(200);
            if status == 0 {
                Err(ProtocolError::ConnectionFailed("reset by peer".into()))
            } else if (200..300).contains(&status) {
                Ok(BridgeResponse::new(status, "[]".to_string()))
            } else {
                Err(ProtocolError::Status {
                    status,
                    body: String::new(),
                })
            }
        }
    }

    impl LightSink for RecordingSink {
        async fn send_command(
            &self,
            command: &LightCommand,
        ) -> Result<BridgeResponse, ProtocolError> {
            self.reply(command.to_body().unwrap())
        }

        async fn send_state(&self, state: &LightState) -> Result<BridgeResponse, ProtocolError> {
            self.reply(state.to_body().unwrap())
        }
    }

    struct Wifi {
        up: bool,
        accept: bool,
    }

    impl Link for Wifi {
        fn is_connected(&self) -> bool {
            self.up
        }

        async fn connect(&mut self) -> Result<(), ProtocolError> {
            if self.accept {
                self.up = true;
                Ok(())
            } else {
                Err(ProtocolError::ConnectionFailed("no AP".into()))
            }
        }

        fn mark_down(&mut self) {
            self.up = false;
        }
    }

    struct Dark;

    impl Indicator for Dark {
        fn set(&mut self, _lit: bool) {}
    }

    type TestDial = LightDial<Script, RecordingSink, Wifi, Dark>;

    fn dial(samples: &[(bool, i32, i32)], sink: RecordingSink, policy: CommitPolicy) -> TestDial {
        LightDial::new(
            Script::new(samples),
            sink,
            Wifi {
                up: true,
                accept: true,
            },
            Dark,
            LightDialSettings::default().with_commit_policy(policy),
        )
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn switch_on_publishes_power_then_levels() {
        let mut dial = dial(
            &[(true, 1023, 0)],
            RecordingSink::default(),
            CommitPolicy::OnSuccess,
        );
        let report = dial.tick().await;
        assert_eq!(
            dial.sink().bodies(),
            vec![r#"{"on":true}"#, r#"{"bri":254}"#, r#"{"ct":153}"#]
        );
        assert_eq!(report.publications.len(), 3);
        assert!(report.publications.iter().all(|p| p.delivered));
    }

    #[tokio::test(start_paused = true)]
    async fn levels_are_not_sent_while_off() {
        let mut dial = dial(
            &[(false, 0, 0), (false, 1023, 1023)],
            RecordingSink::default(),
            CommitPolicy::OnSuccess,
        );
        dial.tick().await;
        let report = dial.tick().await;
        assert!(report.is_quiet());
        assert_eq!(dial.sink().bodies(), vec![r#"{"on":false}"#]);
    }

    #[tokio::test(start_paused = true)]
    async fn small_moves_stay_inside_dead_band() {
        // Raw 512 -> bri 127, raw 530 -> bri 132 (delta 5), raw 540 -> bri 134 (delta 7)
        let mut dial = dial(
            &[(true, 512, 0), (true, 530, 0), (true, 540, 0)],
            RecordingSink::default(),
            CommitPolicy::OnSuccess,
        );
        dial.tick().await;
        assert!(dial.tick().await.for_field("bri").is_empty());
        let third = dial.tick().await;
        assert_eq!(third.for_field("bri")[0].value, 134);
        assert_eq!(dial.state().brightness.published(), Some(134));
    }

    #[tokio::test(start_paused = true)]
    async fn each_toggle_publishes_exactly_once() {
        let mut dial = dial(
            &[(true, 0, 0), (false, 0, 0), (false, 0, 0), (true, 0, 0)],
            RecordingSink::default(),
            CommitPolicy::OnSuccess,
        );
        let mut power_sends = 0;
        for _ in 0..4 {
            power_sends += dial.tick().await.for_field("on").len();
        }
        assert_eq!(power_sends, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_update_is_retried_on_success_policy() {
        let mut dial = dial(
            &[(true, 1023, 0)],
            RecordingSink::failing_once(404),
            CommitPolicy::OnSuccess,
        );
        let first = dial.tick().await;
        assert!(!first.for_field("on")[0].delivered);
        assert_eq!(dial.state().power.published(), None);
        // The light still follows the switch, so levels went out.
        assert!(dial.state().light_on);

        let second = dial.tick().await;
        assert_eq!(second.for_field("on").len(), 1);
        assert!(second.for_field("on")[0].delivered);
        assert!(second.for_field("bri").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_update_is_dropped_on_always_policy() {
        let mut dial = dial(
            &[(true, 1023, 0)],
            RecordingSink::failing_once(404),
            CommitPolicy::Always,
        );
        dial.tick().await;
        assert_eq!(dial.state().power.published(), Some(true));
        assert!(dial.tick().await.is_quiet());
    }

    #[tokio::test(start_paused = true)]
    async fn down_link_skips_tick() {
        let mut dial = LightDial::new(
            Script::new(&[(true, 0, 0)]),
            RecordingSink::default(),
            Wifi {
                up: false,
                accept: false,
            },
            Dark,
            LightDialSettings::default()
                .with_reconnection(ReconnectionPolicy::new().with_max_attempts(1)),
        )
        .unwrap();
        let report = dial.tick().await;
        assert!(report.link_down);
        assert!(report.is_quiet());
        assert!(dial.sink().bodies().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn sync_all_sends_combined_state() {
        let mut dial = dial(
            &[(true, 1023, 1023)],
            RecordingSink::default(),
            CommitPolicy::OnSuccess,
        );
        assert!(dial.sync_all().await);
        assert_eq!(
            dial.sink().bodies(),
            vec![r#"{"on":true,"bri":254,"ct":500}"#]
        );
        assert!(dial.tick().await.is_quiet());
    }

    #[test]
    fn invalid_bounds_are_rejected() {
        let mut settings = LightDialSettings::default();
        settings.min_brightness = 0;
        let result = LightDial::new(
            Script::new(&[(false, 0, 0)]),
            RecordingSink::default(),
            Wifi {
                up: true,
                accept: true,
            },
            Dark,
            settings,
        );
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failure_skips_rest_of_tick() {
        let mut dial = dial(
            &[(true, 1023, 0)],
            RecordingSink::failing_once(0),
            CommitPolicy::OnSuccess,
        );
        let first = dial.tick().await;
        assert_eq!(first.publications.len(), 1);
        assert!(!first.for_field("on")[0].delivered);
        assert!(!dial.link().is_connected());
        assert_eq!(dial.sink().bodies(), vec![r#"{"on":true}"#]);

        // Reconnects, then sends everything that is still pending.
        let second = dial.tick().await;
        assert!(!second.link_down);
        assert_eq!(second.publications.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn each_publish_is_followed_by_debounce() {
        let mut dial = dial(
            &[(true, 1023, 0)],
            RecordingSink::default(),
            CommitPolicy::OnSuccess,
        );
        let start = Instant::now();
        assert_eq!(dial.tick().await.publications.len(), 3);
        assert_eq!(start.elapsed(), Duration::from_millis(150));

        let start = Instant::now();
        assert!(dial.tick().await.is_quiet());
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_reconnect_waits_out_cooldown() {
        let policy = ReconnectionPolicy::new()
            .with_max_attempts(1)
            .with_retry_delay(Duration::from_millis(500));
        let mut dial = LightDial::new(
            Script::new(&[(true, 0, 0)]),
            RecordingSink::default(),
            Wifi {
                up: false,
                accept: false,
            },
            Dark,
            LightDialSettings::default().with_reconnection(policy),
        )
        .unwrap();

        let start = Instant::now();
        assert!(dial.tick().await.link_down);
        let elapsed = start.elapsed();
        assert!(elapsed >= ReconnectionPolicy::DEFAULT_COOLDOWN);
        // Two attempts half a second apart, then the cooldown.
        assert_eq!(elapsed, Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn run_pauses_between_ticks() {
        let script = Script::new(&[(false, 0, 0)]);
        let taken = Arc::clone(&script.taken);
        let mut dial = LightDial::new(
            script,
            RecordingSink::default(),
            Wifi {
                up: true,
                accept: true,
            },
            Dark,
            LightDialSettings::default(),
        )
        .unwrap();

        // Ticks start at 0 ms (publishes `on`, +50 ms), 150, 250, 350 and 450 ms.
        let outcome = tokio::time::timeout(Duration::from_millis(460), dial.run()).await;
        assert!(outcome.is_err());
        assert_eq!(*taken.lock(), 5);
        assert_eq!(dial.sink().bodies(), vec![r#"{"on":false}"#]);
    }
}

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::step::Targets;
use super::telemetry::TelemetrySnapshot;
use super::tuner::{AutoTuner, TICK_INTERVAL};
use crate::tracing::prelude::*;

/// Periodic driver for an [`AutoTuner`].
///
/// Reads the most recent telemetry snapshot from a watch channel on every
/// tick and publishes the resulting [`Targets`] on another. The actuator
/// side talks to it through an [`AutoTuneHandle`].
pub struct AutoTuneController {
    tuner: AutoTuner,
    tick_duration: Duration,
    telemetry_rx: watch::Receiver<Option<TelemetrySnapshot>>,
    enabled_rx: watch::Receiver<bool>,
    targets_tx: watch::Sender<Targets>,
}

/// Getter/setter side of a running [`AutoTuneController`].
///
/// Cheap to clone. Reads never block and always return a frequency and
/// voltage from the same tick.
#[derive(Clone)]
pub struct AutoTuneHandle {
    targets_rx: watch::Receiver<Targets>,
    enabled_tx: Arc<watch::Sender<bool>>,
}

impl AutoTuneController {
    pub fn new(
        tuner: AutoTuner,
        telemetry_rx: watch::Receiver<Option<TelemetrySnapshot>>,
    ) -> (Self, AutoTuneHandle) {
        let (targets_tx, targets_rx) = watch::channel(tuner.targets());
        let (enabled_tx, enabled_rx) = watch::channel(tuner.auto_tune_enabled());

        let controller = Self {
            tuner,
            tick_duration: TICK_INTERVAL,
            telemetry_rx,
            enabled_rx,
            targets_tx,
        };
        let handle = AutoTuneHandle {
            targets_rx,
            enabled_tx: Arc::new(enabled_tx),
        };

        (controller, handle)
    }

    pub async fn run(mut self, cancellation: CancellationToken) {
        let mut interval = tokio::time::interval(self.tick_duration);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancellation.cancelled() => {
                    debug!(state = %self.tuner.state(), "Auto-tune controller stopped");
                    break;
                }
                _ = interval.tick() => {
                    self.tick();
                }
            }
        }
    }

    pub fn tuner(&self) -> &AutoTuner {
        &self.tuner
    }

    fn tick(&mut self) {
        let enabled = *self.enabled_rx.borrow_and_update();
        self.tuner.set_auto_tune_enabled(enabled);

        let telemetry = match *self.telemetry_rx.borrow() {
            Some(telemetry) => telemetry,
            None => {
                debug!("Auto-tune tick: no telemetry available yet");
                return;
            }
        };

        self.tuner.tick(&telemetry);

        let targets = self.tuner.targets();
        self.targets_tx.send_if_modified(|current| {
            if *current == targets {
                false
            } else {
                *current = targets;
                true
            }
        });
    }
}

impl AutoTuneHandle {
    /// Latest published target pair.
    pub fn targets(&self) -> Targets {
        *self.targets_rx.borrow()
    }

    pub fn frequency(&self) -> f32 {
        self.targets().frequency_mhz
    }

    pub fn voltage(&self) -> f32 {
        self.targets().voltage_mv
    }

    /// Receiver that is notified whenever the targets change.
    pub fn subscribe(&self) -> watch::Receiver<Targets> {
        self.targets_rx.clone()
    }

    pub fn auto_tune_enabled(&self) -> bool {
        *self.enabled_tx.borrow()
    }

    /// Takes effect on the controller's next tick.
    pub fn set_auto_tune_enabled(&self, enabled: bool) {
        self.enabled_tx.send_replace(enabled);
    }
}

#[cfg(test)]
mod tests {
    use tokio::time;

    use super::super::config::TuningSettings;
    use super::super::state::TuneState;
    use super::*;

    fn warmup_tuner() -> AutoTuner {
        let settings = TuningSettings {
            auto_tune_enabled: true,
            ..Default::default()
        };
        let mut tuner = AutoTuner::new(settings, 0.0);
        tuner.set_state(TuneState::Warmup);
        tuner
    }

    fn cool(hashrate: f32) -> TelemetrySnapshot {
        TelemetrySnapshot {
            fan_pct: 40.0,
            power_w: 15.0,
            chip_temp_avg_c: 50.0,
            chip_temp2_avg_c: 51.0,
            vr_temp_c: 55.0,
            hashrate,
        }
    }

    fn create_controller() -> (
        AutoTuneController,
        AutoTuneHandle,
        watch::Sender<Option<TelemetrySnapshot>>,
    ) {
        let (telemetry_tx, telemetry_rx) = watch::channel(None);
        let (controller, handle) = AutoTuneController::new(warmup_tuner(), telemetry_rx);
        (controller, handle, telemetry_tx)
    }

    #[test]
    fn should_publish_initial_targets() {
        let (_controller, handle, _telemetry_tx) = create_controller();

        assert_eq!(handle.frequency(), 525.0);
        assert_eq!(handle.voltage(), 1150.0);
        assert!(handle.auto_tune_enabled());
    }

    #[test]
    fn should_skip_tick_without_telemetry() {
        let (mut controller, handle, _telemetry_tx) = create_controller();
        let mut targets_rx = handle.subscribe();

        controller.tick();

        assert!(!targets_rx.has_changed().unwrap());
        assert_eq!(handle.frequency(), 525.0);
    }

    #[test]
    fn should_publish_targets_after_tick() {
        let (mut controller, handle, telemetry_tx) = create_controller();
        let mut targets_rx = handle.subscribe();

        telemetry_tx.send(Some(cool(500.0))).unwrap();
        controller.tick();

        assert!(targets_rx.has_changed().unwrap());
        assert_eq!(
            *targets_rx.borrow_and_update(),
            Targets {
                frequency_mhz: 525.5,
                voltage_mv: 1150.0,
            }
        );
        assert_eq!(handle.targets(), controller.tuner().targets());
    }

    #[test]
    fn should_not_notify_when_targets_are_held() {
        let (mut controller, handle, telemetry_tx) = create_controller();
        let mut targets_rx = handle.subscribe();

        // Soft power limit: Warmup moves to Working without stepping.
        telemetry_tx
            .send(Some(TelemetrySnapshot {
                power_w: 20.1,
                ..cool(500.0)
            }))
            .unwrap();
        controller.tick();

        assert_eq!(controller.tuner().state(), TuneState::Working);
        assert!(!targets_rx.has_changed().unwrap());
    }

    #[test]
    fn should_apply_enable_toggle_on_next_tick() {
        let (mut controller, handle, telemetry_tx) = create_controller();
        telemetry_tx.send(Some(cool(500.0))).unwrap();

        handle.set_auto_tune_enabled(false);
        assert!(!handle.auto_tune_enabled());
        controller.tick();

        assert!(!controller.tuner().auto_tune_enabled());
        assert_eq!(handle.frequency(), 525.0);

        handle.clone().set_auto_tune_enabled(true);
        controller.tick();

        assert_eq!(handle.frequency(), 525.5);
    }

    #[tokio::test(start_paused = true)]
    async fn should_tick_periodically_until_cancelled() {
        let (controller, handle, telemetry_tx) = create_controller();
        let cancellation = CancellationToken::new();
        telemetry_tx.send(Some(cool(500.0))).unwrap();

        let task = tokio::spawn(controller.run(cancellation.clone()));

        // Ticks at 0, 1.8 s and 3.6 s.
        time::sleep(TICK_INTERVAL * 2 + Duration::from_millis(100)).await;
        assert_eq!(handle.frequency(), 526.5);

        cancellation.cancel();
        task.await.unwrap();

        time::sleep(TICK_INTERVAL * 5).await;
        assert_eq!(handle.frequency(), 526.5);
    }
}

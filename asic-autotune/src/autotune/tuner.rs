use std::time::Duration;

use super::config::TuningSettings;
use super::history::HashrateHistory;
use super::limits::LimitStatus;
use super::state::TuneState;
use super::step::{StepAction, StepEngine, StepSizes, Targets};
use super::telemetry::TelemetrySnapshot;
use crate::tracing::prelude::*;

/// Nominal interval between ticks.
pub const TICK_INTERVAL: Duration = Duration::from_millis(1800);

/// Time to leave the chip alone after its temperature first appears.
const STARTUP_DELAY: Duration = Duration::from_secs(45);

/// Startup delay expressed in ticks.
pub const STARTUP_WAIT_TICKS: u32 =
    (STARTUP_DELAY.as_millis() / TICK_INTERVAL.as_millis()) as u32;

/// Hashrate-seeking frequency/voltage controller.
///
/// Owns the tuning settings and session state. Call [`tick`](Self::tick)
/// once per [`TICK_INTERVAL`] with the latest telemetry, then read the
/// new [`targets`](Self::targets).
#[derive(Debug, Clone)]
pub struct AutoTuner {
    settings: TuningSettings,
    history: HashrateHistory,
    engine: StepEngine,
    state: TuneState,
    wait_ticks_remaining: u32,
    last_hashrate: f32,
}

impl AutoTuner {
    /// Creates a tuner from loaded settings and the hashrate observed at
    /// start-up, which seeds the hashrate history.
    ///
    /// The initial targets are clamped into their safe ranges.
    pub fn new(mut settings: TuningSettings, initial_hashrate: f32) -> Self {
        let initial = Targets {
            frequency_mhz: settings.frequency_mhz,
            voltage_mv: settings.voltage_mv,
        }
        .clamped(&settings);
        settings.frequency_mhz = initial.frequency_mhz;
        settings.voltage_mv = initial.voltage_mv;

        let mut history = HashrateHistory::new();
        history.push(initial_hashrate);

        Self {
            settings,
            history,
            engine: StepEngine::new(),
            state: TuneState::SleepBeforeWarmup,
            wait_ticks_remaining: STARTUP_WAIT_TICKS,
            last_hashrate: initial_hashrate,
        }
    }

    pub fn state(&self) -> TuneState {
        self.state
    }

    pub fn settings(&self) -> &TuningSettings {
        &self.settings
    }

    pub fn frequency(&self) -> f32 {
        self.settings.frequency_mhz
    }

    pub fn voltage(&self) -> f32 {
        self.settings.voltage_mv
    }

    pub fn targets(&self) -> Targets {
        Targets {
            frequency_mhz: self.settings.frequency_mhz,
            voltage_mv: self.settings.voltage_mv,
        }
    }

    pub fn auto_tune_enabled(&self) -> bool {
        self.settings.auto_tune_enabled
    }

    pub fn set_auto_tune_enabled(&mut self, enabled: bool) {
        if enabled != self.settings.auto_tune_enabled {
            info!(enabled, "Auto-tune toggled");
        }
        self.settings.auto_tune_enabled = enabled;
    }

    pub fn wait_ticks_remaining(&self) -> u32 {
        self.wait_ticks_remaining
    }

    /// Whether the next increase goes to voltage rather than frequency.
    pub fn adjusting_voltage(&self) -> bool {
        self.engine.adjusting_voltage()
    }

    /// Hashrate seen on the previous tick.
    pub fn last_hashrate(&self) -> f32 {
        self.last_hashrate
    }

    /// Frequency step size for the current phase.
    pub fn frequency_step(&self) -> f32 {
        match self.state {
            TuneState::SleepBeforeWarmup | TuneState::Warmup => self.settings.step_freq_rampup_mhz,
            TuneState::Working => self.settings.step_freq_mhz,
        }
    }

    #[cfg(test)]
    pub(crate) fn set_state(&mut self, state: TuneState) {
        self.state = state;
    }

    /// Runs one control cycle. Does nothing while auto-tune is disabled.
    pub fn tick(&mut self, telemetry: &TelemetrySnapshot) {
        if !self.settings.auto_tune_enabled {
            trace!("Auto-tune disabled, skipping tick");
            return;
        }

        self.history.push(telemetry.hashrate);
        let limits = LimitStatus::evaluate(telemetry, &self.settings);

        match self.state {
            TuneState::SleepBeforeWarmup => self.sleep_before_warmup(telemetry),
            TuneState::Warmup => {
                self.step(telemetry, limits);
                if limits.limit_hit {
                    self.transition(TuneState::Working);
                }
            }
            TuneState::Working => {
                if limits.limit_hit && !limits.critical {
                    debug!(
                        power_w = %telemetry.power_w,
                        fan_pct = %telemetry.fan_pct,
                        "Limit reached, holding targets"
                    );
                } else {
                    self.step(telemetry, limits);
                }
            }
        }

        self.last_hashrate = telemetry.hashrate;
    }

    fn sleep_before_warmup(&mut self, telemetry: &TelemetrySnapshot) {
        if !telemetry.chip_temp_available() {
            return;
        }

        if self.wait_ticks_remaining > 0 {
            self.wait_ticks_remaining -= 1;
            debug!(
                wait_ticks_remaining = self.wait_ticks_remaining,
                "Waiting before warmup"
            );
            return;
        }

        if telemetry.hashrate > 0.0 {
            self.transition(TuneState::Warmup);
        }
    }

    fn step(&mut self, telemetry: &TelemetrySnapshot, limits: LimitStatus) {
        let steps = StepSizes {
            frequency_mhz: self.frequency_step(),
            voltage_mv: self.settings.step_voltage_mv,
        };
        let hashrate_increased = self.history.increased_since_mark();
        let current = self.targets();

        let outcome = self.engine.step(
            current,
            hashrate_increased,
            limits,
            steps,
            &self.settings,
        );

        self.settings.frequency_mhz = outcome.targets.frequency_mhz;
        self.settings.voltage_mv = outcome.targets.voltage_mv;

        if outcome.action == StepAction::BackOff {
            warn!(
                chip_temp_c = %telemetry.chip_temp_avg_c,
                chip_temp2_c = %telemetry.chip_temp2_avg_c,
                vr_temp_c = %telemetry.vr_temp_c,
                power_w = %telemetry.power_w,
                fan_pct = %telemetry.fan_pct,
                "Critical limit, backing off"
            );
        }

        info!(
            state = %self.state,
            hashrate = %telemetry.hashrate,
            previous_hashrate = %self.last_hashrate,
            voltage_mv = %outcome.targets.voltage_mv,
            frequency_mhz = %outcome.targets.frequency_mhz,
            action = ?outcome.action,
            "Auto-tune step"
        );
    }

    fn transition(&mut self, new_state: TuneState) {
        info!(
            previous_state = %self.state,
            new_state = %new_state,
            "Auto-tune state changed"
        );
        self.state = new_state;
    }
}

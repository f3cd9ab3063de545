//! Per-tick adjustment of the frequency and voltage targets.
//!
//! The search is coordinate-wise: one axis moves per tick, so a change in
//! hashrate can be attributed to a single adjustment. The axis is kept
//! while the hashrate keeps improving and swapped when it does not. A
//! critical limit overrides the search and backs both axes off at once.

use super::config::{MIN_FREQ, MIN_VOLTAGE, TuningSettings};
use super::limits::LimitStatus;

/// Frequency/voltage pair handed to the actuator.
///
/// Always published together so a reader never mixes a frequency from one
/// tick with a voltage from another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Targets {
    pub frequency_mhz: f32,
    pub voltage_mv: f32,
}

impl Targets {
    /// Forces both values into their safe ranges.
    pub fn clamped(self, settings: &TuningSettings) -> Self {
        Self {
            frequency_mhz: clamp(self.frequency_mhz, MIN_FREQ, settings.max_frequency_mhz),
            voltage_mv: clamp(self.voltage_mv, MIN_VOLTAGE, settings.max_voltage_mv),
        }
    }

    pub fn at_floor(&self) -> bool {
        self.frequency_mhz == MIN_FREQ || self.voltage_mv == MIN_VOLTAGE
    }
}

// Bounds `value` to `min..=max`. A cap below the floor yields the floor.
fn clamp(value: f32, min: f32, max: f32) -> f32 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Frequency,
    Voltage,
}

impl Axis {
    fn other(self) -> Self {
        match self {
            Axis::Frequency => Axis::Voltage,
            Axis::Voltage => Axis::Frequency,
        }
    }
}

/// Step sizes in effect for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepSizes {
    pub frequency_mhz: f32,
    pub voltage_mv: f32,
}

/// What a step did to the targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAction {
    /// Critical limit: both axes moved down.
    BackOff,
    /// One axis moved up.
    Increase(Axis),
    /// A soft limit blocked any increase.
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub targets: Targets,
    pub action: StepAction,
}

/// Remembers which axis the search is on.
#[derive(Debug, Clone)]
pub struct StepEngine {
    axis: Axis,
    floor_latched: bool,
}

impl StepEngine {
    pub fn new() -> Self {
        Self {
            axis: Axis::Frequency,
            floor_latched: false,
        }
    }

    /// Axis that the next increase will move.
    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn adjusting_voltage(&self) -> bool {
        self.axis == Axis::Voltage
    }

    /// True once a target has been clamped to its floor. From then on only
    /// voltage is ever increased.
    pub fn floor_latched(&self) -> bool {
        self.floor_latched
    }

    /// Runs one stepping pass and returns the clamped targets.
    ///
    /// `hashrate_increased` is the trend verdict from the hashrate history
    /// taken before this step.
    pub fn step(
        &mut self,
        current: Targets,
        hashrate_increased: bool,
        limits: LimitStatus,
        steps: StepSizes,
        settings: &TuningSettings,
    ) -> StepOutcome {
        if !hashrate_increased && !self.floor_latched {
            self.axis = self.axis.other();
        }

        let mut targets = current;
        let action = if limits.critical {
            targets.frequency_mhz -= steps.frequency_mhz;
            targets.voltage_mv -= steps.voltage_mv;
            StepAction::BackOff
        } else if limits.can_increase {
            match self.axis {
                Axis::Frequency => targets.frequency_mhz += steps.frequency_mhz,
                Axis::Voltage => targets.voltage_mv += steps.voltage_mv,
            }
            StepAction::Increase(self.axis)
        } else {
            StepAction::Hold
        };

        let targets = targets.clamped(settings);
        if targets.at_floor() {
            self.axis = Axis::Voltage;
            self.floor_latched = true;
        }

        StepOutcome { targets, action }
    }
}

impl Default for StepEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEPS: StepSizes = StepSizes {
        frequency_mhz: 0.5,
        voltage_mv: 0.1,
    };

    const CAN_INCREASE: LimitStatus = LimitStatus {
        can_increase: true,
        limit_hit: false,
        critical: false,
    };

    const SOFT_LIMIT: LimitStatus = LimitStatus {
        can_increase: false,
        limit_hit: true,
        critical: false,
    };

    const CRITICAL: LimitStatus = LimitStatus {
        can_increase: false,
        limit_hit: true,
        critical: true,
    };

    fn start() -> Targets {
        Targets {
            frequency_mhz: 525.0,
            voltage_mv: 1150.0,
        }
    }

    #[test]
    fn should_keep_axis_while_hashrate_increases() {
        let mut engine = StepEngine::new();
        let settings = TuningSettings::default();

        let outcome = engine.step(start(), true, CAN_INCREASE, STEPS, &settings);

        assert_eq!(outcome.action, StepAction::Increase(Axis::Frequency));
        assert_eq!(outcome.targets.frequency_mhz, 525.5);
        assert_eq!(outcome.targets.voltage_mv, 1150.0);
    }

    #[test]
    fn should_switch_axis_when_hashrate_does_not_increase() {
        let mut engine = StepEngine::new();
        let settings = TuningSettings::default();

        let outcome = engine.step(start(), false, CAN_INCREASE, STEPS, &settings);

        assert_eq!(outcome.action, StepAction::Increase(Axis::Voltage));
        assert_eq!(outcome.targets.frequency_mhz, 525.0);
        assert!((outcome.targets.voltage_mv - 1150.1).abs() < 1e-3);

        let outcome = engine.step(outcome.targets, false, CAN_INCREASE, STEPS, &settings);

        assert_eq!(outcome.action, StepAction::Increase(Axis::Frequency));
        assert_eq!(outcome.targets.frequency_mhz, 525.5);
    }

    #[test]
    fn should_back_off_both_axes_on_critical_limit() {
        let mut engine = StepEngine::new();
        let settings = TuningSettings::default();

        let outcome = engine.step(start(), true, CRITICAL, STEPS, &settings);

        assert_eq!(outcome.action, StepAction::BackOff);
        assert_eq!(outcome.targets.frequency_mhz, 524.5);
        assert!((outcome.targets.voltage_mv - 1149.9).abs() < 1e-3);
    }

    #[test]
    fn should_hold_targets_on_soft_limit() {
        let mut engine = StepEngine::new();
        let settings = TuningSettings::default();

        let outcome = engine.step(start(), false, SOFT_LIMIT, STEPS, &settings);

        assert_eq!(outcome.action, StepAction::Hold);
        assert_eq!(outcome.targets, start());
        // The axis still swaps on a flat trend, even when holding.
        assert!(engine.adjusting_voltage());
    }

    #[test]
    fn should_clamp_to_caps() {
        let mut engine = StepEngine::new();
        let settings = TuningSettings::default();
        let near_cap = Targets {
            frequency_mhz: 999.8,
            voltage_mv: 1150.0,
        };

        let outcome = engine.step(near_cap, true, CAN_INCREASE, STEPS, &settings);

        assert_eq!(outcome.targets.frequency_mhz, settings.max_frequency_mhz);
        assert!(!engine.floor_latched());
    }

    #[test]
    fn should_make_clamping_idempotent() {
        let settings = TuningSettings::default();

        for targets in [
            Targets {
                frequency_mhz: 10.0,
                voltage_mv: 5000.0,
            },
            Targets {
                frequency_mhz: 2000.0,
                voltage_mv: 0.0,
            },
            start(),
        ] {
            let once = targets.clamped(&settings);
            assert_eq!(once.clamped(&settings), once);
        }
    }

    #[test]
    fn should_latch_voltage_axis_once_floor_is_reached() {
        let mut engine = StepEngine::new();
        let settings = TuningSettings::default();
        let at_floor = Targets {
            frequency_mhz: MIN_FREQ + 0.2,
            voltage_mv: 1100.0,
        };

        let outcome = engine.step(at_floor, true, CRITICAL, STEPS, &settings);

        assert_eq!(outcome.targets.frequency_mhz, MIN_FREQ);
        assert!(engine.floor_latched());
        assert!(engine.adjusting_voltage());

        // Flat or rising, the axis never returns to frequency.
        let mut targets = outcome.targets;
        for increased in [false, true, false, false, true] {
            let outcome = engine.step(targets, increased, CAN_INCREASE, STEPS, &settings);
            assert_eq!(outcome.action, StepAction::Increase(Axis::Voltage));
            assert_eq!(outcome.targets.frequency_mhz, MIN_FREQ);
            targets = outcome.targets;
        }
        assert!(engine.adjusting_voltage());
    }
}

mod config;
mod controller;
mod history;
mod limits;
mod state;
mod step;
mod telemetry;
mod tuner;

pub use config::{MIN_FREQ, MIN_VOLTAGE, SettingsSnapshot, TuningSettings};
pub use controller::{AutoTuneController, AutoTuneHandle};
pub use history::{HISTORY_SIZE, HashrateHistory};
pub use limits::{LimitStatus, can_increase, critical_limit_hit, limit_hit};
pub use state::TuneState;
pub use step::{Axis, StepAction, StepEngine, StepOutcome, StepSizes, Targets};
pub use telemetry::{TEMP_UNAVAILABLE_C, TelemetrySnapshot};
pub use tuner::{AutoTuner, STARTUP_WAIT_TICKS, TICK_INTERVAL};

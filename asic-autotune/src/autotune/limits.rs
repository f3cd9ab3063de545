//! Classification of a telemetry snapshot against the tuning limits.
//!
//! Three thresholds apply, from mildest to most severe:
//!
//! - **Soft:** every reading strictly below its ceiling. Only then may a
//!   target move up ([`can_increase`]).
//! - **Hard:** fan, power, or a chip temperature strictly above its
//!   ceiling ([`limit_hit`]). The VR temperature does not count here.
//! - **Critical:** a chip or VR temperature above its ceiling, or power
//!   or fan at or beyond ceiling plus overshoot margin
//!   ([`critical_limit_hit`]). Forces an immediate back-off.

use super::config::TuningSettings;
use super::telemetry::TelemetrySnapshot;

/// All three verdicts for one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitStatus {
    pub can_increase: bool,
    pub limit_hit: bool,
    pub critical: bool,
}

impl LimitStatus {
    pub fn evaluate(telemetry: &TelemetrySnapshot, settings: &TuningSettings) -> Self {
        Self {
            can_increase: can_increase(telemetry, settings),
            limit_hit: limit_hit(telemetry, settings),
            critical: critical_limit_hit(telemetry, settings),
        }
    }
}

pub fn can_increase(telemetry: &TelemetrySnapshot, settings: &TuningSettings) -> bool {
    telemetry.fan_pct < settings.fan_limit_pct
        && telemetry.power_w < settings.power_limit_w
        && telemetry.chip_temp_avg_c < settings.max_temp_asic_c
        && telemetry.chip_temp2_avg_c < settings.max_temp_asic_c
        && telemetry.vr_temp_c < settings.max_temp_vr_c
}

pub fn limit_hit(telemetry: &TelemetrySnapshot, settings: &TuningSettings) -> bool {
    telemetry.fan_pct > settings.fan_limit_pct
        || telemetry.power_w > settings.power_limit_w
        || telemetry.chip_temp_avg_c > settings.max_temp_asic_c
        || telemetry.chip_temp2_avg_c > settings.max_temp_asic_c
}

pub fn critical_limit_hit(telemetry: &TelemetrySnapshot, settings: &TuningSettings) -> bool {
    telemetry.chip_temp_avg_c > settings.max_temp_asic_c
        || telemetry.chip_temp2_avg_c > settings.max_temp_asic_c
        || telemetry.power_w >= settings.power_limit_w + settings.overshot_power_w
        || telemetry.fan_pct >= settings.fan_limit_pct + settings.overshot_fan_pct
        || telemetry.vr_temp_c > settings.max_temp_vr_c
}

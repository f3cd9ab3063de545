use std::{fs, path::Path};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Lowest frequency the tuner will ever request (MHz).
pub const MIN_FREQ: f32 = 400.0;

/// Lowest core voltage the tuner will ever request (mV).
pub const MIN_VOLTAGE: f32 = 1000.0;

/// Tuning limits, step sizes, and the current output targets.
///
/// Built once from the persisted settings at start-up. Only
/// `frequency_mhz` and `voltage_mv` change afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct TuningSettings {
    /// Soft power ceiling (W).
    pub power_limit_w: f32,

    /// Soft fan duty ceiling (%).
    pub fan_limit_pct: f32,

    /// Ceiling for both chip temperature sensors (°C).
    pub max_temp_asic_c: f32,

    /// Voltage regulator temperature ceiling (°C).
    pub max_temp_vr_c: f32,

    /// Added to `power_limit_w` to form the critical power threshold.
    pub overshot_power_w: f32,

    /// Added to `fan_limit_pct` to form the critical fan threshold.
    pub overshot_fan_pct: f32,

    pub step_voltage_mv: f32,

    /// Frequency step while ramping up.
    pub step_freq_rampup_mhz: f32,

    /// Frequency step once the first limit has been reached.
    pub step_freq_mhz: f32,

    pub max_voltage_mv: f32,
    pub max_frequency_mhz: f32,

    /// Current frequency target (MHz).
    pub frequency_mhz: f32,

    /// Current core voltage target (mV).
    pub voltage_mv: f32,

    pub auto_tune_enabled: bool,
}

impl Default for TuningSettings {
    fn default() -> Self {
        Self {
            power_limit_w: 20.0,
            fan_limit_pct: 75.0,
            max_temp_asic_c: 65.0,
            max_temp_vr_c: 85.0,
            overshot_power_w: 0.2,
            overshot_fan_pct: 5.0,
            step_voltage_mv: 0.1,
            step_freq_rampup_mhz: 0.5,
            step_freq_mhz: 0.2,
            max_voltage_mv: 1400.0,
            max_frequency_mhz: 1000.0,
            frequency_mhz: 525.0,
            voltage_mv: 1150.0,
            auto_tune_enabled: false,
        }
    }
}

impl TuningSettings {
    /// Build settings from a persisted snapshot, filling unset keys with
    /// defaults.
    pub fn from_snapshot(snapshot: &SettingsSnapshot) -> Result<Self> {
        let defaults = Self::default();
        let settings = Self {
            power_limit_w: snapshot.power_limit.unwrap_or(defaults.power_limit_w),
            fan_limit_pct: snapshot.fan_limit.unwrap_or(defaults.fan_limit_pct),
            max_temp_asic_c: snapshot.max_temp_asic.unwrap_or(defaults.max_temp_asic_c),
            max_temp_vr_c: snapshot.max_temp_vr.unwrap_or(defaults.max_temp_vr_c),
            overshot_power_w: snapshot.osh_pow_limit.unwrap_or(defaults.overshot_power_w),
            overshot_fan_pct: snapshot.osh_fan_limit.unwrap_or(defaults.overshot_fan_pct),
            step_voltage_mv: snapshot.step_volt.unwrap_or(defaults.step_voltage_mv),
            step_freq_rampup_mhz: snapshot
                .step_freq_rampup
                .unwrap_or(defaults.step_freq_rampup_mhz),
            step_freq_mhz: snapshot.step_freq.unwrap_or(defaults.step_freq_mhz),
            max_voltage_mv: snapshot.max_volt_asic.unwrap_or(defaults.max_voltage_mv),
            max_frequency_mhz: snapshot.max_freq_asic.unwrap_or(defaults.max_frequency_mhz),
            frequency_mhz: snapshot.frequency.unwrap_or(defaults.frequency_mhz),
            voltage_mv: snapshot.core_voltage.unwrap_or(defaults.voltage_mv),
            auto_tune_enabled: snapshot.auto_tune.unwrap_or(defaults.auto_tune_enabled),
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the control loop cannot run with.
    ///
    /// The caps must sit at or above the fixed floors, otherwise clamping
    /// has an empty range. The initial targets must already lie inside
    /// their ranges.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("power_limit", self.power_limit_w),
            ("fan_limit", self.fan_limit_pct),
            ("max_temp_asic", self.max_temp_asic_c),
            ("max_temp_vr", self.max_temp_vr_c),
            ("osh_pow_limit", self.overshot_power_w),
            ("osh_fan_limit", self.overshot_fan_pct),
            ("step_volt", self.step_voltage_mv),
            ("step_freq_rampup", self.step_freq_rampup_mhz),
            ("step_freq", self.step_freq_mhz),
            ("max_volt_asic", self.max_voltage_mv),
            ("max_freq_asic", self.max_frequency_mhz),
            ("frequency", self.frequency_mhz),
            ("coreVoltage", self.voltage_mv),
        ];

        for (key, value) in fields {
            if !value.is_finite() {
                return Err(Error::InvalidSetting {
                    key,
                    reason: format!("{value} is not a finite number"),
                });
            }
        }

        for (key, value) in [
            ("power_limit", self.power_limit_w),
            ("fan_limit", self.fan_limit_pct),
            ("step_volt", self.step_voltage_mv),
            ("step_freq_rampup", self.step_freq_rampup_mhz),
            ("step_freq", self.step_freq_mhz),
        ] {
            if value <= 0.0 {
                return Err(Error::InvalidSetting {
                    key,
                    reason: format!("{value} must be positive"),
                });
            }
        }

        for (key, value) in [
            ("osh_pow_limit", self.overshot_power_w),
            ("osh_fan_limit", self.overshot_fan_pct),
        ] {
            if value < 0.0 {
                return Err(Error::InvalidSetting {
                    key,
                    reason: format!("{value} must not be negative"),
                });
            }
        }

        if self.max_frequency_mhz < MIN_FREQ {
            return Err(Error::InvalidSetting {
                key: "max_freq_asic",
                reason: format!(
                    "{} MHz is below the {MIN_FREQ} MHz floor",
                    self.max_frequency_mhz
                ),
            });
        }

        if self.max_voltage_mv < MIN_VOLTAGE {
            return Err(Error::InvalidSetting {
                key: "max_volt_asic",
                reason: format!(
                    "{} mV is below the {MIN_VOLTAGE} mV floor",
                    self.max_voltage_mv
                ),
            });
        }

        if !(MIN_FREQ..=self.max_frequency_mhz).contains(&self.frequency_mhz) {
            return Err(Error::InvalidSetting {
                key: "frequency",
                reason: format!(
                    "{} MHz is outside {MIN_FREQ}..={} MHz",
                    self.frequency_mhz, self.max_frequency_mhz
                ),
            });
        }

        if !(MIN_VOLTAGE..=self.max_voltage_mv).contains(&self.voltage_mv) {
            return Err(Error::InvalidSetting {
                key: "coreVoltage",
                reason: format!(
                    "{} mV is outside {MIN_VOLTAGE}..={} mV",
                    self.voltage_mv, self.max_voltage_mv
                ),
            });
        }

        Ok(())
    }
}

/// Persisted tuning settings as stored by the firmware configuration.
///
/// Key names follow the firmware's settings API. Every key is optional;
/// unset keys take the [`TuningSettings`] defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SettingsSnapshot {
    pub frequency: Option<f32>,
    #[serde(rename = "coreVoltage")]
    pub core_voltage: Option<f32>,
    pub power_limit: Option<f32>,
    pub fan_limit: Option<f32>,
    pub max_volt_asic: Option<f32>,
    pub max_freq_asic: Option<f32>,
    pub max_temp_asic: Option<f32>,
    pub max_temp_vr: Option<f32>,
    pub auto_tune: Option<bool>,
    pub osh_pow_limit: Option<f32>,
    pub osh_fan_limit: Option<f32>,
    pub step_volt: Option<f32>,
    pub step_freq_rampup: Option<f32>,
    pub step_freq: Option<f32>,
}

impl SettingsSnapshot {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a snapshot from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| Error::ReadSettings {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }
}

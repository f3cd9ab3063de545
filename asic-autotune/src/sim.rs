//! Simulated single-chip board.
//!
//! Produces telemetry from the frequency and voltage currently requested,
//! standing in for real sensors and actuators so the tuning loop can run
//! without hardware. The model is deliberately simple: power follows
//! f·V², temperatures follow power through a fixed thermal resistance,
//! and the chip only delivers its full hashrate when the core voltage is
//! high enough for the clock.

use crate::autotune::{TEMP_UNAVAILABLE_C, Targets, TelemetrySnapshot};

#[derive(Debug, Clone)]
pub struct SimulatedBoardConfig {
    pub ambient_c: f32,

    /// Chip temperature rise per watt (°C/W).
    pub chip_thermal_resistance: f32,

    /// VR temperature rise per watt (°C/W).
    pub vr_thermal_resistance: f32,

    /// Offset of the second chip sensor from the first (°C).
    pub chip_sensor_offset_c: f32,

    /// Power (W) per MHz per V².
    pub power_coefficient: f32,

    /// Hashrate (GH/s) per MHz with sufficient voltage.
    pub hashrate_per_mhz: f32,

    /// Core voltage (mV) needed at 400 MHz.
    pub base_voltage_mv: f32,

    /// Extra core voltage (mV) needed per MHz above 400.
    pub voltage_per_mhz: f32,

    /// Fraction of hashrate kept when undervolted.
    pub undervolt_yield: f32,

    /// Chip temperature (°C) at which the fan runs at `fan_base_pct`.
    pub fan_setpoint_c: f32,
    pub fan_base_pct: f32,
    /// Fan duty added per °C above the setpoint.
    pub fan_gain_pct: f32,

    /// Samples reported with an unavailable chip temperature.
    pub warmup_samples: u32,
}

impl Default for SimulatedBoardConfig {
    fn default() -> Self {
        Self {
            ambient_c: 25.0,
            chip_thermal_resistance: 2.5,
            vr_thermal_resistance: 2.0,
            chip_sensor_offset_c: 0.5,
            power_coefficient: 0.02,
            hashrate_per_mhz: 2.0,
            base_voltage_mv: 1000.0,
            voltage_per_mhz: 0.5,
            undervolt_yield: 0.5,
            fan_setpoint_c: 50.0,
            fan_base_pct: 30.0,
            fan_gain_pct: 3.0,
            warmup_samples: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulatedBoard {
    config: SimulatedBoardConfig,
    samples: u32,
}

impl SimulatedBoard {
    pub fn new(config: SimulatedBoardConfig) -> Self {
        Self { config, samples: 0 }
    }

    /// Core voltage the chip needs to run stably at `frequency_mhz`.
    pub fn required_voltage_mv(&self, frequency_mhz: f32) -> f32 {
        self.config.base_voltage_mv
            + (frequency_mhz - 400.0).max(0.0) * self.config.voltage_per_mhz
    }

    /// Samples the board while it runs at `targets`.
    pub fn telemetry(&mut self, targets: Targets) -> TelemetrySnapshot {
        let config = &self.config;
        let volts = targets.voltage_mv / 1000.0;
        let power_w = config.power_coefficient * targets.frequency_mhz * volts * volts;

        let full_hashrate = targets.frequency_mhz * config.hashrate_per_mhz;
        let hashrate = if targets.voltage_mv >= self.required_voltage_mv(targets.frequency_mhz) {
            full_hashrate
        } else {
            full_hashrate * config.undervolt_yield
        };

        let chip_temp_c = config.ambient_c + config.chip_thermal_resistance * power_w;
        let fan_pct = (config.fan_base_pct
            + config.fan_gain_pct * (chip_temp_c - config.fan_setpoint_c))
            .clamp(0.0, 100.0);

        let warming_up = self.samples < config.warmup_samples;
        self.samples = self.samples.saturating_add(1);

        TelemetrySnapshot {
            fan_pct,
            power_w,
            chip_temp_avg_c: if warming_up {
                TEMP_UNAVAILABLE_C
            } else {
                chip_temp_c
            },
            chip_temp2_avg_c: chip_temp_c + config.chip_sensor_offset_c,
            vr_temp_c: config.ambient_c + config.vr_thermal_resistance * power_w,
            hashrate: if warming_up { 0.0 } else { hashrate },
        }
    }
}

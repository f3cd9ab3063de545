/// Chip temperature reported before the first valid sensor reading.
pub const TEMP_UNAVAILABLE_C: f32 = -1.0;

/// One sample of board telemetry, taken whole by the producer.
///
/// The tuner reads a snapshot by value, so a tick never observes a
/// half-updated set of readings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetrySnapshot {
    /// Fan duty (%).
    pub fan_pct: f32,
    /// Input power (W).
    pub power_w: f32,
    /// Average of the first chip temperature sensor (°C), or
    /// [`TEMP_UNAVAILABLE_C`].
    pub chip_temp_avg_c: f32,
    /// Average of the second chip temperature sensor (°C).
    pub chip_temp2_avg_c: f32,
    /// Voltage regulator temperature (°C).
    pub vr_temp_c: f32,
    /// Current hashrate (GH/s).
    pub hashrate: f32,
}

impl TelemetrySnapshot {
    pub fn chip_temp_available(&self) -> bool {
        self.chip_temp_avg_c != TEMP_UNAVAILABLE_C
    }
}

impl Default for TelemetrySnapshot {
    fn default() -> Self {
        Self {
            fan_pct: 0.0,
            power_w: 0.0,
            chip_temp_avg_c: TEMP_UNAVAILABLE_C,
            chip_temp2_avg_c: TEMP_UNAVAILABLE_C,
            vr_temp_c: 0.0,
            hashrate: 0.0,
        }
    }
}

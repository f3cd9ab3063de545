use strum::Display;

/// Phase of the tuning session.
///
/// Phases only move forward: `SleepBeforeWarmup` → `Warmup` → `Working`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum TuneState {
    /// Waiting for the chip to report temperatures and produce work.
    SleepBeforeWarmup,
    /// Ramping frequency up in large steps until a limit is reached.
    Warmup,
    /// Fine-grained search around the limits.
    Working,
}

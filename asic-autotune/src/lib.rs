//! Hashrate-seeking frequency and voltage tuning for a single ASIC mining
//! chip.
//!
//! The [`autotune`] module holds the control loop. [`sim`] provides a
//! simulated board for running the loop without hardware.

pub mod autotune;
pub mod error;
pub mod sim;
pub mod tracing;

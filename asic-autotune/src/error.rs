//! Error types for settings loading.
//!
//! The control loop itself never fails; only turning the persisted
//! settings into a usable configuration can.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to read settings from {path}: {source}")]
    ReadSettings {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed settings: {0}")]
    ParseSettings(#[from] serde_json::Error),

    #[error("Invalid setting {key}: {reason}")]
    InvalidSetting { key: &'static str, reason: String },
}

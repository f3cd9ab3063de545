//! Logging setup and the macro prelude used throughout the crate.

use std::env;

use time::macros::format_description;
use tracing_subscriber::{EnvFilter, fmt, fmt::time::LocalTime, prelude::*};

pub mod prelude {
    pub use ::tracing::{debug, error, info, trace, warn};
}

/// Install the global subscriber.
///
/// Logs go to the systemd journal when running as a service (systemd sets
/// `JOURNAL_STREAM`), otherwise to stdout. `RUST_LOG` overrides the
/// default `info` level either way.
pub fn init_journald_or_stdout() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if env::var_os("JOURNAL_STREAM").is_some() {
        match tracing_journald::layer() {
            Ok(journald) => {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(journald)
                    .init();
                return;
            }
            Err(e) => eprintln!("Failed to connect to journald, logging to stdout: {e}"),
        }
    }

    let timer = LocalTime::new(format_description!(
        "[hour]:[minute]:[second].[subsecond digits:3]"
    ));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_timer(timer))
        .init();
}

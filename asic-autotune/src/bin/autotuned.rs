//! Auto-tune daemon driving a simulated board.
//!
//! Loads the persisted tuning settings, then runs the tuning loop against
//! the simulated chip until interrupted.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use asic_autotune::autotune::{
    AutoTuneController, AutoTuneHandle, AutoTuner, SettingsSnapshot, Targets, TelemetrySnapshot,
    TuningSettings,
};
use asic_autotune::sim::{SimulatedBoard, SimulatedBoardConfig};
use asic_autotune::tracing::{self, prelude::*};

/// How often the simulated sensors are sampled.
const TELEMETRY_INTERVAL: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> Result<()> {
    tracing::init_journald_or_stdout();

    let snapshot = match env::var("AUTOTUNE_SETTINGS") {
        Ok(path) => SettingsSnapshot::load(&path)
            .with_context(|| format!("loading settings from {path}"))?,
        Err(_) => {
            info!("AUTOTUNE_SETTINGS not set, using default settings");
            SettingsSnapshot::default()
        }
    };
    let settings = TuningSettings::from_snapshot(&snapshot)?;

    let mut board = SimulatedBoard::new(SimulatedBoardConfig::default());
    let initial_targets = Targets {
        frequency_mhz: settings.frequency_mhz,
        voltage_mv: settings.voltage_mv,
    };
    let initial = board.telemetry(initial_targets);

    let tuner = AutoTuner::new(settings, initial.hashrate);
    let (telemetry_tx, telemetry_rx) = watch::channel(Some(initial));
    let (controller, handle) = AutoTuneController::new(tuner, telemetry_rx);

    if env::args().any(|arg| arg == "--enable") {
        handle.set_auto_tune_enabled(true);
    }
    if !handle.auto_tune_enabled() {
        warn!("Auto-tune is disabled; pass --enable or set auto_tune in the settings");
    }

    let running = CancellationToken::new();
    let controller_task = tokio::spawn(controller.run(running.clone()));
    let board_task = tokio::spawn(sample_board(
        board,
        handle.clone(),
        telemetry_tx,
        running.clone(),
    ));

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("Shutdown requested");
    running.cancel();

    controller_task.await?;
    board_task.await?;

    let targets = handle.targets();
    info!(
        frequency_mhz = %targets.frequency_mhz,
        voltage_mv = %targets.voltage_mv,
        "Final targets"
    );

    Ok(())
}

/// Applies the latest targets to the simulated board and publishes what
/// its sensors report.
async fn sample_board(
    mut board: SimulatedBoard,
    handle: AutoTuneHandle,
    telemetry_tx: watch::Sender<Option<TelemetrySnapshot>>,
    running: CancellationToken,
) {
    let mut interval = tokio::time::interval(TELEMETRY_INTERVAL);

    loop {
        tokio::select! {
            _ = running.cancelled() => break,
            _ = interval.tick() => {
                let telemetry = board.telemetry(handle.targets());
                trace!(?telemetry, "Board sampled");
                if telemetry_tx.send(Some(telemetry)).is_err() {
                    debug!("Telemetry channel closed");
                    break;
                }
            }
        }
    }
}

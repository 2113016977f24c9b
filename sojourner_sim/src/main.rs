// sojourner_sim/src/main.rs

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sojourner_sim::prelude::*;

const DEFAULT_LOG_FILTER: &str = "info,sojourner_core=info,sojourner_sim=info";

fn main() -> ExitCode {
    // Initialize logging; RUST_LOG overrides the default filter.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> std::result::Result<(), SimError> {
    let mut scenario = load_scenario(cli.scenario.as_deref())?;
    cli.apply_overrides(&mut scenario);

    if cli.dump_config {
        print!("{}", toml::to_string_pretty(&scenario)?);
        return Ok(());
    }

    info!("Sojourner v{}", env!("CARGO_PKG_VERSION"));
    let mut simulation = Simulation::new(scenario)?;
    let summary = simulation.run()?;

    let pct = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |f| format!("{:.1}%", f * 100.0));
    info!(
        "Finished {} frames at ({:.1}, {:.1}, {:.0} deg), travelled {:.1} cells, stalled {} frames",
        summary.frames,
        summary.final_pose.x,
        summary.final_pose.y,
        summary.final_pose.yaw_deg,
        summary.distance_travelled,
        summary.stalled_frames,
    );
    info!(
        "Mapped {} of {} cells; fidelity {}, mapped {} of navigable ground",
        summary.coverage.observed,
        summary.coverage.total,
        pct(summary.fidelity.fidelity()),
        pct(summary.fidelity.mapped()),
    );
    info!(
        "Located {} of {} sample rocks",
        summary.rocks_located, summary.rocks_total
    );
    Ok(())
}

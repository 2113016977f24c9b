// sojourner_sim/src/cli.rs

use clap::Parser;
use std::path::PathBuf;

use crate::simulation::config::ScenarioConfig;

/// Sojourner: a headless harness for the rover perception pipeline.
///
/// Synthesizes camera frames from a seeded terrain, drives the perception
/// core with them and reports how well the resulting map matches the truth.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The path to the scenario TOML file to run. Built-in defaults are used
    /// when omitted.
    #[arg(short, long)]
    pub scenario: Option<PathBuf>,

    /// Number of frames to simulate, overriding the scenario.
    #[arg(short, long)]
    pub frames: Option<usize>,

    /// Seed for the terrain and sensor noise, overriding the scenario.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print the effective scenario as TOML and exit.
    #[arg(long, default_value_t = false)]
    pub dump_config: bool,
}

impl Cli {
    /// Applies command-line overrides on top of a loaded scenario.
    pub fn apply_overrides(&self, scenario: &mut ScenarioConfig) {
        if let Some(frames) = self.frames {
            scenario.simulation.frames = frames;
        }
        if let Some(seed) = self.seed {
            scenario.simulation.seed = Some(seed);
        }
    }
}

// sojourner_sim/src/prelude.rs

// Re-export the entire sojourner_core prelude so you can easily access
// pure types like `WorldMap`, `RoverPose`, `PerceptionPipeline`, etc.
pub use sojourner_core::prelude::*;

// Re-export common simulation-specific types.
pub use crate::cli::Cli;
pub use crate::error::SimError;
pub use crate::simulation::camera::CameraModel;
pub use crate::simulation::config::{load_scenario, ScenarioConfig};
pub use crate::simulation::prng::SimulationRng;
pub use crate::simulation::runner::{RunSummary, Simulation};
pub use crate::simulation::terrain::{Surface, Terrain};

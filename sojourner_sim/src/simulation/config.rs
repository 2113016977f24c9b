// sojourner_sim/src/simulation/config.rs

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use sojourner_core::config::PerceptionConfig;
use sojourner_core::error::PerceptionError;
use sojourner_core::types::RoverPose;
use tracing::info;

use crate::error::{Result, SimError};

/// Prefix for environment overrides, e.g. `SOJOURNER_SIMULATION__FRAMES=50`.
pub const ENV_PREFIX: &str = "SOJOURNER_";

// =========================================================================
// == Top-Level Scenario ==
// =========================================================================

/// # ScenarioConfig
/// The root of the data parsed from a `scenario.toml` file. Every section may
/// be omitted, in which case its defaults are used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub simulation: SimulationSection,

    #[serde(default)]
    pub terrain: TerrainConfig,

    #[serde(default)]
    pub rover: RoverConfig,

    #[serde(default)]
    pub camera: CameraConfig,

    #[serde(default)]
    pub perception: PerceptionConfig,
}

// =========================================================================
// == Scenario Sections ==
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationSection {
    /// Optional seed for the pseudo-random number generator for determinism.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Number of camera frames to process.
    #[serde(default = "default_frames")]
    pub frames: usize,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            seed: None,
            frames: default_frames(),
        }
    }
}

fn default_frames() -> usize {
    400
}

/// Ground-truth terrain generation. Distances are in map cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TerrainConfig {
    /// Width of the solid obstacle band around the map edge.
    pub border_width: usize,
    /// Number of circular boulders to scatter.
    pub boulders: usize,
    /// Inclusive `[min, max]` boulder radius.
    pub boulder_radius: [f64; 2],
    /// Number of sample rocks to place on navigable ground.
    pub rocks: usize,
    pub rock_radius: f64,
    /// No boulder may come closer than this to the rover's start position.
    pub start_clearance: f64,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            border_width: 3,
            boulders: 25,
            boulder_radius: [2.0, 6.0],
            rocks: 6,
            rock_radius: 0.8,
            start_clearance: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoverConfig {
    pub start: RoverPose,
    /// Distance driven per frame. Units: map cells.
    pub speed: f64,
    /// Largest heading change per frame. Units: degrees.
    pub max_yaw_rate_deg: f64,
    /// Below this many navigable pixels the rover stops and turns in place.
    pub min_navigable_pixels: usize,
}

impl Default for RoverConfig {
    fn default() -> Self {
        Self {
            start: RoverPose::new(100.0, 100.0, 0.0),
            speed: 0.5,
            max_yaw_rate_deg: 15.0,
            min_navigable_pixels: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraConfig {
    /// Standard deviation of the per-channel Gaussian pixel noise. Zero
    /// renders noiseless frames.
    pub noise_stddev: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self { noise_stddev: 3.0 }
    }
}

// =========================================================================
// == Loading and Validation ==
// =========================================================================

impl ScenarioConfig {
    /// Checks the harness sections and the embedded perception config.
    pub fn validate(&self) -> Result<()> {
        self.perception
            .validate()
            .map_err(PerceptionError::from)?;

        let invalid = |msg: String| Err(SimError::Invalid(msg));
        let t = &self.terrain;
        let [r_min, r_max] = t.boulder_radius;
        if !(r_min > 0.0 && r_min <= r_max) {
            return invalid(format!(
                "terrain.boulder_radius must satisfy 0 < min <= max, got [{r_min}, {r_max}]"
            ));
        }
        if !(t.rock_radius.is_finite() && t.rock_radius > 0.0) {
            return invalid(format!("terrain.rock_radius must be positive, got {}", t.rock_radius));
        }
        if 2 * t.border_width >= self.perception.map.dimension {
            return invalid(format!(
                "terrain.border_width {} leaves no interior on a {}-cell map",
                t.border_width, self.perception.map.dimension
            ));
        }

        let start = &self.rover.start;
        let dim = self.perception.map.dimension as f64;
        if !(0.0..dim).contains(&start.x) || !(0.0..dim).contains(&start.y) {
            return invalid(format!(
                "rover.start ({}, {}) lies outside the {dim}-cell map",
                start.x, start.y
            ));
        }
        let non_negative = |v: f64| v.is_finite() && v >= 0.0;
        if !non_negative(self.rover.speed) || !non_negative(self.rover.max_yaw_rate_deg) {
            return invalid("rover.speed and rover.max_yaw_rate_deg must be non-negative".into());
        }
        if !non_negative(self.camera.noise_stddev) {
            return invalid(format!(
                "camera.noise_stddev must be non-negative, got {}",
                self.camera.noise_stddev
            ));
        }
        Ok(())
    }
}

/// Builds the layered provider: built-in defaults, then the scenario file (if
/// any), then `SOJOURNER_`-prefixed environment variables.
pub fn scenario_figment(path: Option<&Path>) -> Result<Figment> {
    let mut figment = Figment::from(Serialized::defaults(ScenarioConfig::default()));
    if let Some(path) = path {
        if !path.is_file() {
            return Err(SimError::ScenarioNotFound(path.to_path_buf()));
        }
        figment = figment.merge(Toml::file(path));
    }
    Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
}

/// Extracts and validates a scenario from any figment.
pub fn extract_scenario(figment: &Figment) -> Result<ScenarioConfig> {
    let scenario: ScenarioConfig = figment.extract()?;
    scenario.validate()?;
    Ok(scenario)
}

pub fn load_scenario(path: Option<&Path>) -> Result<ScenarioConfig> {
    match path {
        Some(p) => info!("Loading scenario from: {}", p.display()),
        None => info!("No scenario file given; using built-in defaults"),
    }
    extract_scenario(&scenario_figment(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sojourner_core::error::ConfigurationError;

    fn from_toml(text: &str) -> Result<ScenarioConfig> {
        let figment =
            Figment::from(Serialized::defaults(ScenarioConfig::default())).merge(Toml::string(text));
        extract_scenario(&figment)
    }

    #[test]
    fn defaults_are_valid() {
        ScenarioConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_file_overrides_only_what_it_names() {
        let scenario = from_toml(
            r#"
            [simulation]
            seed = 11
            frames = 20

            [terrain]
            boulders = 0

            [perception.map]
            scale = 8.0
            "#,
        )
        .unwrap();

        assert_eq!(scenario.simulation.seed, Some(11));
        assert_eq!(scenario.simulation.frames, 20);
        assert_eq!(scenario.terrain.boulders, 0);
        assert_eq!(scenario.terrain.rocks, TerrainConfig::default().rocks);
        assert_eq!(scenario.perception.map.scale, 8.0);
        assert_eq!(scenario.perception.map.dimension, 200);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            from_toml("[rover]\nwheels = 6\n"),
            Err(SimError::Config(_))
        ));
    }

    #[test]
    fn invalid_perception_section_is_reported() {
        let err = from_toml("[perception.map]\nscale = 0.0\n").unwrap_err();
        assert!(matches!(
            err,
            SimError::Perception(PerceptionError::Configuration(
                ConfigurationError::InvalidParameter { .. }
            ))
        ));
    }

    #[test]
    fn inverted_boulder_radius_is_rejected() {
        assert!(matches!(
            from_toml("[terrain]\nboulder_radius = [5.0, 1.0]\n"),
            Err(SimError::Invalid(_))
        ));
    }

    #[test]
    fn nan_tunables_are_rejected() {
        let mut scenario = ScenarioConfig::default();
        scenario.camera.noise_stddev = f64::NAN;
        assert!(matches!(scenario.validate(), Err(SimError::Invalid(_))));

        let mut scenario = ScenarioConfig::default();
        scenario.rover.speed = f64::NAN;
        assert!(matches!(scenario.validate(), Err(SimError::Invalid(_))));

        let mut scenario = ScenarioConfig::default();
        scenario.terrain.rock_radius = f64::NAN;
        assert!(matches!(scenario.validate(), Err(SimError::Invalid(_))));
    }

    #[test]
    fn missing_scenario_file_is_an_error() {
        let path = Path::new("does/not/exist.toml");
        assert!(matches!(
            scenario_figment(Some(path)),
            Err(SimError::ScenarioNotFound(p)) if p == path
        ));
    }

    #[test]
    fn dumped_scenario_reloads_unchanged() {
        let mut scenario = ScenarioConfig::default();
        scenario.simulation.seed = Some(3);
        scenario.rover.start = RoverPose::new(40.0, 60.0, 90.0);
        let text = toml::to_string_pretty(&scenario).unwrap();
        assert_eq!(from_toml(&text).unwrap(), scenario);
    }
}

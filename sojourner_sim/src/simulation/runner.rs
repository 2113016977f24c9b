// sojourner_sim/src/simulation/runner.rs

use nalgebra::Point2;
use sojourner_core::frames::PolarPoints;
use sojourner_core::mapping::{MapChannel, MapCoverage, MapFidelity, WorldMap};
use sojourner_core::messages::{FrameInput, FrameReport};
use sojourner_core::pipeline::PerceptionPipeline;
use sojourner_core::types::RoverPose;
use tracing::{debug, info};

use crate::error::{Result, SimError};
use crate::simulation::camera::CameraModel;
use crate::simulation::config::ScenarioConfig;
use crate::simulation::prng::SimulationRng;
use crate::simulation::terrain::{Surface, Terrain};

/// End-of-run statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub frames: usize,
    pub final_pose: RoverPose,
    pub distance_travelled: f64,
    /// Frames on which the rover turned in place instead of driving.
    pub stalled_frames: usize,
    pub coverage: MapCoverage,
    pub fidelity: MapFidelity,
    /// Terrain rocks with rock evidence on or next to their cell.
    pub rocks_located: usize,
    pub rocks_total: usize,
}

/// One rover exploring one terrain.
#[derive(Debug)]
pub struct Simulation {
    scenario: ScenarioConfig,
    pipeline: PerceptionPipeline,
    camera: CameraModel,
    terrain: Terrain,
    map: WorldMap,
    pose: RoverPose,
    rng: SimulationRng,
    frame: usize,
    distance_travelled: f64,
    stalled_frames: usize,
}

impl Simulation {
    /// Generates a terrain from the scenario's seed.
    pub fn new(scenario: ScenarioConfig) -> Result<Self> {
        let mut rng = SimulationRng::new(scenario.simulation.seed);
        let terrain = Terrain::generate(
            &scenario.terrain,
            scenario.perception.map.dimension,
            &scenario.rover.start,
            &mut rng,
        );
        Self::with_terrain(scenario, terrain, rng)
    }

    /// Runs on a caller-supplied terrain.
    pub fn with_terrain(scenario: ScenarioConfig, terrain: Terrain, rng: SimulationRng) -> Result<Self> {
        scenario.validate()?;
        let dimension = scenario.perception.map.dimension;
        if terrain.dimension() != dimension {
            return Err(SimError::Invalid(format!(
                "terrain is {0}x{0} cells but perception.map.dimension is {dimension}",
                terrain.dimension()
            )));
        }
        let pipeline = PerceptionPipeline::new(scenario.perception.clone())?;
        let camera = CameraModel::new(&scenario.perception, &scenario.camera)?;
        let map = WorldMap::new(dimension);

        Ok(Self {
            pose: scenario.rover.start,
            scenario,
            pipeline,
            camera,
            terrain,
            map,
            rng,
            frame: 0,
            distance_travelled: 0.0,
            stalled_frames: 0,
        })
    }

    pub fn pose(&self) -> &RoverPose {
        &self.pose
    }

    pub fn map(&self) -> &WorldMap {
        &self.map
    }

    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Renders the current view, folds it into the map and drives on.
    pub fn step(&mut self) -> Result<FrameReport> {
        let image = self.camera.render(&self.terrain, &self.pose, &mut self.rng);
        let output = self.pipeline.process(
            &FrameInput {
                image: &image,
                pose: self.pose,
            },
            &mut self.map,
        )?;

        self.drive(&output.navigable);
        self.frame += 1;

        debug!(
            frame = self.frame,
            x = self.pose.x,
            y = self.pose.y,
            yaw = self.pose.yaw_deg,
            navigable = output.report.pixels.navigable,
            rock = output.report.pixels.rock,
            "frame processed"
        );
        Ok(output.report)
    }

    /// Steers toward the mean navigable bearing when there is enough open
    /// ground, otherwise turns in place. The rover never drives into an
    /// obstacle cell.
    fn drive(&mut self, navigable: &PolarPoints) {
        let rover = &self.scenario.rover;
        let max_turn = rover.max_yaw_rate_deg;

        let bearing = navigable
            .mean_angle()
            .filter(|_| navigable.len() >= rover.min_navigable_pixels);

        let Some(bearing) = bearing else {
            self.pose.yaw_deg = (self.pose.yaw_deg - max_turn).rem_euclid(360.0);
            self.stalled_frames += 1;
            return;
        };

        let steer = bearing.to_degrees().clamp(-max_turn, max_turn);
        self.pose.yaw_deg = (self.pose.yaw_deg + steer).rem_euclid(360.0);

        let heading = self.pose.yaw_deg.to_radians();
        let next_x = self.pose.x + rover.speed * heading.cos();
        let next_y = self.pose.y + rover.speed * heading.sin();
        if self.terrain.surface_at(next_x, next_y) == Surface::Obstacle {
            self.stalled_frames += 1;
            return;
        }
        self.distance_travelled += rover.speed;
        self.pose.x = next_x;
        self.pose.y = next_y;
    }

    /// Runs the scenario's remaining frames and summarizes.
    pub fn run(&mut self) -> Result<RunSummary> {
        let total = self.scenario.simulation.frames;
        info!(frames = total, "starting simulation");
        while self.frame < total {
            self.step()?;
        }
        self.summary()
    }

    pub fn summary(&self) -> Result<RunSummary> {
        Ok(RunSummary {
            frames: self.frame,
            final_pose: self.pose,
            distance_travelled: self.distance_travelled,
            stalled_frames: self.stalled_frames,
            coverage: self.map.coverage(),
            fidelity: self.map.fidelity(self.terrain.truth())?,
            rocks_located: self.rocks_located(),
            rocks_total: self.terrain.rocks().len(),
        })
    }

    fn rocks_located(&self) -> usize {
        let dim = self.map.dimension();
        let reach = self.terrain.rock_radius() + 1.0;
        self.terrain
            .rocks()
            .iter()
            .filter(|rock| {
                let lo = |v: f64| (v - reach).floor().max(0.0) as usize;
                let hi = |v: f64| ((v + reach).ceil().max(0.0) as usize).min(dim);
                (lo(rock.y)..hi(rock.y)).any(|y| {
                    (lo(rock.x)..hi(rock.x)).any(|x| {
                        let centre = Point2::new(x as f64 + 0.5, y as f64 + 0.5);
                        nalgebra::distance(&centre, rock) <= reach
                            && self.map.get(MapChannel::Rock, x, y) > 0.0
                    })
                })
            })
            .count()
    }
}

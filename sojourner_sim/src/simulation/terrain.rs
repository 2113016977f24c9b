// sojourner_sim/src/simulation/terrain.rs

use nalgebra::{DMatrix, Point2};
use rand::Rng;
use sojourner_core::types::RoverPose;
use tracing::{debug, warn};

use crate::simulation::config::TerrainConfig;
use crate::simulation::prng::SimulationRng;

/// Rejection-sampling budget per requested feature.
const PLACEMENT_ATTEMPTS: usize = 50;

/// What the camera sees at a world position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Navigable,
    Obstacle,
    Rock,
}

/// The ground-truth world the rover drives through.
///
/// `truth` is indexed `(y, x)` like the world map channels; a non-zero cell is
/// navigable. Rocks sit on navigable ground and keep their cells navigable in
/// the truth grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Terrain {
    truth: DMatrix<u8>,
    rocks: Vec<Point2<f64>>,
    rock_radius: f64,
}

impl Terrain {
    pub fn from_parts(truth: DMatrix<u8>, rocks: Vec<Point2<f64>>, rock_radius: f64) -> Self {
        Self {
            truth,
            rocks,
            rock_radius,
        }
    }

    /// A fully navigable map apart from a solid border `border_width` wide.
    pub fn open(dimension: usize, border_width: usize) -> Self {
        let inside = |i: usize| i >= border_width && i + border_width < dimension;
        let truth = DMatrix::from_fn(dimension, dimension, |y, x| (inside(x) && inside(y)) as u8);
        Self::from_parts(truth, Vec::new(), 0.0)
    }

    /// Scatters boulders and rocks over an open map.
    ///
    /// Boulders never intrude within `start_clearance` of `start`. Features
    /// that cannot be placed within the attempt budget are skipped.
    pub fn generate(
        config: &TerrainConfig,
        dimension: usize,
        start: &RoverPose,
        rng: &mut SimulationRng,
    ) -> Self {
        let mut terrain = Self::open(dimension, config.border_width);
        terrain.rock_radius = config.rock_radius;
        let origin = Point2::new(start.x, start.y);
        let extent = dimension as f64;

        let [r_min, r_max] = config.boulder_radius;
        let mut placed = 0;
        for _ in 0..config.boulders * PLACEMENT_ATTEMPTS {
            if placed == config.boulders {
                break;
            }
            let centre = Point2::new(rng.0.gen_range(0.0..extent), rng.0.gen_range(0.0..extent));
            let radius = rng.0.gen_range(r_min..=r_max);
            if nalgebra::distance(&centre, &origin) < radius + config.start_clearance {
                continue;
            }
            terrain.carve_disc(centre, radius);
            placed += 1;
        }
        if placed < config.boulders {
            warn!(placed, requested = config.boulders, "could not place every boulder");
        }

        for _ in 0..config.rocks * PLACEMENT_ATTEMPTS {
            if terrain.rocks.len() == config.rocks {
                break;
            }
            let centre = Point2::new(rng.0.gen_range(0.0..extent), rng.0.gen_range(0.0..extent));
            if terrain.is_navigable(centre.x, centre.y) {
                terrain.rocks.push(centre);
            }
        }
        if terrain.rocks.len() < config.rocks {
            warn!(
                placed = terrain.rocks.len(),
                requested = config.rocks,
                "could not place every rock"
            );
        }

        debug!(
            dimension,
            boulders = placed,
            rocks = terrain.rocks.len(),
            navigable = terrain.navigable_cells(),
            "terrain generated"
        );
        terrain
    }

    fn carve_disc(&mut self, centre: Point2<f64>, radius: f64) {
        let dim = self.dimension();
        let lo = |v: f64| (v - radius).floor().max(0.0) as usize;
        let hi = |v: f64| ((v + radius).ceil().max(0.0) as usize).min(dim);
        for y in lo(centre.y)..hi(centre.y) {
            for x in lo(centre.x)..hi(centre.x) {
                let cell = Point2::new(x as f64 + 0.5, y as f64 + 0.5);
                if nalgebra::distance(&cell, &centre) <= radius {
                    self.truth[(y, x)] = 0;
                }
            }
        }
    }

    pub fn dimension(&self) -> usize {
        self.truth.nrows()
    }

    pub fn truth(&self) -> &DMatrix<u8> {
        &self.truth
    }

    pub fn rocks(&self) -> &[Point2<f64>] {
        &self.rocks
    }

    pub fn rock_radius(&self) -> f64 {
        self.rock_radius
    }

    pub fn navigable_cells(&self) -> usize {
        self.truth.iter().filter(|v| **v != 0).count()
    }

    /// Whether the cell containing `(x, y)` is navigable. Off-map is not.
    pub fn is_navigable(&self, x: f64, y: f64) -> bool {
        let dim = self.dimension() as f64;
        if !(x >= 0.0 && y >= 0.0 && x < dim && y < dim) {
            return false;
        }
        self.truth[(y as usize, x as usize)] != 0
    }

    pub fn surface_at(&self, x: f64, y: f64) -> Surface {
        if !self.is_navigable(x, y) {
            return Surface::Obstacle;
        }
        let p = Point2::new(x, y);
        if self
            .rocks
            .iter()
            .any(|r| nalgebra::distance(r, &p) <= self.rock_radius)
        {
            Surface::Rock
        } else {
            Surface::Navigable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate(seed: u64) -> Terrain {
        let mut rng = SimulationRng::new(Some(seed));
        Terrain::generate(
            &TerrainConfig::default(),
            200,
            &RoverPose::new(100.0, 100.0, 0.0),
            &mut rng,
        )
    }

    #[test]
    fn same_seed_gives_the_same_terrain() {
        assert_eq!(generate(7), generate(7));
        assert_ne!(generate(7), generate(8));
    }

    #[test]
    fn border_is_solid_and_off_map_is_obstacle() {
        let t = generate(1);
        for i in 0..200 {
            for b in 0..3 {
                assert_eq!(t.truth()[(b, i)], 0);
                assert_eq!(t.truth()[(i, 199 - b)], 0);
            }
        }
        assert_eq!(t.surface_at(-0.5, 50.0), Surface::Obstacle);
        assert_eq!(t.surface_at(50.0, 200.0), Surface::Obstacle);
        assert_eq!(t.surface_at(f64::NAN, 50.0), Surface::Obstacle);
    }

    #[test]
    fn start_area_is_kept_clear() {
        let t = generate(3);
        let clearance = TerrainConfig::default().start_clearance;
        for dy in -5..=5 {
            for dx in -5..=5 {
                let (x, y) = (100.0 + dx as f64, 100.0 + dy as f64);
                assert!(nalgebra::distance(&Point2::new(x, y), &Point2::new(100.0, 100.0)) < clearance);
                assert!(t.is_navigable(x, y), "start area blocked at ({x}, {y})");
            }
        }
    }

    #[test]
    fn rocks_sit_on_navigable_ground() {
        let t = generate(5);
        assert_eq!(t.rocks().len(), TerrainConfig::default().rocks);
        for r in t.rocks() {
            assert!(t.is_navigable(r.x, r.y));
            assert_eq!(t.surface_at(r.x, r.y), Surface::Rock);
        }
    }

    #[test]
    fn open_terrain_counts_its_interior() {
        let t = Terrain::open(10, 2);
        assert_eq!(t.navigable_cells(), 36);
        assert_eq!(t.surface_at(5.0, 5.0), Surface::Navigable);
        assert_eq!(t.surface_at(1.9, 5.0), Surface::Obstacle);
    }
}

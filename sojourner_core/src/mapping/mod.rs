// sojourner_core/src/mapping/mod.rs

use nalgebra::DMatrix;

use crate::frames::world::WorldCells;

mod stats;

pub use stats::{MapCoverage, MapFidelity};

// --- Map Data Structures ---

/// One accumulation layer of the [`WorldMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapChannel {
    Obstacle,
    Rock,
    Navigable,
}

impl MapChannel {
    pub const ALL: [MapChannel; 3] = [MapChannel::Obstacle, MapChannel::Rock, MapChannel::Navigable];

    #[inline]
    fn index(self) -> usize {
        match self {
            MapChannel::Obstacle => 0,
            MapChannel::Rock => 1,
            MapChannel::Navigable => 2,
        }
    }
}

/// The world cells observed for each class during one frame.
#[derive(Debug, Clone, Copy)]
pub struct ClassifiedCells<'a> {
    pub obstacle: &'a WorldCells,
    pub rock: &'a WorldCells,
    pub navigable: &'a WorldCells,
}

/// What one call to [`WorldMap::accumulate`] changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccumulationReport {
    /// Distinct cells incremented, per channel.
    pub obstacle_cells: usize,
    pub rock_cells: usize,
    pub navigable_cells: usize,
    /// Cells whose obstacle evidence was wiped by navigable evidence.
    pub obstacle_cleared: usize,
}

/// A persistent, square, three-channel evidence map.
///
/// Cells are addressed `(x, y)` = `(column, row)`. Each channel is an
/// unbounded accumulator; the only correction applied is that navigable
/// evidence in a cell zeroes its obstacle channel. The map is allocated once
/// per mission and owned by the caller, which hands it to the pipeline by
/// `&mut` for each frame.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldMap {
    dimension: usize,
    channels: [DMatrix<f64>; 3],
}

impl WorldMap {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            channels: std::array::from_fn(|_| DMatrix::zeros(dimension, dimension)),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// The raw layer, indexed `(row, col)` = `(y, x)`.
    pub fn channel(&self, channel: MapChannel) -> &DMatrix<f64> {
        &self.channels[channel.index()]
    }

    /// Evidence at column `x`, row `y`. Panics if out of range.
    pub fn get(&self, channel: MapChannel, x: usize, y: usize) -> f64 {
        self.channels[channel.index()][(y, x)]
    }

    /// Overwrites one cell. Intended for seeding maps in tools and tests;
    /// the perception pipeline only ever goes through [`WorldMap::accumulate`].
    pub fn set(&mut self, channel: MapChannel, x: usize, y: usize, value: f64) {
        self.channels[channel.index()][(y, x)] = value;
    }

    /// Adds `weight` to each class channel at that class's cells, then lets
    /// navigable evidence override obstacle evidence.
    ///
    /// Within a single call a cell listed more than once for a class is
    /// incremented once. The override only ever clears the obstacle channel.
    pub fn accumulate(&mut self, cells: &ClassifiedCells<'_>, weight: f64) -> AccumulationReport {
        let obstacle_cells = self.add_evidence(MapChannel::Obstacle, cells.obstacle, weight);
        let rock_cells = self.add_evidence(MapChannel::Rock, cells.rock, weight);
        let navigable_cells = self.add_evidence(MapChannel::Navigable, cells.navigable, weight);
        let obstacle_cleared = self.resolve_conflicts();

        AccumulationReport {
            obstacle_cells,
            rock_cells,
            navigable_cells,
            obstacle_cleared,
        }
    }

    fn add_evidence(&mut self, channel: MapChannel, cells: &WorldCells, weight: f64) -> usize {
        let dim = self.dimension;
        let mut linear: Vec<usize> = cells
            .iter()
            .filter(|&(x, y)| x < dim && y < dim)
            .map(|(x, y)| y * dim + x)
            .collect();
        linear.sort_unstable();
        linear.dedup();

        let layer = &mut self.channels[channel.index()];
        for &i in &linear {
            let (row, col) = (i / dim, i % dim);
            layer[(row, col)] += weight;
        }
        linear.len()
    }

    /// Zeroes obstacle evidence wherever navigable evidence is positive.
    /// Returns the number of cells that were cleared.
    pub fn resolve_conflicts(&mut self) -> usize {
        let [obstacle, _, navigable] = &mut self.channels;
        let mut cleared = 0;
        for (o, n) in obstacle.iter_mut().zip(navigable.iter()) {
            if *n > 0.0 && *o != 0.0 {
                *o = 0.0;
                cleared += 1;
            }
        }
        cleared
    }

    /// `true` if no cell holds both navigable and obstacle evidence.
    pub fn is_consistent(&self) -> bool {
        self.channel(MapChannel::Navigable)
            .iter()
            .zip(self.channel(MapChannel::Obstacle).iter())
            .all(|(n, o)| *n <= 0.0 || *o == 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::world::pix_to_world;
    use crate::frames::RoverPoints;
    use crate::types::RoverPose;

    fn cells_at(points: &[(f64, f64)]) -> WorldCells {
        // Rover at the origin, scale 1: rover-centric == world.
        let (x, y) = points.iter().copied().unzip();
        let pts = RoverPoints::new(x, y).unwrap();
        pix_to_world(&pts, &RoverPose::default(), 10, 1.0)
    }

    #[test]
    fn accumulation_is_additive_across_frames() {
        let mut map = WorldMap::new(10);
        let rock = cells_at(&[(2.0, 3.0)]);
        let none = WorldCells::default();

        for _ in 0..3 {
            map.accumulate(
                &ClassifiedCells {
                    obstacle: &none,
                    rock: &rock,
                    navigable: &none,
                },
                255.0,
            );
        }
        assert_eq!(map.get(MapChannel::Rock, 2, 3), 765.0);
        assert_eq!(map.get(MapChannel::Rock, 3, 2), 0.0);
    }

    #[test]
    fn duplicates_within_a_frame_count_once() {
        let mut map = WorldMap::new(10);
        let obstacle = cells_at(&[(4.0, 4.0), (4.2, 4.9), (5.0, 4.0)]);
        let none = WorldCells::default();
        let report = map.accumulate(
            &ClassifiedCells {
                obstacle: &obstacle,
                rock: &none,
                navigable: &none,
            },
            255.0,
        );
        assert_eq!(report.obstacle_cells, 2);
        assert_eq!(map.get(MapChannel::Obstacle, 4, 4), 255.0);
        assert_eq!(map.get(MapChannel::Obstacle, 5, 4), 255.0);
    }

    #[test]
    fn navigable_overrides_prior_obstacle() {
        let mut map = WorldMap::new(10);
        let none = WorldCells::default();
        let cell = cells_at(&[(1.0, 1.0)]);

        map.accumulate(
            &ClassifiedCells {
                obstacle: &cell,
                rock: &none,
                navigable: &none,
            },
            255.0,
        );
        assert_eq!(map.get(MapChannel::Obstacle, 1, 1), 255.0);
        assert!(map.is_consistent());

        let report = map.accumulate(
            &ClassifiedCells {
                obstacle: &none,
                rock: &none,
                navigable: &cell,
            },
            255.0,
        );
        assert_eq!(report.obstacle_cleared, 1);
        assert_eq!(map.get(MapChannel::Obstacle, 1, 1), 0.0);
        assert!(map.is_consistent());

        // Later obstacle evidence does not survive the override.
        map.accumulate(
            &ClassifiedCells {
                obstacle: &cell,
                rock: &none,
                navigable: &none,
            },
            255.0,
        );
        assert_eq!(map.get(MapChannel::Obstacle, 1, 1), 0.0);
        assert_eq!(map.get(MapChannel::Navigable, 1, 1), 255.0);
    }

    #[test]
    fn obstacle_never_clears_navigable() {
        let mut map = WorldMap::new(4);
        map.set(MapChannel::Navigable, 0, 0, 10.0);
        let cell = cells_at(&[(0.0, 0.0)]);
        let none = WorldCells::default();
        map.accumulate(
            &ClassifiedCells {
                obstacle: &cell,
                rock: &none,
                navigable: &none,
            },
            1.0,
        );
        assert_eq!(map.get(MapChannel::Navigable, 0, 0), 10.0);
        assert_eq!(map.get(MapChannel::Obstacle, 0, 0), 0.0);
    }
}

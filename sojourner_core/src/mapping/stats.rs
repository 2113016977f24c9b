// sojourner_core/src/mapping/stats.rs

use nalgebra::DMatrix;

use crate::error::{PerceptionError, Result};
use crate::mapping::{MapChannel, WorldMap};

/// Number of cells holding any evidence, per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MapCoverage {
    pub obstacle: usize,
    pub rock: usize,
    pub navigable: usize,
    /// Cells with evidence in any channel.
    pub observed: usize,
    pub total: usize,
}

/// Agreement between the navigable channel and a ground-truth grid.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MapFidelity {
    /// Mapped-navigable cells that are truly navigable.
    pub good_cells: usize,
    /// Mapped-navigable cells that are not.
    pub bad_cells: usize,
    /// Truly navigable cells.
    pub truth_cells: usize,
}

impl MapFidelity {
    /// `good / (good + bad)`. `None` until something has been mapped.
    pub fn fidelity(&self) -> Option<f64> {
        ratio(self.good_cells, self.good_cells + self.bad_cells)
    }

    /// `good / truth`. `None` for a ground truth with no navigable cells.
    pub fn mapped(&self) -> Option<f64> {
        ratio(self.good_cells, self.truth_cells)
    }
}

fn ratio(num: usize, den: usize) -> Option<f64> {
    (den > 0).then(|| num as f64 / den as f64)
}

impl WorldMap {
    pub fn coverage(&self) -> MapCoverage {
        let count = |ch| self.channel(ch).iter().filter(|v| **v > 0.0).count();
        let observed = (0..self.dimension() * self.dimension())
            .filter(|&i| {
                MapChannel::ALL
                    .iter()
                    .any(|&ch| self.channel(ch).as_slice()[i] > 0.0)
            })
            .count();

        MapCoverage {
            obstacle: count(MapChannel::Obstacle),
            rock: count(MapChannel::Rock),
            navigable: count(MapChannel::Navigable),
            observed,
            total: self.dimension() * self.dimension(),
        }
    }

    /// Compares navigable evidence with `truth`, where a non-zero cell is
    /// navigable. `truth` is indexed `(row, col)` like the map channels.
    pub fn fidelity(&self, truth: &DMatrix<u8>) -> Result<MapFidelity> {
        let dim = self.dimension();
        if truth.shape() != (dim, dim) {
            return Err(PerceptionError::ShapeMismatch {
                expected: (dim, dim),
                actual: truth.shape(),
            });
        }

        let mut stats = MapFidelity::default();
        for (mapped, t) in self.channel(MapChannel::Navigable).iter().zip(truth.iter()) {
            let is_true = *t != 0;
            stats.truth_cells += is_true as usize;
            if *mapped > 0.0 {
                if is_true {
                    stats.good_cells += 1;
                } else {
                    stats.bad_cells += 1;
                }
            }
        }
        Ok(stats)
    }
}

// sojourner_core/src/frames.rs

//! Rover-centric coordinate frames.
//!
//! The rover-centric frame has its origin at the bottom-center of the
//! rectified image, `x` pointing forward (up the image) and `y` pointing to
//! the rover's left. Point sets keep their `x`/`y` (or distance/angle)
//! sequences paired: index `i` always refers to the same mask pixel.

pub mod world;

use crate::image::Mask;

// =========================================================================
// == Cartesian ==
// =========================================================================

/// Rover-centric Cartesian coordinates of the set cells of a mask.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RoverPoints {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl RoverPoints {
    /// Pairs two sequences. `None` if their lengths differ.
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Option<Self> {
        (x.len() == y.len()).then_some(Self { x, y })
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Forward distances.
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// Lateral offsets, left positive.
    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }

    pub fn to_polar(&self) -> PolarPoints {
        to_polar_coords(self)
    }
}

/// Converts the non-zero cells of `mask` to rover-centric coordinates.
///
/// Cells are visited in row-major order; row `r` becomes `x = height - r` and
/// column `c` becomes `y = width / 2 - c`. An empty mask gives an empty set.
pub fn to_rover_coords(mask: &Mask) -> RoverPoints {
    let height = mask.height() as f64;
    let half_width = mask.width() as f64 / 2.0;

    let n = mask.count_nonzero();
    let mut x = Vec::with_capacity(n);
    let mut y = Vec::with_capacity(n);

    for (col, row, v) in mask.enumerate_pixels() {
        if v != 0 {
            x.push(height - row as f64);
            y.push(half_width - col as f64);
        }
    }

    RoverPoints { x, y }
}

// =========================================================================
// == Polar ==
// =========================================================================

/// Rover-centric polar coordinates: distance and bearing from the rover.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PolarPoints {
    distances: Vec<f64>,
    angles: Vec<f64>,
}

impl PolarPoints {
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    /// Distances, `>= 0`.
    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    /// Bearings in radians, `(-pi, pi]`, positive to the left.
    pub fn angles(&self) -> &[f64] {
        &self.angles
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.distances
            .iter()
            .copied()
            .zip(self.angles.iter().copied())
    }

    /// Mean bearing, the usual steering signal. `None` for an empty set.
    pub fn mean_angle(&self) -> Option<f64> {
        mean(&self.angles)
    }

    /// Mean distance. `None` for an empty set.
    pub fn mean_distance(&self) -> Option<f64> {
        mean(&self.distances)
    }

    /// Back-derives Cartesian coordinates.
    pub fn to_cartesian(&self) -> RoverPoints {
        let (x, y) = self
            .iter()
            .map(|(d, a)| (d * a.cos(), d * a.sin()))
            .unzip();
        RoverPoints { x, y }
    }

    /// Splits into `(distances, angles)`.
    pub fn into_parts(self) -> (Vec<f64>, Vec<f64>) {
        (self.distances, self.angles)
    }
}

/// Elementwise `d = sqrt(x^2 + y^2)`, `a = atan2(y, x)`.
pub fn to_polar_coords(points: &RoverPoints) -> PolarPoints {
    let (distances, angles) = points.iter().map(|(x, y)| (x.hypot(y), y.atan2(x))).unzip();
    PolarPoints { distances, angles }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

// sojourner_core/src/frames/world.rs

//! Rover-centric to world-map projection.
//!
//! Axis convention: the rotated rover-centric `x` becomes the world `x`
//! index, which addresses map **columns**; the rotated `y` becomes the world
//! `y` index, which addresses map **rows**. A cell is therefore read as
//! `map[(y, x)]`.

use nalgebra::{Rotation2, Vector2};

use crate::frames::RoverPoints;
use crate::types::RoverPose;

/// Integer world-map cells, paired with the points they came from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorldCells {
    x: Vec<usize>,
    y: Vec<usize>,
    clamped: usize,
}

impl WorldCells {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Column indices.
    pub fn x(&self) -> &[usize] {
        &self.x
    }

    /// Row indices.
    pub fn y(&self) -> &[usize] {
        &self.y
    }

    /// Number of points whose index had to be clamped on at least one axis.
    pub fn clamped(&self) -> usize {
        self.clamped
    }

    /// Iterates `(x, y)` = `(col, row)`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }
}

/// Rotates a rover-centric point counter-clockwise by `yaw_deg`.
#[inline]
pub fn rotate(x: f64, y: f64, yaw_deg: f64) -> (f64, f64) {
    let r = Rotation2::new(yaw_deg.to_radians()) * Vector2::new(x, y);
    (r.x, r.y)
}

/// Scales rotated pixels down to world units and offsets by the rover position.
#[inline]
pub fn translate(x_rot: f64, y_rot: f64, x_pos: f64, y_pos: f64, scale: f64) -> (f64, f64) {
    (x_rot / scale + x_pos, y_rot / scale + y_pos)
}

/// Truncates toward zero and clamps into `[0, dimension - 1]`. The flag is
/// set if clamping changed the value.
#[inline]
fn to_index(v: f64, dimension: usize) -> (usize, bool) {
    let max = dimension.saturating_sub(1) as i64;
    // `as` saturates and maps NaN to 0.
    let t = v.trunc() as i64;
    let c = t.clamp(0, max);
    (c as usize, c != t || v.is_nan())
}

/// Projects a world-frame point (already rotated and translated) to a cell.
#[inline]
pub fn world_to_cell(x: f64, y: f64, dimension: usize) -> ((usize, usize), bool) {
    let (cx, clamped_x) = to_index(x, dimension);
    let (cy, clamped_y) = to_index(y, dimension);
    ((cx, cy), clamped_x || clamped_y)
}

/// Rotates, scales, translates and clips rover-centric points into world
/// cells. Output order matches `points`.
///
/// Out-of-map points are clamped onto the border rather than dropped; the
/// number of such points is reported by [`WorldCells::clamped`].
pub fn pix_to_world(points: &RoverPoints, pose: &RoverPose, dimension: usize, scale: f64) -> WorldCells {
    let rotation = Rotation2::new(pose.yaw_deg.to_radians());
    let mut cells = WorldCells {
        x: Vec::with_capacity(points.len()),
        y: Vec::with_capacity(points.len()),
        clamped: 0,
    };

    for (px, py) in points.iter() {
        let r = rotation * Vector2::new(px, py);
        let (wx, wy) = translate(r.x, r.y, pose.x, pose.y, scale);
        let ((cx, cy), clamped) = world_to_cell(wx, wy, dimension);
        cells.x.push(cx);
        cells.y.push(cy);
        cells.clamped += clamped as usize;
    }

    cells
}

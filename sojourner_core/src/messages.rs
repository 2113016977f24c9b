// sojourner_core/src/messages.rs

use crate::frames::PolarPoints;
use crate::image::RgbImage;
use crate::mapping::{AccumulationReport, WorldMap};
use crate::types::RoverPose;

// =========================================================================
// == Pipeline Input / Output ==
// =========================================================================

/// Everything the pipeline reads for one frame, besides the map.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    /// The raw camera frame.
    pub image: &'a RgbImage,
    pub pose: RoverPose,
}

/// Per-class counters for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClassCounts {
    pub obstacle: usize,
    pub rock: usize,
    pub navigable: usize,
}

/// Diagnostics for one processed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameReport {
    /// Set pixels in each rectified mask.
    pub pixels: ClassCounts,
    /// Points whose world index was saturated at the map border.
    pub clamped: ClassCounts,
    pub accumulation: AccumulationReport,
}

impl FrameReport {
    pub fn total_clamped(&self) -> usize {
        self.clamped.obstacle + self.clamped.rock + self.clamped.navigable
    }
}

/// What the pipeline produces for one frame.
#[derive(Debug, Clone)]
pub struct PerceptionOutput {
    /// Rectified obstacle / rock / navigable masks at full intensity in
    /// channels 0 / 1 / 2. Diagnostic only.
    pub vision_image: RgbImage,
    /// Polar coordinates of the navigable pixels, for steering.
    pub navigable: PolarPoints,
    pub report: FrameReport,
}

// =========================================================================
// == Rover State Snapshot ==
// =========================================================================

/// The rover's shared state bag, for callers that keep image, pose, map and
/// outputs together on one object.
#[derive(Debug, Clone)]
pub struct RoverState {
    /// Latest camera frame.
    pub image: RgbImage,
    pub pose: RoverPose,
    /// Persistent map; mutated in place every frame.
    pub world_map: WorldMap,
    /// Overwritten every frame.
    pub vision_image: RgbImage,
    /// Navigable pixel distances from the last frame.
    pub nav_distances: Vec<f64>,
    /// Navigable pixel bearings from the last frame, radians.
    pub nav_angles: Vec<f64>,
}

impl RoverState {
    /// A state with an empty map of `map_dimension` and blank frames of
    /// `width` x `height`.
    pub fn new(width: usize, height: usize, map_dimension: usize) -> Self {
        Self {
            image: RgbImage::new(width, height),
            pose: RoverPose::default(),
            world_map: WorldMap::new(map_dimension),
            vision_image: RgbImage::new(width, height),
            nav_distances: Vec::new(),
            nav_angles: Vec::new(),
        }
    }
}

// sojourner_core/src/prelude.rs

// --- Core Abstractions ---
pub use crate::error::{ConfigurationError, PerceptionError, Result};
pub use crate::perception::PixelClassifier;
pub use crate::pipeline::PerceptionPipeline;

// --- Core Data Structures ---
pub use crate::config::PerceptionConfig;
pub use crate::frames::world::WorldCells;
pub use crate::frames::{PolarPoints, RoverPoints};
pub use crate::image::{Image, Mask, Rgb, RgbImage};
pub use crate::mapping::{MapChannel, WorldMap};
pub use crate::messages::{FrameInput, FrameReport, PerceptionOutput, RoverState};
pub use crate::types::RoverPose;

// --- Stage Functions (for running stages in isolation) ---
pub use crate::frames::world::pix_to_world;
pub use crate::frames::{to_polar_coords, to_rover_coords};
pub use crate::perception::color::{ground_mask, obstacle_mask, rock_mask};
pub use crate::perception::rectify::{Homography, Interpolation, PerspectiveRectifier};

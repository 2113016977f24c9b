// sojourner_core/src/types.rs

use serde::{Deserialize, Serialize};

/// The rover's pose in the world frame, supplied from outside the core.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RoverPose {
    /// World x position. Units: map cells.
    pub x: f64,
    /// World y position. Units: map cells.
    pub y: f64,
    /// Heading, counter-clockwise from the world x axis. Units: degrees, 0-360.
    pub yaw_deg: f64,
}

impl RoverPose {
    pub const fn new(x: f64, y: f64, yaw_deg: f64) -> Self {
        Self { x, y, yaw_deg }
    }
}

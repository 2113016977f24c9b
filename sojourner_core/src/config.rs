// sojourner_core/src/config.rs

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::perception::color::ChannelOrder;
use crate::perception::rectify::Interpolation;

// =========================================================================
// == Top-Level Configuration ==
// =========================================================================

/// # PerceptionConfig
/// Every tunable of the perception pipeline. All sections are optional in a
/// config file; missing ones fall back to the calibrated defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)] // Fail if the TOML has fields not in our struct
pub struct PerceptionConfig {
    #[serde(default)]
    pub frame: FrameConfig,

    #[serde(default)]
    pub color: ColorConfig,

    #[serde(default)]
    pub rock: RockConfig,

    #[serde(default)]
    pub calibration: CalibrationConfig,

    #[serde(default)]
    pub map: MapConfig,
}

impl PerceptionConfig {
    /// Checks the scalar tunables. Calibration geometry is checked separately
    /// when the homography is solved.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.frame.width == 0 || self.frame.height == 0 {
            return Err(invalid(
                "frame",
                format!("{}x{} is empty", self.frame.width, self.frame.height),
            ));
        }
        if !(self.map.scale.is_finite() && self.map.scale > 0.0) {
            return Err(invalid("map.scale", format!("{} must be > 0", self.map.scale)));
        }
        if self.map.dimension == 0 {
            return Err(invalid("map.dimension", "must be > 0".to_string()));
        }
        if !(self.map.observation_weight.is_finite() && self.map.observation_weight > 0.0) {
            return Err(invalid(
                "map.observation_weight",
                format!("{} must be > 0", self.map.observation_weight),
            ));
        }
        let half_size = self.calibration.destination_half_size;
        if !(half_size.is_finite() && half_size > 0.0) {
            return Err(invalid(
                "calibration.destination_half_size",
                format!("{} must be > 0", self.calibration.destination_half_size),
            ));
        }
        for (i, (lo, hi)) in self
            .rock
            .hsv_lower
            .iter()
            .zip(self.rock.hsv_upper.iter())
            .enumerate()
        {
            if lo > hi {
                return Err(invalid(
                    "rock.hsv_lower",
                    format!("channel {i}: lower bound {lo} exceeds upper bound {hi}"),
                ));
            }
        }
        Ok(())
    }
}

fn invalid(name: &'static str, reason: String) -> ConfigurationError {
    ConfigurationError::InvalidParameter { name, reason }
}

// =========================================================================
// == Configuration Sub-Structs ==
// =========================================================================

/// Camera frame geometry the calibration was measured on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct FrameConfig {
    /// Units: pixels.
    pub width: usize,
    /// Units: pixels.
    pub height: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 160,
        }
    }
}

/// Ground/obstacle thresholding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColorConfig {
    /// A pixel is ground when every channel is strictly above its threshold.
    #[serde(default = "default_rgb_threshold")]
    pub rgb_threshold: [u8; 3],
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            rgb_threshold: default_rgb_threshold(),
        }
    }
}

fn default_rgb_threshold() -> [u8; 3] {
    [160, 160, 160]
}

/// Sample-rock detection in HSV space (hue in half-degrees, S and V 0-255).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RockConfig {
    /// Inclusive lower bound `[h, s, v]`.
    #[serde(default = "default_hsv_lower")]
    pub hsv_lower: [u8; 3],
    /// Inclusive upper bound `[h, s, v]`.
    #[serde(default = "default_hsv_upper")]
    pub hsv_upper: [u8; 3],
    /// How the frame's bytes are read when converting to HSV. The default
    /// bounds were tuned with `Bgr`.
    #[serde(default)]
    pub channel_order: ChannelOrder,
}

impl Default for RockConfig {
    fn default() -> Self {
        Self {
            hsv_lower: default_hsv_lower(),
            hsv_upper: default_hsv_upper(),
            channel_order: ChannelOrder::default(),
        }
    }
}

fn default_hsv_lower() -> [u8; 3] {
    [50, 160, 80]
}

fn default_hsv_upper() -> [u8; 3] {
    [110, 255, 250]
}

/// Camera-to-bird's-eye calibration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CalibrationConfig {
    /// Camera-frame trapezoid `[col, row]`, ordered bottom-left, bottom-right,
    /// top-right, top-left.
    #[serde(default = "default_source_points")]
    pub source: [[f64; 2]; 4],

    /// Half the side of the destination square.
    ///
    /// Units: bird's-eye pixels. One grid square of the calibration image
    /// spans `2 * destination_half_size` pixels.
    #[serde(default = "default_destination_half_size")]
    pub destination_half_size: f64,

    /// Distance from the bottom of the frame to the near edge of the
    /// destination square, accounting for the ground the camera cannot see.
    ///
    /// Units: bird's-eye pixels.
    #[serde(default = "default_bottom_offset")]
    pub bottom_offset: f64,

    /// Resampling used on the colour frame before rock detection. Masks are
    /// always resampled nearest-neighbour.
    #[serde(default)]
    pub interpolation: Interpolation,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            source: default_source_points(),
            destination_half_size: default_destination_half_size(),
            bottom_offset: default_bottom_offset(),
            interpolation: Interpolation::default(),
        }
    }
}

impl CalibrationConfig {
    /// The bird's-eye square matching `source`, for a frame of `frame` size.
    pub fn destination_points(&self, frame: &FrameConfig) -> [[f64; 2]; 4] {
        let cx = frame.width as f64 / 2.0;
        let h = frame.height as f64;
        let s = self.destination_half_size;
        let o = self.bottom_offset;
        [
            [cx - s, h - o],
            [cx + s, h - o],
            [cx + s, h - 2.0 * s - o],
            [cx - s, h - 2.0 * s - o],
        ]
    }
}

fn default_source_points() -> [[f64; 2]; 4] {
    [[14.0, 140.0], [301.0, 140.0], [200.0, 96.0], [118.0, 96.0]]
}

fn default_destination_half_size() -> f64 {
    5.0
}

fn default_bottom_offset() -> f64 {
    6.0
}

/// World map geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapConfig {
    /// Side length of the square world map.
    ///
    /// Units: cells.
    #[serde(default = "default_map_dimension")]
    pub dimension: usize,

    /// Bird's-eye pixels per world cell.
    #[serde(default = "default_scale")]
    pub scale: f64,

    /// Amount added to a channel each frame a cell is observed.
    #[serde(default = "default_observation_weight")]
    pub observation_weight: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            dimension: default_map_dimension(),
            scale: default_scale(),
            observation_weight: default_observation_weight(),
        }
    }
}

fn default_map_dimension() -> usize {
    200
}

fn default_scale() -> f64 {
    10.0
}

fn default_observation_weight() -> f64 {
    255.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(PerceptionConfig::default().validate(), Ok(()));
    }

    #[test]
    fn destination_square_is_centered_above_bottom_margin() {
        let cfg = CalibrationConfig::default();
        let dst = cfg.destination_points(&FrameConfig::default());
        assert_eq!(dst[0], [155.0, 154.0]);
        assert_eq!(dst[1], [165.0, 154.0]);
        assert_eq!(dst[2], [165.0, 144.0]);
        assert_eq!(dst[3], [155.0, 144.0]);
    }

    #[test]
    fn rejects_non_positive_scale() {
        let mut cfg = PerceptionConfig::default();
        cfg.map.scale = 0.0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigurationError::InvalidParameter { name: "map.scale", .. })
        ));
    }

    #[test]
    fn rejects_nan_destination_half_size() {
        let mut cfg = PerceptionConfig::default();
        cfg.calibration.destination_half_size = f64::NAN;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigurationError::InvalidParameter {
                name: "calibration.destination_half_size",
                ..
            })
        ));
    }

    #[test]
    fn rejects_inverted_hsv_bounds() {
        let mut cfg = PerceptionConfig::default();
        cfg.rock.hsv_lower[1] = 250;
        cfg.rock.hsv_upper[1] = 100;
        assert!(cfg.validate().is_err());
    }
}

// sojourner_core/src/perception/color.rs

use serde::{Deserialize, Serialize};

use crate::config::{ColorConfig, RockConfig};
use crate::image::{Mask, Rgb, RgbImage};
use crate::perception::PixelClassifier;

/// How the three bytes of a frame are interpreted when converting to HSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ChannelOrder {
    /// Byte 0 is red.
    Rgb,
    /// Byte 0 is blue. The calibrated sample-rock bounds assume this order.
    #[default]
    Bgr,
}

/// An 8-bit HSV sample: hue in half-degrees `[0, 180)`, saturation and value
/// in `[0, 255]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl Hsv {
    pub fn from_pixel(pixel: Rgb, order: ChannelOrder) -> Self {
        let [c0, c1, c2] = pixel.0;
        let (r, g, b) = match order {
            ChannelOrder::Rgb => (c0, c1, c2),
            ChannelOrder::Bgr => (c2, c1, c0),
        };
        let (r, g, b) = (r as f64, g as f64, b as f64);

        let v = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = v - min;

        let s = if v > 0.0 { 255.0 * delta / v } else { 0.0 };

        let h_deg = if delta <= 0.0 {
            0.0
        } else if v == r {
            60.0 * (g - b) / delta
        } else if v == g {
            120.0 + 60.0 * (b - r) / delta
        } else {
            240.0 + 60.0 * (r - g) / delta
        };
        let h_deg = if h_deg < 0.0 { h_deg + 360.0 } else { h_deg };

        Self {
            h: ((h_deg / 2.0).round() as u32 % 180) as u8,
            s: s.round() as u8,
            v: v as u8,
        }
    }

    /// Inclusive range check on all three components.
    pub fn within(&self, lower: [u8; 3], upper: [u8; 3]) -> bool {
        let c = [self.h, self.s, self.v];
        c.iter()
            .zip(lower.iter().zip(upper.iter()))
            .all(|(v, (lo, hi))| lo <= v && v <= hi)
    }
}

// =========================================================================
// == Classifiers ==
// =========================================================================

/// Navigable ground: every channel strictly above its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbThreshold {
    pub threshold: [u8; 3],
}

impl PixelClassifier for RgbThreshold {
    #[inline]
    fn matches(&self, pixel: Rgb) -> bool {
        pixel
            .0
            .iter()
            .zip(self.threshold.iter())
            .all(|(p, t)| p > t)
    }
}

/// Membership in the complement of another classifier's class.
#[derive(Debug, Clone)]
pub struct Complement<C>(pub C);

impl<C: PixelClassifier + Clone> PixelClassifier for Complement<C> {
    #[inline]
    fn matches(&self, pixel: Rgb) -> bool {
        !self.0.matches(pixel)
    }
}

/// Sample rocks: an inclusive box in HSV space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
    pub channel_order: ChannelOrder,
}

impl From<&RockConfig> for HsvRange {
    fn from(cfg: &RockConfig) -> Self {
        Self {
            lower: cfg.hsv_lower,
            upper: cfg.hsv_upper,
            channel_order: cfg.channel_order,
        }
    }
}

impl PixelClassifier for HsvRange {
    #[inline]
    fn matches(&self, pixel: Rgb) -> bool {
        Hsv::from_pixel(pixel, self.channel_order).within(self.lower, self.upper)
    }
}

// =========================================================================
// == Convenience Functions ==
// =========================================================================

/// 1 where all channels exceed `cfg.rgb_threshold`.
pub fn ground_mask(image: &RgbImage, cfg: &ColorConfig) -> Mask {
    RgbThreshold {
        threshold: cfg.rgb_threshold,
    }
    .classify(image)
}

/// 1 where the ground predicate fails. Unclassified terrain is obstacle.
pub fn obstacle_mask(image: &RgbImage, cfg: &ColorConfig) -> Mask {
    Complement(RgbThreshold {
        threshold: cfg.rgb_threshold,
    })
    .classify(image)
}

/// 1 where the pixel's HSV lies inside the rock bounds. Expects the
/// rectified colour frame.
pub fn rock_mask(image: &RgbImage, cfg: &RockConfig) -> Mask {
    HsvRange::from(cfg).classify(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Image;

    fn checkerboard() -> RgbImage {
        Image::from_fn(8, 6, |c, r| {
            let v = ((c * 37 + r * 91) % 256) as u8;
            Rgb::new(v, v.wrapping_add(40), v.wrapping_mul(3))
        })
    }

    #[test]
    fn obstacle_is_complement_of_ground() {
        let img = checkerboard();
        let cfg = ColorConfig::default();
        let ground = ground_mask(&img, &cfg);
        let obstacle = obstacle_mask(&img, &cfg);
        for ((_, _, g), (_, _, o)) in ground.enumerate_pixels().zip(obstacle.enumerate_pixels()) {
            assert_eq!(o, 1 - g);
        }
    }

    #[test]
    fn threshold_is_strict() {
        let cfg = ColorConfig::default();
        let at = Image::filled(2, 2, Rgb::new(160, 160, 160));
        let above = Image::filled(2, 2, Rgb::new(161, 161, 161));
        assert_eq!(ground_mask(&at, &cfg).count_nonzero(), 0);
        assert_eq!(ground_mask(&above, &cfg).count_nonzero(), 4);
    }

    #[test]
    fn dark_frame_defaults_to_obstacle() {
        let cfg = ColorConfig::default();
        let img = Image::filled(4, 3, Rgb::new(10, 200, 255));
        assert_eq!(ground_mask(&img, &cfg).count_nonzero(), 0);
        assert_eq!(obstacle_mask(&img, &cfg).count_nonzero(), 12);
    }

    #[test]
    fn hsv_of_primaries() {
        let red = Hsv::from_pixel(Rgb::new(255, 0, 0), ChannelOrder::Rgb);
        assert_eq!(red, Hsv { h: 0, s: 255, v: 255 });

        let green = Hsv::from_pixel(Rgb::new(0, 255, 0), ChannelOrder::Rgb);
        assert_eq!(green.h, 60);

        let blue = Hsv::from_pixel(Rgb::new(0, 0, 255), ChannelOrder::Rgb);
        assert_eq!(blue.h, 120);

        // Same bytes, read blue-first.
        let swapped = Hsv::from_pixel(Rgb::new(0, 0, 255), ChannelOrder::Bgr);
        assert_eq!(swapped.h, 0);

        let grey = Hsv::from_pixel(Rgb::new(90, 90, 90), ChannelOrder::Rgb);
        assert_eq!(grey, Hsv { h: 0, s: 0, v: 90 });
    }

    #[test]
    fn golden_sample_rock_is_detected() {
        let cfg = RockConfig::default();
        let rock = Image::filled(3, 3, Rgb::new(200, 170, 30));
        let sand = Image::filled(3, 3, Rgb::new(200, 180, 160));
        assert_eq!(rock_mask(&rock, &cfg).count_nonzero(), 9);
        assert_eq!(rock_mask(&sand, &cfg).count_nonzero(), 0);
    }

    #[test]
    fn boxed_classifiers_clone() {
        let c: Box<dyn PixelClassifier> = Box::new(Complement(RgbThreshold {
            threshold: [0, 0, 0],
        }));
        let d = c.clone();
        assert!(d.matches(Rgb::BLACK));
        assert!(!d.matches(Rgb::new(1, 1, 1)));
    }
}

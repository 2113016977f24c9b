// sojourner_core/src/perception/rectify.rs

use nalgebra::{Matrix3, Point2, SMatrix, SVector};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::PerceptionConfig;
use crate::error::{ConfigurationError, PerceptionError, QuadKind, Result};
use crate::image::{Image, Mask, Pixel, RgbImage};

/// Relative tolerance for the collinearity test on calibration points.
const COLLINEAR_EPSILON: f64 = 1e-9;

/// Resampling policy used when warping an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Interpolation {
    /// Takes the closest source pixel. Keeps binary masks binary.
    Nearest,
    /// Weighted average of the four surrounding source pixels.
    #[default]
    Bilinear,
}

// =========================================================================
// == Homography ==
// =========================================================================

/// A projective transform of the plane, stored together with its inverse.
#[derive(Debug, Clone, PartialEq)]
pub struct Homography {
    matrix: Matrix3<f64>,
    inverse: Matrix3<f64>,
}

impl Homography {
    /// Solves the unique homography taking each `source[i]` onto
    /// `destination[i]`.
    ///
    /// Uses the direct linear transform with `h33 = 1`: each correspondence
    /// contributes two rows to an 8x8 system.
    ///
    /// # Errors
    /// `CollinearPoints` if any three points of either quadrilateral lie on a
    /// line, `SingularHomography` if the system or the result cannot be
    /// inverted.
    pub fn from_correspondences(
        source: &[[f64; 2]; 4],
        destination: &[[f64; 2]; 4],
    ) -> std::result::Result<Self, ConfigurationError> {
        check_quad(source, QuadKind::Source)?;
        check_quad(destination, QuadKind::Destination)?;

        let mut a = SMatrix::<f64, 8, 8>::zeros();
        let mut b = SVector::<f64, 8>::zeros();

        for (i, (s, d)) in source.iter().zip(destination.iter()).enumerate() {
            let (x, y) = (s[0], s[1]);
            let (u, v) = (d[0], d[1]);
            let r = 2 * i;

            a[(r, 0)] = x;
            a[(r, 1)] = y;
            a[(r, 2)] = 1.0;
            a[(r, 6)] = -u * x;
            a[(r, 7)] = -u * y;
            b[r] = u;

            a[(r + 1, 3)] = x;
            a[(r + 1, 4)] = y;
            a[(r + 1, 5)] = 1.0;
            a[(r + 1, 6)] = -v * x;
            a[(r + 1, 7)] = -v * y;
            b[r + 1] = v;
        }

        let h = a
            .lu()
            .solve(&b)
            .ok_or(ConfigurationError::SingularHomography)?;

        let matrix = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0);
        Self::from_matrix(matrix)
    }

    /// Wraps an explicit 3x3 matrix.
    pub fn from_matrix(matrix: Matrix3<f64>) -> std::result::Result<Self, ConfigurationError> {
        if !matrix.iter().all(|v| v.is_finite()) {
            return Err(ConfigurationError::SingularHomography);
        }
        let inverse = matrix
            .try_inverse()
            .ok_or(ConfigurationError::SingularHomography)?;
        Ok(Self { matrix, inverse })
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    /// Maps a point forward. `None` if it lands on the line at infinity.
    pub fn apply(&self, point: Point2<f64>) -> Option<Point2<f64>> {
        Point2::from_homogeneous(self.matrix * point.to_homogeneous())
    }

    /// Maps a point backward through the inverse transform.
    pub fn apply_inverse(&self, point: Point2<f64>) -> Option<Point2<f64>> {
        Point2::from_homogeneous(self.inverse * point.to_homogeneous())
    }

    /// Resamples `image` through the inverse transform into an output of the
    /// same size. Output pixels whose pre-image falls outside `image` are
    /// left at `P::default()`.
    pub fn warp<P: Pixel>(&self, image: &Image<P>, interpolation: Interpolation) -> Image<P> {
        let (w, h) = image.dimensions();
        Image::from_fn(w, h, |col, row| {
            match self.apply_inverse(Point2::new(col as f64, row as f64)) {
                Some(src) => match interpolation {
                    Interpolation::Nearest => sample_nearest(image, src.x, src.y),
                    Interpolation::Bilinear => sample_bilinear(image, src.x, src.y),
                },
                None => P::default(),
            }
        })
    }
}

/// Rejects quads with three (near-)collinear or coincident points.
fn check_quad(
    points: &[[f64; 2]; 4],
    quad: QuadKind,
) -> std::result::Result<(), ConfigurationError> {
    const TRIPLES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];

    for indices in TRIPLES {
        let [a, b, c] = indices.map(|i| Point2::new(points[i][0], points[i][1]));
        let ab = b - a;
        let ac = c - a;
        let cross = ab.perp(&ac);
        if !cross.is_finite() || cross.abs() <= COLLINEAR_EPSILON * ab.norm() * ac.norm() {
            return Err(ConfigurationError::CollinearPoints { quad, indices });
        }
    }
    Ok(())
}

fn pixel_or_default<P: Pixel>(image: &Image<P>, x: i64, y: i64) -> P {
    if x < 0 || y < 0 {
        return P::default();
    }
    image.get(x as usize, y as usize).unwrap_or_default()
}

fn sample_nearest<P: Pixel>(image: &Image<P>, x: f64, y: f64) -> P {
    if !(x.is_finite() && y.is_finite()) {
        return P::default();
    }
    pixel_or_default(image, x.round() as i64, y.round() as i64)
}

fn sample_bilinear<P: Pixel>(image: &Image<P>, x: f64, y: f64) -> P {
    if !(x.is_finite() && y.is_finite()) {
        return P::default();
    }
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    // Entirely outside, including the one-pixel fringe.
    if x0 < -1 || y0 < -1 || x0 >= image.width() as i64 || y0 >= image.height() as i64 {
        return P::default();
    }

    P::blend(&[
        (pixel_or_default(image, x0, y0), (1.0 - fx) * (1.0 - fy)),
        (pixel_or_default(image, x0 + 1, y0), fx * (1.0 - fy)),
        (pixel_or_default(image, x0, y0 + 1), (1.0 - fx) * fy),
        (pixel_or_default(image, x0 + 1, y0 + 1), fx * fy),
    ])
}

// =========================================================================
// == Perspective Rectifier ==
// =========================================================================

/// The calibrated camera-to-bird's-eye transform for one frame geometry.
#[derive(Debug, Clone)]
pub struct PerspectiveRectifier {
    homography: Homography,
    width: usize,
    height: usize,
    color_interpolation: Interpolation,
}

impl PerspectiveRectifier {
    /// Solves the homography from the calibration section of `config`.
    pub fn new(config: &PerceptionConfig) -> std::result::Result<Self, ConfigurationError> {
        let destination = config.calibration.destination_points(&config.frame);
        let homography =
            Homography::from_correspondences(&config.calibration.source, &destination)?;
        debug!(matrix = ?homography.matrix(), "solved calibration homography");

        Ok(Self {
            homography,
            width: config.frame.width,
            height: config.frame.height,
            color_interpolation: config.calibration.interpolation,
        })
    }

    pub fn homography(&self) -> &Homography {
        &self.homography
    }

    /// `(width, height)` this rectifier was calibrated for.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Fails with `ShapeMismatch` unless `image` has the calibrated size.
    pub fn check_shape<P: Pixel>(&self, image: &Image<P>) -> Result<()> {
        if image.dimensions() != self.dimensions() {
            return Err(PerceptionError::ShapeMismatch {
                expected: self.dimensions(),
                actual: image.dimensions(),
            });
        }
        Ok(())
    }

    pub fn rectify<P: Pixel>(&self, image: &Image<P>, interpolation: Interpolation) -> Result<Image<P>> {
        self.check_shape(image)?;
        Ok(self.homography.warp(image, interpolation))
    }

    /// Warps a binary mask. Always nearest-neighbour.
    pub fn rectify_mask(&self, mask: &Mask) -> Result<Mask> {
        self.rectify(mask, Interpolation::Nearest)
    }

    /// Warps a colour frame with the configured interpolation.
    pub fn rectify_color(&self, image: &RgbImage) -> Result<RgbImage> {
        self.rectify(image, self.color_interpolation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Rgb;
    use approx::assert_abs_diff_eq;

    const EPSILON: f64 = 1e-6;

    fn default_rectifier() -> PerspectiveRectifier {
        PerspectiveRectifier::new(&PerceptionConfig::default()).expect("default calibration")
    }

    #[test]
    fn homography_maps_source_onto_destination() {
        let cfg = PerceptionConfig::default();
        let dst = cfg.calibration.destination_points(&cfg.frame);
        let h = Homography::from_correspondences(&cfg.calibration.source, &dst).unwrap();

        for (s, d) in cfg.calibration.source.iter().zip(dst.iter()) {
            let p = h.apply(Point2::new(s[0], s[1])).unwrap();
            assert_abs_diff_eq!(p.x, d[0], epsilon = EPSILON);
            assert_abs_diff_eq!(p.y, d[1], epsilon = EPSILON);

            let back = h.apply_inverse(p).unwrap();
            assert_abs_diff_eq!(back.x, s[0], epsilon = EPSILON);
            assert_abs_diff_eq!(back.y, s[1], epsilon = EPSILON);
        }
    }

    #[test]
    fn collinear_source_is_rejected() {
        let src = [[0.0, 0.0], [10.0, 0.0], [20.0, 0.0], [5.0, 5.0]];
        let dst = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        assert_eq!(
            Homography::from_correspondences(&src, &dst),
            Err(ConfigurationError::CollinearPoints {
                quad: QuadKind::Source,
                indices: [0, 1, 2]
            })
        );
    }

    #[test]
    fn coincident_destination_is_rejected() {
        let src = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        let dst = [[3.0, 3.0], [3.0, 3.0], [1.0, 1.0], [0.0, 1.0]];
        assert!(matches!(
            Homography::from_correspondences(&src, &dst),
            Err(ConfigurationError::CollinearPoints {
                quad: QuadKind::Destination,
                ..
            })
        ));
    }

    #[test]
    fn singular_matrix_is_rejected() {
        assert_eq!(
            Homography::from_matrix(Matrix3::zeros()),
            Err(ConfigurationError::SingularHomography)
        );
    }

    #[test]
    fn zero_mask_stays_zero() {
        let rect = default_rectifier();
        let mask = Mask::new(320, 160);
        let out = rect.rectify_mask(&mask).unwrap();
        assert_eq!(out.dimensions(), (320, 160));
        assert_eq!(out.count_nonzero(), 0);
    }

    #[test]
    fn nearest_keeps_masks_binary() {
        let rect = default_rectifier();
        let mask = Mask::from_fn(320, 160, |c, r| ((c / 7 + r / 3) % 2) as u8);
        let out = rect.rectify_mask(&mask).unwrap();
        assert!(out.as_slice().iter().all(|&v| v <= 1));
        assert!(out.count_nonzero() > 0);
    }

    #[test]
    fn identity_warp_preserves_image() {
        let square = [[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]];
        let h = Homography::from_correspondences(&square, &square).unwrap();
        let img = Image::from_fn(5, 4, |c, r| Rgb::new(c as u8 * 10, r as u8 * 20, 7));
        assert_eq!(h.warp(&img, Interpolation::Nearest), img);
        assert_eq!(h.warp(&img, Interpolation::Bilinear), img);
    }

    #[test]
    fn bilinear_averages_neighbours() {
        let img = Image::<u8>::from_vec(2, 1, vec![0, 100]).unwrap();
        assert_eq!(sample_bilinear(&img, 0.5, 0.0), 50);
        assert_eq!(sample_nearest(&img, 0.6, 0.0), 100);
        assert_eq!(sample_nearest(&img, -3.0, 0.0), 0);
    }

    #[test]
    fn wrong_frame_size_is_a_shape_mismatch() {
        let rect = default_rectifier();
        let mask = Mask::new(100, 50);
        assert_eq!(
            rect.rectify_mask(&mask),
            Err(PerceptionError::ShapeMismatch {
                expected: (320, 160),
                actual: (100, 50)
            })
        );
    }
}

// sojourner_sim/src/simulation/camera.rs

use nalgebra::Point2;
use rand_distr::{Distribution, Normal};
use sojourner_core::config::PerceptionConfig;
use sojourner_core::error::PerceptionError;
use sojourner_core::frames::world::{rotate, translate};
use sojourner_core::image::{Rgb, RgbImage};
use sojourner_core::perception::rectify::{Homography, PerspectiveRectifier};
use sojourner_core::types::RoverPose;

use crate::error::{Result, SimError};
use crate::simulation::config::CameraConfig;
use crate::simulation::prng::SimulationRng;
use crate::simulation::terrain::{Surface, Terrain};

pub const SAND: Rgb = Rgb([210, 190, 170]);
pub const BOULDER: Rgb = Rgb([90, 75, 60]);
pub const SAMPLE_ROCK: Rgb = Rgb([200, 170, 30]);
pub const SKY: Rgb = Rgb([40, 35, 30]);

/// A forward-facing camera that sees the world through the same ground-plane
/// homography the perception pipeline is calibrated with.
///
/// Rendering runs the rectification forwards: each camera pixel is projected
/// onto the bird's-eye plane, converted to rover then world coordinates, and
/// coloured by the terrain surface found there.
#[derive(Debug, Clone)]
pub struct CameraModel {
    homography: Homography,
    /// Sign of the homogeneous scale for points on the ground plane. Pixels
    /// with the opposite sign lie above the horizon.
    ground_sign: f64,
    width: usize,
    height: usize,
    scale: f64,
    noise: Option<Normal<f64>>,
}

impl CameraModel {
    pub fn new(perception: &PerceptionConfig, camera: &CameraConfig) -> Result<Self> {
        let rectifier = PerspectiveRectifier::new(perception).map_err(PerceptionError::from)?;
        let homography = rectifier.homography().clone();

        let [sx, sy] = perception.calibration.source[0];
        let ground_sign = (homography.matrix() * Point2::new(sx, sy).to_homogeneous())
            .z
            .signum();

        let noise = if camera.noise_stddev > 0.0 {
            let dist = Normal::new(0.0, camera.noise_stddev)
                .map_err(|e| SimError::Invalid(format!("camera.noise_stddev: {e}")))?;
            Some(dist)
        } else {
            None
        };

        let (width, height) = rectifier.dimensions();
        Ok(Self {
            homography,
            ground_sign,
            width,
            height,
            scale: perception.map.scale,
            noise,
        })
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Bird's-eye position of a camera pixel, or `None` above the horizon.
    pub fn ground_point(&self, col: usize, row: usize) -> Option<Point2<f64>> {
        let q = self.homography.matrix() * Point2::new(col as f64, row as f64).to_homogeneous();
        if q.z * self.ground_sign <= 0.0 {
            return None;
        }
        Some(Point2::new(q.x / q.z, q.y / q.z))
    }

    /// World position seen by a camera pixel from `pose`.
    pub fn world_point(&self, col: usize, row: usize, pose: &RoverPose) -> Option<Point2<f64>> {
        let bird = self.ground_point(col, row)?;
        let x_rover = self.height as f64 - bird.y;
        let y_rover = self.width as f64 / 2.0 - bird.x;
        let (x_rot, y_rot) = rotate(x_rover, y_rover, pose.yaw_deg);
        let (x, y) = translate(x_rot, y_rot, pose.x, pose.y, self.scale);
        Some(Point2::new(x, y))
    }

    /// Synthesizes the frame seen from `pose`.
    pub fn render(&self, terrain: &Terrain, pose: &RoverPose, rng: &mut SimulationRng) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |col, row| {
            let base = match self.world_point(col, row, pose) {
                None => SKY,
                Some(p) => match terrain.surface_at(p.x, p.y) {
                    Surface::Navigable => SAND,
                    Surface::Obstacle => BOULDER,
                    Surface::Rock => SAMPLE_ROCK,
                },
            };
            match &self.noise {
                Some(dist) => {
                    let mut noisy = |v: u8| {
                        (v as f64 + dist.sample(&mut rng.0)).round().clamp(0.0, 255.0) as u8
                    };
                    Rgb([noisy(base.r()), noisy(base.g()), noisy(base.b())])
                }
                None => base,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn camera() -> CameraModel {
        CameraModel::new(
            &PerceptionConfig::default(),
            &CameraConfig { noise_stddev: 0.0 },
        )
        .unwrap()
    }

    #[test]
    fn calibration_points_land_on_their_destinations() {
        let cfg = PerceptionConfig::default();
        let cam = camera();
        let dst = cfg.calibration.destination_points(&cfg.frame);
        for (s, d) in cfg.calibration.source.iter().zip(dst.iter()) {
            let p = cam.ground_point(s[0] as usize, s[1] as usize).unwrap();
            assert_abs_diff_eq!(p.x, d[0], epsilon = 1e-6);
            assert_abs_diff_eq!(p.y, d[1], epsilon = 1e-6);
        }
    }

    #[test]
    fn top_of_frame_is_sky_and_bottom_is_ground() {
        let cam = camera();
        assert!(cam.ground_point(0, 0).is_none());
        assert!(cam.ground_point(160, 40).is_none());
        assert!(cam.ground_point(160, 159).is_some());
    }

    #[test]
    fn bottom_centre_pixel_looks_just_ahead_of_the_rover() {
        let cam = camera();
        let p = cam
            .world_point(160, 159, &RoverPose::new(50.0, 50.0, 0.0))
            .unwrap();
        assert!(p.x > 50.0 && p.x < 52.0, "x = {}", p.x);
        assert_abs_diff_eq!(p.y, 50.0, epsilon = 0.1);

        // Turning left by 90 degrees moves the same view onto the +y axis.
        let q = cam
            .world_point(160, 159, &RoverPose::new(50.0, 50.0, 90.0))
            .unwrap();
        assert_abs_diff_eq!(q.x, 50.0, epsilon = 0.1);
        assert!(q.y > 50.0 && q.y < 52.0, "y = {}", q.y);
    }

    #[test]
    fn render_on_open_ground_shows_sand_below_the_horizon() {
        let cam = camera();
        let terrain = Terrain::open(200, 3);
        let mut rng = SimulationRng::new(Some(0));
        let image = cam.render(&terrain, &RoverPose::new(100.0, 100.0, 0.0), &mut rng);

        assert_eq!(image.dimensions(), (320, 160));
        assert_eq!(image.at(160, 150), SAND);
        assert_eq!(image.at(10, 155), SAND);
        assert_eq!(image.at(160, 10), SKY);
    }

    #[test]
    fn map_edge_renders_as_boulder() {
        let cam = camera();
        let terrain = Terrain::open(200, 3);
        let mut rng = SimulationRng::new(Some(0));
        // Two cells from the border, facing it.
        let image = cam.render(&terrain, &RoverPose::new(5.0, 100.0, 180.0), &mut rng);
        assert_eq!(image.at(160, 159), SAND);
        assert!(image.as_slice().iter().any(|px| *px == BOULDER));
    }

    #[test]
    fn noise_is_seeded() {
        let cam = CameraModel::new(
            &PerceptionConfig::default(),
            &CameraConfig { noise_stddev: 3.0 },
        )
        .unwrap();
        let terrain = Terrain::open(200, 3);
        let pose = RoverPose::new(100.0, 100.0, 0.0);
        let a = cam.render(&terrain, &pose, &mut SimulationRng::new(Some(4)));
        let b = cam.render(&terrain, &pose, &mut SimulationRng::new(Some(4)));
        assert_eq!(a, b);
        assert!(a.as_slice().iter().any(|px| *px != SAND && *px != SKY));
    }
}

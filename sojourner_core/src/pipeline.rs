// sojourner_core/src/pipeline.rs

use tracing::{debug, info, warn};

use crate::config::PerceptionConfig;
use crate::error::{PerceptionError, Result};
use crate::frames::to_rover_coords;
use crate::frames::world::pix_to_world;
use crate::image::{Mask, Rgb, RgbImage};
use crate::mapping::{ClassifiedCells, WorldMap};
use crate::messages::{ClassCounts, FrameInput, FrameReport, PerceptionOutput, RoverState};
use crate::perception::color::{Complement, HsvRange, RgbThreshold};
use crate::perception::rectify::PerspectiveRectifier;
use crate::perception::PixelClassifier;

/// Turns camera frames into world-map evidence and a steering observation.
///
/// Built once per mission; construction validates the configuration and
/// solves the calibration homography, so a pipeline that exists can process
/// any correctly sized frame. The pipeline holds no per-frame state.
#[derive(Debug, Clone)]
pub struct PerceptionPipeline {
    config: PerceptionConfig,
    rectifier: PerspectiveRectifier,
    ground: Box<dyn PixelClassifier>,
    obstacle: Box<dyn PixelClassifier>,
    rock: Box<dyn PixelClassifier>,
}

impl PerceptionPipeline {
    /// # Errors
    /// `PerceptionError::Configuration` for invalid tunables or degenerate
    /// calibration geometry.
    pub fn new(config: PerceptionConfig) -> Result<Self> {
        config.validate()?;
        let rectifier = PerspectiveRectifier::new(&config)?;

        let threshold = RgbThreshold {
            threshold: config.color.rgb_threshold,
        };
        let pipeline = Self {
            ground: Box::new(threshold),
            obstacle: Box::new(Complement(threshold)),
            rock: Box::new(HsvRange::from(&config.rock)),
            rectifier,
            config,
        };

        info!(
            frame = ?pipeline.rectifier.dimensions(),
            map_dimension = pipeline.config.map.dimension,
            scale = pipeline.config.map.scale,
            "perception pipeline ready"
        );
        Ok(pipeline)
    }

    /// Replaces the colour rules. The rock classifier is applied to the
    /// rectified colour frame; the other two to the raw frame.
    pub fn with_classifiers(
        mut self,
        ground: Box<dyn PixelClassifier>,
        obstacle: Box<dyn PixelClassifier>,
        rock: Box<dyn PixelClassifier>,
    ) -> Self {
        self.ground = ground;
        self.obstacle = obstacle;
        self.rock = rock;
        self
    }

    pub fn config(&self) -> &PerceptionConfig {
        &self.config
    }

    pub fn rectifier(&self) -> &PerspectiveRectifier {
        &self.rectifier
    }

    /// Processes one frame and folds its evidence into `map`.
    ///
    /// Ground and obstacle are thresholded on the raw frame and the masks
    /// rectified; rock is thresholded on the rectified colour frame. The map
    /// is only touched once every fallible step has succeeded, so an error
    /// leaves it unchanged.
    ///
    /// # Errors
    /// `PerceptionError::ShapeMismatch` if the frame does not have the
    /// calibrated dimensions or the map is not the configured size.
    pub fn process(&self, frame: &FrameInput<'_>, map: &mut WorldMap) -> Result<PerceptionOutput> {
        if let Err(e) = self
            .rectifier
            .check_shape(frame.image)
            .and_then(|()| self.check_map(map))
        {
            warn!(error = %e, "skipping frame");
            return Err(e);
        }

        let ground = self
            .rectifier
            .rectify_mask(&self.ground.classify(frame.image))?;
        let obstacle = self
            .rectifier
            .rectify_mask(&self.obstacle.classify(frame.image))?;
        let warped = self.rectifier.rectify_color(frame.image)?;
        let rock = self.rock.classify(&warped);

        let vision_image = compose_vision_image(&obstacle, &rock, &ground);

        let nav_points = to_rover_coords(&ground);
        let obs_points = to_rover_coords(&obstacle);
        let rock_points = to_rover_coords(&rock);

        let dimension = map.dimension();
        let scale = self.config.map.scale;
        let nav_cells = pix_to_world(&nav_points, &frame.pose, dimension, scale);
        let obs_cells = pix_to_world(&obs_points, &frame.pose, dimension, scale);
        let rock_cells = pix_to_world(&rock_points, &frame.pose, dimension, scale);

        let accumulation = map.accumulate(
            &ClassifiedCells {
                obstacle: &obs_cells,
                rock: &rock_cells,
                navigable: &nav_cells,
            },
            self.config.map.observation_weight,
        );

        let report = FrameReport {
            pixels: ClassCounts {
                obstacle: obs_points.len(),
                rock: rock_points.len(),
                navigable: nav_points.len(),
            },
            clamped: ClassCounts {
                obstacle: obs_cells.clamped(),
                rock: rock_cells.clamped(),
                navigable: nav_cells.clamped(),
            },
            accumulation,
        };

        debug!(
            navigable = report.pixels.navigable,
            obstacle = report.pixels.obstacle,
            rock = report.pixels.rock,
            cleared = accumulation.obstacle_cleared,
            "frame classified"
        );
        if report.total_clamped() > 0 {
            warn!(
                clamped = report.total_clamped(),
                x = frame.pose.x,
                y = frame.pose.y,
                "projected points clamped onto the map border"
            );
        }

        Ok(PerceptionOutput {
            vision_image,
            navigable: nav_points.to_polar(),
            report,
        })
    }

    /// Fails with `ShapeMismatch` unless `map` has the configured side length.
    pub fn check_map(&self, map: &WorldMap) -> Result<()> {
        let expected = self.config.map.dimension;
        let actual = map.dimension();
        if actual != expected {
            return Err(PerceptionError::ShapeMismatch {
                expected: (expected, expected),
                actual: (actual, actual),
            });
        }
        Ok(())
    }

    /// Runs [`process`](Self::process) against a rover state snapshot,
    /// writing the map, visualization buffer and navigable observation back
    /// into it.
    pub fn step(&self, state: &mut RoverState) -> Result<FrameReport> {
        let frame = FrameInput {
            image: &state.image,
            pose: state.pose,
        };
        let output = self.process(&frame, &mut state.world_map)?;

        state.vision_image = output.vision_image;
        let (distances, angles) = output.navigable.into_parts();
        state.nav_distances = distances;
        state.nav_angles = angles;
        Ok(output.report)
    }
}

fn compose_vision_image(obstacle: &Mask, rock: &Mask, ground: &Mask) -> RgbImage {
    let full = |v: u8| if v != 0 { 255 } else { 0 };
    RgbImage::from_fn(ground.width(), ground.height(), |c, r| {
        Rgb::new(
            full(obstacle.at(c, r)),
            full(rock.at(c, r)),
            full(ground.at(c, r)),
        )
    })
}

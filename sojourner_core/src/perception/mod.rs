// sojourner_core/src/perception/mod.rs

pub mod color;
pub mod rectify;

use crate::image::{Mask, Rgb, RgbImage};
use dyn_clone::DynClone;
use std::fmt::Debug;

/// The contract for any per-pixel colour rule that produces a binary mask.
///
/// Implementations decide class membership for a single pixel; `classify`
/// lifts that decision over a whole frame, yielding 1 for members and 0
/// otherwise. Classifiers are pure: no state is carried between frames.
pub trait PixelClassifier: Send + Sync + DynClone + Debug {
    /// Returns `true` if `pixel` belongs to this classifier's class.
    fn matches(&self, pixel: Rgb) -> bool;

    /// Produces a mask with the same dimensions as `image`.
    fn classify(&self, image: &RgbImage) -> Mask {
        image.map(|p| self.matches(p) as u8)
    }
}

// Make the trait object cloneable.
dyn_clone::clone_trait_object!(PixelClassifier);

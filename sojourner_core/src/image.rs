// sojourner_core/src/image.rs

use serde::{Deserialize, Serialize};

// =========================================================================
// == Pixel Types ==
// =========================================================================

/// Anything that can be stored in an [`Image`].
///
/// `Default` is the "no information" value: it is what rectification writes
/// for samples that fall outside the source frame.
pub trait Pixel: Copy + Default + PartialEq + Send + Sync + 'static {
    /// Blends up to four weighted samples. Weights sum to 1 for interior
    /// samples; border samples simply contribute the default pixel.
    fn blend(samples: &[(Self, f64); 4]) -> Self;
}

impl Pixel for u8 {
    #[inline]
    fn blend(samples: &[(Self, f64); 4]) -> Self {
        let v: f64 = samples.iter().map(|(p, w)| *p as f64 * w).sum();
        v.clamp(0.0, 255.0).round() as u8
    }
}

/// A 3-channel, byte-valued colour sample. Channel order is whatever the
/// camera delivered; classifiers decide how to interpret it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const BLACK: Rgb = Rgb([0, 0, 0]);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    #[inline]
    pub fn r(&self) -> u8 {
        self.0[0]
    }

    #[inline]
    pub fn g(&self) -> u8 {
        self.0[1]
    }

    #[inline]
    pub fn b(&self) -> u8 {
        self.0[2]
    }
}

impl Pixel for Rgb {
    #[inline]
    fn blend(samples: &[(Self, f64); 4]) -> Self {
        let mut out = [0u8; 3];
        for (c, slot) in out.iter_mut().enumerate() {
            let v: f64 = samples.iter().map(|(p, w)| p.0[c] as f64 * w).sum();
            *slot = v.clamp(0.0, 255.0).round() as u8;
        }
        Rgb(out)
    }
}

// =========================================================================
// == Image Container ==
// =========================================================================

/// A row-major 2D image with runtime dimensions.
///
/// Pixel `(col, row)` lives at `data[row * width + col]`. Row 0 is the top of
/// the frame, matching the camera's scan order.
#[derive(Debug, Clone, PartialEq)]
pub struct Image<P: Pixel> {
    data: Vec<P>,
    width: usize,
    height: usize,
}

/// A single-channel binary mask. Cells hold 0 or 1.
pub type Mask = Image<u8>;

/// A full-colour camera or visualization frame.
pub type RgbImage = Image<Rgb>;

impl<P: Pixel> Image<P> {
    /// Creates an image filled with the default pixel.
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, P::default())
    }

    pub fn filled(width: usize, height: usize, value: P) -> Self {
        Self {
            data: vec![value; width * height],
            width,
            height,
        }
    }

    /// Builds an image by evaluating `f(col, row)` for every pixel.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> P) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for row in 0..height {
            for col in 0..width {
                data.push(f(col, row));
            }
        }
        Self {
            data,
            width,
            height,
        }
    }

    /// Wraps an existing row-major buffer. Returns `None` if the buffer length
    /// does not match `width * height`.
    pub fn from_vec(width: usize, height: usize, data: Vec<P>) -> Option<Self> {
        (data.len() == width * height).then_some(Self {
            data,
            width,
            height,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// `(width, height)`.
    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    #[inline]
    pub fn get(&self, col: usize, row: usize) -> Option<P> {
        (col < self.width && row < self.height).then(|| self.data[row * self.width + col])
    }

    /// Unchecked-by-contract accessor; panics on out-of-bounds like slice indexing.
    #[inline]
    pub fn at(&self, col: usize, row: usize) -> P {
        self.data[row * self.width + col]
    }

    #[inline]
    pub fn set(&mut self, col: usize, row: usize, value: P) {
        let idx = row * self.width + col;
        self.data[idx] = value;
    }

    pub fn as_slice(&self) -> &[P] {
        &self.data
    }

    /// Iterates `(col, row, pixel)` in row-major order.
    pub fn enumerate_pixels(&self) -> impl Iterator<Item = (usize, usize, P)> + '_ {
        let w = self.width;
        self.data
            .iter()
            .enumerate()
            .map(move |(i, p)| (i % w, i / w, *p))
    }

    /// Applies `f` to every pixel, producing an image of the same size.
    pub fn map<Q: Pixel>(&self, f: impl Fn(P) -> Q) -> Image<Q> {
        Image {
            data: self.data.iter().map(|p| f(*p)).collect(),
            width: self.width,
            height: self.height,
        }
    }
}

impl Image<u8> {
    /// Number of non-zero cells.
    pub fn count_nonzero(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_fn_is_row_major() {
        let img = Image::<u8>::from_fn(3, 2, |c, r| (r * 10 + c) as u8);
        assert_eq!(img.as_slice(), &[0, 1, 2, 10, 11, 12]);
        assert_eq!(img.at(2, 1), 12);
        assert_eq!(img.get(3, 0), None);
    }

    #[test]
    fn from_vec_rejects_wrong_length() {
        assert!(Image::<u8>::from_vec(2, 2, vec![0; 3]).is_none());
        assert!(Image::<u8>::from_vec(2, 2, vec![0; 4]).is_some());
    }

    #[test]
    fn enumerate_pixels_reports_col_row() {
        let img = Image::<u8>::from_fn(2, 2, |c, r| (c + 2 * r) as u8);
        let coords: Vec<_> = img.enumerate_pixels().collect();
        assert_eq!(coords, vec![(0, 0, 0), (1, 0, 1), (0, 1, 2), (1, 1, 3)]);
    }

    #[test]
    fn rgb_blend_weights_channels() {
        let s = [
            (Rgb::new(100, 0, 200), 0.5),
            (Rgb::new(200, 100, 0), 0.5),
            (Rgb::BLACK, 0.0),
            (Rgb::BLACK, 0.0),
        ];
        assert_eq!(Rgb::blend(&s), Rgb::new(150, 50, 100));
    }
}

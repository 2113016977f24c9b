// sojourner_core/src/error.rs

use thiserror::Error;

/// Which quadrilateral of the calibration a geometry problem was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuadKind {
    Source,
    Destination,
}

impl QuadKind {
    pub fn as_str(self) -> &'static str {
        match self {
            QuadKind::Source => "source",
            QuadKind::Destination => "destination",
        }
    }
}

/// Structural misconfiguration. Always fatal, always detected before the
/// first frame is processed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("{} calibration points {indices:?} are collinear", .quad.as_str())]
    CollinearPoints { quad: QuadKind, indices: [usize; 3] },

    #[error("calibration homography is singular")]
    SingularHomography,

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// The error type for every fallible operation in this crate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PerceptionError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Input dimensions disagree with the calibrated geometry. The frame is
    /// skipped; nothing was written to the map.
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
}

pub type Result<T> = std::result::Result<T, PerceptionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collinear_message_names_the_quad() {
        let e = ConfigurationError::CollinearPoints {
            quad: QuadKind::Destination,
            indices: [0, 1, 3],
        };
        assert_eq!(e.to_string(), "destination calibration points [0, 1, 3] are collinear");
    }
}

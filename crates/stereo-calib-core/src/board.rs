use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// Errors raised while validating or comparing chessboard descriptions.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum BoardError {
    #[error("chessboard needs at least 3x3 inner corners (got {width}x{height})")]
    TooSmall { width: u32, height: u32 },
    #[error("chessboard cell size must be a positive finite number (got {0})")]
    InvalidCellSize(f32),
    #[error("chessboard data differs between left ({left}) and right ({right}) calibrations")]
    Mismatch {
        left: ChessboardSpec,
        right: ChessboardSpec,
    },
}

/// Planar chessboard target.
///
/// `width` and `height` count inner corners (corner intersections not on the
/// border) along a row and along a column.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChessboardSpec {
    pub width: u32,
    pub height: u32,
    /// Side of a square, in the unit the calibration should be expressed in.
    pub cell_size: f32,
}

impl ChessboardSpec {
    pub fn new(width: u32, height: u32, cell_size: f32) -> Result<Self, BoardError> {
        let spec = Self {
            width,
            height,
            cell_size,
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<(), BoardError> {
        if self.width < 3 || self.height < 3 {
            return Err(BoardError::TooSmall {
                width: self.width,
                height: self.height,
            });
        }
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(BoardError::InvalidCellSize(self.cell_size));
        }
        Ok(())
    }

    #[inline]
    pub fn corner_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// `(width, height)` as expected by pattern-size based detectors.
    #[inline]
    pub fn pattern_size(&self) -> (i32, i32) {
        (self.width as i32, self.height as i32)
    }

    /// Board-frame coordinates of every inner corner, row-major from the
    /// top-left corner, on the z = 0 plane.
    pub fn object_points(&self) -> Vec<Point3<f32>> {
        let mut pts = Vec::with_capacity(self.corner_count());
        for i in 0..self.height {
            for j in 0..self.width {
                pts.push(Point3::new(
                    j as f32 * self.cell_size,
                    i as f32 * self.cell_size,
                    0.0,
                ));
            }
        }
        pts
    }
}

impl std::fmt::Display for ChessboardSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{} @ {}", self.width, self.height, self.cell_size)
    }
}

/// Cross-check the board recorded in two single-camera calibrations.
///
/// Stereo tools only run when both cameras were calibrated against the very
/// same valid target; the shared spec is returned. Boards loaded from disk
/// skip [`ChessboardSpec::new`], so both are validated here.
pub fn ensure_consistent(
    left: &ChessboardSpec,
    right: &ChessboardSpec,
) -> Result<ChessboardSpec, BoardError> {
    left.validate()?;
    right.validate()?;
    if left == right {
        Ok(*left)
    } else {
        Err(BoardError::Mismatch {
            left: *left,
            right: *right,
        })
    }
}

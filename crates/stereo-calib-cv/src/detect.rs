//! Chessboard corner detection.

use std::path::Path;

use nalgebra::Point2;
use opencv::{
    calib3d,
    core::{Mat, Point2f, Size, TermCriteria, TermCriteria_EPS, TermCriteria_MAX_ITER, Vector},
    imgproc,
    prelude::*,
};
use stereo_calib_core::ChessboardSpec;

use crate::convert::{from_cv_points, pattern_size, to_cv_points};
use crate::image_io::{to_gray, write_image};
use crate::CvError;

const SUBPIX_WINDOW: i32 = 5;
const SUBPIX_MAX_ITER: i32 = 500;
const SUBPIX_EPS: f64 = 0.1;

/// Corners reported by one chessboard search.
///
/// When the full pattern was not found, `corners` holds whatever partial
/// detection OpenCV returned, unrefined and possibly empty.
#[derive(Clone, Debug, Default)]
pub struct ChessDetection {
    pub corners: Vec<Point2<f32>>,
    pub found: bool,
}

impl ChessDetection {
    /// Corners of a complete detection.
    pub fn complete(self) -> Option<Vec<Point2<f32>>> {
        self.found.then_some(self.corners)
    }
}

fn search_chess_corners(
    gray: &Mat,
    board: &ChessboardSpec,
) -> Result<(Vector<Point2f>, bool), CvError> {
    let mut corners = Vector::<Point2f>::new();
    let found = calib3d::find_chessboard_corners_def(gray, pattern_size(board), &mut corners)?;
    if !found || corners.len() != board.corner_count() {
        return Ok((corners, false));
    }

    let criteria = TermCriteria::new(
        TermCriteria_EPS + TermCriteria_MAX_ITER,
        SUBPIX_MAX_ITER,
        SUBPIX_EPS,
    )?;
    imgproc::corner_sub_pix(
        gray,
        &mut corners,
        Size::new(SUBPIX_WINDOW, SUBPIX_WINDOW),
        Size::new(-1, -1),
        criteria,
    )?;
    Ok((corners, true))
}

/// Find the inner corners of `board` in a grayscale image and refine them
/// to sub-pixel accuracy.
///
/// Returns `Ok(None)` when the full pattern is not visible.
pub fn find_chess_corners(
    gray: &Mat,
    board: &ChessboardSpec,
) -> Result<Option<Vector<Point2f>>, CvError> {
    let (corners, found) = search_chess_corners(gray, board)?;
    Ok(found.then_some(corners))
}

/// Convert a BGR image to gray and search it for the board, keeping partial
/// detections.
pub fn search_in_color(img: &Mat, board: &ChessboardSpec) -> Result<ChessDetection, CvError> {
    let gray = to_gray(img)?;
    let (corners, found) = search_chess_corners(&gray, board)?;
    Ok(ChessDetection {
        corners: from_cv_points(&corners),
        found,
    })
}

/// Convert a BGR image to gray and detect the board in it.
pub fn detect_in_color(
    img: &Mat,
    board: &ChessboardSpec,
) -> Result<Option<Vec<Point2<f32>>>, CvError> {
    Ok(search_in_color(img, board)?.complete())
}

/// Draw corners over `img` in place: connected and colored for a complete
/// detection, as red circles otherwise.
pub fn draw_corners(
    img: &mut Mat,
    board: &ChessboardSpec,
    corners: &[Point2<f32>],
    found: bool,
) -> Result<(), CvError> {
    let corners = to_cv_points(corners);
    calib3d::draw_chessboard_corners(img, pattern_size(board), &corners, found)?;
    Ok(())
}

/// Write a copy of `img` with the corners drawn on it.
pub fn save_corner_overlay(
    path: &Path,
    img: &Mat,
    board: &ChessboardSpec,
    corners: &[Point2<f32>],
) -> Result<(), CvError> {
    let mut overlay = img.try_clone()?;
    draw_corners(&mut overlay, board, corners, true)?;
    write_image(path, &overlay)?;
    log::debug!("corner overlay written to {}", path.display());
    Ok(())
}

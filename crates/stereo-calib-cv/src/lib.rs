//! OpenCV-backed vision operations for stereo calibration.
//!
//! Everything that touches `opencv` lives here: image decoding, chessboard
//! corner detection with sub-pixel refinement, single-camera and stereo
//! calibration, rectification and remapping. Results are handed back as the
//! plain record types of [`stereo_calib_core`].

pub mod convert;
mod calibrate;
mod detect;
mod image_io;
mod rectify;

use std::path::PathBuf;

pub use calibrate::{calibrate_camera, stereo_calibrate, MonoCalibration, StereoExtrinsics};
pub use detect::{
    detect_in_color, draw_corners, find_chess_corners, save_corner_overlay, search_in_color,
    ChessDetection,
};
pub use image_io::{decoded_size, mat_size, read_color, to_gray, write_image};
pub use rectify::{stereo_rectify, RectifyMaps};

pub use opencv::core::Mat;

#[derive(thiserror::Error, Debug)]
pub enum CvError {
    #[error(transparent)]
    OpenCv(#[from] opencv::Error),
    #[error("failed to read image {}", path.display())]
    ReadImage { path: PathBuf },
    #[error("failed to write image {}", path.display())]
    WriteImage { path: PathBuf },
    #[error("path is not valid UTF-8: {}", path.display())]
    NonUtf8Path { path: PathBuf },
    #[error("expected a {}x{} matrix, got {}x{}", expected.0, expected.1, found.0, found.1)]
    Shape {
        expected: (usize, usize),
        found: (usize, usize),
    },
    #[error("no views to calibrate from")]
    NoViews,
    #[error("left and right view counts differ ({left} vs {right})")]
    ViewCountMismatch { left: usize, right: usize },
}

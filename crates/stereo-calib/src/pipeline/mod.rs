//! End-to-end calibration utilities.
//!
//! Every pipeline validates its inputs before any detection or solve runs,
//! logs progress at `info` and returns the paths it wrote.

mod check;
mod export;
mod rectify;
mod single;
mod stereo;
mod undistort;

use std::{
    fs,
    path::{Path, PathBuf},
};

use stereo_calib_core::{
    list_images, BoardError, ImageCheckError, ImageSize, RecordIoError, StatsError,
};
use stereo_calib_cv::CvError;
use stereo_calib_export::ExportError;

pub use check::{
    run_check_rectification, CheckRectificationOptions, CheckRectificationSummary, PairReport,
    RectificationReport,
};
pub use export::{
    run_export_openvslam_mono, run_export_openvslam_stereo, ExportMonoOptions, ExportStereoOptions,
};
pub use rectify::{run_stereo_rectify, StereoRectifyOptions, StereoRectifySummary};
pub use single::{run_single_cam_calib, SingleCamCalibOptions, SingleCamCalibSummary};
pub use stereo::{run_stereo_cam_calib, StereoCamCalibOptions, StereoCamCalibSummary};
pub use undistort::{run_undistort_rectify, UndistortRectifyOptions};

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("no *.{extension} images in {}", dir.display())]
    NoImages { dir: PathBuf, extension: String },
    #[error("left and right folders hold different numbers of images ({left} vs {right})")]
    ImageCountMismatch { left: usize, right: usize },
    #[error("left and right images have different resolutions ({left} vs {right})")]
    ResolutionMismatch { left: ImageSize, right: ImageSize },
    #[error("no chessboard found in any image of {}", dir.display())]
    NoDetections { dir: PathBuf },
    #[error("no image pair with the chessboard found on both sides")]
    NoValidPairs,
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error(transparent)]
    Images(#[from] ImageCheckError),
    #[error(transparent)]
    Record(#[from] RecordIoError),
    #[error(transparent)]
    Stats(#[from] StatsError),
    #[error(transparent)]
    Cv(#[from] CvError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

pub(crate) fn create_dir(path: &Path) -> Result<(), PipelineError> {
    fs::create_dir_all(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Image size as the vision backend decodes it.
pub(crate) fn decoded_size(path: &Path) -> Result<ImageSize, PipelineError> {
    Ok(stereo_calib_cv::decoded_size(path)?)
}

/// Sorted listing that treats an empty folder as an error.
pub(crate) fn non_empty_listing(
    dir: &Path,
    extension: &str,
) -> Result<Vec<PathBuf>, PipelineError> {
    let images = list_images(dir, extension)?;
    if images.is_empty() {
        return Err(PipelineError::NoImages {
            dir: dir.to_path_buf(),
            extension: extension.trim_start_matches('.').to_string(),
        });
    }
    log::info!("{} images found in {}", images.len(), dir.display());
    Ok(images)
}

/// Left and right listings of a stereo dataset, paired by sorted position.
pub(crate) fn paired_listing(
    left_dir: &Path,
    right_dir: &Path,
    extension: &str,
) -> Result<(Vec<PathBuf>, Vec<PathBuf>), PipelineError> {
    let left = non_empty_listing(left_dir, extension)?;
    let right = non_empty_listing(right_dir, extension)?;
    if left.len() != right.len() {
        return Err(PipelineError::ImageCountMismatch {
            left: left.len(),
            right: right.len(),
        });
    }
    Ok((left, right))
}

pub(crate) fn warn_on_serial_mismatch(what: &str, expected: (&str, &str), found: (&str, &str)) {
    if expected != found {
        log::warn!(
            "{what} was computed for {} -> {}, cameras are {} -> {}",
            found.0,
            found.1,
            expected.0,
            expected.1
        );
    }
}

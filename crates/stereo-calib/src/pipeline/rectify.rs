use std::path::{Path, PathBuf};

use stereo_calib_core::{naming, CameraCalibration, Record, StereoCalibration, StereoRectification};
use stereo_calib_cv::stereo_rectify;

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::{create_dir, warn_on_serial_mismatch, PipelineError};

#[derive(Clone, Debug)]
pub struct StereoRectifyOptions {
    pub left_calibration: PathBuf,
    pub right_calibration: PathBuf,
    pub stereo_calibration: PathBuf,
    pub output_dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct StereoRectifySummary {
    pub rectification_path: PathBuf,
    pub rectification: StereoRectification,
}

/// Rectifying transforms of a calibrated stereo pair, computed at the
/// resolution of the stereo record.
#[cfg_attr(feature = "tracing", instrument(level = "info", skip_all))]
pub fn run_stereo_rectify(
    opts: &StereoRectifyOptions,
) -> Result<StereoRectifySummary, PipelineError> {
    let left = CameraCalibration::load_yaml(&opts.left_calibration)?;
    let right = CameraCalibration::load_yaml(&opts.right_calibration)?;
    let stereo = StereoCalibration::load_yaml(&opts.stereo_calibration)?;
    let (rectification_path, rectification) =
        rectify_pair(&left, &right, &stereo, &opts.output_dir)?;
    Ok(StereoRectifySummary {
        rectification_path,
        rectification,
    })
}

pub(super) fn rectify_pair(
    left: &CameraCalibration,
    right: &CameraCalibration,
    stereo: &StereoCalibration,
    output_dir: &Path,
) -> Result<(PathBuf, StereoRectification), PipelineError> {
    warn_on_serial_mismatch(
        "stereo calibration",
        (left.serial.as_str(), right.serial.as_str()),
        (stereo.serial_left.as_str(), stereo.serial_right.as_str()),
    );
    log::info!(
        "rectifying {} -> {} at {}",
        stereo.serial_left,
        stereo.serial_right,
        stereo.image_size
    );

    let rectification = stereo_rectify(left, right, stereo)?;
    create_dir(output_dir)?;
    let path = output_dir.join(naming::rectification(
        &rectification.serial_left,
        &rectification.serial_right,
    ));
    rectification.write_yaml(&path)?;
    log::info!("rectification written to {}", path.display());
    Ok((path, rectification))
}

use std::path::PathBuf;

use stereo_calib_core::{CameraCalibration, Record, StereoCalibration, StereoRectification};
use stereo_calib_cv::{mat_size, read_color, write_image, RectifyMaps};

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::PipelineError;

#[derive(Clone, Debug)]
pub struct UndistortRectifyOptions {
    pub left_calibration: PathBuf,
    pub right_calibration: PathBuf,
    pub stereo_calibration: PathBuf,
    pub rectification: PathBuf,
    pub left_image: PathBuf,
    pub right_image: PathBuf,
    pub left_output: PathBuf,
    pub right_output: PathBuf,
}

/// Undistort and rectify a single stereo pair.
///
/// Outputs keep the size of the input images, even when it differs from the
/// size the pair was calibrated at.
#[cfg_attr(feature = "tracing", instrument(level = "info", skip_all))]
pub fn run_undistort_rectify(opts: &UndistortRectifyOptions) -> Result<(), PipelineError> {
    let left = CameraCalibration::load_yaml(&opts.left_calibration)?;
    let right = CameraCalibration::load_yaml(&opts.right_calibration)?;
    let stereo = StereoCalibration::load_yaml(&opts.stereo_calibration)?;
    let rectification = StereoRectification::load_yaml(&opts.rectification)?;

    let l_img = read_color(&opts.left_image)?;
    let r_img = read_color(&opts.right_image)?;
    let l_size = mat_size(&l_img)?;
    let r_size = mat_size(&r_img)?;
    if l_size != r_size {
        return Err(PipelineError::ResolutionMismatch {
            left: l_size,
            right: r_size,
        });
    }
    if l_size != stereo.image_size {
        log::warn!(
            "images are {l_size} but the stereo pair was calibrated at {}",
            stereo.image_size
        );
    }

    let l_rect = RectifyMaps::left(&left, &rectification, l_size)?.remap(&l_img)?;
    let r_rect = RectifyMaps::right(&right, &rectification, r_size)?.remap(&r_img)?;
    write_image(&opts.left_output, &l_rect)?;
    write_image(&opts.right_output, &r_rect)?;
    log::info!(
        "rectified pair written to {} and {}",
        opts.left_output.display(),
        opts.right_output.display()
    );
    Ok(())
}

use std::path::PathBuf;

use stereo_calib_core::{CameraCalibration, Record, StereoRectification};
use stereo_calib_export::{export_mono, export_stereo, OpenVslamSettings};

use super::PipelineError;

#[derive(Clone, Debug)]
pub struct ExportMonoOptions {
    pub calibration: PathBuf,
    /// JSON overrides of the OpenVSLAM constants.
    pub settings: Option<PathBuf>,
    pub output_dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct ExportStereoOptions {
    pub left_calibration: PathBuf,
    pub right_calibration: PathBuf,
    pub rectification: PathBuf,
    pub settings: Option<PathBuf>,
    pub output_dir: PathBuf,
}

fn load_settings(path: Option<&PathBuf>) -> Result<OpenVslamSettings, PipelineError> {
    match path {
        Some(path) => {
            log::debug!("loading OpenVSLAM settings from {}", path.display());
            Ok(OpenVslamSettings::load_json(path)?)
        }
        None => Ok(OpenVslamSettings::default()),
    }
}

/// Monocular OpenVSLAM config from a single-camera calibration.
pub fn run_export_openvslam_mono(opts: &ExportMonoOptions) -> Result<PathBuf, PipelineError> {
    let settings = load_settings(opts.settings.as_ref())?;
    let calib = CameraCalibration::load_yaml(&opts.calibration)?;
    Ok(export_mono(&calib, &settings, &opts.output_dir)?)
}

/// Stereo OpenVSLAM config from both single-camera calibrations and the
/// rectification of the pair.
pub fn run_export_openvslam_stereo(opts: &ExportStereoOptions) -> Result<PathBuf, PipelineError> {
    let settings = load_settings(opts.settings.as_ref())?;
    let left = CameraCalibration::load_yaml(&opts.left_calibration)?;
    let right = CameraCalibration::load_yaml(&opts.right_calibration)?;
    let rectification = StereoRectification::load_yaml(&opts.rectification)?;
    Ok(export_stereo(
        &left,
        &right,
        &rectification,
        &settings,
        &opts.output_dir,
    )?)
}

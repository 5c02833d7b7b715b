use std::path::PathBuf;

use stereo_calib_core::{
    common_resolution, naming, CalibrationInfo, CameraCalibration, ChessboardSpec, CornerLog,
    Record,
};
use stereo_calib_cv::{calibrate_camera, detect_in_color, read_color, save_corner_overlay};

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::{create_dir, decoded_size, non_empty_listing, PipelineError};

#[derive(Clone, Debug)]
pub struct SingleCamCalibOptions {
    pub board: ChessboardSpec,
    pub image_dir: PathBuf,
    pub extension: String,
    pub serial: String,
    pub output_dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct SingleCamCalibSummary {
    pub calibration_path: PathBuf,
    pub info_path: PathBuf,
    pub images: usize,
    pub detected: usize,
    pub rms_error: f64,
}

/// Intrinsic calibration of one camera from a folder of chessboard images.
///
/// Writes `calib_<serial>.yml` and `info_<serial>.yml` into the output
/// directory, and the corner log plus one overlay per detection into
/// `<output>/<serial>/`.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(serial = %opts.serial))
)]
pub fn run_single_cam_calib(
    opts: &SingleCamCalibOptions,
) -> Result<SingleCamCalibSummary, PipelineError> {
    opts.board.validate()?;
    let images = non_empty_listing(&opts.image_dir, &opts.extension)?;
    let image_size = common_resolution(&images, decoded_size)?;
    log::info!("image resolution {image_size}, board {}", opts.board);

    let serial_dir = opts.output_dir.join(&opts.serial);
    create_dir(&serial_dir)?;

    let mut corner_log = CornerLog::default();
    let mut views = Vec::new();
    let mut used = Vec::new();
    for (index, path) in images.iter().enumerate() {
        let img = read_color(path)?;
        match detect_in_color(&img, &opts.board)? {
            Some(corners) => {
                log::info!("{}: found", path.display());
                corner_log.push(index, path, &corners);
                let overlay = serial_dir.join(naming::corner_overlay(index));
                save_corner_overlay(&overlay, &img, &opts.board, &corners)?;
                views.push(corners);
                used.push(path.to_string_lossy().into_owned());
            }
            None => log::info!("{}: not found", path.display()),
        }
    }
    if views.is_empty() {
        return Err(PipelineError::NoDetections {
            dir: opts.image_dir.clone(),
        });
    }
    corner_log.write_yaml(serial_dir.join(naming::CORNER_LOG))?;
    log::info!(
        "chessboard found in {} of {} images",
        views.len(),
        images.len()
    );

    let solved = calibrate_camera(&views, &opts.board, image_size)?;
    log::info!("RMS reprojection error: {:.4} px", solved.rms_error);

    let calibration = CameraCalibration {
        serial: opts.serial.clone(),
        image_size,
        camera_matrix: solved.camera_matrix,
        distortion: solved.distortion,
        board: opts.board,
    };
    let info = CalibrationInfo {
        rms_error: solved.rms_error,
        images: used,
        rvecs: solved.rvecs,
        tvecs: solved.tvecs,
        intrinsic_std: solved.intrinsic_std,
        extrinsic_std: solved.extrinsic_std,
        per_view_errors: solved.per_view_errors,
    };

    let calibration_path = opts
        .output_dir
        .join(naming::camera_calibration(&opts.serial));
    let info_path = opts
        .output_dir
        .join(naming::camera_calibration_info(&opts.serial));
    calibration.write_yaml(&calibration_path)?;
    info.write_yaml(&info_path)?;
    log::info!("calibration written to {}", calibration_path.display());

    Ok(SingleCamCalibSummary {
        calibration_path,
        info_path,
        images: images.len(),
        detected: views.len(),
        rms_error: info.rms_error,
    })
}

use std::path::{Path, PathBuf};

use nalgebra::Point2;
use stereo_calib_core::{
    check_resolution, ensure_consistent, naming, CameraCalibration, ChessboardSpec, CornerLog,
    Record, StereoCalibration, StereoCalibrationInfo,
};
use stereo_calib_cv::{detect_in_color, read_color, save_corner_overlay, stereo_calibrate, Mat};

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::rectify::rectify_pair;
use super::{create_dir, decoded_size, paired_listing, PipelineError};

#[derive(Clone, Debug)]
pub struct StereoCamCalibOptions {
    pub left_calibration: PathBuf,
    pub right_calibration: PathBuf,
    pub left_dir: PathBuf,
    pub right_dir: PathBuf,
    pub extension: String,
    pub output_dir: PathBuf,
    /// Also compute and write the rectification of the calibrated pair.
    pub rectify: bool,
}

#[derive(Clone, Debug)]
pub struct StereoCamCalibSummary {
    pub calibration_path: PathBuf,
    pub info_path: PathBuf,
    pub rectification_path: Option<PathBuf>,
    pub pairs: usize,
    pub valid_pairs: usize,
    pub rms_error: f64,
}

/// One camera's side of the detection loop.
struct Side<'a> {
    calib: &'a CameraCalibration,
    dir: PathBuf,
    corners: CornerLog,
    views: Vec<Vec<Point2<f32>>>,
}

impl<'a> Side<'a> {
    fn new(calib: &'a CameraCalibration, output_dir: &Path) -> Result<Self, PipelineError> {
        let dir = output_dir.join(&calib.serial);
        create_dir(&dir)?;
        Ok(Self {
            calib,
            dir,
            corners: CornerLog::default(),
            views: Vec::new(),
        })
    }

    fn keep(
        &mut self,
        index: usize,
        path: &Path,
        img: &Mat,
        board: &ChessboardSpec,
        corners: Vec<Point2<f32>>,
    ) -> Result<(), PipelineError> {
        self.corners.push(index, path, &corners);
        let overlay = self.dir.join(naming::corner_overlay(index));
        save_corner_overlay(&overlay, img, board, &corners)?;
        self.views.push(corners);
        Ok(())
    }

    fn finish(&self) -> Result<(), PipelineError> {
        self.corners.write_yaml(self.dir.join(naming::CORNER_LOG))?;
        log::debug!("corner log of {} written", self.calib.serial);
        Ok(())
    }
}

/// Extrinsic calibration of a stereo pair whose cameras were calibrated
/// individually beforehand.
///
/// Only pairs with the chessboard found in both images take part in the
/// solve. Writes `calib_stereo_<L>_to_<R>.yml` and its info record, and with
/// `rectify` set also `rectify_<L>_to_<R>.yml`.
#[cfg_attr(feature = "tracing", instrument(level = "info", skip_all))]
pub fn run_stereo_cam_calib(
    opts: &StereoCamCalibOptions,
) -> Result<StereoCamCalibSummary, PipelineError> {
    let left = CameraCalibration::load_yaml(&opts.left_calibration)?;
    let right = CameraCalibration::load_yaml(&opts.right_calibration)?;
    let board = ensure_consistent(&left.board, &right.board)?;
    log::info!("cameras {} -> {}, board {board}", left.serial, right.serial);

    let (left_images, right_images) =
        paired_listing(&opts.left_dir, &opts.right_dir, &opts.extension)?;
    check_resolution(&left_images, left.image_size, decoded_size)?;
    check_resolution(&right_images, right.image_size, decoded_size)?;
    if left.image_size != right.image_size {
        return Err(PipelineError::ResolutionMismatch {
            left: left.image_size,
            right: right.image_size,
        });
    }
    let image_size = left.image_size;

    let mut left_side = Side::new(&left, &opts.output_dir)?;
    let mut right_side = Side::new(&right, &opts.output_dir)?;
    let mut pairs_used = Vec::new();

    for (index, (lp, rp)) in left_images.iter().zip(&right_images).enumerate() {
        let l_img = read_color(lp)?;
        let r_img = read_color(rp)?;
        let found = (
            detect_in_color(&l_img, &board)?,
            detect_in_color(&r_img, &board)?,
        );
        match found {
            (Some(lc), Some(rc)) => {
                log::info!("pair {index}: found");
                left_side.keep(index, lp, &l_img, &board, lc)?;
                right_side.keep(index, rp, &r_img, &board, rc)?;
                pairs_used.push([
                    lp.to_string_lossy().into_owned(),
                    rp.to_string_lossy().into_owned(),
                ]);
            }
            (l, r) => log::info!(
                "pair {index}: not found (left: {}, right: {})",
                if l.is_some() { "found" } else { "missed" },
                if r.is_some() { "found" } else { "missed" },
            ),
        }
    }
    if pairs_used.is_empty() {
        return Err(PipelineError::NoValidPairs);
    }
    left_side.finish()?;
    right_side.finish()?;
    log::info!(
        "chessboard found on both sides in {} of {} pairs",
        pairs_used.len(),
        left_images.len()
    );

    let solved = stereo_calibrate(
        &left_side.views,
        &right_side.views,
        &board,
        &left,
        &right,
        image_size,
    )?;
    log::info!("stereo RMS reprojection error: {:.4} px", solved.rms_error);

    let stereo = StereoCalibration {
        serial_left: left.serial.clone(),
        serial_right: right.serial.clone(),
        image_size,
        rotation: solved.rotation,
        translation: solved.translation,
        essential: solved.essential,
        fundamental: solved.fundamental,
    };
    let info = StereoCalibrationInfo {
        rms_error: solved.rms_error,
        image_pairs: pairs_used,
        per_view_errors: solved.per_view_errors,
    };

    create_dir(&opts.output_dir)?;
    let calibration_path = opts
        .output_dir
        .join(naming::stereo_calibration(&left.serial, &right.serial));
    let info_path = opts
        .output_dir
        .join(naming::stereo_calibration_info(&left.serial, &right.serial));
    stereo.write_yaml(&calibration_path)?;
    info.write_yaml(&info_path)?;
    log::info!("stereo calibration written to {}", calibration_path.display());

    let rectification_path = if opts.rectify {
        let (path, _) = rectify_pair(&left, &right, &stereo, &opts.output_dir)?;
        Some(path)
    } else {
        None
    };

    Ok(StereoCamCalibSummary {
        calibration_path,
        info_path,
        rectification_path,
        pairs: left_images.len(),
        valid_pairs: info.image_pairs.len(),
        rms_error: info.rms_error,
    })
}

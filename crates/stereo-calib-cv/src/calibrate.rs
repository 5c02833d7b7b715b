//! Single-camera and stereo calibration.

use nalgebra::{Matrix3, Point2, Vector3};
use opencv::{
    calib3d,
    core::{Mat, TermCriteria, TermCriteria_EPS, TermCriteria_MAX_ITER, Vector},
};
use stereo_calib_core::{CameraCalibration, ChessboardSpec, ImageSize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::convert::{
    mat_to_array3, mat_to_matrix, mat_to_vec, object_points_for, row_to_mat, to_cv_size,
    to_cv_views, to_mat,
};
use crate::CvError;

const CALIB_MAX_ITER: i32 = 30;
const CALIB_EPS: f64 = 1e-3;

/// Intrinsics estimated from one camera's views, with their diagnostics.
#[derive(Clone, Debug)]
pub struct MonoCalibration {
    pub camera_matrix: Matrix3<f64>,
    pub distortion: Vec<f64>,
    pub rms_error: f64,
    pub rvecs: Vec<[f64; 3]>,
    pub tvecs: Vec<[f64; 3]>,
    pub intrinsic_std: Vec<f64>,
    pub extrinsic_std: Vec<f64>,
    pub per_view_errors: Vec<f64>,
}

/// Pose of the right camera in the left camera's frame.
#[derive(Clone, Debug)]
pub struct StereoExtrinsics {
    pub rotation: Matrix3<f64>,
    pub translation: Vector3<f64>,
    pub essential: Matrix3<f64>,
    pub fundamental: Matrix3<f64>,
    pub rms_error: f64,
    /// `[left, right]` reprojection error of each pair.
    pub per_view_errors: Vec<[f64; 2]>,
}

fn criteria() -> Result<TermCriteria, CvError> {
    Ok(TermCriteria::new(
        TermCriteria_EPS + TermCriteria_MAX_ITER,
        CALIB_MAX_ITER,
        CALIB_EPS,
    )?)
}

/// Calibrate one camera from the detected corners of each view.
///
/// The 5-coefficient distortion model is used (`k4`, `k5` fixed at zero).
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(views), fields(views = views.len()))
)]
pub fn calibrate_camera(
    views: &[Vec<Point2<f32>>],
    board: &ChessboardSpec,
    image_size: ImageSize,
) -> Result<MonoCalibration, CvError> {
    if views.is_empty() {
        return Err(CvError::NoViews);
    }
    let object = object_points_for(board, views.len());
    let image = to_cv_views(views);

    let mut k = Mat::default();
    let mut d = Mat::default();
    let mut rvecs = Vector::<Mat>::new();
    let mut tvecs = Vector::<Mat>::new();
    let mut std_intrinsic = Mat::default();
    let mut std_extrinsic = Mat::default();
    let mut per_view = Mat::default();

    let rms_error = calib3d::calibrate_camera_extended(
        &object,
        &image,
        to_cv_size(image_size),
        &mut k,
        &mut d,
        &mut rvecs,
        &mut tvecs,
        &mut std_intrinsic,
        &mut std_extrinsic,
        &mut per_view,
        calib3d::CALIB_FIX_K4 | calib3d::CALIB_FIX_K5,
        criteria()?,
    )?;
    log::debug!("camera calibrated from {} views, rms {rms_error:.4}", views.len());

    Ok(MonoCalibration {
        camera_matrix: mat_to_matrix(&k)?,
        distortion: mat_to_vec(&d)?,
        rms_error,
        rvecs: rvecs.iter().map(|m| mat_to_array3(&m)).collect::<Result<_, _>>()?,
        tvecs: tvecs.iter().map(|m| mat_to_array3(&m)).collect::<Result<_, _>>()?,
        intrinsic_std: mat_to_vec(&std_intrinsic)?,
        extrinsic_std: mat_to_vec(&std_extrinsic)?,
        per_view_errors: mat_to_vec(&per_view)?,
    })
}

/// Estimate the left-to-right pose with both cameras' intrinsics held fixed.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(pairs = left_views.len()))
)]
pub fn stereo_calibrate(
    left_views: &[Vec<Point2<f32>>],
    right_views: &[Vec<Point2<f32>>],
    board: &ChessboardSpec,
    left: &CameraCalibration,
    right: &CameraCalibration,
    image_size: ImageSize,
) -> Result<StereoExtrinsics, CvError> {
    if left_views.len() != right_views.len() {
        return Err(CvError::ViewCountMismatch {
            left: left_views.len(),
            right: right_views.len(),
        });
    }
    if left_views.is_empty() {
        return Err(CvError::NoViews);
    }
    let object = object_points_for(board, left_views.len());
    let image_left = to_cv_views(left_views);
    let image_right = to_cv_views(right_views);

    let mut k1 = to_mat(&left.camera_matrix)?;
    let mut d1 = row_to_mat(&left.distortion)?;
    let mut k2 = to_mat(&right.camera_matrix)?;
    let mut d2 = row_to_mat(&right.distortion)?;
    let mut r = Mat::default();
    let mut t = Mat::default();
    let mut e = Mat::default();
    let mut f = Mat::default();
    let mut rvecs = Vector::<Mat>::new();
    let mut tvecs = Vector::<Mat>::new();
    let mut per_view = Mat::default();

    let rms_error = calib3d::stereo_calibrate_extended(
        &object,
        &image_left,
        &image_right,
        &mut k1,
        &mut d1,
        &mut k2,
        &mut d2,
        to_cv_size(image_size),
        &mut r,
        &mut t,
        &mut e,
        &mut f,
        &mut rvecs,
        &mut tvecs,
        &mut per_view,
        calib3d::CALIB_FIX_INTRINSIC,
        criteria()?,
    )?;
    log::debug!(
        "stereo pair calibrated from {} views, rms {rms_error:.4}",
        left_views.len()
    );

    let errors = mat_to_vec(&per_view)?;
    let per_view_errors = errors.chunks_exact(2).map(|c| [c[0], c[1]]).collect();
    let translation = mat_to_array3(&t)?;

    Ok(StereoExtrinsics {
        rotation: mat_to_matrix(&r)?,
        translation: Vector3::from(translation),
        essential: mat_to_matrix(&e)?,
        fundamental: mat_to_matrix(&f)?,
        rms_error,
        per_view_errors,
    })
}

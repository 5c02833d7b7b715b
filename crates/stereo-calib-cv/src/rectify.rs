//! Stereo rectification and image remapping.

use nalgebra::{Matrix3, Matrix3x4};
use opencv::{
    calib3d,
    core::{Mat, Scalar, BORDER_CONSTANT, CV_32FC1},
    imgproc,
};
use stereo_calib_core::{CameraCalibration, ImageSize, StereoCalibration, StereoRectification};

use crate::convert::{mat_to_matrix, row_to_mat, to_cv_size, to_mat, vec3_to_mat};
use crate::CvError;

/// Compute the rectifying rotations and projections of a calibrated pair.
///
/// Uses OpenCV defaults: principal points aligned (`CALIB_ZERO_DISPARITY`)
/// and automatic scaling.
pub fn stereo_rectify(
    left: &CameraCalibration,
    right: &CameraCalibration,
    stereo: &StereoCalibration,
) -> Result<StereoRectification, CvError> {
    let mut r1 = Mat::default();
    let mut r2 = Mat::default();
    let mut p1 = Mat::default();
    let mut p2 = Mat::default();
    let mut q = Mat::default();

    calib3d::stereo_rectify_def(
        &to_mat(&left.camera_matrix)?,
        &row_to_mat(&left.distortion)?,
        &to_mat(&right.camera_matrix)?,
        &row_to_mat(&right.distortion)?,
        to_cv_size(stereo.image_size),
        &to_mat(&stereo.rotation)?,
        &vec3_to_mat(&stereo.translation)?,
        &mut r1,
        &mut r2,
        &mut p1,
        &mut p2,
        &mut q,
    )?;

    Ok(StereoRectification {
        serial_left: stereo.serial_left.clone(),
        serial_right: stereo.serial_right.clone(),
        image_size: stereo.image_size,
        r1: mat_to_matrix(&r1)?,
        r2: mat_to_matrix(&r2)?,
        p1: mat_to_matrix(&p1)?,
        p2: mat_to_matrix(&p2)?,
        q: mat_to_matrix(&q)?,
    })
}

/// Undistort-and-rectify lookup maps of one camera.
///
/// Maps cover `image_size`, which is the size of the images they will be
/// applied to; the output of [`RectifyMaps::remap`] has that size too.
pub struct RectifyMaps {
    map_x: Mat,
    map_y: Mat,
}

impl RectifyMaps {
    pub fn new(
        calib: &CameraCalibration,
        rotation: &Matrix3<f64>,
        projection: &Matrix3x4<f64>,
        image_size: ImageSize,
    ) -> Result<Self, CvError> {
        let mut map_x = Mat::default();
        let mut map_y = Mat::default();
        calib3d::init_undistort_rectify_map(
            &to_mat(&calib.camera_matrix)?,
            &row_to_mat(&calib.distortion)?,
            &to_mat(rotation)?,
            &to_mat(projection)?,
            to_cv_size(image_size),
            CV_32FC1,
            &mut map_x,
            &mut map_y,
        )?;
        Ok(Self { map_x, map_y })
    }

    pub fn left(
        calib: &CameraCalibration,
        rect: &StereoRectification,
        image_size: ImageSize,
    ) -> Result<Self, CvError> {
        Self::new(calib, &rect.r1, &rect.p1, image_size)
    }

    pub fn right(
        calib: &CameraCalibration,
        rect: &StereoRectification,
        image_size: ImageSize,
    ) -> Result<Self, CvError> {
        Self::new(calib, &rect.r2, &rect.p2, image_size)
    }

    /// Resample `img` into the rectified frame (bilinear, black border).
    pub fn remap(&self, img: &Mat) -> Result<Mat, CvError> {
        let mut out = Mat::default();
        imgproc::remap(
            img,
            &mut out,
            &self.map_x,
            &self.map_y,
            imgproc::INTER_LINEAR,
            BORDER_CONSTANT,
            Scalar::default(),
        )?;
        Ok(out)
    }
}

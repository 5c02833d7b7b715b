//! Conversions between OpenCV containers and the nalgebra-based record types.

use nalgebra::{Point2, SMatrix, Vector3};
use opencv::core::{Mat, Point2f, Point3f, Size, Vector, CV_64F};
use opencv::prelude::*;
use stereo_calib_core::{ChessboardSpec, ImageSize};

use crate::CvError;

pub fn to_cv_size(size: ImageSize) -> Size {
    Size::new(size.width as i32, size.height as i32)
}

pub fn from_cv_size(size: Size) -> ImageSize {
    ImageSize::new(size.width.max(0) as u32, size.height.max(0) as u32)
}

pub fn pattern_size(board: &ChessboardSpec) -> Size {
    let (w, h) = board.pattern_size();
    Size::new(w, h)
}

pub fn to_cv_points(points: &[Point2<f32>]) -> Vector<Point2f> {
    points.iter().map(|p| Point2f::new(p.x, p.y)).collect()
}

pub fn from_cv_points(points: &Vector<Point2f>) -> Vec<Point2<f32>> {
    points.iter().map(|p| Point2::new(p.x, p.y)).collect()
}

/// Image points of every view, as OpenCV expects them.
pub fn to_cv_views(views: &[Vec<Point2<f32>>]) -> Vector<Vector<Point2f>> {
    views.iter().map(|v| to_cv_points(v)).collect()
}

/// The board's object points repeated once per view.
pub fn object_points_for(board: &ChessboardSpec, views: usize) -> Vector<Vector<Point3f>> {
    let one: Vector<Point3f> = board
        .object_points()
        .iter()
        .map(|p| Point3f::new(p.x, p.y, p.z))
        .collect();
    (0..views).map(|_| one.clone()).collect()
}

/// Copy a fixed-size matrix into a `CV_64F` `Mat` of the same shape.
pub fn to_mat<const R: usize, const C: usize>(m: &SMatrix<f64, R, C>) -> Result<Mat, CvError> {
    let rows: Vec<Vec<f64>> = (0..R)
        .map(|r| (0..C).map(|c| m[(r, c)]).collect())
        .collect();
    Ok(Mat::from_slice_2d(&rows)?)
}

/// A `1xN` `CV_64F` row, the layout OpenCV uses for distortion vectors.
pub fn row_to_mat(values: &[f64]) -> Result<Mat, CvError> {
    Ok(Mat::from_slice_2d(&[values])?)
}

pub fn vec3_to_mat(v: &Vector3<f64>) -> Result<Mat, CvError> {
    Ok(Mat::from_slice_2d(&[[v.x], [v.y], [v.z]])?)
}

/// Read a `Mat` of exactly `R x C` elements into a fixed-size matrix.
pub fn mat_to_matrix<const R: usize, const C: usize>(
    m: &Mat,
) -> Result<SMatrix<f64, R, C>, CvError> {
    if m.rows() != R as i32 || m.cols() != C as i32 {
        return Err(CvError::Shape {
            expected: (R, C),
            found: (m.rows().max(0) as usize, m.cols().max(0) as usize),
        });
    }
    let m = as_f64(m)?;
    let mut out = SMatrix::<f64, R, C>::zeros();
    for r in 0..R {
        for c in 0..C {
            out[(r, c)] = *m.at_2d::<f64>(r as i32, c as i32)?;
        }
    }
    Ok(out)
}

/// All elements of a single-channel `Mat`, row-major.
pub fn mat_to_vec(m: &Mat) -> Result<Vec<f64>, CvError> {
    if m.empty() {
        return Ok(Vec::new());
    }
    let m = as_f64(m)?;
    let mut out = Vec::with_capacity((m.rows() * m.cols()).max(0) as usize);
    for r in 0..m.rows() {
        for c in 0..m.cols() {
            out.push(*m.at_2d::<f64>(r, c)?);
        }
    }
    Ok(out)
}

/// A 3-element vector (rotation / translation vector) stored in any shape.
pub fn mat_to_array3(m: &Mat) -> Result<[f64; 3], CvError> {
    let v = mat_to_vec(m)?;
    match v.as_slice() {
        [a, b, c] => Ok([*a, *b, *c]),
        _ => Err(CvError::Shape {
            expected: (3, 1),
            found: (m.rows().max(0) as usize, m.cols().max(0) as usize),
        }),
    }
}

fn as_f64(m: &Mat) -> Result<Mat, CvError> {
    if m.typ() == CV_64F {
        return Ok(m.try_clone()?);
    }
    let mut out = Mat::default();
    m.convert_to(&mut out, CV_64F, 1.0, 0.0)?;
    Ok(out)
}

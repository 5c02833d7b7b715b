//! Calibration records exchanged between the tools, and their on-disk form.
//!
//! Every tool reads the records written by the previous stage, so the layout
//! here is the contract of the whole pipeline:
//! single-camera calibration -> stereo calibration -> rectification ->
//! undistort/evaluate/export.

use std::{
    fs,
    path::{Path, PathBuf},
};

use nalgebra::{Matrix3, Matrix3x4, Matrix4, Point2, Vector3};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::board::ChessboardSpec;
use crate::matrix_serde::{rows, vec3};

#[derive(thiserror::Error, Debug)]
pub enum RecordIoError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid YAML record {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("failed to encode JSON report {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// A value persisted as a YAML record (or a JSON report).
pub trait Record: Serialize + DeserializeOwned {
    /// Load a record from disk.
    fn load_yaml(path: impl AsRef<Path>) -> Result<Self, RecordIoError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| RecordIoError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| RecordIoError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write this record to disk, replacing any previous content.
    fn write_yaml(&self, path: impl AsRef<Path>) -> Result<(), RecordIoError> {
        let path = path.as_ref();
        let yaml = serde_yaml::to_string(self).map_err(|source| RecordIoError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, yaml).map_err(|source| RecordIoError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write this record as pretty JSON.
    fn write_json(&self, path: impl AsRef<Path>) -> Result<(), RecordIoError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|source| RecordIoError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(|source| RecordIoError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Image resolution in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Intrinsics of one camera plus the target it was calibrated with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraCalibration {
    pub serial: String,
    pub image_size: ImageSize,
    #[serde(with = "rows")]
    pub camera_matrix: Matrix3<f64>,
    /// Distortion coefficients in OpenCV order (k1, k2, p1, p2, k3, ...).
    pub distortion: Vec<f64>,
    pub board: ChessboardSpec,
}

impl CameraCalibration {
    pub fn fx(&self) -> f64 {
        self.camera_matrix[(0, 0)]
    }

    pub fn fy(&self) -> f64 {
        self.camera_matrix[(1, 1)]
    }

    pub fn cx(&self) -> f64 {
        self.camera_matrix[(0, 2)]
    }

    pub fn cy(&self) -> f64 {
        self.camera_matrix[(1, 2)]
    }

    /// The `n`-th distortion coefficient; absent trailing terms are zero.
    pub fn distortion_coefficient(&self, n: usize) -> f64 {
        self.distortion.get(n).copied().unwrap_or(0.0)
    }
}

impl Record for CameraCalibration {}

/// Per-view byproducts of a single-camera calibration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationInfo {
    /// Overall RMS reprojection error, in pixels.
    pub rms_error: f64,
    /// Images whose corners entered the solve, in view order.
    pub images: Vec<String>,
    pub rvecs: Vec<[f64; 3]>,
    pub tvecs: Vec<[f64; 3]>,
    pub intrinsic_std: Vec<f64>,
    pub extrinsic_std: Vec<f64>,
    pub per_view_errors: Vec<f64>,
}

impl Record for CalibrationInfo {}

/// Pose of the right camera with respect to the left one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StereoCalibration {
    pub serial_left: String,
    pub serial_right: String,
    pub image_size: ImageSize,
    #[serde(with = "rows")]
    pub rotation: Matrix3<f64>,
    #[serde(with = "vec3")]
    pub translation: Vector3<f64>,
    #[serde(with = "rows")]
    pub essential: Matrix3<f64>,
    #[serde(with = "rows")]
    pub fundamental: Matrix3<f64>,
}

impl Record for StereoCalibration {}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StereoCalibrationInfo {
    pub rms_error: f64,
    /// `[left, right]` image paths of every pair used, in view order.
    pub image_pairs: Vec<[String; 2]>,
    /// `[left, right]` RMS error of every pair.
    pub per_view_errors: Vec<[f64; 2]>,
}

impl Record for StereoCalibrationInfo {}

/// Rectifying rotations and projections of a stereo pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StereoRectification {
    pub serial_left: String,
    pub serial_right: String,
    pub image_size: ImageSize,
    #[serde(with = "rows")]
    pub r1: Matrix3<f64>,
    #[serde(with = "rows")]
    pub r2: Matrix3<f64>,
    #[serde(with = "rows")]
    pub p1: Matrix3x4<f64>,
    #[serde(with = "rows")]
    pub p2: Matrix3x4<f64>,
    /// Disparity-to-depth reprojection matrix.
    #[serde(with = "rows")]
    pub q: Matrix4<f64>,
}

impl Record for StereoRectification {}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CornerLogEntry {
    /// Index of the image (or pair) in the sorted input listing.
    pub index: usize,
    pub image: String,
    pub corners: Vec<[f32; 2]>,
}

/// Detected corners of every image where the board was found.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CornerLog {
    pub images: Vec<CornerLogEntry>,
}

impl CornerLog {
    pub fn push(&mut self, index: usize, image: &Path, corners: &[Point2<f32>]) {
        self.images.push(CornerLogEntry {
            index,
            image: image.to_string_lossy().into_owned(),
            corners: corners.iter().map(|p| [p.x, p.y]).collect(),
        });
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl Record for CornerLog {}

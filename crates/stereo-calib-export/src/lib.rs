//! Export of calibration records to third-party configuration formats.
//!
//! Currently OpenVSLAM: a monocular config from one single-camera
//! calibration, and a stereo config from both single-camera calibrations plus
//! the rectification of the pair.
//!
//! ```
//! use nalgebra::Matrix3;
//! use stereo_calib_core::{CameraCalibration, ChessboardSpec, ImageSize};
//! use stereo_calib_export::{render_mono, OpenVslamSettings};
//!
//! let calib = CameraCalibration {
//!     serial: "cam0".into(),
//!     image_size: ImageSize::new(640, 480),
//!     camera_matrix: Matrix3::new(500.0, 0.0, 320.0, 0.0, 500.0, 240.0, 0.0, 0.0, 1.0),
//!     distortion: vec![0.0; 5],
//!     board: ChessboardSpec::new(9, 6, 0.025).unwrap(),
//! };
//! let yaml = render_mono(&calib, &OpenVslamSettings::default());
//! assert!(yaml.contains("Camera.fx: 500\n"));
//! ```

mod number;
mod openvslam;

use std::{
    fs,
    path::{Path, PathBuf},
};

use stereo_calib_core::{naming, CameraCalibration, ImageSize, StereoRectification};

pub use number::{fixed6, general};
pub use openvslam::{render_mono, render_stereo, FeatureSettings, GcSettings, OpenVslamSettings};

#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error("left and right calibrations have different image sizes ({left} vs {right})")]
    ResolutionMismatch { left: ImageSize, right: ImageSize },
    #[error("invalid OpenVSLAM settings in {}: {source}", path.display())]
    Settings {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Render and write `openvslam_mono_<serial>.yml` into `out_dir`.
pub fn export_mono(
    calib: &CameraCalibration,
    settings: &OpenVslamSettings,
    out_dir: &Path,
) -> Result<PathBuf, ExportError> {
    let contents = render_mono(calib, settings);
    write_config(out_dir, &naming::openvslam_mono(&calib.serial), &contents)
}

/// Render and write `openvslam_stereo_<L>_to_<R>.yml` into `out_dir`.
pub fn export_stereo(
    left: &CameraCalibration,
    right: &CameraCalibration,
    rectification: &StereoRectification,
    settings: &OpenVslamSettings,
    out_dir: &Path,
) -> Result<PathBuf, ExportError> {
    let contents = render_stereo(left, right, rectification, settings)?;
    let name = naming::openvslam_stereo(&left.serial, &right.serial);
    write_config(out_dir, &name, &contents)
}

fn write_config(out_dir: &Path, name: &str, contents: &str) -> Result<PathBuf, ExportError> {
    fs::create_dir_all(out_dir).map_err(|source| ExportError::Io {
        path: out_dir.to_path_buf(),
        source,
    })?;
    let path = out_dir.join(name);
    fs::write(&path, contents).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;
    log::info!("OpenVSLAM configuration written to {}", path.display());
    Ok(path)
}

//! Facade crate for the `stereo-calib-*` workspace.
//!
//! This crate provides:
//! - re-exports of the underlying crates (`core`, `cv`, `export`)
//! - one pipeline per calibration utility, each taking an options struct and
//!   returning a summary of what it wrote
//! - the `stereo-calib` command-line tool (feature `cli`, on by default)
//!
//! ## Workflow
//!
//! 1. `single-cam-calib` once per camera: intrinsics from chessboard images.
//! 2. `stereo-cam-calib`: pose of the right camera, intrinsics held fixed.
//! 3. `stereo-rectify`: rectifying rotations and projections of the pair.
//! 4. `check-rectification`: vertical disparity of re-detected corners.
//! 5. `export-openvslam-mono` / `export-openvslam-stereo`: SLAM configs.
//!
//! ```no_run
//! use stereo_calib::core::ChessboardSpec;
//! use stereo_calib::pipeline::{run_single_cam_calib, SingleCamCalibOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let summary = run_single_cam_calib(&SingleCamCalibOptions {
//!     board: ChessboardSpec::new(9, 6, 0.025)?,
//!     image_dir: "images/left".into(),
//!     extension: "png".into(),
//!     serial: "21502195".into(),
//!     output_dir: "logSingleCamCalib".into(),
//! })?;
//! println!("rms = {:.3}", summary.rms_error);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `stereo_calib::core`: board spec, records, image checks, statistics.
//! - `stereo_calib::cv`: OpenCV detection, calibration and rectification.
//! - `stereo_calib::export`: OpenVSLAM configuration rendering.
//! - `stereo_calib::pipeline`: the end-to-end utilities.

pub use stereo_calib_core as core;
pub use stereo_calib_cv as cv;
pub use stereo_calib_export as export;

pub use stereo_calib_core::{ChessboardSpec, Record};

pub mod pipeline;

pub use pipeline::PipelineError;

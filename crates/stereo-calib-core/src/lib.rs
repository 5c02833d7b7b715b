//! Core types and utilities for single- and stereo-camera calibration.
//!
//! This crate is intentionally free of any vision library. It holds the data
//! model shared by the calibration tools (board spec, calibration records and
//! their on-disk form), the consistency checks run before any heavy work
//! (image resolutions, left/right board agreement) and the y-disparity
//! statistics used to judge a stereo rectification.

mod board;
mod images;
mod logger;
mod matrix_serde;
pub mod naming;
mod records;
mod stats;

pub use board::{ensure_consistent, BoardError, ChessboardSpec};
pub use images::{
    check_resolution, common_resolution, file_name, image_size, list_images, ImageCheckError,
};
pub use records::{
    CalibrationInfo, CameraCalibration, CornerLog, CornerLogEntry, ImageSize, Record,
    RecordIoError, StereoCalibration, StereoCalibrationInfo, StereoRectification,
};
pub use stats::{y_disparities, DatasetSummary, DisparityStats, StatsError};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, level_from_verbosity};

/// Re-exported so downstream crates agree on the `log` level type.
pub use log::LevelFilter;

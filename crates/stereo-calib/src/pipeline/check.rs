use std::{fmt::Write as _, fs, path::PathBuf};

use serde::{Deserialize, Serialize};
use stereo_calib_core::{
    ensure_consistent, file_name, naming, y_disparities, CameraCalibration, DatasetSummary,
    DisparityStats, Record, StereoCalibration, StereoRectification,
};
use stereo_calib_cv::{
    draw_corners, mat_size, read_color, search_in_color, write_image, RectifyMaps,
};
use stereo_calib_export::general;

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::{create_dir, paired_listing, warn_on_serial_mismatch, PipelineError};

const STAT_DIGITS: usize = 6;

#[derive(Clone, Debug)]
pub struct CheckRectificationOptions {
    pub left_calibration: PathBuf,
    pub right_calibration: PathBuf,
    pub stereo_calibration: PathBuf,
    pub rectification: PathBuf,
    pub left_dir: PathBuf,
    pub right_dir: PathBuf,
    pub extension: String,
    pub output_dir: PathBuf,
}

/// Outcome of one rectified pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PairReport {
    pub left: String,
    pub right: String,
    /// `None` when the board was missed in either rectified image.
    pub stats: Option<DisparityStats>,
}

/// `summary.json` of a rectification check.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RectificationReport {
    pub total_pairs: usize,
    pub valid_pairs: usize,
    /// Per-pair statistics averaged over the valid pairs.
    pub average: Option<DisparityStats>,
    pub pairs: Vec<PairReport>,
}

impl Record for RectificationReport {}

#[derive(Clone, Debug)]
pub struct CheckRectificationSummary {
    pub disparities_path: PathBuf,
    pub report_path: PathBuf,
    pub report: RectificationReport,
}

/// Rectify every pair of a dataset, re-detect the chessboard and measure how
/// far corresponding corners sit from the same image row.
///
/// `yDisparities.txt` gets one `median mean std` line per pair (`NaN NaN NaN`
/// when the board was missed), rectified images with their corners drawn go
/// to `<output>/<serial>Rect/`. Partial detections are drawn too. Each pair
/// is rectified at its own decoded size.
#[cfg_attr(feature = "tracing", instrument(level = "info", skip_all))]
pub fn run_check_rectification(
    opts: &CheckRectificationOptions,
) -> Result<CheckRectificationSummary, PipelineError> {
    let left = CameraCalibration::load_yaml(&opts.left_calibration)?;
    let right = CameraCalibration::load_yaml(&opts.right_calibration)?;
    let stereo = StereoCalibration::load_yaml(&opts.stereo_calibration)?;
    let rectification = StereoRectification::load_yaml(&opts.rectification)?;

    let (left_images, right_images) =
        paired_listing(&opts.left_dir, &opts.right_dir, &opts.extension)?;
    let board = ensure_consistent(&left.board, &right.board)?;
    warn_on_serial_mismatch(
        "rectification",
        (stereo.serial_left.as_str(), stereo.serial_right.as_str()),
        (
            rectification.serial_left.as_str(),
            rectification.serial_right.as_str(),
        ),
    );

    let l_out = opts.output_dir.join(naming::rectified_folder(&left.serial));
    let r_out = opts.output_dir.join(naming::rectified_folder(&right.serial));
    create_dir(&l_out)?;
    create_dir(&r_out)?;

    let mut lines = String::from("#Median mean std\n");
    let mut summary = DatasetSummary::default();
    let mut pairs = Vec::with_capacity(left_images.len());

    for (index, (lp, rp)) in left_images.iter().zip(&right_images).enumerate() {
        let l_img = read_color(lp)?;
        let r_img = read_color(rp)?;
        let l_size = mat_size(&l_img)?;
        if l_size != rectification.image_size {
            log::warn!(
                "pair {index}: images are {l_size}, rectification was computed at {}",
                rectification.image_size
            );
        }
        let mut l_rect = RectifyMaps::left(&left, &rectification, l_size)?.remap(&l_img)?;
        let mut r_rect =
            RectifyMaps::right(&right, &rectification, mat_size(&r_img)?)?.remap(&r_img)?;

        let l_found = search_in_color(&l_rect, &board)?;
        let r_found = search_in_color(&r_rect, &board)?;
        draw_corners(&mut l_rect, &board, &l_found.corners, l_found.found)?;
        draw_corners(&mut r_rect, &board, &r_found.corners, r_found.found)?;
        write_image(&l_out.join(file_name(lp)), &l_rect)?;
        write_image(&r_out.join(file_name(rp)), &r_rect)?;

        let stats = match (l_found.complete(), r_found.complete()) {
            (Some(lc), Some(rc)) => DisparityStats::from_samples(&y_disparities(&lc, &rc)?),
            _ => None,
        };
        match &stats {
            Some(s) => {
                log::info!(
                    "pair {index}: y-disparity median {:.4} mean {:.4} std {:.4}",
                    s.median,
                    s.mean,
                    s.std_dev
                );
                let _ = writeln!(
                    lines,
                    "{} {} {}",
                    general(s.median.into(), STAT_DIGITS),
                    general(s.mean.into(), STAT_DIGITS),
                    general(s.std_dev.into(), STAT_DIGITS)
                );
                summary.add_valid(s);
            }
            None => {
                log::info!("pair {index}: chessboard not found after rectification");
                lines.push_str("NaN NaN NaN\n");
                summary.add_invalid();
            }
        }
        pairs.push(PairReport {
            left: lp.to_string_lossy().into_owned(),
            right: rp.to_string_lossy().into_owned(),
            stats,
        });
    }

    let disparities_path = opts.output_dir.join(naming::Y_DISPARITIES);
    fs::write(&disparities_path, lines).map_err(|source| PipelineError::Io {
        path: disparities_path.clone(),
        source,
    })?;

    let average = summary.average();
    match &average {
        Some(avg) => log::info!(
            "{} of {} pairs valid; average y-disparity median {:.4} mean {:.4} std {:.4}",
            summary.valid_pairs,
            summary.total_pairs,
            avg.median,
            avg.mean,
            avg.std_dev
        ),
        None => log::warn!(
            "chessboard not found in any of the {} rectified pairs",
            summary.total_pairs
        ),
    }

    let report = RectificationReport {
        total_pairs: summary.total_pairs,
        valid_pairs: summary.valid_pairs,
        average,
        pairs,
    };
    let report_path = opts.output_dir.join(naming::RECTIFICATION_SUMMARY);
    report.write_json(&report_path)?;

    Ok(CheckRectificationSummary {
        disparities_path,
        report_path,
        report,
    })
}

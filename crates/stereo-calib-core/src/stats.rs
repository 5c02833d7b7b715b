//! Vertical disparity statistics of rectified stereo pairs.
//!
//! After a correct rectification, corresponding chessboard corners lie on the
//! same image row. The absolute row offset of each corner pair is the
//! y-disparity; its distribution per pair, averaged over a dataset, measures
//! rectification quality.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum StatsError {
    #[error("left and right corner counts differ ({left} vs {right})")]
    LengthMismatch { left: usize, right: usize },
}

/// `|y_left - y_right|` for each corner pair.
pub fn y_disparities(
    left: &[Point2<f32>],
    right: &[Point2<f32>],
) -> Result<Vec<f32>, StatsError> {
    if left.len() != right.len() {
        return Err(StatsError::LengthMismatch {
            left: left.len(),
            right: right.len(),
        });
    }
    Ok(left
        .iter()
        .zip(right)
        .map(|(l, r)| (l.y - r.y).abs())
        .collect())
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DisparityStats {
    /// Element `n / 2` of the sorted samples.
    pub median: f32,
    pub mean: f32,
    /// Sample standard deviation (n - 1 denominator).
    pub std_dev: f32,
}

impl DisparityStats {
    /// `None` for an empty sample set.
    pub fn from_samples(samples: &[f32]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let median = sorted[sorted.len() / 2];

        let n = samples.len() as f64;
        let mean = samples.iter().map(|&v| v as f64).sum::<f64>() / n;
        let std_dev = if samples.len() < 2 {
            0.0
        } else {
            let sq: f64 = samples
                .iter()
                .map(|&v| {
                    let d = v as f64 - mean;
                    d * d
                })
                .sum();
            (sq / (n - 1.0)).sqrt()
        };

        Some(Self {
            median,
            mean: mean as f32,
            std_dev: std_dev as f32,
        })
    }
}

/// Running totals over the pairs of an evaluation dataset.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    /// All pairs seen, including those where a board was missed.
    pub total_pairs: usize,
    /// Pairs with corners detected in both rectified images.
    pub valid_pairs: usize,
    sum_median: f64,
    sum_mean: f64,
    sum_std_dev: f64,
}

impl DatasetSummary {
    pub fn add_valid(&mut self, stats: &DisparityStats) {
        self.total_pairs += 1;
        self.valid_pairs += 1;
        self.sum_median += stats.median as f64;
        self.sum_mean += stats.mean as f64;
        self.sum_std_dev += stats.std_dev as f64;
    }

    pub fn add_invalid(&mut self) {
        self.total_pairs += 1;
    }

    /// Per-pair statistics averaged over the valid pairs.
    pub fn average(&self) -> Option<DisparityStats> {
        if self.valid_pairs == 0 {
            return None;
        }
        let n = self.valid_pairs as f64;
        Some(DisparityStats {
            median: (self.sum_median / n) as f32,
            mean: (self.sum_mean / n) as f32,
            std_dev: (self.sum_std_dev / n) as f32,
        })
    }
}

//! OpenVSLAM configuration rendering.
//!
//! OpenVSLAM keys contain dots (`Camera.fx`), so the files are assembled line
//! by line instead of going through a YAML serializer.

use std::fmt::Write as _;
use std::path::Path;

use serde::{Deserialize, Serialize};
use stereo_calib_core::{CameraCalibration, StereoRectification};

use crate::number::{fixed6, general};
use crate::ExportError;

/// Significant digits of calibration values.
const VALUE_DIGITS: usize = 10;
/// Significant digits of the `Feature.*` block.
const FEATURE_DIGITS: usize = 2;

/// ORB extractor settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureSettings {
    pub max_num_keypoints: u32,
    pub scale_factor: f64,
    pub num_levels: u32,
    pub ini_fast_threshold: u32,
    pub min_fast_threshold: u32,
}

impl Default for FeatureSettings {
    fn default() -> Self {
        Self {
            max_num_keypoints: 1000,
            scale_factor: 1.2,
            num_levels: 8,
            ini_fast_threshold: 20,
            min_fast_threshold: 7,
        }
    }
}

/// Acquisition settings of the GigE cameras (`Gc.*` keys).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GcSettings {
    pub exposure: u32,
    pub gain: u32,
    pub decime: bool,
}

impl Default for GcSettings {
    fn default() -> Self {
        Self {
            exposure: 10000,
            gain: 12,
            decime: true,
        }
    }
}

/// Everything in an OpenVSLAM config that does not come from calibration.
///
/// Loaded from JSON; absent keys keep their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenVslamSettings {
    /// Overrides `Camera.name` (default: `GetCameras mono` / `GetCameras stereo`).
    pub camera_name: Option<String>,
    pub fps: f64,
    pub color_order: String,
    pub feature: FeatureSettings,
    /// Stereo only.
    pub num_min_triangulated_pts: u32,
    pub gc: GcSettings,
}

impl Default for OpenVslamSettings {
    fn default() -> Self {
        Self {
            camera_name: None,
            fps: 15.0,
            color_order: "RGB".to_string(),
            feature: FeatureSettings::default(),
            num_min_triangulated_pts: 100,
            gc: GcSettings::default(),
        }
    }
}

impl OpenVslamSettings {
    /// Load settings overrides from a JSON file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ExportError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ExportError::Settings {
            path: path.to_path_buf(),
            source,
        })
    }

    fn camera_name<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.camera_name.as_deref().unwrap_or(fallback)
    }
}

/// Config for a single (unrectified) camera.
pub fn render_mono(calib: &CameraCalibration, settings: &OpenVslamSettings) -> String {
    let mut out = String::new();
    camera_header(
        &mut out,
        settings.camera_name("GetCameras mono"),
        "monocular",
    );

    let _ = writeln!(out, "Camera.fx: {}", general(calib.fx(), VALUE_DIGITS));
    let _ = writeln!(out, "Camera.fy: {}", general(calib.fy(), VALUE_DIGITS));
    let _ = writeln!(out, "Camera.cx: {}", general(calib.cx(), VALUE_DIGITS));
    let _ = writeln!(out, "Camera.cy: {}\n", general(calib.cy(), VALUE_DIGITS));

    let d: [f64; 5] = std::array::from_fn(|i| calib.distortion_coefficient(i));
    distortion_block(&mut out, &d);

    let _ = writeln!(out, "Camera.fps: {}", general(settings.fps, VALUE_DIGITS));
    let _ = writeln!(out, "Camera.cols: {}", calib.image_size.width);
    let _ = writeln!(out, "Camera.rows: {}", calib.image_size.height);
    let _ = writeln!(out, "Camera.color_order: \"{}\"\n", settings.color_order);

    feature_block(&mut out, settings);
    gc_block(&mut out, settings);
    let _ = writeln!(out, "Gc.serial: \"{}\"", calib.serial);
    out
}

/// Config for a rectified stereo pair.
///
/// The pinhole parameters are those of the rectified left projection `P1`;
/// distortion is zero because OpenVSLAM rectifies the input itself with the
/// `StereoRectifier.*` matrices.
pub fn render_stereo(
    left: &CameraCalibration,
    right: &CameraCalibration,
    rectification: &StereoRectification,
    settings: &OpenVslamSettings,
) -> Result<String, ExportError> {
    if left.image_size != right.image_size {
        return Err(ExportError::ResolutionMismatch {
            left: left.image_size,
            right: right.image_size,
        });
    }
    if rectification.serial_left != left.serial || rectification.serial_right != right.serial {
        log::warn!(
            "rectification was computed for {} -> {}, exporting cameras {} -> {}",
            rectification.serial_left,
            rectification.serial_right,
            left.serial,
            right.serial
        );
    }

    let p1 = &rectification.p1;
    let mut out = String::new();
    camera_header(&mut out, settings.camera_name("GetCameras stereo"), "stereo");

    let _ = writeln!(out, "Camera.fx: {}", general(p1[(0, 0)], VALUE_DIGITS));
    let _ = writeln!(out, "Camera.fy: {}", general(p1[(1, 1)], VALUE_DIGITS));
    let _ = writeln!(out, "Camera.cx: {}", general(p1[(0, 2)], VALUE_DIGITS));
    let _ = writeln!(out, "Camera.cy: {}\n", general(p1[(1, 2)], VALUE_DIGITS));

    distortion_block(&mut out, &[0.0; 5]);

    let focal_x_baseline = -rectification.p2[(0, 3)];
    let _ = writeln!(out, "Camera.fps: {}", general(settings.fps, VALUE_DIGITS));
    let _ = writeln!(out, "Camera.cols: {}", left.image_size.width);
    let _ = writeln!(out, "Camera.rows: {}", left.image_size.height);
    let _ = writeln!(
        out,
        "Camera.focal_x_baseline: {}",
        general(focal_x_baseline, VALUE_DIGITS)
    );
    let _ = writeln!(out, "Camera.color_order: \"{}\"\n", settings.color_order);

    let sides = [
        ("left", left, &rectification.r1),
        ("right", right, &rectification.r2),
    ];
    for (side, calib, r) in sides {
        let k = &calib.camera_matrix;
        let k_values: Vec<f64> = (0..3)
            .flat_map(|row| (0..3).map(move |col| k[(row, col)]))
            .collect();
        let d_values: Vec<f64> = (0..5).map(|i| calib.distortion_coefficient(i)).collect();
        let r_values: Vec<f64> = (0..3)
            .flat_map(|row| (0..3).map(move |col| r[(row, col)]))
            .collect();
        let _ = writeln!(out, "StereoRectifier.K_{side}: {}", fixed_list(&k_values));
        let _ = writeln!(out, "StereoRectifier.D_{side}: {}", fixed_list(&d_values));
        let _ = writeln!(out, "StereoRectifier.R_{side}: {}", fixed_list(&r_values));
    }
    out.push('\n');

    feature_block(&mut out, settings);
    let _ = writeln!(
        out,
        "Initializer.num_min_triangulated_pts: {}\n",
        settings.num_min_triangulated_pts
    );
    gc_block(&mut out, settings);
    let _ = writeln!(out, "Gc.serial.left: \"{}\"", left.serial);
    let _ = writeln!(out, "Gc.serial.right: \"{}\"", right.serial);
    Ok(out)
}

fn camera_header(out: &mut String, name: &str, setup: &str) {
    let _ = writeln!(out, "Camera.name: \"{name}\"");
    let _ = writeln!(out, "Camera.setup: \"{setup}\"");
    let _ = writeln!(out, "Camera.model: \"perspective\"\n");
}

fn distortion_block(out: &mut String, d: &[f64; 5]) {
    for (key, value) in ["k1", "k2", "p1", "p2", "k3"].iter().zip(d) {
        let _ = writeln!(out, "Camera.{key}: {}", general(*value, VALUE_DIGITS));
    }
    out.push('\n');
}

fn feature_block(out: &mut String, settings: &OpenVslamSettings) {
    let f = &settings.feature;
    let _ = writeln!(out, "Feature.max_num_keypoints: {}", f.max_num_keypoints);
    let _ = writeln!(
        out,
        "Feature.scale_factor: {}",
        general(f.scale_factor, FEATURE_DIGITS)
    );
    let _ = writeln!(out, "Feature.num_levels: {}", f.num_levels);
    let _ = writeln!(out, "Feature.ini_fast_threshold: {}", f.ini_fast_threshold);
    let _ = writeln!(out, "Feature.min_fast_threshold: {}\n", f.min_fast_threshold);
}

fn gc_block(out: &mut String, settings: &OpenVslamSettings) {
    let gc = &settings.gc;
    let _ = writeln!(out, "Gc.exposure: {}", gc.exposure);
    let _ = writeln!(out, "Gc.gain: {}", gc.gain);
    let _ = writeln!(out, "Gc.decime: {}", gc.decime);
}

fn fixed_list(values: &[f64]) -> String {
    let items: Vec<String> = values.iter().map(|&v| fixed6(v)).collect();
    format!("[{}]", items.join(", "))
}

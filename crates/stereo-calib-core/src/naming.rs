//! File names of the records and artifacts written by the tools.

/// Default output folders, one per tool.
pub const SINGLE_CAM_CALIB_DIR: &str = "logSingleCamCalib";
pub const STEREO_CAM_CALIB_DIR: &str = "logStereoCamCalib";
pub const STEREO_RECTIFY_DIR: &str = "logStereoRectify";
pub const CHECK_RECTIFICATION_DIR: &str = "logCheckRectification";

pub const CORNER_LOG: &str = "chess_corners.yml";
pub const Y_DISPARITIES: &str = "yDisparities.txt";
pub const RECTIFICATION_SUMMARY: &str = "summary.json";

pub fn camera_calibration(serial: &str) -> String {
    format!("calib_{serial}.yml")
}

pub fn camera_calibration_info(serial: &str) -> String {
    format!("info_{serial}.yml")
}

pub fn stereo_calibration(left: &str, right: &str) -> String {
    format!("calib_stereo_{left}_to_{right}.yml")
}

pub fn stereo_calibration_info(left: &str, right: &str) -> String {
    format!("info_stereo_{left}_to_{right}.yml")
}

pub fn rectification(left: &str, right: &str) -> String {
    format!("rectify_{left}_to_{right}.yml")
}

/// Overlay image of the corners found in the `index`-th input image.
pub fn corner_overlay(index: usize) -> String {
    format!("{index}.jpeg")
}

/// Folder collecting the rectified images of one camera.
pub fn rectified_folder(serial: &str) -> String {
    format!("{serial}Rect")
}

pub fn openvslam_mono(serial: &str) -> String {
    format!("openvslam_mono_{serial}.yml")
}

pub fn openvslam_stereo(left: &str, right: &str) -> String {
    format!("openvslam_stereo_{left}_to_{right}.yml")
}

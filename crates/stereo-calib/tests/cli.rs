use std::path::{Path, PathBuf};

use assert_cmd::Command;
use image::{GrayImage, Luma};
use nalgebra::{Matrix3, Matrix3x4, Matrix4, Vector3};
use predicates::prelude::*;
use stereo_calib::core::{
    CameraCalibration, ChessboardSpec, ImageSize, Record, StereoCalibration, StereoRectification,
};

const SQUARE: u32 = 40;
const MARGIN: u32 = 40;
const SQUARES_X: u32 = 7;
const SQUARES_Y: u32 = 5;
const WIDTH: u32 = SQUARES_X * SQUARE + 2 * MARGIN;
const HEIGHT: u32 = SQUARES_Y * SQUARE + 2 * MARGIN;
const FOCAL: f64 = 300.0;

fn cmd() -> Command {
    Command::cargo_bin("stereo-calib").unwrap()
}

/// 6x4 inner corners.
fn board() -> ChessboardSpec {
    ChessboardSpec::new(SQUARES_X - 1, SQUARES_Y - 1, 0.04).unwrap()
}

fn chessboard_image() -> GrayImage {
    GrayImage::from_fn(WIDTH, HEIGHT, |x, y| {
        let inside =
            (MARGIN..WIDTH - MARGIN).contains(&x) && (MARGIN..HEIGHT - MARGIN).contains(&y);
        if inside && ((x - MARGIN) / SQUARE + (y - MARGIN) / SQUARE) % 2 == 0 {
            Luma([0u8])
        } else {
            Luma([255u8])
        }
    })
}

fn blank_image(width: u32, height: u32) -> GrayImage {
    GrayImage::from_pixel(width, height, Luma([255u8]))
}

fn camera_matrix() -> Matrix3<f64> {
    Matrix3::new(
        FOCAL,
        0.0,
        WIDTH as f64 / 2.0,
        0.0,
        FOCAL,
        HEIGHT as f64 / 2.0,
        0.0,
        0.0,
        1.0,
    )
}

fn camera(serial: &str, board: ChessboardSpec) -> CameraCalibration {
    CameraCalibration {
        serial: serial.to_string(),
        image_size: ImageSize::new(WIDTH, HEIGHT),
        camera_matrix: camera_matrix(),
        distortion: vec![0.0; 5],
        board,
    }
}

fn stereo() -> StereoCalibration {
    StereoCalibration {
        serial_left: "L".into(),
        serial_right: "R".into(),
        image_size: ImageSize::new(WIDTH, HEIGHT),
        rotation: Matrix3::identity(),
        translation: Vector3::new(-0.1, 0.0, 0.0),
        essential: Matrix3::zeros(),
        fundamental: Matrix3::zeros(),
    }
}

/// Rectification that leaves undistorted images untouched.
fn identity_rectification() -> StereoRectification {
    let mut p1 = Matrix3x4::zeros();
    p1.fixed_view_mut::<3, 3>(0, 0).copy_from(&camera_matrix());
    let mut p2 = p1;
    p2[(0, 3)] = -FOCAL * 0.1;
    StereoRectification {
        serial_left: "L".into(),
        serial_right: "R".into(),
        image_size: ImageSize::new(WIDTH, HEIGHT),
        r1: Matrix3::identity(),
        r2: Matrix3::identity(),
        p1,
        p2,
        q: Matrix4::identity(),
    }
}

struct Records {
    left: PathBuf,
    right: PathBuf,
    stereo: PathBuf,
    rectification: PathBuf,
}

fn write_records(dir: &Path) -> Records {
    let records = Records {
        left: dir.join("calib_L.yml"),
        right: dir.join("calib_R.yml"),
        stereo: dir.join("calib_stereo_L_to_R.yml"),
        rectification: dir.join("rectify_L_to_R.yml"),
    };
    camera("L", board()).write_yaml(&records.left).unwrap();
    camera("R", board()).write_yaml(&records.right).unwrap();
    stereo().write_yaml(&records.stereo).unwrap();
    identity_rectification()
        .write_yaml(&records.rectification)
        .unwrap();
    records
}

fn image_dir(root: &Path, name: &str, images: &[(&str, &GrayImage)]) -> PathBuf {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    for (file, img) in images {
        img.save(dir.join(file)).unwrap();
    }
    dir
}

#[test]
fn help_lists_every_utility() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("single-cam-calib"))
        .stdout(predicate::str::contains("stereo-cam-calib"))
        .stdout(predicate::str::contains("stereo-rectify"))
        .stdout(predicate::str::contains("undistort-rectify"))
        .stdout(predicate::str::contains("check-rectification"))
        .stdout(predicate::str::contains("export-openvslam-mono"))
        .stdout(predicate::str::contains("export-openvslam-stereo"));
}

#[test]
fn single_cam_calib_rejects_empty_folder() {
    let tmp = tempfile::tempdir().unwrap();
    let images = image_dir(tmp.path(), "images", &[]);
    cmd()
        .arg("single-cam-calib")
        .args(["6", "4", "0.04"])
        .arg(&images)
        .args(["png", "cam0", "--output-dir"])
        .arg(tmp.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("no *.png images"));
}

#[test]
fn single_cam_calib_rejects_invalid_board() {
    let tmp = tempfile::tempdir().unwrap();
    cmd()
        .arg("single-cam-calib")
        .args(["2", "4", "0.04"])
        .arg(tmp.path())
        .args(["png", "cam0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 3x3"));
}

#[test]
fn single_cam_calib_fails_without_detections() {
    let tmp = tempfile::tempdir().unwrap();
    let blank = blank_image(WIDTH, HEIGHT);
    let images = image_dir(tmp.path(), "images", &[("a.png", &blank), ("b.png", &blank)]);
    cmd()
        .arg("single-cam-calib")
        .args(["6", "4", "0.04"])
        .arg(&images)
        .args(["png", "cam0", "--output-dir"])
        .arg(tmp.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("no chessboard found"));
}

#[test]
fn single_cam_calib_rejects_mixed_resolutions() {
    let tmp = tempfile::tempdir().unwrap();
    let images = image_dir(
        tmp.path(),
        "images",
        &[
            ("a.png", &blank_image(WIDTH, HEIGHT)),
            ("b.png", &blank_image(WIDTH / 2, HEIGHT)),
        ],
    );
    cmd()
        .arg("single-cam-calib")
        .args(["6", "4", "0.04"])
        .arg(&images)
        .args(["png", "cam0", "--output-dir"])
        .arg(tmp.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("b.png"));
}

#[test]
fn stereo_cam_calib_rejects_board_mismatch() {
    let tmp = tempfile::tempdir().unwrap();
    let left = tmp.path().join("calib_L.yml");
    let right = tmp.path().join("calib_R.yml");
    camera("L", board()).write_yaml(&left).unwrap();
    camera("R", ChessboardSpec::new(9, 6, 0.04).unwrap())
        .write_yaml(&right)
        .unwrap();

    cmd()
        .arg("stereo-cam-calib")
        .arg(&left)
        .arg(&right)
        .arg(tmp.path())
        .arg(tmp.path())
        .arg("png")
        .assert()
        .failure()
        .stderr(predicate::str::contains("chessboard data differs"));
}

#[test]
fn stereo_cam_calib_rejects_unequal_image_counts() {
    let tmp = tempfile::tempdir().unwrap();
    let records = write_records(tmp.path());
    let img = chessboard_image();
    let left = image_dir(tmp.path(), "left", &[("a.png", &img), ("b.png", &img)]);
    let right = image_dir(tmp.path(), "right", &[("a.png", &img)]);

    cmd()
        .arg("stereo-cam-calib")
        .arg(&records.left)
        .arg(&records.right)
        .arg(&left)
        .arg(&right)
        .arg("png")
        .arg("--output-dir")
        .arg(tmp.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("different numbers of images (2 vs 1)"));
}

#[test]
fn missing_record_is_reported_with_its_path() {
    let tmp = tempfile::tempdir().unwrap();
    cmd()
        .arg("export-openvslam-mono")
        .arg(tmp.path().join("nope.yml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.yml"));
}

#[test]
fn stereo_rectify_writes_record() {
    let tmp = tempfile::tempdir().unwrap();
    let records = write_records(tmp.path());
    let out = tmp.path().join("rect");

    cmd()
        .arg("stereo-rectify")
        .arg(&records.left)
        .arg(&records.right)
        .arg(&records.stereo)
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success();

    let rect = StereoRectification::load_yaml(out.join("rectify_L_to_R.yml")).unwrap();
    assert_eq!(rect.image_size, ImageSize::new(WIDTH, HEIGHT));
    assert!(rect.p2[(0, 3)] < 0.0);
    assert!((rect.p1[(1, 2)] - rect.p2[(1, 2)]).abs() < 1e-9);
}

#[test]
fn undistort_rectify_writes_both_images() {
    let tmp = tempfile::tempdir().unwrap();
    let records = write_records(tmp.path());
    let img = chessboard_image();
    let dir = image_dir(tmp.path(), "in", &[("l.png", &img), ("r.png", &img)]);
    let (l_out, r_out) = (tmp.path().join("l_rect.png"), tmp.path().join("r_rect.png"));

    cmd()
        .arg("undistort-rectify")
        .arg(&records.left)
        .arg(&records.right)
        .arg(&records.stereo)
        .arg(&records.rectification)
        .arg(dir.join("l.png"))
        .arg(dir.join("r.png"))
        .arg(&l_out)
        .arg(&r_out)
        .assert()
        .success();

    assert_eq!(image::image_dimensions(&l_out).unwrap(), (WIDTH, HEIGHT));
    assert_eq!(image::image_dimensions(&r_out).unwrap(), (WIDTH, HEIGHT));
}

#[test]
fn undistort_rectify_keeps_the_input_size() {
    let tmp = tempfile::tempdir().unwrap();
    let records = write_records(tmp.path());
    let larger = blank_image(WIDTH + 40, HEIGHT + 20);
    let dir = image_dir(tmp.path(), "in", &[("l.png", &larger), ("r.png", &larger)]);
    let (l_out, r_out) = (tmp.path().join("l_rect.png"), tmp.path().join("r_rect.png"));

    cmd()
        .arg("undistort-rectify")
        .arg(&records.left)
        .arg(&records.right)
        .arg(&records.stereo)
        .arg(&records.rectification)
        .arg(dir.join("l.png"))
        .arg(dir.join("r.png"))
        .arg(&l_out)
        .arg(&r_out)
        .assert()
        .success()
        .stderr(predicate::str::contains("calibrated at 360x280"));

    let expected = (WIDTH + 40, HEIGHT + 20);
    assert_eq!(image::image_dimensions(&l_out).unwrap(), expected);
    assert_eq!(image::image_dimensions(&r_out).unwrap(), expected);
}

#[test]
fn undistort_rectify_rejects_mismatched_pair() {
    let tmp = tempfile::tempdir().unwrap();
    let records = write_records(tmp.path());
    let dir = image_dir(
        tmp.path(),
        "in",
        &[
            ("l.png", &blank_image(WIDTH, HEIGHT)),
            ("r.png", &blank_image(WIDTH, HEIGHT / 2)),
        ],
    );

    cmd()
        .arg("undistort-rectify")
        .arg(&records.left)
        .arg(&records.right)
        .arg(&records.stereo)
        .arg(&records.rectification)
        .arg(dir.join("l.png"))
        .arg(dir.join("r.png"))
        .arg(tmp.path().join("l_rect.png"))
        .arg(tmp.path().join("r_rect.png"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("different resolutions"));
}

#[test]
fn check_rectification_reports_per_pair_disparities() {
    let tmp = tempfile::tempdir().unwrap();
    let records = write_records(tmp.path());
    let board_img = chessboard_image();
    let blank = blank_image(WIDTH, HEIGHT);
    let left = image_dir(tmp.path(), "left", &[("a.png", &board_img), ("b.png", &blank)]);
    let right = image_dir(tmp.path(), "right", &[("a.png", &board_img), ("b.png", &board_img)]);
    let out = tmp.path().join("check");

    cmd()
        .arg("check-rectification")
        .arg(&records.left)
        .arg(&records.right)
        .arg(&records.stereo)
        .arg(&records.rectification)
        .arg(&left)
        .arg(&right)
        .arg("png")
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success();

    let disparities = std::fs::read_to_string(out.join("yDisparities.txt")).unwrap();
    let lines: Vec<&str> = disparities.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "#Median mean std");
    let values: Vec<f64> = lines[1]
        .split(' ')
        .map(|v| v.parse().unwrap())
        .collect();
    assert_eq!(values.len(), 3);
    assert!(values.iter().all(|v| v.abs() < 0.5), "{}", lines[1]);
    assert_eq!(lines[2], "NaN NaN NaN");

    assert!(out.join("LRect").join("a.png").is_file());
    assert!(out.join("RRect").join("b.png").is_file());

    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join("summary.json")).unwrap()).unwrap();
    assert_eq!(summary["total_pairs"], 2);
    assert_eq!(summary["valid_pairs"], 1);
    assert!(summary["average"].is_object());
    assert!(summary["pairs"][1]["stats"].is_null());
}

#[test]
fn export_commands_write_openvslam_configs() {
    let tmp = tempfile::tempdir().unwrap();
    let records = write_records(tmp.path());
    let settings = tmp.path().join("settings.json");
    std::fs::write(&settings, r#"{ "fps": 30 }"#).unwrap();
    let out = tmp.path().join("slam");

    cmd()
        .arg("export-openvslam-mono")
        .arg(&records.left)
        .arg("--settings")
        .arg(&settings)
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success();
    let mono = std::fs::read_to_string(out.join("openvslam_mono_L.yml")).unwrap();
    assert!(mono.contains("Camera.fx: 300\n"));
    assert!(mono.contains("Camera.fps: 30\n"));

    cmd()
        .arg("export-openvslam-stereo")
        .arg(&records.left)
        .arg(&records.right)
        .arg(&records.rectification)
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success();
    let stereo = std::fs::read_to_string(out.join("openvslam_stereo_L_to_R.yml")).unwrap();
    assert!(stereo.contains("Camera.setup: \"stereo\"\n"));
    assert!(stereo.contains("Camera.focal_x_baseline: 30\n"));
    assert!(stereo.contains("Gc.serial.right: \"R\"\n"));
}

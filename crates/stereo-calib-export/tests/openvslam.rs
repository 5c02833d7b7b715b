use nalgebra::{Matrix3, Matrix3x4, Matrix4};
use stereo_calib_core::{CameraCalibration, ChessboardSpec, ImageSize, StereoRectification};
use stereo_calib_export::{
    export_mono, export_stereo, render_mono, render_stereo, ExportError, OpenVslamSettings,
};

fn camera(serial: &str, fx: f64) -> CameraCalibration {
    CameraCalibration {
        serial: serial.to_string(),
        image_size: ImageSize::new(1280, 1024),
        camera_matrix: Matrix3::new(fx, 0.0, 641.25, 0.0, fx + 2.0, 509.5, 0.0, 0.0, 1.0),
        distortion: vec![-0.1, 0.05, 0.001, -0.002, 0.0],
        board: ChessboardSpec::new(9, 6, 0.03).unwrap(),
    }
}

fn rectification() -> StereoRectification {
    let mut p1 = Matrix3x4::zeros();
    p1[(0, 0)] = 1100.5;
    p1[(1, 1)] = 1100.5;
    p1[(0, 2)] = 630.0;
    p1[(1, 2)] = 515.25;
    p1[(2, 2)] = 1.0;
    let mut p2 = p1;
    p2[(0, 3)] = -132.06;
    StereoRectification {
        serial_left: "L".into(),
        serial_right: "R".into(),
        image_size: ImageSize::new(1280, 1024),
        r1: Matrix3::identity(),
        r2: Matrix3::identity(),
        p1,
        p2,
        q: Matrix4::identity(),
    }
}

#[test]
fn mono_config_has_expected_layout() {
    let yaml = render_mono(&camera("L", 1200.0), &OpenVslamSettings::default());
    let expected = "\
Camera.name: \"GetCameras mono\"
Camera.setup: \"monocular\"
Camera.model: \"perspective\"

Camera.fx: 1200
Camera.fy: 1202
Camera.cx: 641.25
Camera.cy: 509.5

Camera.k1: -0.1
Camera.k2: 0.05
Camera.p1: 0.001
Camera.p2: -0.002
Camera.k3: 0

Camera.fps: 15
Camera.cols: 1280
Camera.rows: 1024
Camera.color_order: \"RGB\"

Feature.max_num_keypoints: 1000
Feature.scale_factor: 1.2
Feature.num_levels: 8
Feature.ini_fast_threshold: 20
Feature.min_fast_threshold: 7

Gc.exposure: 10000
Gc.gain: 12
Gc.decime: true
Gc.serial: \"L\"
";
    assert_eq!(yaml, expected);
}

#[test]
fn stereo_config_uses_rectified_projection() {
    let yaml = render_stereo(
        &camera("L", 1200.0),
        &camera("R", 1190.0),
        &rectification(),
        &OpenVslamSettings::default(),
    )
    .unwrap();

    assert!(yaml.starts_with("Camera.name: \"GetCameras stereo\"\nCamera.setup: \"stereo\"\n"));
    assert!(yaml.contains("Camera.fx: 1100.5\nCamera.fy: 1100.5\nCamera.cx: 630\nCamera.cy: 515.25\n"));
    assert!(yaml.contains("Camera.k1: 0\nCamera.k2: 0\n"));
    assert!(yaml.contains("Camera.focal_x_baseline: 132.06\nCamera.color_order: \"RGB\"\n"));
    assert!(yaml.contains(
        "StereoRectifier.K_left: [1200.000000, 0.000000, 641.250000, 0.000000, 1202.000000, 509.500000, 0.000000, 0.000000, 1.000000]\n"
    ));
    assert!(yaml.contains(
        "StereoRectifier.D_right: [-0.100000, 0.050000, 0.001000, -0.002000, 0.000000]\n"
    ));
    assert!(yaml.contains(
        "StereoRectifier.R_right: [1.000000, 0.000000, 0.000000, 0.000000, 1.000000, 0.000000, 0.000000, 0.000000, 1.000000]\n\n"
    ));
    assert!(yaml.contains("Initializer.num_min_triangulated_pts: 100\n"));
    assert!(yaml.ends_with("Gc.serial.left: \"L\"\nGc.serial.right: \"R\"\n"));
}

#[test]
fn stereo_export_rejects_mismatched_resolutions() {
    let mut right = camera("R", 1190.0);
    right.image_size = ImageSize::new(640, 512);
    let err = render_stereo(
        &camera("L", 1200.0),
        &right,
        &rectification(),
        &OpenVslamSettings::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ExportError::ResolutionMismatch { .. }));
}

#[test]
fn settings_override_only_given_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(
        &path,
        r#"{ "fps": 30, "camera_name": "rig", "gc": { "gain": 4 } }"#,
    )
    .unwrap();
    let settings = OpenVslamSettings::load_json(&path).unwrap();
    assert_eq!(settings.fps, 30.0);
    assert_eq!(settings.gc.gain, 4);
    assert_eq!(settings.gc.exposure, 10000);
    assert_eq!(settings.feature.num_levels, 8);

    let yaml = render_mono(&camera("L", 1200.0), &settings);
    assert!(yaml.starts_with("Camera.name: \"rig\"\n"));
    assert!(yaml.contains("Camera.fps: 30\n"));
    assert!(yaml.contains("Gc.gain: 4\n"));
}

#[test]
fn export_writes_named_files() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("nested");
    let settings = OpenVslamSettings::default();

    let mono = export_mono(&camera("L", 1200.0), &settings, &out).unwrap();
    assert_eq!(mono, out.join("openvslam_mono_L.yml"));
    assert!(std::fs::read_to_string(&mono).unwrap().contains("Gc.serial: \"L\""));

    let stereo = export_stereo(
        &camera("L", 1200.0),
        &camera("R", 1190.0),
        &rectification(),
        &settings,
        &out,
    )
    .unwrap();
    assert_eq!(stereo, out.join("openvslam_stereo_L_to_R.yml"));
}

use nalgebra::{Matrix3, Matrix3x4, Matrix4, Vector3};
use stereo_calib_core::{
    naming, CameraCalibration, ChessboardSpec, ImageSize, Record, RecordIoError,
    StereoCalibration, StereoRectification,
};

#[test]
fn stereo_pipeline_records_survive_disk() {
    let dir = tempfile::tempdir().unwrap();

    let stereo = StereoCalibration {
        serial_left: "L01".into(),
        serial_right: "R02".into(),
        image_size: ImageSize::new(1920, 1200),
        rotation: Matrix3::identity(),
        translation: Vector3::new(-0.12, 0.001, 0.0005),
        essential: Matrix3::zeros(),
        fundamental: Matrix3::zeros(),
    };
    let path = dir.path().join(naming::stereo_calibration("L01", "R02"));
    stereo.write_yaml(&path).unwrap();
    assert!(path.ends_with("calib_stereo_L01_to_R02.yml"));
    assert_eq!(StereoCalibration::load_yaml(&path).unwrap(), stereo);

    let mut p2 = Matrix3x4::zeros();
    p2[(0, 0)] = 900.0;
    p2[(0, 3)] = -108.0;
    let rect = StereoRectification {
        serial_left: "L01".into(),
        serial_right: "R02".into(),
        image_size: stereo.image_size,
        r1: Matrix3::identity(),
        r2: Matrix3::identity(),
        p1: Matrix3x4::zeros(),
        p2,
        q: Matrix4::identity(),
    };
    let path = dir.path().join(naming::rectification("L01", "R02"));
    rect.write_yaml(&path).unwrap();
    let back = StereoRectification::load_yaml(&path).unwrap();
    assert_eq!(back.p2[(0, 3)], -108.0);
    assert_eq!(back, rect);
}

#[test]
fn load_errors_carry_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("calib_missing.yml");
    let err = CameraCalibration::load_yaml(&missing).unwrap_err();
    assert!(matches!(err, RecordIoError::Io { .. }));
    assert!(err.to_string().contains("calib_missing.yml"));

    let garbage = dir.path().join("calib_garbage.yml");
    std::fs::write(&garbage, "serial: [unterminated").unwrap();
    let err = CameraCalibration::load_yaml(&garbage).unwrap_err();
    assert!(matches!(err, RecordIoError::Yaml { .. }));
}

#[test]
fn camera_calibration_keeps_board() {
    let dir = tempfile::tempdir().unwrap();
    let calib = CameraCalibration {
        serial: "cam0".into(),
        image_size: ImageSize::new(640, 480),
        camera_matrix: Matrix3::new(500.0, 0.0, 320.0, 0.0, 500.0, 240.0, 0.0, 0.0, 1.0),
        distortion: vec![0.1, -0.05, 0.0, 0.0, 0.01],
        board: ChessboardSpec::new(9, 6, 0.024).unwrap(),
    };
    let path = dir.path().join(naming::camera_calibration("cam0"));
    calib.write_yaml(&path).unwrap();
    let back = CameraCalibration::load_yaml(&path).unwrap();
    assert_eq!(back.board, calib.board);
    assert_eq!(back.camera_matrix, calib.camera_matrix);
}

//! stereo-calib CLI: chessboard calibration of single cameras and stereo pairs.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Args, Parser, Subcommand};
use stereo_calib::core::{naming, BoardError, ChessboardSpec};
use stereo_calib::pipeline::{
    run_check_rectification, run_export_openvslam_mono, run_export_openvslam_stereo,
    run_single_cam_calib, run_stereo_cam_calib, run_stereo_rectify, run_undistort_rectify,
    CheckRectificationOptions, ExportMonoOptions, ExportStereoOptions, SingleCamCalibOptions,
    StereoCamCalibOptions, StereoRectifyOptions, UndistortRectifyOptions,
};
use stereo_calib::PipelineError;

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "stereo-calib")]
#[command(about = "Chessboard calibration of single cameras and stereo pairs, with OpenVSLAM export")]
#[command(version)]
struct Cli {
    /// More output (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only warnings and errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Intrinsic calibration of one camera from chessboard images.
    SingleCamCalib(SingleCamCalibArgs),

    /// Extrinsic calibration of a stereo pair, intrinsics held fixed.
    StereoCamCalib(StereoCamCalibArgs),

    /// Rectifying rotations and projections of a calibrated pair.
    StereoRectify(StereoRectifyArgs),

    /// Undistort and rectify one stereo image pair.
    UndistortRectify(UndistortRectifyArgs),

    /// Measure vertical disparity of chessboard corners after rectification.
    CheckRectification(CheckRectificationArgs),

    /// Write an OpenVSLAM monocular config.
    ExportOpenvslamMono(ExportMonoArgs),

    /// Write an OpenVSLAM stereo config.
    ExportOpenvslamStereo(ExportStereoArgs),
}

#[derive(Debug, Clone, Args)]
struct SingleCamCalibArgs {
    /// Inner corners per chessboard row.
    board_width: u32,
    /// Inner corners per chessboard column.
    board_height: u32,
    /// Side length of one square, in the unit of the calibration output.
    cell_size: f32,
    /// Folder with the calibration images.
    image_dir: PathBuf,
    /// Image file extension, e.g. `png`.
    extension: String,
    /// Camera serial, used to name the outputs.
    serial: String,
    #[arg(long, default_value = naming::SINGLE_CAM_CALIB_DIR)]
    output_dir: PathBuf,
}

#[derive(Debug, Clone, Args)]
struct StereoCamCalibArgs {
    /// Left camera calibration (`calib_<serial>.yml`).
    left_calibration: PathBuf,
    /// Right camera calibration.
    right_calibration: PathBuf,
    left_dir: PathBuf,
    right_dir: PathBuf,
    extension: String,
    /// Also write the rectification of the pair.
    #[arg(long)]
    rectify: bool,
    #[arg(long, default_value = naming::STEREO_CAM_CALIB_DIR)]
    output_dir: PathBuf,
}

#[derive(Debug, Clone, Args)]
struct StereoRectifyArgs {
    left_calibration: PathBuf,
    right_calibration: PathBuf,
    /// Stereo calibration (`calib_stereo_<L>_to_<R>.yml`).
    stereo_calibration: PathBuf,
    #[arg(long, default_value = naming::STEREO_RECTIFY_DIR)]
    output_dir: PathBuf,
}

#[derive(Debug, Clone, Args)]
struct UndistortRectifyArgs {
    left_calibration: PathBuf,
    right_calibration: PathBuf,
    stereo_calibration: PathBuf,
    /// Rectification (`rectify_<L>_to_<R>.yml`).
    rectification: PathBuf,
    left_image: PathBuf,
    right_image: PathBuf,
    left_output: PathBuf,
    right_output: PathBuf,
}

#[derive(Debug, Clone, Args)]
struct CheckRectificationArgs {
    left_calibration: PathBuf,
    right_calibration: PathBuf,
    stereo_calibration: PathBuf,
    rectification: PathBuf,
    left_dir: PathBuf,
    right_dir: PathBuf,
    extension: String,
    #[arg(long, default_value = naming::CHECK_RECTIFICATION_DIR)]
    output_dir: PathBuf,
}

#[derive(Debug, Clone, Args)]
struct ExportMonoArgs {
    calibration: PathBuf,
    /// JSON file overriding OpenVSLAM constants (fps, ORB and camera settings).
    #[arg(long)]
    settings: Option<PathBuf>,
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

#[derive(Debug, Clone, Args)]
struct ExportStereoArgs {
    left_calibration: PathBuf,
    right_calibration: PathBuf,
    rectification: PathBuf,
    #[arg(long)]
    settings: Option<PathBuf>,
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(not(feature = "tracing"))]
fn init_logging(cli: &Cli) {
    let level = stereo_calib::core::level_from_verbosity(cli.quiet, cli.verbose);
    if let Err(err) = stereo_calib::core::init_with_level(level) {
        eprintln!("warning: logger already installed: {err}");
    }
}

#[cfg(feature = "tracing")]
fn init_logging(cli: &Cli) {
    let level = stereo_calib::core::level_from_verbosity(cli.quiet, cli.verbose);
    stereo_calib::core::init_tracing(false, level);
}

fn run(command: Commands) -> CliResult<()> {
    match command {
        Commands::SingleCamCalib(args) => {
            let summary = run_single_cam_calib(&SingleCamCalibOptions {
                board: ChessboardSpec::new(args.board_width, args.board_height, args.cell_size)?,
                image_dir: args.image_dir,
                extension: args.extension,
                serial: args.serial,
                output_dir: args.output_dir,
            })?;
            log::info!(
                "{} of {} images used, rms {:.4}",
                summary.detected,
                summary.images,
                summary.rms_error
            );
        }
        Commands::StereoCamCalib(args) => {
            let summary = run_stereo_cam_calib(&StereoCamCalibOptions {
                left_calibration: args.left_calibration,
                right_calibration: args.right_calibration,
                left_dir: args.left_dir,
                right_dir: args.right_dir,
                extension: args.extension,
                output_dir: args.output_dir,
                rectify: args.rectify,
            })?;
            log::info!(
                "{} of {} pairs used, rms {:.4}",
                summary.valid_pairs,
                summary.pairs,
                summary.rms_error
            );
        }
        Commands::StereoRectify(args) => {
            run_stereo_rectify(&StereoRectifyOptions {
                left_calibration: args.left_calibration,
                right_calibration: args.right_calibration,
                stereo_calibration: args.stereo_calibration,
                output_dir: args.output_dir,
            })?;
        }
        Commands::UndistortRectify(args) => {
            run_undistort_rectify(&UndistortRectifyOptions {
                left_calibration: args.left_calibration,
                right_calibration: args.right_calibration,
                stereo_calibration: args.stereo_calibration,
                rectification: args.rectification,
                left_image: args.left_image,
                right_image: args.right_image,
                left_output: args.left_output,
                right_output: args.right_output,
            })?;
        }
        Commands::CheckRectification(args) => {
            run_check_rectification(&CheckRectificationOptions {
                left_calibration: args.left_calibration,
                right_calibration: args.right_calibration,
                stereo_calibration: args.stereo_calibration,
                rectification: args.rectification,
                left_dir: args.left_dir,
                right_dir: args.right_dir,
                extension: args.extension,
                output_dir: args.output_dir,
            })?;
        }
        Commands::ExportOpenvslamMono(args) => {
            run_export_openvslam_mono(&ExportMonoOptions {
                calibration: args.calibration,
                settings: args.settings,
                output_dir: args.output_dir,
            })?;
        }
        Commands::ExportOpenvslamStereo(args) => {
            run_export_openvslam_stereo(&ExportStereoOptions {
                left_calibration: args.left_calibration,
                right_calibration: args.right_calibration,
                rectification: args.rectification,
                settings: args.settings,
                output_dir: args.output_dir,
            })?;
        }
    }
    Ok(())
}

use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use spotkick_core::annotation::infrastructure::role_box_annotator::{
    RoleBoxAnnotator, DEFAULT_LINE_THICKNESS,
};
use spotkick_core::background::infrastructure::hsv_ground_filter::HsvGroundFilter;
use spotkick_core::classification::domain::classifier_config::ClassifierConfig;
use spotkick_core::classification::domain::goalpost::GoalpostRegion;
use spotkick_core::classification::domain::role_classifier::RoleClassifier;
use spotkick_core::classification::infrastructure::fixed_goalpost_locator::FixedGoalpostLocator;
use spotkick_core::pipeline::annotate_image_use_case::AnnotateImageUseCase;
use spotkick_core::pipeline::annotate_video_use_case::AnnotateVideoUseCase;
use spotkick_core::pipeline::frame_processor::FrameProcessor;
use spotkick_core::pipeline::frame_report::{write_report, FrameReport};
use spotkick_core::pipeline::infrastructure::threaded_pipeline_executor::ThreadedPipelineExecutor;
use spotkick_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use spotkick_core::pose::domain::pose_estimator::{PoseEstimator, PoseEstimatorConfig};
use spotkick_core::pose::infrastructure::openpose_json_estimator::OpenPoseJsonEstimator;
use spotkick_core::shared::constants::{DEFAULT_BOX_PADDING, IMAGE_EXTENSIONS};
use spotkick_core::video::domain::video_reader::VideoReader;
use spotkick_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use spotkick_core::video::infrastructure::ffmpeg_writer::FfmpegWriter;
use spotkick_core::video::infrastructure::image_file_reader::ImageFileReader;
use spotkick_core::video::infrastructure::image_file_writer::ImageFileWriter;

/// Labels the striker, goalkeeper and referees in penalty-kick footage.
#[derive(Parser)]
#[command(name = "spotkick")]
struct Cli {
    /// Input video or image file.
    input: PathBuf,

    /// Annotated output file.
    output: PathBuf,

    /// OpenPose `--write_json` directory (videos) or single keypoint file (images).
    #[arg(long)]
    keypoints: PathBuf,

    /// Goal mouth rectangle as x,y,x2,y2 in pixels.
    #[arg(long, default_value = "720,240,1120,520")]
    goalpost: GoalpostRegion,

    /// Margin added around each person's keypoints, in pixels.
    #[arg(long, default_value_t = DEFAULT_BOX_PADDING)]
    padding: f64,

    /// Skip the goalkeeper search; everyone but the striker is a referee.
    #[arg(long)]
    no_goalkeeper: bool,

    /// Black out everything but the pitch before reading keypoints.
    #[arg(long)]
    mask_ground: bool,

    /// Keep at most this many people per frame (0 = no limit).
    #[arg(long, default_value_t = PoseEstimatorConfig::multi_person().max_people)]
    max_people: usize,

    /// First video frame to process.
    #[arg(long, default_value_t = 0)]
    start_frame: usize,

    /// Process every Nth frame.
    #[arg(long, default_value_t = 1)]
    frame_step: usize,

    /// TrueType font for role labels; boxes only when omitted.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Box outline thickness in pixels.
    #[arg(long, default_value_t = DEFAULT_LINE_THICKNESS)]
    line_thickness: u32,

    /// Write a per-frame JSON report here.
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let processor = build_processor(&cli)?;
    let reports = if is_image(&cli.input) {
        vec![run_image(&cli.input, &cli.output, processor)?]
    } else {
        run_video(&cli, processor)?
    };

    if let Some(report_path) = &cli.report {
        write_report(report_path, &reports)?;
    }
    Ok(())
}

fn run_image(
    input: &Path,
    output: &Path,
    processor: FrameProcessor,
) -> Result<FrameReport, Box<dyn std::error::Error>> {
    let mut use_case = AnnotateImageUseCase::new(
        Box::new(ImageFileReader::new()),
        Box::new(ImageFileWriter::new()),
        processor,
    );
    let report = use_case.execute(input, output)?;
    log::info!("Output written to {}", output.display());
    Ok(report)
}

fn run_video(
    cli: &Cli,
    processor: FrameProcessor,
) -> Result<Vec<FrameReport>, Box<dyn std::error::Error>> {
    let mut reader: Box<dyn VideoReader> =
        Box::new(FfmpegReader::new().with_sampling(cli.start_frame, cli.frame_step));
    let metadata = reader.open(&cli.input)?;

    let total = metadata.total_frames;
    let progress: Box<dyn Fn(usize, usize) -> bool + Send> = Box::new(move |current, _| {
        eprint!("\rProcessing frame {current}/{total}");
        true
    });

    let mut use_case = AnnotateVideoUseCase::new(
        reader,
        Box::new(FfmpegWriter::new()),
        processor,
        Box::new(ThreadedPipelineExecutor::new()),
        Box::new(StdoutPipelineLogger::default()),
    )
    .with_progress(progress);
    let reports = use_case.execute(&metadata, &cli.output)?;
    eprintln!();
    log::info!("Output written to {}", cli.output.display());
    Ok(reports)
}

fn build_processor(cli: &Cli) -> Result<FrameProcessor, Box<dyn std::error::Error>> {
    let pose_config = PoseEstimatorConfig {
        max_people: cli.max_people,
    };
    let pose: Box<dyn PoseEstimator> = if cli.keypoints.is_dir() {
        Box::new(OpenPoseJsonEstimator::from_dir(&cli.keypoints, pose_config)?)
    } else {
        Box::new(OpenPoseJsonEstimator::from_file(&cli.keypoints, pose_config))
    };

    let mut annotator = RoleBoxAnnotator::new(cli.line_thickness);
    if let Some(font) = &cli.font {
        annotator = annotator.with_font_file(font)?;
    }

    let classifier = RoleClassifier::new(ClassifierConfig {
        padding: cli.padding,
        ..ClassifierConfig::default()
    });

    let processor = FrameProcessor::new(
        pose,
        Box::new(FixedGoalpostLocator::new(cli.goalpost)),
        Box::new(annotator),
        classifier,
    )
    .with_goalkeeper_detection(!cli.no_goalkeeper);
    Ok(if cli.mask_ground {
        processor.with_background_filter(Box::new(HsvGroundFilter::default()))
    } else {
        processor
    })
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if !cli.keypoints.exists() {
        return Err(format!("Keypoints not found: {}", cli.keypoints.display()).into());
    }
    if is_image(&cli.input) && cli.keypoints.is_dir() {
        return Err("--keypoints must be a single JSON file for image input".into());
    }
    if !cli.padding.is_finite() || cli.padding < 0.0 {
        return Err(format!("Padding must be a non-negative number, got {}", cli.padding).into());
    }
    if cli.frame_step == 0 {
        return Err("--frame-step must be at least 1".into());
    }
    if cli.line_thickness == 0 {
        return Err("--line-thickness must be at least 1".into());
    }
    if is_image(&cli.input) && !is_image(&cli.output) {
        return Err(format!(
            "Output for an image input must be an image, got {}",
            cli.output.display()
        )
        .into());
    }
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use attenda_core::attendance::domain::attendance_log::AttendanceLog;
use attenda_core::attendance::infrastructure::csv_attendance_log::CsvAttendanceLog;
use attenda_core::perception::infrastructure::decimated_perception::DecimatedPerception;
use attenda_core::perception::infrastructure::null_perception::{
    NullFaceDetector, NullFaceRecognizer,
};
use attenda_core::pipeline::controls::PipelineControls;
use attenda_core::pipeline::infrastructure::synthetic_frame_source::SyntheticFrameSource;
use attenda_core::pipeline::infrastructure::threaded_pipeline::{
    PipelineConfig, ThreadedAttendancePipeline,
};
use attenda_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use attenda_core::shared::constants::{DEFAULT_FRAME_SKIP, MAX_FRAME_SKIP, MIN_FRAME_SKIP};
use attenda_core::tracking::infrastructure::image_dir_sample_store::ImageDirSampleStore;
use attenda_core::tracking::spatial_tracker::{SpatialTracker, TrackerConfig};

/// Kiosk attendance pipeline: watches a frame stream, records recognized
/// identities, and collects face samples for everyone else.
#[derive(Parser)]
#[command(name = "attenda")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the attendance pipeline against a synthetic frame source.
    Run(RunArgs),
    /// Print today's attendance summary and exit.
    Stats {
        /// Directory holding the attendance log and face samples.
        #[arg(long, default_value = "attendance_data")]
        data_dir: PathBuf,
    },
}

#[derive(clap::Args)]
struct RunArgs {
    /// Directory for the attendance log and face samples.
    #[arg(long, default_value = "attendance_data")]
    data_dir: PathBuf,

    /// Run perception on every Nth frame (1 = every frame).
    #[arg(long, default_value_t = DEFAULT_FRAME_SKIP)]
    frame_skip: usize,

    /// Matching radius in pixels for session and cooldown lookups.
    #[arg(long, default_value_t = 80.0)]
    radius: f64,

    /// Face samples collected per capture session.
    #[arg(long, default_value_t = 5)]
    samples: usize,

    /// Extract a sample every Nth matched detection.
    #[arg(long, default_value_t = 3)]
    interval: usize,

    /// Seconds of inactivity before a capture session is cancelled.
    #[arg(long, default_value_t = 3)]
    session_timeout: u64,

    /// Seconds before the same screen position may be captured again.
    #[arg(long, default_value_t = 60)]
    capture_cooldown: u64,

    /// Seconds before the same identity may be recorded again.
    #[arg(long, default_value_t = 3600)]
    attendance_cooldown: u64,

    /// Seconds a repeated identity event is absorbed in-process.
    #[arg(long, default_value_t = 5)]
    burst_window: u64,

    /// Synthetic source frame width.
    #[arg(long, default_value_t = 640)]
    width: u32,

    /// Synthetic source frame height.
    #[arg(long, default_value_t = 480)]
    height: u32,

    /// Synthetic source frame rate.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Stop after this many frames (runs until Ctrl-C when omitted).
    #[arg(long)]
    frames: Option<usize>,
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
    match cli.command {
        Command::Run(args) => {
            validate(&args)?;
            run_pipeline(args)
        }
        Command::Stats { data_dir } => print_stats(&data_dir),
    }
}

fn run_pipeline(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let controls = PipelineControls::new(args.frame_skip);

    let interrupt = controls.clone();
    ctrlc::set_handler(move || {
        log::info!("interrupt received, shutting down");
        interrupt.request_stop();
    })?;

    let mut source =
        SyntheticFrameSource::new(args.width, args.height, frame_interval(args.fps));
    if let Some(limit) = args.frames {
        source = source.with_limit(limit);
    }

    let perception = DecimatedPerception::new(
        Box::new(NullFaceDetector),
        Box::new(NullFaceRecognizer),
        controls.frame_skip_handle(),
    );

    let store = ImageDirSampleStore::new(args.data_dir.join("unknown_faces"));
    let tracker = Arc::new(SpatialTracker::new(
        Box::new(store),
        TrackerConfig {
            match_radius: args.radius,
            samples_per_session: args.samples,
            sample_interval: args.interval,
            session_timeout: Duration::from_secs(args.session_timeout),
            capture_cooldown: Duration::from_secs(args.capture_cooldown),
            ..TrackerConfig::default()
        },
    ));

    let log = CsvAttendanceLog::with_cooldown(
        args.data_dir.join("attendance.csv"),
        Duration::from_secs(args.attendance_cooldown),
    )?;

    let mut config = PipelineConfig::new(controls, Box::new(StdoutPipelineLogger::new()));
    config.debounce.burst_window = Duration::from_secs(args.burst_window);

    log::info!(
        "starting pipeline ({}x{} @ {} fps, data in {})",
        args.width,
        args.height,
        args.fps,
        args.data_dir.display()
    );
    ThreadedAttendancePipeline::new().run(
        Box::new(source),
        perception,
        tracker,
        Box::new(log),
        config,
    )?;
    Ok(())
}

fn print_stats(data_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let log = CsvAttendanceLog::new(data_dir.join("attendance.csv"))?;
    let summary = log.today_summary()?;

    println!("Attendance for {}", summary.date);
    println!(
        "  {} records, {} unique",
        summary.total_records, summary.unique_attendees
    );
    for name in &summary.names {
        println!("  {name}");
    }
    Ok(())
}

fn frame_interval(fps: u32) -> Duration {
    Duration::from_secs_f64(1.0 / fps as f64)
}

fn validate(args: &RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !(MIN_FRAME_SKIP..=MAX_FRAME_SKIP).contains(&args.frame_skip) {
        return Err(format!(
            "Frame skip must be between {MIN_FRAME_SKIP} and {MAX_FRAME_SKIP}, got {}",
            args.frame_skip
        )
        .into());
    }
    if args.radius <= 0.0 {
        return Err(format!("Radius must be positive, got {}", args.radius).into());
    }
    if args.samples == 0 {
        return Err("Samples per session must be at least 1".into());
    }
    if args.interval == 0 {
        return Err("Sample interval must be at least 1".into());
    }
    if args.fps == 0 {
        return Err("Frame rate must be at least 1".into());
    }
    Ok(())
}

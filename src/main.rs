use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use rayon::prelude::*;

use signal_hook::consts::{SIGINT, SIGTERM};
use tango_pose::{
    CancelFlag, ClassifyEvent, LandmarkFrame, PoseCatalog, PoseEngine, RecordedDetections,
    WorkerOptions, build_descriptor, config::Config, export, landmarks,
    pipeline::detection_positions, run_video,
};

#[derive(Parser, Debug)]
#[command(
    name = "tango-pose",
    version,
    about = "Dance pose classification from body landmarks"
)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,
    /// Log verbosity level, overrides RUST_LOG.
    #[arg(long, value_enum, global = true)]
    log_level: Option<LogLevel>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify recorded landmark streams and write the encoded pose sequence.
    Classify {
        /// Landmark recordings (JSON lines), one per video.
        #[arg(long = "input", value_name = "FILE", required = true)]
        inputs: Vec<PathBuf>,
        /// Pose catalog, overrides the config.
        #[arg(long, value_name = "FILE")]
        catalog: Option<PathBuf>,
        /// Output directory, overrides the config.
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
        /// Run identifier used in the artifact name.
        #[arg(long)]
        id: Option<String>,
    },
    /// Export per-frame joint angles as JSON.
    Angles {
        #[arg(long, value_name = "FILE")]
        input: PathBuf,
        #[arg(long, value_name = "FILE")]
        output: PathBuf,
    },
    /// Export landmarks in the right-shoulder body frame as JSON.
    Positions {
        #[arg(long, value_name = "FILE")]
        input: PathBuf,
        #[arg(long, value_name = "FILE")]
        output: PathBuf,
    },
    /// Export raw landmarks as animation lines.
    Animation {
        #[arg(long, value_name = "FILE")]
        input: PathBuf,
        /// Destination file, defaults to AnimationFile_<id>.txt in the output directory.
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if let Some(level) = cli.log_level {
        logger.filter_level(level.as_filter());
    }
    logger.init();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    match cli.command {
        Command::Classify {
            inputs,
            catalog,
            output_dir,
            id,
        } => classify(&config, inputs, catalog, output_dir, id),
        Command::Angles { input, output } => export_angles(&config, input, output),
        Command::Positions { input, output } => export_positions(input, output),
        Command::Animation { input, output } => export_animation(&config, input, output),
    }
}

/// Cancel flag raised by SIGINT or SIGTERM. A second SIGINT exits at once.
fn cancel_on_signals() -> Result<CancelFlag> {
    let cancel = CancelFlag::new();
    signal_hook::flag::register_conditional_shutdown(SIGINT, 130, cancel.shared())
        .context("failed to install SIGINT shutdown handler")?;
    for signal in [SIGINT, SIGTERM] {
        signal_hook::flag::register(signal, cancel.shared())
            .with_context(|| format!("failed to install handler for signal {signal}"))?;
    }
    Ok(cancel)
}

fn classify(
    config: &Config,
    inputs: Vec<PathBuf>,
    catalog: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    id: Option<String>,
) -> Result<()> {
    let catalog_path = catalog.unwrap_or_else(|| config.catalog.path.clone());
    let catalog = PoseCatalog::load(&catalog_path)
        .with_context(|| format!("failed to load pose catalog {}", catalog_path.display()))?;
    let engine = PoseEngine::new(catalog);

    let output_dir = output_dir.unwrap_or_else(|| config.output.dir.clone());
    let id = id.unwrap_or_else(export::generate_identifier);
    let options = WorkerOptions {
        scale: config.landmarks.scale,
        queue_depth: config.worker.queue_depth,
    };
    let cancel = cancel_on_signals()?;
    let progress = MultiProgress::new();
    let many = inputs.len() > 1;

    inputs
        .par_iter()
        .enumerate()
        .map(|(n, input)| -> Result<()> {
            let recording = landmarks::read_recording(input)?;
            let bar = progress.add(create_progress_bar(recording.len() as u64));
            bar.set_message(input.display().to_string());

            let classification = run_video(
                &engine,
                RecordedDetections,
                recording,
                options,
                &cancel,
                |event| match event {
                    ClassifyEvent::Classified { .. } | ClassifyEvent::Skipped { .. } => {
                        bar.inc(1)
                    }
                    ClassifyEvent::Finished {
                        classified,
                        skipped,
                    } => bar.finish_with_message(format!(
                        "{}: {classified} poses, {skipped} skipped",
                        input.display()
                    )),
                },
            )
            .with_context(|| format!("failed to classify {}", input.display()))?;

            let run_id = if many { format!("{id}_{n}") } else { id.clone() };
            let dest = export::classification_path(&output_dir, &run_id);
            export::write_artifact(&dest, &classification.encode())?;
            log::info!("{} -> {}", input.display(), dest.display());
            Ok(())
        })
        .collect::<Result<Vec<()>>>()?;

    Ok(())
}

fn load_frames(config: &Config, input: &Path) -> Result<Vec<LandmarkFrame>> {
    let scale = config.landmarks.scale;
    let recording = landmarks::read_recording(input)?;
    Ok(recording
        .into_iter()
        .enumerate()
        .map(|(index, detection)| landmarks::landmarks_or_zeroed(index, Ok(detection), scale))
        .collect())
}

fn export_angles(config: &Config, input: PathBuf, output: PathBuf) -> Result<()> {
    let frames = load_frames(config, &input)?;
    let descriptors: Vec<_> = frames.par_iter().map(build_descriptor).collect();
    export::write_artifact(&output, &export::angles_document(&descriptors)?)
}

fn export_positions(input: PathBuf, output: PathBuf) -> Result<()> {
    let recording = landmarks::read_recording(&input)?;
    let positions: Vec<_> = recording
        .into_par_iter()
        .enumerate()
        .map(|(index, detection)| detection_positions(index, detection))
        .collect();
    export::write_artifact(&output, &export::positions_document(&positions)?)
}

fn export_animation(config: &Config, input: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let recording = landmarks::read_recording(&input)?;
    let output = output.unwrap_or_else(|| {
        config.output.dir.join(export::unique_filename(
            "AnimationFile.txt",
            &export::generate_identifier(),
        ))
    });
    export::write_artifact(&output, &export::animation_document(&recording))
}

fn create_progress_bar(total: u64) -> ProgressBar {
    if total > 0 {
        let pb = ProgressBar::new(total);
        match ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} frames {msg}",
        ) {
            Ok(style) => pb.set_style(style.progress_chars("=>-")),
            Err(err) => log::debug!("progress template rejected: {err}"),
        }
        pb
    } else {
        let pb = ProgressBar::new_spinner();
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }
}

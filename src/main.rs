//! gaze-scanpath CLI
//!
//! Fixation detection and scanpath overlays for eye-tracking research.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use gaze_scanpath::{
    blind::search_blind,
    config::{modes_from_csv, Config},
    core::{
        detect_fixations, group_by_shot, FixationParams, FixationSummary, ScanpathParams,
        Scanpath,
    },
    recording::read_gaze_file,
    report::{create_shared_log_with_persistence, read_persisted},
    stimuli::{RenderOutcome, StimulusRenderer},
    VERSION,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scanpath")]
#[command(version = VERSION)]
#[command(about = "Fixation detection and scanpath overlays for eye-tracking recordings", long_about = None)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render overlays for every stimulus under <directory>/stimuli
    Render {
        /// Recording export directory containing the stimuli folder
        #[arg(long, short)]
        directory: PathBuf,

        /// Overlay modes (gaze, scanpath, mouse, scanpath_mouse or all)
        #[arg(long)]
        modes: Option<String>,

        /// Fixation dispersion threshold in pixels
        #[arg(long)]
        threshold: Option<f64>,

        /// Minimum fixation duration (ms) for index labels
        #[arg(long)]
        annotation_min: Option<i64>,
    },

    /// Detect fixations in a single gaze recording
    Fixations {
        /// Gaze recording (<stimulus>-gaze.csv)
        #[arg(long, short)]
        gaze: PathBuf,

        /// Only this session
        #[arg(long)]
        session: Option<String>,

        /// Only this shot index
        #[arg(long)]
        shot: Option<u32>,

        /// Fixation dispersion threshold in pixels
        #[arg(long)]
        threshold: Option<f64>,

        /// Output format (table or json)
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Check whether a frame is listed as blind for a participant
    Blind {
        /// Shots directory containing the -blind.csv files
        #[arg(long, short)]
        directory: PathBuf,

        /// Frame index
        #[arg(long, short)]
        frame: i64,

        /// Participant prefix (e.g. p1)
        #[arg(long, short)]
        participant: String,
    },

    /// Show cumulative processing statistics
    Stats,

    /// Show configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Render {
            directory,
            modes,
            threshold,
            annotation_min,
        } => cmd_render(config, &directory, modes, threshold, annotation_min),
        Commands::Fixations {
            gaze,
            session,
            shot,
            threshold,
            format,
        } => cmd_fixations(&config, &gaze, session, shot, threshold, &format),
        Commands::Blind {
            directory,
            frame,
            participant,
        } => cmd_blind(&directory, frame, &participant),
        Commands::Stats => cmd_stats(&config),
        Commands::Config => cmd_config(&config, cli.config.as_deref()),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(p) => Config::load_from(p),
        None => Config::load(),
    };
    config.context("could not load configuration")
}

fn cmd_render(
    mut config: Config,
    directory: &Path,
    modes: Option<String>,
    threshold: Option<f64>,
    annotation_min: Option<i64>,
) -> Result<()> {
    if let Some(modes) = modes {
        config.modes = modes_from_csv(&modes)?;
    }
    if let Some(threshold) = threshold {
        config.fixation_threshold = threshold;
    }
    if let Some(annotation_min) = annotation_min {
        config.annotation_min_duration_ms = annotation_min;
    }
    config.validate()?;

    println!("gaze-scanpath v{VERSION}");
    println!();
    println!("Rendering stimuli under {directory:?}");
    println!(
        "  Modes: {}",
        config
            .modes
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("  Fixation threshold: {}px", config.fixation_threshold);
    println!("  Label fixations longer than: {}ms", config.annotation_min_duration_ms);
    println!();

    if let Err(e) = config.ensure_directories() {
        warn!("Could not create data directory: {e}");
    }
    let log = create_shared_log_with_persistence(config.stats_path());

    let renderer = StimulusRenderer::new(&config, log.clone())?;
    info!(instance = %renderer.builder().instance_id(), "renderer ready");

    let reports = renderer
        .render_root(directory)
        .with_context(|| format!("could not render {}", directory.display()))?;

    for report in &reports {
        match &report.outcome {
            RenderOutcome::Written(paths) => {
                for path in paths {
                    println!("Stored: {}", path.display());
                }
                for skipped in &report.skipped_modes {
                    println!(
                        "Skipped {}/{} ({}): {}",
                        report.layer, report.stimulus, skipped.mode, skipped.reason
                    );
                }
            }
            RenderOutcome::Skipped(reason) => {
                println!("Skipped {}/{}: {reason}", report.layer, report.stimulus);
            }
        }
    }

    if let Err(e) = log.save() {
        warn!("Could not save processing stats: {e}");
    }

    println!();
    println!("{}", log.summary());
    Ok(())
}

fn cmd_fixations(
    config: &Config,
    gaze: &Path,
    session: Option<String>,
    shot: Option<u32>,
    threshold: Option<f64>,
    format: &str,
) -> Result<()> {
    let params = FixationParams::new(threshold.unwrap_or(config.fixation_threshold))?;
    let scanpath_params = ScanpathParams {
        annotation_min_duration: config.annotation_min_duration_ms,
    };

    let samples = read_gaze_file(gaze)?;
    let groups: Vec<_> = group_by_shot(samples)
        .into_iter()
        .filter(|g| session.as_deref().map_or(true, |s| g.session == s))
        .filter(|g| shot.map_or(true, |s| g.shot == s))
        .collect();

    if groups.is_empty() {
        bail!("no gaze samples match the selected session/shot");
    }

    let mut results = Vec::with_capacity(groups.len());
    for group in &groups {
        let fixations = detect_fixations(&group.timestamps(), &group.xs(), &group.ys(), &params)
            .with_context(|| format!("session {} shot {}", group.session, group.shot))?;
        results.push((group, fixations));
    }

    match format {
        "json" => {
            let documents: Vec<serde_json::Value> = results
                .iter()
                .map(|(group, fixations)| {
                    serde_json::json!({
                        "session": group.session,
                        "shot": group.shot,
                        "fixations": fixations,
                        "scanpath": Scanpath::from_fixations(fixations, &scanpath_params),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&documents)?);
        }
        "table" => {
            for (group, fixations) in &results {
                let summary = FixationSummary::from_fixations(fixations);
                println!(
                    "Session {} shot {}: {} samples, {} fixations (mean {:.1}ms, sd {:.1}ms)",
                    group.session,
                    group.shot,
                    group.samples.len(),
                    summary.count,
                    summary.mean_duration,
                    summary.std_dev_duration
                );
                println!("  {:>4} {:>10} {:>10} {:>10} {:>8}", "#", "duration", "x", "y", "samples");
                for (idx, f) in fixations.iter().enumerate() {
                    println!(
                        "  {:>4} {:>10} {:>10.1} {:>10.1} {:>8}",
                        idx, f.duration, f.x, f.y, f.sample_count
                    );
                }
                println!();
            }
        }
        other => bail!("unknown format '{other}' (expected table or json)"),
    }

    Ok(())
}

fn cmd_blind(directory: &Path, frame: i64, participant: &str) -> Result<()> {
    let hits = search_blind(directory, frame, participant)?;
    if hits.is_empty() {
        println!("Frame {frame} is not blind for {participant}.");
    }
    for hit in hits {
        println!("Blind! See at {} (line {})", hit.file.display(), hit.line);
    }
    Ok(())
}

fn cmd_stats(config: &Config) -> Result<()> {
    println!("gaze-scanpath Statistics");
    println!("========================");
    println!();

    let stats_path = config.stats_path();
    if !stats_path.exists() {
        println!("No previous render data found.");
        return Ok(());
    }

    let stats = read_persisted(&stats_path)
        .with_context(|| format!("could not read {}", stats_path.display()))?;
    println!("Cumulative Statistics:");
    println!("  Stimuli rendered: {}", stats.stimuli_rendered);
    println!("  Stimuli skipped: {}", stats.stimuli_skipped);
    println!("  Gaze samples: {}", stats.gaze_samples);
    println!("  Mouse samples: {}", stats.mouse_samples);
    println!("  Fixations detected: {}", stats.fixations_detected);
    println!("  Overlays written: {}", stats.overlays_written);
    println!("  Last updated: {}", stats.last_updated.format("%Y-%m-%d %H:%M:%S"));
    Ok(())
}

fn cmd_config(config: &Config, path: Option<&Path>) -> Result<()> {
    println!("Configuration");
    println!("=============");
    println!();
    let shown = path.map(Path::to_path_buf).unwrap_or_else(Config::config_path);
    println!("Config file: {shown:?}");
    println!();
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

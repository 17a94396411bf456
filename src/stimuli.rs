//! Stimuli discovery and batch overlay rendering.
//!
//! A recording export is laid out as
//!
//! ```text
//! <root>/stimuli/<layer>/<stimulus>.png
//! <root>/stimuli/<layer>/<stimulus>-gaze.csv
//! <root>/stimuli/<layer>/<stimulus>-mouse.csv
//! ```
//!
//! Every stimulus of every layer is rendered in each configured mode into
//! `<root>/stimuli/<layer>/<plots_folder>/<stimulus>-<mode>.json`. Modes are
//! rendered independently, so a missing mouse recording still leaves the gaze
//! overlays. A stimulus with nothing to show is logged and skipped; the batch
//! carries on.

use crate::config::Config;
use crate::core::fixation::FixationError;
use crate::core::grouping::{group_by_shot, ShotGroup};
use crate::core::overlay::{OverlayBuilder, OverlayMode, StimulusInfo};
use crate::recording::reader::{read_gaze_file, read_mouse_file, RecordingError};
use crate::recording::types::{GazeSample, MouseSample};
use crate::report::SharedProcessingLog;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Name of the directory under the export root that holds the layers.
pub const STIMULI_DIR: &str = "stimuli";

/// Errors that can occur while rendering stimuli.
#[derive(Debug, Clone)]
pub enum RenderError {
    IoError(String),
    MissingStimuliDir(PathBuf),
    Image { path: PathBuf, message: String },
    TooLarge { width: u32, height: u32, max: u32 },
    Recording(RecordingError),
    Fixation(FixationError),
    SerializeError(String),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::IoError(e) => write!(f, "IO error: {e}"),
            RenderError::MissingStimuliDir(p) => {
                write!(f, "No stimuli directory at {}", p.display())
            }
            RenderError::Image { path, message } => {
                write!(f, "Could not read image {}: {message}", path.display())
            }
            RenderError::TooLarge { width, height, max } => {
                write!(f, "Image is too big to process ({width}x{height}, max {max})")
            }
            RenderError::Recording(e) => write!(f, "Recording error: {e}"),
            RenderError::Fixation(e) => write!(f, "Fixation error: {e}"),
            RenderError::SerializeError(e) => write!(f, "Serialize error: {e}"),
        }
    }
}

impl std::error::Error for RenderError {}

impl From<RecordingError> for RenderError {
    fn from(e: RecordingError) -> Self {
        RenderError::Recording(e)
    }
}

impl From<FixationError> for RenderError {
    fn from(e: FixationError) -> Self {
        RenderError::Fixation(e)
    }
}

/// What happened to one stimulus.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    /// At least one overlay file written
    Written(Vec<PathBuf>),
    /// Nothing written, with the reason
    Skipped(String),
}

/// A mode that could not be rendered for a stimulus.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedMode {
    pub mode: OverlayMode,
    pub reason: String,
}

/// Overlays produced for one stimulus.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StimulusOverlays {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<SkippedMode>,
}

/// Result of rendering one stimulus.
#[derive(Debug, Clone, PartialEq)]
pub struct StimulusReport {
    pub layer: String,
    pub stimulus: String,
    pub outcome: RenderOutcome,
    /// Modes left out even though the stimulus itself was readable
    pub skipped_modes: Vec<SkippedMode>,
}

/// List the layer directories under `<root>/stimuli`, sorted by name.
pub fn discover_layers(root: &Path) -> Result<Vec<PathBuf>, RenderError> {
    let stimuli_dir = root.join(STIMULI_DIR);
    if !stimuli_dir.is_dir() {
        return Err(RenderError::MissingStimuliDir(stimuli_dir));
    }

    let mut layers: Vec<PathBuf> = std::fs::read_dir(&stimuli_dir)
        .map_err(|e| RenderError::IoError(e.to_string()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    layers.sort();
    Ok(layers)
}

/// List the stimulus names (PNG file stems) in a layer directory, sorted.
pub fn discover_stimuli(layer_dir: &Path) -> Result<Vec<String>, RenderError> {
    let mut stimuli: Vec<String> = std::fs::read_dir(layer_dir)
        .map_err(|e| RenderError::IoError(e.to_string()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| p.extension().map(|e| e == "png").unwrap_or(false))
        .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .collect();
    stimuli.sort();
    Ok(stimuli)
}

/// Renders overlay documents for stimuli.
pub struct StimulusRenderer {
    builder: OverlayBuilder,
    modes: Vec<OverlayMode>,
    plots_folder: String,
    max_image_dimension: u32,
    log: SharedProcessingLog,
}

impl StimulusRenderer {
    /// Create a renderer from a validated configuration.
    pub fn new(config: &Config, log: SharedProcessingLog) -> Result<Self, crate::ConfigError> {
        config.validate()?;
        Ok(Self {
            builder: OverlayBuilder::new(config.fixation_params()?, config.scanpath_params()),
            modes: config.modes.clone(),
            plots_folder: config.plots_folder.clone(),
            max_image_dimension: config.max_image_dimension,
            log,
        })
    }

    pub fn builder(&self) -> &OverlayBuilder {
        &self.builder
    }

    /// Render every layer under `<root>/stimuli`.
    pub fn render_root(&self, root: &Path) -> Result<Vec<StimulusReport>, RenderError> {
        let mut reports = Vec::new();
        for layer_dir in discover_layers(root)? {
            reports.extend(self.render_layer(&layer_dir)?);
        }
        Ok(reports)
    }

    /// Render every stimulus in one layer directory.
    pub fn render_layer(&self, layer_dir: &Path) -> Result<Vec<StimulusReport>, RenderError> {
        let layer = layer_name(layer_dir);
        let stimuli = discover_stimuli(layer_dir)?;
        info!(layer = %layer, stimuli = stimuli.len(), "rendering layer");

        let reports = stimuli
            .into_iter()
            .map(|stimulus| {
                let (outcome, skipped_modes) = match self.render_stimulus(layer_dir, &stimulus) {
                    Ok(overlays) if !overlays.written.is_empty() => {
                        self.log.record_stimulus_rendered();
                        (RenderOutcome::Written(overlays.written), overlays.skipped)
                    }
                    Ok(overlays) => {
                        let reason = overlays
                            .skipped
                            .iter()
                            .map(|s| format!("{}: {}", s.mode, s.reason))
                            .collect::<Vec<_>>()
                            .join("; ");
                        warn!(layer = %layer, stimulus = %stimulus, "skipping stimulus: {reason}");
                        self.log.record_stimulus_skipped();
                        (RenderOutcome::Skipped(reason), overlays.skipped)
                    }
                    Err(e) => {
                        warn!(layer = %layer, stimulus = %stimulus, "skipping stimulus: {e}");
                        self.log.record_stimulus_skipped();
                        (RenderOutcome::Skipped(e.to_string()), Vec::new())
                    }
                };
                StimulusReport {
                    layer: layer.clone(),
                    stimulus,
                    outcome,
                    skipped_modes,
                }
            })
            .collect();

        Ok(reports)
    }

    /// Render one stimulus in every configured mode.
    ///
    /// Each mode is rendered on its own: a mode whose recording is missing
    /// or malformed is reported in [`StimulusOverlays::skipped`] and the
    /// other modes are still written. Errors are returned only when the
    /// stimulus image or the plots folder is unusable.
    pub fn render_stimulus(
        &self,
        layer_dir: &Path,
        stimulus: &str,
    ) -> Result<StimulusOverlays, RenderError> {
        let plots_dir = layer_dir.join(&self.plots_folder);
        std::fs::create_dir_all(&plots_dir)
            .map_err(|e| RenderError::IoError(format!("{}: {e}", plots_dir.display())))?;

        let (width, height) = self.check_image(&layer_dir.join(format!("{stimulus}.png")))?;
        let info = StimulusInfo {
            layer: layer_name(layer_dir),
            name: stimulus.to_string(),
            width,
            height,
        };

        let gaze = self
            .modes
            .iter()
            .any(OverlayMode::needs_gaze)
            .then(|| self.load_gaze(layer_dir, stimulus));
        let mouse = self
            .modes
            .iter()
            .any(OverlayMode::needs_mouse)
            .then(|| self.load_mouse(layer_dir, stimulus));

        let mut overlays = StimulusOverlays::default();
        let mut fixations_counted = false;

        for &mode in &self.modes {
            match self.write_overlay(&plots_dir, &info, mode, &gaze, &mouse) {
                Ok((path, fixation_count)) => {
                    // Scanpath modes share the same fixations; count them once
                    if mode.needs_scanpath() && !fixations_counted {
                        self.log.record_fixations(fixation_count as u64);
                        fixations_counted = true;
                    }
                    self.log.record_overlay_written();
                    overlays.written.push(path);
                }
                Err(e) => {
                    warn!(stimulus = %stimulus, mode = %mode, "skipping mode: {e}");
                    overlays.skipped.push(SkippedMode {
                        mode,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(overlays)
    }

    fn load_gaze(
        &self,
        layer_dir: &Path,
        stimulus: &str,
    ) -> Result<Vec<ShotGroup<GazeSample>>, RenderError> {
        let samples = read_gaze_file(&layer_dir.join(format!("{stimulus}-gaze.csv")))?;
        self.log.record_gaze_samples(samples.len() as u64);
        Ok(group_by_shot(samples))
    }

    fn load_mouse(
        &self,
        layer_dir: &Path,
        stimulus: &str,
    ) -> Result<Vec<ShotGroup<MouseSample>>, RenderError> {
        let samples = read_mouse_file(&layer_dir.join(format!("{stimulus}-mouse.csv")))?;
        self.log.record_mouse_samples(samples.len() as u64);
        Ok(group_by_shot(samples))
    }

    /// Build and store one overlay document, returning its path and
    /// fixation count. Nothing is written unless the document builds.
    fn write_overlay(
        &self,
        plots_dir: &Path,
        info: &StimulusInfo,
        mode: OverlayMode,
        gaze: &Option<Result<Vec<ShotGroup<GazeSample>>, RenderError>>,
        mouse: &Option<Result<Vec<ShotGroup<MouseSample>>, RenderError>>,
    ) -> Result<(PathBuf, usize), RenderError> {
        let gaze = loaded(gaze, mode.needs_gaze())?;
        let mouse = loaded(mouse, mode.needs_mouse())?;
        let document = self.builder.build(info.clone(), mode, gaze, mouse)?;

        let json = serde_json::to_string_pretty(&document)
            .map_err(|e| RenderError::SerializeError(e.to_string()))?;
        let path = plots_dir.join(format!("{}-{mode}.json", info.name));
        std::fs::write(&path, json)
            .map_err(|e| RenderError::IoError(format!("{}: {e}", path.display())))?;

        info!(path = %path.display(), shots = document.shots.len(), "stored overlay");
        Ok((path, document.fixation_count()))
    }

    fn check_image(&self, path: &Path) -> Result<(u32, u32), RenderError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| RenderError::Image {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        debug!(path = %path.display(), width, height, "stimulus dimensions");

        if width > self.max_image_dimension || height > self.max_image_dimension {
            return Err(RenderError::TooLarge {
                width,
                height,
                max: self.max_image_dimension,
            });
        }
        Ok((width, height))
    }
}

/// The loaded groups a mode needs, or the error that kept them from loading.
fn loaded<T>(
    recording: &Option<Result<Vec<T>, RenderError>>,
    needed: bool,
) -> Result<&[T], RenderError> {
    match recording {
        Some(Ok(groups)) if needed => Ok(groups.as_slice()),
        Some(Err(e)) if needed => Err(e.clone()),
        _ => Ok(&[]),
    }
}

fn layer_name(layer_dir: &Path) -> String {
    layer_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::create_shared_log;

    fn write_png(path: &Path, width: u32, height: u32) {
        image::RgbImage::new(width, height).save(path).unwrap();
    }

    #[test]
    fn test_discover_stimuli_filters_png() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("b.png"), 2, 2);
        write_png(&dir.path().join("a.png"), 2, 2);
        std::fs::write(dir.path().join("a-gaze.csv"), "h\n").unwrap();
        std::fs::create_dir(dir.path().join("plots.png")).unwrap();

        let stimuli = discover_stimuli(dir.path()).unwrap();
        assert_eq!(stimuli, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_missing_stimuli_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            discover_layers(dir.path()),
            Err(RenderError::MissingStimuliDir(_))
        ));
    }

    #[test]
    fn test_oversized_image_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("wide.png"), 8, 2);

        let config = Config {
            max_image_dimension: 4,
            ..Config::default()
        };
        let log = create_shared_log();
        let renderer = StimulusRenderer::new(&config, log.clone()).unwrap();
        let reports = renderer.render_layer(dir.path()).unwrap();

        assert_eq!(reports.len(), 1);
        match &reports[0].outcome {
            RenderOutcome::Skipped(reason) => assert!(reason.contains("too big")),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(log.stats().stimuli_skipped, 1);
    }

    #[test]
    fn test_missing_recording_skips_stimulus() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("s.png"), 4, 4);

        let log = create_shared_log();
        let renderer = StimulusRenderer::new(&Config::default(), log.clone()).unwrap();
        let reports = renderer.render_layer(dir.path()).unwrap();

        assert!(matches!(reports[0].outcome, RenderOutcome::Skipped(_)));
        assert!(dir.path().join("plots").is_dir());
        assert_eq!(log.stats().overlays_written, 0);
    }

    #[test]
    fn test_modes_render_independently() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("s.png"), 4, 4);
        std::fs::write(
            dir.path().join("s-gaze.csv"),
            "session,intra_idx,timestamp,x,y\np1_a,0,0,1,1\np1_a,0,10,2,2\n",
        )
        .unwrap();

        let config = Config {
            modes: vec![OverlayMode::Gaze, OverlayMode::Mouse],
            ..Config::default()
        };
        let log = create_shared_log();
        let renderer = StimulusRenderer::new(&config, log.clone()).unwrap();
        let reports = renderer.render_layer(dir.path()).unwrap();

        let gaze_path = dir.path().join("plots").join("s-gaze.json");
        assert_eq!(reports[0].outcome, RenderOutcome::Written(vec![gaze_path.clone()]));
        assert!(gaze_path.exists());
        assert!(!dir.path().join("plots").join("s-mouse.json").exists());
        assert_eq!(reports[0].skipped_modes.len(), 1);
        assert_eq!(reports[0].skipped_modes[0].mode, OverlayMode::Mouse);

        let stats = log.stats();
        assert_eq!(stats.stimuli_rendered, 1);
        assert_eq!(stats.stimuli_skipped, 0);
        assert_eq!(stats.overlays_written, 1);
    }

    #[test]
    fn test_failed_mode_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("s.png"), 4, 4);
        // Timestamps go backwards, so fixation detection fails
        std::fs::write(
            dir.path().join("s-gaze.csv"),
            "session,intra_idx,timestamp,x,y\np1_a,0,10,1,1\np1_a,0,0,2,2\n",
        )
        .unwrap();

        let config = Config {
            modes: vec![OverlayMode::Scanpath],
            ..Config::default()
        };
        let log = create_shared_log();
        let renderer = StimulusRenderer::new(&config, log.clone()).unwrap();
        let reports = renderer.render_layer(dir.path()).unwrap();

        assert!(matches!(reports[0].outcome, RenderOutcome::Skipped(_)));
        assert!(!dir.path().join("plots").join("s-scanpath.json").exists());

        let stats = log.stats();
        assert_eq!(stats.stimuli_rendered, 0);
        assert_eq!(stats.stimuli_skipped, 1);
        assert_eq!(stats.overlays_written, 0);
        assert_eq!(stats.fixations_detected, 0);
    }

    #[test]
    fn test_report_matches_files_when_later_mode_fails() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("s.png"), 4, 4);
        std::fs::write(
            dir.path().join("s-gaze.csv"),
            "session,intra_idx,timestamp,x,y\np1_a,0,10,1,1\np1_a,0,0,2,2\n",
        )
        .unwrap();

        let config = Config {
            modes: vec![OverlayMode::Gaze, OverlayMode::Scanpath],
            ..Config::default()
        };
        let log = create_shared_log();
        let renderer = StimulusRenderer::new(&config, log.clone()).unwrap();
        let reports = renderer.render_layer(dir.path()).unwrap();

        let plots = dir.path().join("plots");
        let written = match &reports[0].outcome {
            RenderOutcome::Written(paths) => paths.clone(),
            other => panic!("unexpected outcome: {other:?}"),
        };
        assert_eq!(written, vec![plots.join("s-gaze.json")]);
        assert!(plots.join("s-gaze.json").exists());
        assert!(!plots.join("s-scanpath.json").exists());
        assert_eq!(reports[0].skipped_modes[0].mode, OverlayMode::Scanpath);

        let stats = log.stats();
        assert_eq!(stats.stimuli_rendered, 1);
        assert_eq!(stats.stimuli_skipped, 0);
        assert_eq!(stats.overlays_written, 1);
    }
}

//! Overlay document builder.
//!
//! An overlay document holds everything needed to draw one stimulus in one
//! mode: the stimulus metadata plus, per session and shot, the raw gaze
//! points, the scanpath and the mouse trace. Documents are written as JSON
//! next to the stimulus.

use crate::core::fixation::{detect_fixations, FixationError, FixationParams};
use crate::core::grouping::ShotGroup;
use crate::core::palette::{colors_for, ParticipantColors};
use crate::core::scanpath::{gaze_points, MouseTrace, Point, Scanpath, ScanpathParams};
use crate::recording::types::{GazeSample, MouseSample};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;
use uuid::Uuid;

/// The current overlay document format version.
pub const OVERLAY_FORMAT_VERSION: &str = "1.0";

/// The name of this producer.
pub const PRODUCER_NAME: &str = "gaze-scanpath";

/// What an overlay shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayMode {
    /// Raw gaze samples
    Gaze,
    /// Fixations and saccades
    Scanpath,
    /// Mouse movements and clicks
    Mouse,
    /// Scanpath and mouse together
    ScanpathMouse,
}

impl OverlayMode {
    pub const ALL: [OverlayMode; 4] = [
        OverlayMode::Gaze,
        OverlayMode::Scanpath,
        OverlayMode::Mouse,
        OverlayMode::ScanpathMouse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OverlayMode::Gaze => "gaze",
            OverlayMode::Scanpath => "scanpath",
            OverlayMode::Mouse => "mouse",
            OverlayMode::ScanpathMouse => "scanpath_mouse",
        }
    }

    pub fn needs_gaze(&self) -> bool {
        matches!(
            self,
            OverlayMode::Gaze | OverlayMode::Scanpath | OverlayMode::ScanpathMouse
        )
    }

    pub fn needs_scanpath(&self) -> bool {
        matches!(self, OverlayMode::Scanpath | OverlayMode::ScanpathMouse)
    }

    pub fn needs_mouse(&self) -> bool {
        matches!(self, OverlayMode::Mouse | OverlayMode::ScanpathMouse)
    }
}

impl fmt::Display for OverlayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OverlayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OverlayMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| {
                format!("unknown overlay mode '{s}' (expected gaze, scanpath, mouse or scanpath_mouse)")
            })
    }
}

/// Producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayProducer {
    pub name: String,
    pub version: String,
    /// Unique instance identifier (UUID)
    pub instance_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

/// Stimulus the overlay is drawn on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StimulusInfo {
    pub layer: String,
    pub name: String,
    pub width: u32,
    pub height: u32,
}

/// Everything drawn for one shot of one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShotOverlay {
    pub session: String,
    pub participant: String,
    pub shot: u32,
    pub colors: ParticipantColors,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gaze_points: Option<Vec<Point>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scanpath: Option<Scanpath>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mouse: Option<MouseTrace>,
}

/// Overlay document for one stimulus and mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayDocument {
    pub format_version: String,
    /// When this document was computed (RFC3339)
    pub computed_at_utc: String,
    pub producer: OverlayProducer,
    pub stimulus: StimulusInfo,
    pub mode: OverlayMode,
    /// Fixation dispersion threshold used for the scanpath
    pub fixation_threshold: f64,
    pub shots: Vec<ShotOverlay>,
}

impl OverlayDocument {
    pub fn fixation_count(&self) -> usize {
        self.shots
            .iter()
            .filter_map(|s| s.scanpath.as_ref())
            .map(|s| s.fixations.len())
            .sum()
    }
}

/// Builder for overlay documents.
pub struct OverlayBuilder {
    instance_id: Uuid,
    host: Option<String>,
    fixation: FixationParams,
    scanpath: ScanpathParams,
}

impl OverlayBuilder {
    /// Create a new builder with a unique instance ID.
    pub fn new(fixation: FixationParams, scanpath: ScanpathParams) -> Self {
        Self {
            instance_id: Uuid::new_v4(),
            host: hostname::get()
                .ok()
                .map(|h| h.to_string_lossy().into_owned()),
            fixation,
            scanpath,
        }
    }

    /// Get the instance ID.
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Build the document for one stimulus.
    ///
    /// Shots present only in the gaze or only in the mouse recording each
    /// get their own entry; gaze shots come first.
    pub fn build(
        &self,
        stimulus: StimulusInfo,
        mode: OverlayMode,
        gaze: &[ShotGroup<GazeSample>],
        mouse: &[ShotGroup<MouseSample>],
    ) -> Result<OverlayDocument, FixationError> {
        let mut shots: Vec<ShotOverlay> = Vec::new();

        if mode.needs_gaze() {
            for group in gaze {
                let mut overlay = self.empty_shot(&group.session, group.shot);
                if mode == OverlayMode::Gaze {
                    overlay.gaze_points = Some(gaze_points(&group.samples));
                }
                if mode.needs_scanpath() {
                    let fixations = detect_fixations(
                        &group.timestamps(),
                        &group.xs(),
                        &group.ys(),
                        &self.fixation,
                    )?;
                    overlay.scanpath = Some(Scanpath::from_fixations(&fixations, &self.scanpath));
                }
                shots.push(overlay);
            }
        }

        if mode.needs_mouse() {
            for group in mouse {
                let trace = MouseTrace::from_samples(&group.samples);
                match shots
                    .iter_mut()
                    .find(|s| s.session == group.session && s.shot == group.shot)
                {
                    Some(existing) => existing.mouse = Some(trace),
                    None => {
                        let mut overlay = self.empty_shot(&group.session, group.shot);
                        overlay.mouse = Some(trace);
                        shots.push(overlay);
                    }
                }
            }
        }

        Ok(OverlayDocument {
            format_version: OVERLAY_FORMAT_VERSION.to_string(),
            computed_at_utc: Utc::now().to_rfc3339(),
            producer: OverlayProducer {
                name: PRODUCER_NAME.to_string(),
                version: crate::VERSION.to_string(),
                instance_id: self.instance_id.to_string(),
                host: self.host.clone(),
            },
            stimulus,
            mode,
            fixation_threshold: self.fixation.threshold(),
            shots,
        })
    }

    fn empty_shot(&self, session: &str, shot: u32) -> ShotOverlay {
        let participant = crate::core::grouping::participant_of(session).to_string();
        let (colors, fallback) = colors_for(&participant);
        if fallback {
            warn!(participant = %participant, session, "participant not in palette, using grey");
        }
        ShotOverlay {
            session: session.to_string(),
            participant,
            shot,
            colors,
            gaze_points: None,
            scanpath: None,
            mouse: None,
        }
    }
}

impl Default for OverlayBuilder {
    fn default() -> Self {
        Self::new(FixationParams::default(), ScanpathParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grouping::group_by_shot;
    use crate::recording::types::MouseEventKind;

    fn stimulus() -> StimulusInfo {
        StimulusInfo {
            layer: "0_html".to_string(),
            name: "shot_1".to_string(),
            width: 800,
            height: 600,
        }
    }

    fn gaze() -> Vec<ShotGroup<GazeSample>> {
        group_by_shot(vec![
            GazeSample::new("p1_a", 0, 0, 10.0, 10.0),
            GazeSample::new("p1_a", 0, 150, 12.0, 11.0),
            GazeSample::new("p1_a", 0, 300, 400.0, 300.0),
            GazeSample::new("p2_b", 0, 0, 50.0, 50.0),
        ])
    }

    fn mouse() -> Vec<ShotGroup<MouseSample>> {
        group_by_shot(vec![
            MouseSample::new("p1_a", 0, 0, 0.0, 0.0, MouseEventKind::Move),
            MouseSample::new("p1_a", 0, 10, 20.0, 0.0, MouseEventKind::Click),
            MouseSample::new("p3_c", 1, 0, 5.0, 5.0, MouseEventKind::Move),
        ])
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("scanpath_mouse".parse::<OverlayMode>(), Ok(OverlayMode::ScanpathMouse));
        assert_eq!("Gaze".parse::<OverlayMode>(), Ok(OverlayMode::Gaze));
        assert!("heatmap".parse::<OverlayMode>().is_err());
        assert_eq!(OverlayMode::Mouse.to_string(), "mouse");
    }

    #[test]
    fn test_scanpath_mouse_document() {
        let builder = OverlayBuilder::default();
        let doc = builder
            .build(stimulus(), OverlayMode::ScanpathMouse, &gaze(), &mouse())
            .unwrap();

        assert_eq!(doc.format_version, OVERLAY_FORMAT_VERSION);
        assert_eq!(doc.producer.instance_id, builder.instance_id().to_string());
        assert_eq!(doc.shots.len(), 3);

        let p1 = &doc.shots[0];
        assert_eq!(p1.participant, "p1");
        assert_eq!(p1.colors.normal, "#d7191c");
        let scanpath = p1.scanpath.as_ref().unwrap();
        assert_eq!(scanpath.fixations.len(), 2);
        assert_eq!(scanpath.labels.len(), 1);
        assert_eq!(p1.mouse.as_ref().unwrap().clicks.len(), 1);
        assert!(p1.gaze_points.is_none());

        // Mouse-only shot gets its own entry
        assert_eq!(doc.shots[2].session, "p3_c");
        assert!(doc.shots[2].scanpath.is_none());
        assert_eq!(doc.fixation_count(), 3);
    }

    #[test]
    fn test_gaze_mode_has_points_only() {
        let doc = OverlayBuilder::default()
            .build(stimulus(), OverlayMode::Gaze, &gaze(), &mouse())
            .unwrap();
        assert_eq!(doc.shots.len(), 2);
        assert_eq!(doc.shots[0].gaze_points.as_ref().unwrap().len(), 3);
        assert!(doc.shots.iter().all(|s| s.scanpath.is_none() && s.mouse.is_none()));
    }

    #[test]
    fn test_document_serializes_mode_in_snake_case() {
        let doc = OverlayBuilder::default()
            .build(stimulus(), OverlayMode::Mouse, &[], &mouse())
            .unwrap();
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["mode"], "mouse");
        assert_eq!(json["stimulus"]["width"], 800);
        assert!(json["shots"][0].get("scanpath").is_none());
    }

    #[test]
    fn test_decreasing_gaze_timestamps_fail() {
        let bad = group_by_shot(vec![
            GazeSample::new("p1_a", 0, 10, 0.0, 0.0),
            GazeSample::new("p1_a", 0, 5, 0.0, 0.0),
        ]);
        let result = OverlayBuilder::default().build(stimulus(), OverlayMode::Scanpath, &bad, &[]);
        assert!(matches!(result, Err(FixationError::InvalidInput(_))));
    }
}

//! Scanpath and mouse-trace derivation.
//!
//! This module turns detected fixations and raw mouse samples into the
//! drawable primitives of an overlay: fixation markers, saccade segments,
//! index labels, movement segments and click points. Nothing is rasterised
//! here.

use crate::core::fixation::Fixations;
use crate::recording::types::{GazeSample, MouseSample};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Default minimum duration (ms) for a fixation to get an index label.
pub const DEFAULT_ANNOTATION_MIN_DURATION: i64 = 100;

/// Marker area per millisecond of fixation duration.
const MARKER_SIZE_PER_MS: f64 = 8.0;

/// Parameters for scanpath derivation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanpathParams {
    /// Fixations longer than this get their index drawn
    pub annotation_min_duration: i64,
}

impl Default for ScanpathParams {
    fn default() -> Self {
        Self {
            annotation_min_duration: DEFAULT_ANNOTATION_MIN_DURATION,
        }
    }
}

/// A point in stimulus coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A line segment between two points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
}

impl Segment {
    /// Build a segment, or `None` if both ends coincide.
    fn between(from: Point, to: Point) -> Option<Self> {
        if to.x - from.x == 0.0 && to.y - from.y == 0.0 {
            None
        } else {
            Some(Self { from, to })
        }
    }

    pub fn length(&self) -> f64 {
        ((self.to.x - self.from.x).powi(2) + (self.to.y - self.from.y).powi(2)).sqrt()
    }
}

/// A fixation marker sized by its duration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixationMarker {
    pub index: usize,
    pub position: Point,
    pub duration: i64,
    pub size: f64,
}

/// An index label drawn on top of a long fixation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixationLabel {
    pub text: String,
    pub position: Point,
}

/// Duration statistics over one shot's fixations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FixationSummary {
    pub count: usize,
    pub total_duration: i64,
    pub mean_duration: f64,
    /// Sample standard deviation (0 with fewer than two fixations)
    pub std_dev_duration: f64,
    pub max_duration: i64,
}

impl FixationSummary {
    pub fn from_fixations(fixations: &Fixations) -> Self {
        if fixations.is_empty() {
            return Self::default();
        }

        let durations: Vec<f64> = fixations.durations.iter().map(|&d| d as f64).collect();
        let std_dev_duration = if durations.len() < 2 {
            0.0
        } else {
            durations.iter().std_dev()
        };

        Self {
            count: fixations.len(),
            total_duration: fixations.durations.iter().sum(),
            mean_duration: durations.iter().mean(),
            std_dev_duration,
            max_duration: Iterator::max(fixations.durations.iter().copied()).unwrap_or(0),
        }
    }
}

/// Drawable scanpath for one shot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scanpath {
    pub fixations: Vec<FixationMarker>,
    pub saccades: Vec<Segment>,
    pub labels: Vec<FixationLabel>,
    pub summary: FixationSummary,
}

impl Scanpath {
    /// Derive markers, saccades and labels from detected fixations.
    pub fn from_fixations(fixations: &Fixations, params: &ScanpathParams) -> Self {
        let markers: Vec<FixationMarker> = fixations
            .iter()
            .enumerate()
            .map(|(index, f)| FixationMarker {
                index,
                position: Point::new(f.x, f.y),
                duration: f.duration,
                size: MARKER_SIZE_PER_MS * f.duration as f64,
            })
            .collect();

        let saccades = markers
            .windows(2)
            .filter_map(|pair| Segment::between(pair[0].position, pair[1].position))
            .collect();

        let labels = markers
            .iter()
            .filter(|m| m.duration > params.annotation_min_duration)
            .map(|m| FixationLabel {
                text: m.index.to_string(),
                position: m.position,
            })
            .collect();

        Self {
            fixations: markers,
            saccades,
            labels,
            summary: FixationSummary::from_fixations(fixations),
        }
    }
}

/// Drawable mouse trace for one shot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MouseTrace {
    /// Movement between consecutive samples, clicks included
    pub movements: Vec<Segment>,
    pub clicks: Vec<Point>,
}

impl MouseTrace {
    pub fn from_samples(samples: &[MouseSample]) -> Self {
        let movements = samples
            .windows(2)
            .filter_map(|pair| {
                Segment::between(
                    Point::new(pair[0].x, pair[0].y),
                    Point::new(pair[1].x, pair[1].y),
                )
            })
            .collect();

        let clicks = samples
            .iter()
            .filter(|s| s.event.is_click())
            .map(|s| Point::new(s.x, s.y))
            .collect();

        Self { movements, clicks }
    }

    /// Total distance travelled by the cursor.
    pub fn path_length(&self) -> f64 {
        self.movements.iter().map(Segment::length).sum()
    }
}

/// Raw gaze positions of one shot.
pub fn gaze_points(samples: &[GazeSample]) -> Vec<Point> {
    samples.iter().map(|s| Point::new(s.x, s.y)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixation::{detect_fixations, FixationParams};
    use crate::recording::types::MouseEventKind;

    fn fixations(durations: Vec<i64>, xs: Vec<f64>, ys: Vec<f64>) -> Fixations {
        let n = durations.len();
        Fixations {
            durations,
            xs,
            ys,
            sample_counts: vec![1; n],
        }
    }

    #[test]
    fn test_scanpath_from_detector_output() {
        let detected = detect_fixations(
            &[0, 10, 20, 30],
            &[0.0, 0.0, 0.0, 100.0],
            &[0.0; 4],
            &FixationParams::default(),
        )
        .unwrap();
        let scanpath = Scanpath::from_fixations(&detected, &ScanpathParams::default());

        assert_eq!(scanpath.fixations.len(), 2);
        assert_eq!(scanpath.fixations[0].size, 240.0);
        assert_eq!(scanpath.saccades.len(), 1);
        assert_eq!(scanpath.saccades[0].length(), 100.0);
        // Neither fixation lasts longer than 100 ms
        assert!(scanpath.labels.is_empty());
    }

    #[test]
    fn test_labels_only_for_long_fixations() {
        let f = fixations(
            vec![150, 100, 101, 20],
            vec![0.0, 60.0, 120.0, 180.0],
            vec![0.0; 4],
        );
        let scanpath = Scanpath::from_fixations(&f, &ScanpathParams::default());
        let texts: Vec<&str> = scanpath.labels.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["0", "2"]);
    }

    #[test]
    fn test_annotation_cutoff_is_configurable() {
        let f = fixations(vec![150, 300], vec![0.0, 60.0], vec![0.0, 0.0]);
        let params = ScanpathParams {
            annotation_min_duration: 200,
        };
        let scanpath = Scanpath::from_fixations(&f, &params);
        assert_eq!(scanpath.labels.len(), 1);
        assert_eq!(scanpath.labels[0].text, "1");
    }

    #[test]
    fn test_zero_length_saccades_skipped() {
        let f = fixations(vec![10, 10, 10], vec![5.0, 5.0, 9.0], vec![5.0, 5.0, 5.0]);
        let scanpath = Scanpath::from_fixations(&f, &ScanpathParams::default());
        assert_eq!(scanpath.saccades.len(), 1);
        assert_eq!(scanpath.saccades[0].from, Point::new(5.0, 5.0));
    }

    #[test]
    fn test_summary_statistics() {
        let f = fixations(vec![100, 200, 300], vec![0.0; 3], vec![0.0; 3]);
        let summary = FixationSummary::from_fixations(&f);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.total_duration, 600);
        assert!((summary.mean_duration - 200.0).abs() < 1e-9);
        assert!((summary.std_dev_duration - 100.0).abs() < 1e-9);
        assert_eq!(summary.max_duration, 300);
    }

    #[test]
    fn test_summary_single_fixation() {
        let f = fixations(vec![40], vec![0.0], vec![0.0]);
        let summary = FixationSummary::from_fixations(&f);
        assert_eq!(summary.std_dev_duration, 0.0);
        assert_eq!(summary.mean_duration, 40.0);
    }

    #[test]
    fn test_mouse_trace() {
        let samples = vec![
            MouseSample::new("p1", 0, 0, 0.0, 0.0, MouseEventKind::Move),
            MouseSample::new("p1", 0, 5, 3.0, 4.0, MouseEventKind::Move),
            MouseSample::new("p1", 0, 9, 3.0, 4.0, MouseEventKind::Click),
            MouseSample::new("p1", 0, 12, 3.0, 10.0, MouseEventKind::Move),
        ];
        let trace = MouseTrace::from_samples(&samples);
        assert_eq!(trace.movements.len(), 2);
        assert_eq!(trace.clicks, vec![Point::new(3.0, 4.0)]);
        assert!((trace.path_length() - 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_mouse_trace_single_sample() {
        let samples = vec![MouseSample::new("p1", 0, 0, 1.0, 1.0, MouseEventKind::Click)];
        let trace = MouseTrace::from_samples(&samples);
        assert!(trace.movements.is_empty());
        assert_eq!(trace.clicks.len(), 1);
    }
}

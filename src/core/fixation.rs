//! Fixation detection from raw gaze samples.
//!
//! A fixation is a contiguous run of samples whose positions stay within a
//! distance threshold of the run's mean position. A sample further away
//! than the threshold is a saccade: it closes the current fixation and
//! seeds the next one. No smoothing or outlier rejection is applied.

use crate::recording::types::GazeSample;
use serde::{Deserialize, Serialize};

/// Default dispersion threshold in position units (stimulus pixels).
pub const DEFAULT_FIXATION_THRESHOLD: f64 = 50.0;

/// Errors returned by the fixation detector.
#[derive(Debug, Clone, PartialEq)]
pub enum FixationError {
    InvalidInput(String),
}

impl std::fmt::Display for FixationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FixationError::InvalidInput(e) => write!(f, "Invalid input: {e}"),
        }
    }
}

impl std::error::Error for FixationError {}

/// Tunable parameters of the detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixationParams {
    /// Maximum distance from the running mean before a fixation is closed
    threshold: f64,
}

impl FixationParams {
    /// Create parameters with the given distance threshold.
    ///
    /// The threshold must be finite and non-negative.
    pub fn new(threshold: f64) -> Result<Self, FixationError> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(FixationError::InvalidInput(format!(
                "threshold must be finite and non-negative, got {threshold}"
            )));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl Default for FixationParams {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_FIXATION_THRESHOLD,
        }
    }
}

/// A single detected fixation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fixation {
    /// Time from the first sample to the sample that ended the fixation
    pub duration: i64,
    /// Mean horizontal position of the contributing samples
    pub x: f64,
    /// Mean vertical position of the contributing samples
    pub y: f64,
    /// Number of input samples folded into this fixation
    pub sample_count: usize,
}

/// Detected fixations as parallel sequences, in chronological order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fixations {
    pub durations: Vec<i64>,
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    pub sample_counts: Vec<usize>,
}

impl Fixations {
    pub fn len(&self) -> usize {
        self.durations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }

    /// Get the fixation at `idx`.
    pub fn get(&self, idx: usize) -> Option<Fixation> {
        Some(Fixation {
            duration: *self.durations.get(idx)?,
            x: *self.xs.get(idx)?,
            y: *self.ys.get(idx)?,
            sample_count: *self.sample_counts.get(idx)?,
        })
    }

    /// Iterate over fixations in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = Fixation> + '_ {
        (0..self.len()).filter_map(move |idx| self.get(idx))
    }

    /// Total number of input samples covered.
    pub fn total_samples(&self) -> usize {
        self.sample_counts.iter().sum()
    }

    fn push(&mut self, fixation: Fixation) {
        self.durations.push(fixation.duration);
        self.xs.push(fixation.x);
        self.ys.push(fixation.y);
        self.sample_counts.push(fixation.sample_count);
    }
}

/// Running accumulator for the fixation being built.
struct Accumulator {
    start: i64,
    sum_x: f64,
    sum_y: f64,
    count: usize,
}

impl Accumulator {
    fn seed(timestamp: i64, x: f64, y: f64) -> Self {
        Self {
            start: timestamp,
            sum_x: x,
            sum_y: y,
            count: 1,
        }
    }

    fn mean(&self) -> (f64, f64) {
        let n = self.count as f64;
        (self.sum_x / n, self.sum_y / n)
    }

    fn add(&mut self, x: f64, y: f64) {
        self.sum_x += x;
        self.sum_y += y;
        self.count += 1;
    }

    fn close(&self, end: i64) -> Result<Fixation, FixationError> {
        let duration = end.checked_sub(self.start).ok_or_else(|| {
            FixationError::InvalidInput(format!(
                "fixation from {} to {} overflows the duration range",
                self.start, end
            ))
        })?;
        let (x, y) = self.mean();
        Ok(Fixation {
            duration,
            x,
            y,
            sample_count: self.count,
        })
    }
}

/// Detect fixations from parallel timestamp and position sequences.
///
/// Fails with [`FixationError::InvalidInput`] if the sequences are empty,
/// differ in length, or the timestamps decrease anywhere.
pub fn detect_fixations(
    timestamps: &[i64],
    xs: &[f64],
    ys: &[f64],
    params: &FixationParams,
) -> Result<Fixations, FixationError> {
    validate(timestamps, xs, ys)?;

    let mut fixations = Fixations::default();
    let mut current = Accumulator::seed(timestamps[0], xs[0], ys[0]);

    for i in 1..timestamps.len() {
        let (mean_x, mean_y) = current.mean();
        let distance = ((xs[i] - mean_x).powi(2) + (ys[i] - mean_y).powi(2)).sqrt();

        if distance > params.threshold {
            fixations.push(current.close(timestamps[i])?);
            current = Accumulator::seed(timestamps[i], xs[i], ys[i]);
        } else {
            current.add(xs[i], ys[i]);
        }
    }

    // Last fixation runs to the end of the stream
    fixations.push(current.close(timestamps[timestamps.len() - 1])?);

    Ok(fixations)
}

/// Detect fixations from a slice of gaze samples.
pub fn detect_fixations_in_samples(
    samples: &[GazeSample],
    params: &FixationParams,
) -> Result<Fixations, FixationError> {
    let timestamps: Vec<i64> = samples.iter().map(|s| s.timestamp).collect();
    let xs: Vec<f64> = samples.iter().map(|s| s.x).collect();
    let ys: Vec<f64> = samples.iter().map(|s| s.y).collect();
    detect_fixations(&timestamps, &xs, &ys, params)
}

fn validate(timestamps: &[i64], xs: &[f64], ys: &[f64]) -> Result<(), FixationError> {
    if timestamps.is_empty() {
        return Err(FixationError::InvalidInput(
            "at least one gaze sample is required".to_string(),
        ));
    }

    if xs.len() != timestamps.len() || ys.len() != timestamps.len() {
        return Err(FixationError::InvalidInput(format!(
            "sequence lengths differ: {} timestamps, {} x values, {} y values",
            timestamps.len(),
            xs.len(),
            ys.len()
        )));
    }

    if let Some(idx) = timestamps.windows(2).position(|pair| pair[1] < pair[0]) {
        return Err(FixationError::InvalidInput(format!(
            "timestamps decrease at index {}: {} -> {}",
            idx + 1,
            timestamps[idx],
            timestamps[idx + 1]
        )));
    }

    Ok(())
}

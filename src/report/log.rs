//! Processing statistics log.
//!
//! Tracks what a render run consumed and produced. Counters are atomic so a
//! shared log can be updated through an `Arc` without locking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Statistics for the current run.
#[derive(Debug)]
pub struct ProcessingLog {
    /// Number of stimuli an overlay was written for
    stimuli_rendered: AtomicU64,
    /// Number of stimuli skipped (too large, missing or bad data)
    stimuli_skipped: AtomicU64,
    /// Number of gaze samples read
    gaze_samples: AtomicU64,
    /// Number of mouse samples read
    mouse_samples: AtomicU64,
    /// Number of fixations detected
    fixations_detected: AtomicU64,
    /// Number of overlay documents written
    overlays_written: AtomicU64,
    /// Run start time
    run_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl ProcessingLog {
    /// Create a new processing log.
    pub fn new() -> Self {
        Self {
            stimuli_rendered: AtomicU64::new(0),
            stimuli_skipped: AtomicU64::new(0),
            gaze_samples: AtomicU64::new(0),
            mouse_samples: AtomicU64::new(0),
            fixations_detected: AtomicU64::new(0),
            overlays_written: AtomicU64::new(0),
            run_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a processing log that accumulates into a stats file.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        // Try to load existing totals
        if let Err(e) = log.load() {
            tracing::warn!("Could not load previous processing stats: {e}");
        }

        log
    }

    pub fn record_stimulus_rendered(&self) {
        self.stimuli_rendered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stimulus_skipped(&self) {
        self.stimuli_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_gaze_samples(&self, count: u64) {
        self.gaze_samples.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_mouse_samples(&self, count: u64) {
        self.mouse_samples.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_fixations(&self, count: u64) {
        self.fixations_detected.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_overlay_written(&self) {
        self.overlays_written.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> ProcessingStats {
        ProcessingStats {
            stimuli_rendered: self.stimuli_rendered.load(Ordering::Relaxed),
            stimuli_skipped: self.stimuli_skipped.load(Ordering::Relaxed),
            gaze_samples: self.gaze_samples.load(Ordering::Relaxed),
            mouse_samples: self.mouse_samples.load(Ordering::Relaxed),
            fixations_detected: self.fixations_detected.load(Ordering::Relaxed),
            overlays_written: self.overlays_written.load(Ordering::Relaxed),
            run_start: self.run_start,
            run_duration_secs: (Utc::now() - self.run_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Run Statistics:\n\
             - Stimuli rendered: {}\n\
             - Stimuli skipped: {}\n\
             - Gaze samples read: {}\n\
             - Mouse samples read: {}\n\
             - Fixations detected: {}\n\
             - Overlays written: {}\n\
             - Run duration: {} seconds",
            stats.stimuli_rendered,
            stats.stimuli_skipped,
            stats.gaze_samples,
            stats.mouse_samples,
            stats.fixations_detected,
            stats.overlays_written,
            stats.run_duration_secs
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            // Ensure parent directory exists
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                stimuli_rendered: stats.stimuli_rendered,
                stimuli_skipped: stats.stimuli_skipped,
                gaze_samples: stats.gaze_samples,
                mouse_samples: stats.mouse_samples,
                fixations_detected: stats.fixations_detected,
                overlays_written: stats.overlays_written,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;

            std::fs::write(path, json)?;
            debug!(path = %path.display(), "saved processing stats");
        }
        Ok(())
    }

    /// Load stats from disk.
    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let persisted = read_persisted(path)?;

                self.stimuli_rendered
                    .store(persisted.stimuli_rendered, Ordering::Relaxed);
                self.stimuli_skipped
                    .store(persisted.stimuli_skipped, Ordering::Relaxed);
                self.gaze_samples
                    .store(persisted.gaze_samples, Ordering::Relaxed);
                self.mouse_samples
                    .store(persisted.mouse_samples, Ordering::Relaxed);
                self.fixations_detected
                    .store(persisted.fixations_detected, Ordering::Relaxed);
                self.overlays_written
                    .store(persisted.overlays_written, Ordering::Relaxed);
            }
        }
        Ok(())
    }
}

impl Default for ProcessingLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of processing statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingStats {
    pub stimuli_rendered: u64,
    pub stimuli_skipped: u64,
    pub gaze_samples: u64,
    pub mouse_samples: u64,
    pub fixations_detected: u64,
    pub overlays_written: u64,
    pub run_start: DateTime<Utc>,
    pub run_duration_secs: u64,
}

/// Stats format for persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedStats {
    pub stimuli_rendered: u64,
    pub stimuli_skipped: u64,
    pub gaze_samples: u64,
    pub mouse_samples: u64,
    pub fixations_detected: u64,
    pub overlays_written: u64,
    pub last_updated: DateTime<Utc>,
}

/// Read cumulative stats written by a previous run.
pub fn read_persisted(path: &std::path::Path) -> Result<PersistedStats, std::io::Error> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(std::io::Error::other)
}

/// Thread-safe shared processing log.
pub type SharedProcessingLog = Arc<ProcessingLog>;

/// Create a new shared processing log.
pub fn create_shared_log() -> SharedProcessingLog {
    Arc::new(ProcessingLog::new())
}

/// Create a new shared processing log with persistence.
pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedProcessingLog {
    Arc::new(ProcessingLog::with_persistence(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_log_counting() {
        let log = ProcessingLog::new();

        log.record_stimulus_rendered();
        log.record_stimulus_skipped();
        log.record_gaze_samples(120);
        log.record_gaze_samples(30);
        log.record_fixations(7);

        let stats = log.stats();
        assert_eq!(stats.stimuli_rendered, 1);
        assert_eq!(stats.stimuli_skipped, 1);
        assert_eq!(stats.gaze_samples, 150);
        assert_eq!(stats.fixations_detected, 7);
        assert_eq!(stats.mouse_samples, 0);
    }

    #[test]
    fn test_summary_format() {
        let log = ProcessingLog::new();
        let summary = log.summary();

        assert!(summary.contains("Stimuli rendered"));
        assert!(summary.contains("Fixations detected"));
        assert!(summary.contains("Overlays written"));
    }

    #[test]
    fn test_persistence_accumulates_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");

        let first = ProcessingLog::with_persistence(path.clone());
        first.record_overlay_written();
        first.record_mouse_samples(12);
        first.save().unwrap();

        let second = ProcessingLog::with_persistence(path.clone());
        second.record_overlay_written();
        second.save().unwrap();

        let persisted = read_persisted(&path).unwrap();
        assert_eq!(persisted.overlays_written, 2);
        assert_eq!(persisted.mouse_samples, 12);
    }

    #[test]
    fn test_save_without_persistence_is_noop() {
        assert!(create_shared_log().save().is_ok());
    }
}

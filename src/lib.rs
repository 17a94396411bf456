//! gaze-scanpath - fixation detection and scanpath overlays for eye-tracking research.
//!
//! This library turns the gaze and mouse recordings captured over stimulus
//! screenshots into fixations and drawable overlays.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       gaze-scanpath                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │  Recording  │──▶│  Grouping   │──▶│  Fixation   │       │
//! │  │ (csv files) │   │(session/shot│   │  detector   │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │                                              │              │
//! │                                              ▼              │
//! │  ┌─────────────┐                     ┌─────────────┐       │
//! │  │ Processing  │◀────────────────────│  Overlay    │       │
//! │  │    Log      │                     │  document   │       │
//! │  └─────────────┘                     └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use gaze_scanpath::core::{detect_fixations, FixationParams};
//!
//! let fixations = detect_fixations(
//!     &[0, 10, 20, 30],
//!     &[0.0, 0.0, 0.0, 100.0],
//!     &[0.0, 0.0, 0.0, 0.0],
//!     &FixationParams::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(fixations.durations, vec![30, 0]);
//! assert_eq!(fixations.xs, vec![0.0, 100.0]);
//! ```

pub mod blind;
pub mod config;
pub mod core;
pub mod recording;
pub mod report;
pub mod stimuli;

// Re-export key types at crate root for convenience
pub use blind::{search_blind, BlindHit, BlindSearchError};
pub use config::{Config, ConfigError};
pub use core::{
    detect_fixations, Fixation, FixationError, FixationParams, Fixations, OverlayBuilder,
    OverlayDocument, OverlayMode, Scanpath,
};
pub use recording::{GazeSample, MouseSample, RecordingError};
pub use report::{ProcessingLog, ProcessingStats, SharedProcessingLog};
pub use stimuli::{
    RenderError, RenderOutcome, SkippedMode, StimulusOverlays, StimulusRenderer, StimulusReport,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

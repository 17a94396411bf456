//! Core functionality for gaze-scanpath.
//!
//! This module contains:
//! - Fixation detection from raw gaze samples
//! - Grouping of recordings into sessions and shots
//! - Scanpath and mouse-trace derivation
//! - Overlay document building for export

pub mod fixation;
pub mod grouping;
pub mod overlay;
pub mod palette;
pub mod scanpath;

// Re-export commonly used types
pub use fixation::{
    detect_fixations, detect_fixations_in_samples, Fixation, FixationError, FixationParams,
    Fixations, DEFAULT_FIXATION_THRESHOLD,
};
pub use grouping::{group_by_shot, participant_of, ShotGroup};
pub use overlay::{
    OverlayBuilder, OverlayDocument, OverlayMode, ShotOverlay, StimulusInfo,
    OVERLAY_FORMAT_VERSION, PRODUCER_NAME,
};
pub use palette::{colors_for, ParticipantColors};
pub use scanpath::{
    FixationSummary, MouseTrace, Point, Scanpath, ScanpathParams, Segment,
    DEFAULT_ANNOTATION_MIN_DURATION,
};

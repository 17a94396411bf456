//! Recording input for gaze-scanpath.
//!
//! This module reads the gaze and mouse recordings that accompany each
//! stimulus screenshot.

pub mod reader;
pub mod types;

// Re-export commonly used types
pub use reader::{parse_gaze, parse_mouse, read_gaze_file, read_mouse_file, RecordingError};
pub use types::{GazeSample, MouseEventKind, MouseSample, ShotSample};

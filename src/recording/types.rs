//! Sample types read from eye-tracking and mouse recordings.
//!
//! Samples are immutable once read. They carry the session and shot they
//! belong to so a whole recording file can be grouped later.

use serde::{Deserialize, Serialize};

/// A single gaze position reported by the eye tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GazeSample {
    /// Recording session identifier (first two characters name the participant)
    pub session: String,
    /// Index of the shot within the session
    pub shot: u32,
    /// Timestamp in milliseconds
    pub timestamp: i64,
    /// Horizontal position in stimulus pixels
    pub x: f64,
    /// Vertical position in stimulus pixels
    pub y: f64,
}

impl GazeSample {
    pub fn new(session: impl Into<String>, shot: u32, timestamp: i64, x: f64, y: f64) -> Self {
        Self {
            session: session.into(),
            shot,
            timestamp,
            x,
            y,
        }
    }
}

/// Mouse event classification as labelled in the recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseEventKind {
    /// Cursor movement
    Move,
    /// Button click
    Click,
    /// Any other label, kept verbatim
    Other(String),
}

impl MouseEventKind {
    /// Classify a raw event label from the recording.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "move" => MouseEventKind::Move,
            "click" => MouseEventKind::Click,
            other => MouseEventKind::Other(other.to_string()),
        }
    }

    pub fn is_click(&self) -> bool {
        matches!(self, MouseEventKind::Click)
    }
}

/// A single mouse sample with its event label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MouseSample {
    pub session: String,
    pub shot: u32,
    pub timestamp: i64,
    pub x: f64,
    pub y: f64,
    pub event: MouseEventKind,
}

impl MouseSample {
    pub fn new(
        session: impl Into<String>,
        shot: u32,
        timestamp: i64,
        x: f64,
        y: f64,
        event: MouseEventKind,
    ) -> Self {
        Self {
            session: session.into(),
            shot,
            timestamp,
            x,
            y,
            event,
        }
    }
}

/// Anything that belongs to a session and a shot.
pub trait ShotSample {
    fn session(&self) -> &str;
    fn shot(&self) -> u32;
}

impl ShotSample for GazeSample {
    fn session(&self) -> &str {
        &self.session
    }

    fn shot(&self) -> u32 {
        self.shot
    }
}

impl ShotSample for MouseSample {
    fn session(&self) -> &str {
        &self.session
    }

    fn shot(&self) -> u32 {
        self.shot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mouse_event_labels() {
        assert_eq!(MouseEventKind::from_label("click"), MouseEventKind::Click);
        assert_eq!(MouseEventKind::from_label(" move "), MouseEventKind::Move);
        assert_eq!(
            MouseEventKind::from_label("scroll"),
            MouseEventKind::Other("scroll".to_string())
        );
        assert!(MouseEventKind::Click.is_click());
        assert!(!MouseEventKind::Move.is_click());
    }

    #[test]
    fn test_shot_sample_accessors() {
        let gaze = GazeSample::new("p1_s01", 3, 100, 1.0, 2.0);
        assert_eq!(gaze.session(), "p1_s01");
        assert_eq!(gaze.shot(), 3);
    }
}

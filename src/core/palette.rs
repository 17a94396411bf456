//! Participant colour palette for overlays.

use serde::{Deserialize, Serialize};

/// Colour triple used to draw one participant's data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantColors {
    /// Markers and movement lines
    pub normal: String,
    /// Labels and click fill
    pub dark: String,
    /// Marker edges
    pub bright: String,
}

impl ParticipantColors {
    fn new(normal: &str, dark: &str, bright: &str) -> Self {
        Self {
            normal: normal.to_string(),
            dark: dark.to_string(),
            bright: bright.to_string(),
        }
    }
}

/// Palette entries for the study participants.
const PALETTE: [(&str, &str, &str, &str); 4] = [
    ("p1", "#d7191c", "#600b0d", "#ef7678"),
    ("p2", "#fdae61", "#512901", "#fec790"),
    ("p3", "#abd9e9", "#46acce", "#e3f2f8"),
    ("p4", "#2c7bb6", "#1a486b", "#7cb4df"),
];

/// Neutral grey for participants outside the palette.
const FALLBACK: (&str, &str, &str) = ("#808080", "#404040", "#c0c0c0");

/// Look up a participant's colours.
///
/// Returns the colours and whether the fallback was used.
pub fn colors_for(participant: &str) -> (ParticipantColors, bool) {
    match PALETTE.iter().find(|(id, ..)| *id == participant) {
        Some((_, normal, dark, bright)) => (ParticipantColors::new(normal, dark, bright), false),
        None => (
            ParticipantColors::new(FALLBACK.0, FALLBACK.1, FALLBACK.2),
            true,
        ),
    }
}

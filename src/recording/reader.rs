//! Readers for the gaze and mouse recording files.
//!
//! Both files are comma-separated with a header line:
//!
//! ```text
//! session,intra_idx,timestamp,x,y           (<stimulus>-gaze.csv)
//! session,intra_idx,timestamp,x,y,type      (<stimulus>-mouse.csv)
//! ```
//!
//! Fields are split on `,` without quoting rules; the recorder never writes
//! quoted fields.

use crate::recording::types::{GazeSample, MouseEventKind, MouseSample};
use std::path::Path;
use tracing::debug;

/// Errors that can occur while reading a recording.
#[derive(Debug, Clone)]
pub enum RecordingError {
    IoError(String),
    Parse { line: usize, message: String },
}

impl std::fmt::Display for RecordingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordingError::IoError(e) => write!(f, "IO error: {e}"),
            RecordingError::Parse { line, message } => {
                write!(f, "Parse error on line {line}: {message}")
            }
        }
    }
}

impl std::error::Error for RecordingError {}

/// Read a gaze recording from disk.
pub fn read_gaze_file(path: &Path) -> Result<Vec<GazeSample>, RecordingError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| RecordingError::IoError(format!("{}: {e}", path.display())))?;
    let samples = parse_gaze(&content)?;
    debug!(path = %path.display(), samples = samples.len(), "read gaze recording");
    Ok(samples)
}

/// Read a mouse recording from disk.
pub fn read_mouse_file(path: &Path) -> Result<Vec<MouseSample>, RecordingError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| RecordingError::IoError(format!("{}: {e}", path.display())))?;
    let samples = parse_mouse(&content)?;
    debug!(path = %path.display(), samples = samples.len(), "read mouse recording");
    Ok(samples)
}

/// Parse gaze samples from the text of a gaze recording.
pub fn parse_gaze(content: &str) -> Result<Vec<GazeSample>, RecordingError> {
    data_rows(content)
        .map(|(line, fields)| -> Result<GazeSample, RecordingError> {
            let row = Row::new(line, &fields, 5)?;
            Ok(GazeSample {
                session: row.text(0),
                shot: row.shot(1)?,
                timestamp: row.timestamp(2)?,
                x: row.coordinate(3)?,
                y: row.coordinate(4)?,
            })
        })
        .collect()
}

/// Parse mouse samples from the text of a mouse recording.
pub fn parse_mouse(content: &str) -> Result<Vec<MouseSample>, RecordingError> {
    data_rows(content)
        .map(|(line, fields)| -> Result<MouseSample, RecordingError> {
            let row = Row::new(line, &fields, 6)?;
            Ok(MouseSample {
                session: row.text(0),
                shot: row.shot(1)?,
                timestamp: row.timestamp(2)?,
                x: row.coordinate(3)?,
                y: row.coordinate(4)?,
                event: MouseEventKind::from_label(fields[5]),
            })
        })
        .collect()
}

/// Iterate over non-blank data rows, skipping the header.
///
/// Yields the 1-based line number with the split fields.
pub(crate) fn data_rows<'a>(content: &'a str) -> impl Iterator<Item = (usize, Vec<&'a str>)> {
    content
        .lines()
        .enumerate()
        .skip(1)
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| (idx + 1, line.split(',').map(str::trim).collect()))
}

/// A split row with typed field accessors.
struct Row<'a> {
    line: usize,
    fields: &'a [&'a str],
}

impl<'a> Row<'a> {
    fn new(line: usize, fields: &'a [&'a str], expected: usize) -> Result<Self, RecordingError> {
        if fields.len() < expected {
            return Err(RecordingError::Parse {
                line,
                message: format!("expected {expected} fields, found {}", fields.len()),
            });
        }
        Ok(Self { line, fields })
    }

    fn text(&self, idx: usize) -> String {
        self.fields[idx].to_string()
    }

    fn shot(&self, idx: usize) -> Result<u32, RecordingError> {
        self.fields[idx].parse().map_err(|_| self.error(idx, "shot index"))
    }

    fn timestamp(&self, idx: usize) -> Result<i64, RecordingError> {
        self.fields[idx].parse().map_err(|_| self.error(idx, "timestamp"))
    }

    fn coordinate(&self, idx: usize) -> Result<f64, RecordingError> {
        let raw = self.fields[idx];
        raw.parse::<i64>()
            .map(|v| v as f64)
            .or_else(|_| raw.parse::<f64>())
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| self.error(idx, "coordinate"))
    }

    fn error(&self, idx: usize, what: &str) -> RecordingError {
        RecordingError::Parse {
            line: self.line,
            message: format!("invalid {what} {:?}", self.fields[idx]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GAZE: &str = "session,intra_idx,timestamp,x,y\n\
                        p1_a,0,1000,10,20\n\
                        p1_a,0,1016,12,21\n\
                        \n\
                        p2_b,1,2000,300.5,400\n";

    #[test]
    fn test_parse_gaze_skips_header_and_blank_lines() {
        let samples = parse_gaze(GAZE).unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0], GazeSample::new("p1_a", 0, 1000, 10.0, 20.0));
        assert_eq!(samples[2].x, 300.5);
        assert_eq!(samples[2].shot, 1);
    }

    #[test]
    fn test_parse_mouse_events() {
        let content = "session,intra_idx,timestamp,x,y,type\n\
                       p3_c,2,5,1,1,move\n\
                       p3_c,2,9,4,5,click\n";
        let samples = parse_mouse(content).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].event, MouseEventKind::Move);
        assert!(samples[1].event.is_click());
    }

    #[test]
    fn test_parse_error_reports_line() {
        let content = "session,intra_idx,timestamp,x,y\np1,0,10,1,1\np1,0,abc,1,1\n";
        match parse_gaze(content) {
            Err(RecordingError::Parse { line, message }) => {
                assert_eq!(line, 3);
                assert!(message.contains("timestamp"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_short_row_rejected() {
        let content = "header\np1,0,10,1\n";
        assert!(matches!(
            parse_gaze(content),
            Err(RecordingError::Parse { line: 2, .. })
        ));
    }

    #[test]
    fn test_header_only_is_empty() {
        assert!(parse_gaze("session,intra_idx,timestamp,x,y\n").unwrap().is_empty());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = read_gaze_file(Path::new("/definitely/not/here-gaze.csv"));
        assert!(matches!(result, Err(RecordingError::IoError(_))));
    }
}

//! Blind-frame search.
//!
//! Frames during which the eye tracker lost the participant are listed in
//! `<participant>...-blind.csv` files next to the shots, one frame index per
//! row in the first column. This module answers whether a given frame of a
//! given participant is one of them.

use crate::recording::reader::data_rows;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Suffix of blind-frame listing files.
pub const BLIND_FILE_SUFFIX: &str = "-blind.csv";

/// Errors that can occur during a blind search.
#[derive(Debug)]
pub enum BlindSearchError {
    IoError(String),
    Parse {
        file: PathBuf,
        line: usize,
        message: String,
    },
}

impl std::fmt::Display for BlindSearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlindSearchError::IoError(e) => write!(f, "IO error: {e}"),
            BlindSearchError::Parse {
                file,
                line,
                message,
            } => write!(f, "Parse error in {} line {line}: {message}", file.display()),
        }
    }
}

impl std::error::Error for BlindSearchError {}

/// A blind-frame listing row matching the searched frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlindHit {
    pub file: PathBuf,
    /// 1-based line number within the file
    pub line: usize,
}

/// List the blind-frame files of a participant in a shots directory, sorted.
pub fn blind_files(shots_dir: &Path, participant: &str) -> Result<Vec<PathBuf>, BlindSearchError> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(shots_dir)
        .map_err(|e| BlindSearchError::IoError(format!("{}: {e}", shots_dir.display())))?
        .filter_map(|e| e.ok())
        .filter(|e| {
            let name = e.file_name();
            let name = name.to_string_lossy();
            name.starts_with(participant) && name.ends_with(BLIND_FILE_SUFFIX)
        })
        .map(|e| e.path())
        .collect();
    files.sort();
    Ok(files)
}

/// Find every listing row naming `frame_idx` for `participant`.
pub fn search_blind(
    shots_dir: &Path,
    frame_idx: i64,
    participant: &str,
) -> Result<Vec<BlindHit>, BlindSearchError> {
    let mut hits = Vec::new();

    for file in blind_files(shots_dir, participant)? {
        let content = std::fs::read_to_string(&file)
            .map_err(|e| BlindSearchError::IoError(format!("{}: {e}", file.display())))?;
        debug!(file = %file.display(), "searching blind frames");

        for (line, fields) in data_rows(&content) {
            let frame: i64 = fields[0].parse().map_err(|_| BlindSearchError::Parse {
                file: file.clone(),
                line,
                message: format!("invalid frame index {:?}", fields[0]),
            })?;
            if frame == frame_idx {
                hits.push(BlindHit {
                    file: file.clone(),
                    line,
                });
            }
        }
    }

    Ok(hits)
}

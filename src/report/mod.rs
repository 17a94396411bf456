//! Run reporting for gaze-scanpath.
//!
//! Tracks how much data a render consumed and how many overlays it wrote,
//! optionally accumulating totals across runs.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_log, create_shared_log_with_persistence, read_persisted, PersistedStats,
    ProcessingLog, ProcessingStats, SharedProcessingLog,
};

use super::relay::RelayOutcome;
use crate::alert::Assessment;
use crate::analyzer::FrameAnalysis;

/// Why the sensing loop stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
    Signal(String),
    StreamEnded,
    Cancelled,
}

/// Counters kept by the sensing loop
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub frames: u64,
    pub capture_errors: u64,
    pub status_changes: u64,
    pub data_enqueued: u64,
    pub alerts_enqueued: u64,
}

/// Result of a finished run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub reason: ShutdownReason,
    pub stats: RunStats,
    /// 0 when every component stopped cleanly
    pub exit_code: i32,
}

/// Everything derived from one frame
#[derive(Debug, Clone)]
pub struct FrameOutcome {
    pub analysis: FrameAnalysis,
    pub assessment: Assessment,
    pub relay: RelayOutcome,
}

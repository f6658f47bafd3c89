use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FatigueError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Analyzer error: {0}")]
    Analyzer(#[from] AnalyzerError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
}

/// Errors raised on the sensing side. None of these leave the sensing loop.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyzerError {
    #[error("No frame available: {details}")]
    Capture { details: String },

    #[error("Landmark stream ended")]
    StreamEnded,

    #[error("Face has {available} landmarks, scheme needs at least {required}")]
    IncompleteLandmarks { required: usize, available: usize },

    #[error("Replay source error: {details}")]
    Replay { details: String },
}

impl AnalyzerError {
    /// Whether the sensing loop should just skip this cycle.
    pub fn is_skippable(&self) -> bool {
        !matches!(self, AnalyzerError::StreamEnded)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TelemetryError {
    #[error("Backend is disconnected")]
    Disconnected,

    #[error("{queue} queue is full (capacity {capacity})")]
    QueueFull {
        queue: &'static str,
        capacity: usize,
    },

    #[error("Health probe failed: {details}")]
    Probe { details: String },

    #[error("Delivery of {event_type} failed: {details}")]
    Delivery {
        event_type: &'static str,
        details: String,
    },

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("HTTP client error: {details}")]
    Client { details: String },

    #[error("Invalid telemetry configuration: {details}")]
    InvalidConfig { details: String },
}

pub type Result<T> = std::result::Result<T, FatigueError>;

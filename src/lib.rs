pub mod alarm;
pub mod alert;
pub mod analyzer;
pub mod app;
pub mod config;
pub mod error;
pub mod landmarks;
pub mod telemetry;

pub use alarm::{AlarmDriver, LogAlarmDriver};
pub use alert::{aggregate, Assessment, Severity, Status};
pub use analyzer::{ClassificationRecord, FrameAnalysis, SignalAnalyzer};
pub use app::{FatigueOrchestrator, RunSummary, ShutdownReason, StatusRelay};
pub use config::{FaceSelection, FatigueConfig};
pub use error::{AnalyzerError, FatigueError, Result, TelemetryError};
pub use landmarks::{Face, LandmarkFrame, LandmarkProvider, LandmarkScheme, Point, ReplayProvider};
pub use telemetry::{AlertEvent, DataEvent, HttpTransport, TelemetryDispatcher, TelemetryEvent};

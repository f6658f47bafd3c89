mod geometry;
mod hysteresis;
mod selection;
mod signal;

pub use geometry::{aspect_ratio, eye_aspect_ratio, head_tilt_angle, mouth_aspect_ratio};
pub use hysteresis::{HysteresisCounter, ThresholdCounters};
pub use selection::select_face;
pub use signal::{ClassificationRecord, FaceMetrics, FrameAnalysis, SignalAnalyzer};

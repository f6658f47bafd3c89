use super::geometry::{eye_aspect_ratio, head_tilt_angle, mouth_aspect_ratio};
use super::hysteresis::ThresholdCounters;
use super::selection::select_face;
use crate::config::AnalyzerConfig;
use crate::error::AnalyzerError;
use crate::landmarks::{Face, LandmarkFrame, LandmarkScheme};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, trace};

/// Per-frame classification of the selected face
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationRecord {
    pub ear: f64,
    pub mar: f64,
    pub head_angle: f64,
    pub drowsy: bool,
    pub yawning: bool,
    pub head_tilt: bool,
    pub faces_detected: usize,
    pub timestamp: DateTime<Utc>,
}

impl ClassificationRecord {
    /// Record for a frame with no usable face: zero metrics, no flags
    pub fn neutral(faces_detected: usize, timestamp: DateTime<Utc>) -> Self {
        Self {
            ear: 0.0,
            mar: 0.0,
            head_angle: 0.0,
            drowsy: false,
            yawning: false,
            head_tilt: false,
            faces_detected,
            timestamp,
        }
    }

    pub fn any_active(&self) -> bool {
        self.drowsy || self.yawning || self.head_tilt
    }
}

/// Raw geometry of one usable face
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaceMetrics {
    /// Position of the face in the provider's frame
    pub index: usize,
    pub ear: f64,
    pub mar: f64,
    pub head_angle: f64,
    pub bounding_box_area: f64,
    pub confidence: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameAnalysis {
    pub record: ClassificationRecord,
    /// Metrics for every face that had a complete landmark set
    pub faces: Vec<FaceMetrics>,
    /// Provider index of the face that advanced the counters
    pub selected: Option<usize>,
}

/// Turns landmark frames into classification records.
///
/// Counters advance from the selected face only. Frames without a usable
/// face hold the counters for up to `face_loss_reset_frames` frames, then
/// reset them.
pub struct SignalAnalyzer {
    config: AnalyzerConfig,
    scheme: LandmarkScheme,
    counters: ThresholdCounters,
    frames_without_face: u32,
    frames_processed: u64,
}

impl SignalAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self::with_scheme(config, LandmarkScheme::default())
    }

    pub fn with_scheme(config: AnalyzerConfig, scheme: LandmarkScheme) -> Self {
        info!(
            "Signal analyzer thresholds: ear < {:.2}, mar > {:.2}, |angle| > {:.1}°, runs {}/{}/{} frames",
            config.ear_threshold,
            config.mar_threshold,
            config.head_tilt_degrees,
            config.eye_consec_frames,
            config.mouth_consec_frames,
            config.head_consec_frames
        );

        let counters = ThresholdCounters::new(
            config.eye_consec_frames,
            config.mouth_consec_frames,
            config.head_consec_frames,
        );

        Self {
            config,
            scheme,
            counters,
            frames_without_face: 0,
            frames_processed: 0,
        }
    }

    /// Analyze a frame stamped with the current time
    pub fn analyze(&mut self, frame: &LandmarkFrame) -> FrameAnalysis {
        self.analyze_at(frame, Utc::now())
    }

    pub fn analyze_at(&mut self, frame: &LandmarkFrame, timestamp: DateTime<Utc>) -> FrameAnalysis {
        self.frames_processed += 1;

        let faces: Vec<FaceMetrics> = frame
            .faces
            .iter()
            .enumerate()
            .filter_map(|(index, face)| match self.measure(index, face) {
                Ok(metrics) => Some(metrics),
                Err(e) => {
                    debug!("Skipping face {}: {}", index, e);
                    None
                }
            })
            .collect();

        let Some(position) = select_face(&faces, self.config.face_selection) else {
            self.hold_for_face_loss();
            return FrameAnalysis {
                record: ClassificationRecord::neutral(frame.face_count(), timestamp),
                faces,
                selected: None,
            };
        };

        self.frames_without_face = 0;
        let metrics = &faces[position];

        let drowsy = self
            .counters
            .eye
            .update(metrics.ear < self.config.ear_threshold);
        let yawning = self
            .counters
            .mouth
            .update(metrics.mar > self.config.mar_threshold);
        let head_tilt = self
            .counters
            .head
            .update(metrics.head_angle.abs() > self.config.head_tilt_degrees);

        trace!(
            "Frame {}: ear={:.3} mar={:.3} angle={:.1} counters={}/{}/{}",
            self.frames_processed,
            metrics.ear,
            metrics.mar,
            metrics.head_angle,
            self.counters.eye.count(),
            self.counters.mouth.count(),
            self.counters.head.count()
        );

        let record = ClassificationRecord {
            ear: metrics.ear,
            mar: metrics.mar,
            head_angle: metrics.head_angle,
            drowsy,
            yawning,
            head_tilt,
            faces_detected: frame.face_count(),
            timestamp,
        };
        let selected = Some(metrics.index);

        FrameAnalysis {
            record,
            faces,
            selected,
        }
    }

    fn measure(&self, index: usize, face: &Face) -> Result<FaceMetrics, AnalyzerError> {
        let left = self.scheme.resolve(face, &self.scheme.left_eye)?;
        let right = self.scheme.resolve(face, &self.scheme.right_eye)?;
        let mouth = self.scheme.resolve(face, &self.scheme.mouth)?;
        let (outer, inner) = self.scheme.tilt_corners(face)?;

        Ok(FaceMetrics {
            index,
            ear: eye_aspect_ratio(&left, &right),
            mar: mouth_aspect_ratio(&mouth),
            head_angle: head_tilt_angle(&outer, &inner),
            bounding_box_area: face.bounding_box_area(),
            confidence: face.confidence,
        })
    }

    fn hold_for_face_loss(&mut self) {
        self.frames_without_face = self.frames_without_face.saturating_add(1);

        if self.frames_without_face > self.config.face_loss_reset_frames
            && !self.counters.is_idle()
        {
            info!(
                "No face for {} frames, resetting hysteresis counters",
                self.frames_without_face
            );
            self.counters.reset();
        }
    }

    pub fn counters(&self) -> &ThresholdCounters {
        &self.counters
    }
}

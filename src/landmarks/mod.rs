mod provider;
mod scheme;

pub use provider::{LandmarkProvider, ReplayProvider};
pub use scheme::{FeatureIndices, LandmarkScheme};

use serde::{Deserialize, Serialize};

/// A 2D landmark in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// One detected face: ordered landmarks plus optional detector confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Face {
    pub points: Vec<Point>,
    #[serde(default)]
    pub confidence: Option<f32>,
}

impl Face {
    pub fn new(points: Vec<Point>) -> Self {
        Self {
            points,
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Area of the axis-aligned box around every landmark, 0 when any
    /// coordinate is not finite
    pub fn bounding_box_area(&self) -> f64 {
        let mut points = self.points.iter();
        let Some(first) = points.next() else {
            return 0.0;
        };

        let (mut min_x, mut max_x, mut min_y, mut max_y) = (first.x, first.x, first.y, first.y);
        for p in points {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }

        let area = (max_x - min_x) * (max_y - min_y);
        if area.is_finite() {
            area
        } else {
            0.0
        }
    }
}

/// Landmarks for every face found in one captured frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LandmarkFrame {
    #[serde(default)]
    pub faces: Vec<Face>,
}

impl LandmarkFrame {
    pub fn new(faces: Vec<Face>) -> Self {
        Self { faces }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }
}

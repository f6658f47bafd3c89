use super::{Face, Point};
use crate::error::AnalyzerError;

/// Six landmark indices in `p1..p6` order.
///
/// `p1`/`p4` are the horizontal extremes, `(p2, p6)` and `(p3, p5)` are the
/// vertical pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureIndices(pub [usize; 6]);

impl FeatureIndices {
    pub fn max_index(&self) -> usize {
        self.0.iter().copied().max().unwrap_or(0)
    }

    pub fn horizontal(&self) -> (usize, usize) {
        (self.0[0], self.0[3])
    }
}

/// Named index layout for the eyes and mouth
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LandmarkScheme {
    pub left_eye: FeatureIndices,
    pub right_eye: FeatureIndices,
    pub mouth: FeatureIndices,
}

impl LandmarkScheme {
    /// 468-point face mesh layout
    pub const fn face_mesh() -> Self {
        Self {
            // outer corner, upper lid x2, inner corner, lower lid x2
            left_eye: FeatureIndices([33, 159, 158, 133, 153, 145]),
            right_eye: FeatureIndices([362, 386, 387, 263, 380, 374]),
            mouth: FeatureIndices([78, 13, 82, 308, 312, 14]),
        }
    }

    /// Minimum number of landmarks a face needs for this scheme
    pub fn required_points(&self) -> usize {
        self.left_eye
            .max_index()
            .max(self.right_eye.max_index())
            .max(self.mouth.max_index())
            + 1
    }

    /// Resolve six indices against a face
    pub fn resolve(
        &self,
        face: &Face,
        feature: &FeatureIndices,
    ) -> Result<[Point; 6], AnalyzerError> {
        self.check(face)?;
        Ok(feature.0.map(|i| face.points[i]))
    }

    /// Outer and inner corner of the left eye, used for head tilt
    pub fn tilt_corners(&self, face: &Face) -> Result<(Point, Point), AnalyzerError> {
        self.check(face)?;
        let (a, b) = self.left_eye.horizontal();
        Ok((face.points[a], face.points[b]))
    }

    pub fn check(&self, face: &Face) -> Result<(), AnalyzerError> {
        let required = self.required_points();
        if face.points.len() < required {
            return Err(AnalyzerError::IncompleteLandmarks {
                required,
                available: face.points.len(),
            });
        }
        Ok(())
    }
}

impl Default for LandmarkScheme {
    fn default() -> Self {
        Self::face_mesh()
    }
}

use super::FaceMetrics;
use crate::config::FaceSelection;

use std::cmp::Ordering;

/// Pick the face that drives the hysteresis counters.
///
/// Ties keep the earlier face. Non-finite areas count as 0. `MostConfident`
/// treats a missing or non-finite confidence as lowest and falls back to
/// bounding-box area between equal confidences.
pub fn select_face(faces: &[FaceMetrics], policy: FaceSelection) -> Option<usize> {
    if faces.is_empty() {
        return None;
    }

    let mut best = 0;
    for (i, candidate) in faces.iter().enumerate().skip(1) {
        if compare(candidate, &faces[best], policy) == Ordering::Greater {
            best = i;
        }
    }
    Some(best)
}

fn compare(a: &FaceMetrics, b: &FaceMetrics, policy: FaceSelection) -> Ordering {
    match policy {
        FaceSelection::First => Ordering::Less,
        FaceSelection::Largest => area(a).total_cmp(&area(b)),
        FaceSelection::MostConfident => confidence(a)
            .total_cmp(&confidence(b))
            .then_with(|| area(a).total_cmp(&area(b))),
    }
}

// Non-finite values rank below every real one
fn area(face: &FaceMetrics) -> f64 {
    if face.bounding_box_area.is_finite() {
        face.bounding_box_area
    } else {
        0.0
    }
}

fn confidence(face: &FaceMetrics) -> f32 {
    match face.confidence {
        Some(c) if c.is_finite() => c,
        _ => f32::NEG_INFINITY,
    }
}

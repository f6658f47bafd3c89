use crate::landmarks::Point;

/// Vertical-over-horizontal ratio of six ordered points.
///
/// `(|p2 p6| + |p3 p5|) / (2 |p1 p4|)`, or 0 when `p1` and `p4` coincide.
pub fn aspect_ratio(points: &[Point; 6]) -> f64 {
    let [p1, p2, p3, p4, p5, p6] = points;
    let horizontal = p1.distance(p4);
    if horizontal == 0.0 {
        return 0.0;
    }
    (p2.distance(p6) + p3.distance(p5)) / (2.0 * horizontal)
}

/// Mean aspect ratio of both eyes
pub fn eye_aspect_ratio(left: &[Point; 6], right: &[Point; 6]) -> f64 {
    (aspect_ratio(left) + aspect_ratio(right)) / 2.0
}

pub fn mouth_aspect_ratio(mouth: &[Point; 6]) -> f64 {
    aspect_ratio(mouth)
}

/// Slope angle in degrees of the line from `outer` to `inner`.
///
/// Positive when the inner corner sits lower in the image (y grows downwards).
pub fn head_tilt_angle(outer: &Point, inner: &Point) -> f64 {
    let dx = inner.x - outer.x;
    let dy = inner.y - outer.y;
    dy.atan2(dx).to_degrees()
}

//! Shared synthetic-face fixtures for unit tests.

use crate::types::{landmark, Baseline, LandmarkFrame, Point};

/// Total points in the face-mesh topology the detector emits.
const MESH_POINTS: usize = 478;

/// A neutral synthetic face: open eyes (EAR 0.3), relaxed brow, closed
/// mouth, head centered. Consistent with [`resting_baseline`] so every
/// relative feature comes out at 0.
pub fn calm_frame(timestamp_ms: f64) -> LandmarkFrame {
    let mut points = vec![Point::new(0.5, 0.5); MESH_POINTS];

    points[landmark::NOSE_TIP] = Point::new(0.5, 0.45);

    // Left eye: 0.07 wide, eyelids 0.021 apart -> EAR 0.3
    points[landmark::LEFT_EYE_OUTER] = Point::new(0.35, 0.40);
    points[landmark::LEFT_EYE_INNER] = Point::new(0.42, 0.40);
    points[landmark::LEFT_EYE_UPPER] = Point::new(0.385, 0.38);
    points[landmark::LEFT_EYE_LOWER] = Point::new(0.385, 0.401);

    // Right eye mirrors the left
    points[landmark::RIGHT_EYE_INNER] = Point::new(0.58, 0.40);
    points[landmark::RIGHT_EYE_OUTER] = Point::new(0.65, 0.40);
    points[landmark::RIGHT_EYE_UPPER] = Point::new(0.615, 0.38);
    points[landmark::RIGHT_EYE_LOWER] = Point::new(0.615, 0.401);

    // Brows 0.05 above the upper eyelids
    points[landmark::LEFT_BROW] = Point::new(0.385, 0.33);
    points[landmark::RIGHT_BROW] = Point::new(0.615, 0.33);

    // Mouth: inner lips 0.01 apart, corners 0.005 below the upper lip
    points[landmark::UPPER_LIP] = Point::new(0.5, 0.55);
    points[landmark::LOWER_LIP] = Point::new(0.5, 0.56);
    points[landmark::LEFT_MOUTH_CORNER] = Point::new(0.44, 0.555);
    points[landmark::RIGHT_MOUTH_CORNER] = Point::new(0.56, 0.555);

    LandmarkFrame::new(points, timestamp_ms).expect("fixture frame is long enough")
}

/// The baseline [`calm_frame`] measures out to.
pub fn resting_baseline() -> Baseline {
    Baseline {
        ear: 0.3,
        brow: 0.05,
        jaw: 0.01,
        mouth_corner: 0.005,
        head_x: 0.5,
        head_y: 0.45,
    }
}

/// Calm face with both eyes fully closed (EAR 0).
pub fn frame_with_closed_eyes(timestamp_ms: f64) -> LandmarkFrame {
    let mut frame = calm_frame(timestamp_ms);
    frame.points[landmark::LEFT_EYE_UPPER] = frame.points[landmark::LEFT_EYE_LOWER];
    frame.points[landmark::RIGHT_EYE_UPPER] = frame.points[landmark::RIGHT_EYE_LOWER];
    frame
}

/// An agitated face: near-closed eyes, furrowed brow, opened jaw.
pub fn stressed_frame(timestamp_ms: f64) -> LandmarkFrame {
    let mut frame = calm_frame(timestamp_ms);

    // EAR drops to 0.1
    frame.points[landmark::LEFT_EYE_UPPER] = Point::new(0.385, 0.394);
    frame.points[landmark::LEFT_EYE_LOWER] = Point::new(0.385, 0.401);
    frame.points[landmark::RIGHT_EYE_UPPER] = Point::new(0.615, 0.394);
    frame.points[landmark::RIGHT_EYE_LOWER] = Point::new(0.615, 0.401);

    // Brow pulled down toward the eyes (gap 0.05 -> 0.035)
    frame.points[landmark::LEFT_BROW] = Point::new(0.385, 0.359);
    frame.points[landmark::RIGHT_BROW] = Point::new(0.615, 0.359);

    // Jaw opens (inner-lip gap 0.01 -> 0.03)
    frame.points[landmark::LOWER_LIP] = Point::new(0.5, 0.58);

    frame
}

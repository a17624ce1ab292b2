//! Per-frame feature extraction
//!
//! Converts one frame of facial landmarks plus the session baseline into a
//! fixed-size [`FeatureVector`]: eye aspect ratio, blink count, brow tension,
//! jaw openness, mouth-corner drop, head stability, and micro-movement
//! magnitude. The extractor owns short rolling histories (blink frames, head
//! positions, previous-frame snapshot) and nothing else.

use std::collections::VecDeque;

use crate::geometry::{distance, mean, safe_relative_delta, vertical_gap, EPSILON};
use crate::types::{landmark, Baseline, FeatureVector, LandmarkFrame, Point};

/// Average EAR below which a frame counts as a blink frame.
pub const BLINK_EAR_THRESHOLD: f64 = 0.2;

/// Blink-history capacity (~2 s at 30 fps).
pub const BLINK_HISTORY_CAPACITY: usize = 60;

/// Head-position history capacity (~1 s at 30 fps).
pub const HEAD_HISTORY_CAPACITY: usize = 30;

/// Landmarks diffed against the previous frame for micro-movement.
const MICRO_MOVEMENT_INDICES: [usize; 5] = [
    landmark::LEFT_BROW,
    landmark::RIGHT_BROW,
    landmark::UPPER_LIP,
    landmark::LOWER_LIP,
    landmark::NOSE_TIP,
];

/// Read-only view of the extractor's internal buffers, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferStatus {
    pub blink_history_len: usize,
    pub head_history_len: usize,
    pub has_previous_frame: bool,
}

/// Session-scoped feature extractor. One instance per camera session; state
/// never crosses sessions except through an explicit [`FeatureExtractor::reset`].
#[derive(Debug, Default)]
pub struct FeatureExtractor {
    /// 0/1 blink-frame flags, oldest first.
    blink_history: VecDeque<f64>,
    /// Recent head-reference positions with capture timestamps.
    head_history: VecDeque<(Point, f64)>,
    /// Snapshot of the previous frame for micro-movement diffing.
    previous_frame: Option<LandmarkFrame>,
}

impl FeatureExtractor {
    pub fn new() -> Self {
        Self {
            blink_history: VecDeque::with_capacity(BLINK_HISTORY_CAPACITY),
            head_history: VecDeque::with_capacity(HEAD_HISTORY_CAPACITY),
            previous_frame: None,
        }
    }

    /// Extract one feature vector from `frame` against `baseline`.
    ///
    /// Never fails: degenerate geometry (zero eye width, all-zero baseline)
    /// degrades individual features to 0 rather than producing NaN/Infinity,
    /// so a single occluded frame cannot halt a live session.
    pub fn extract(&mut self, frame: &LandmarkFrame, baseline: &Baseline) -> FeatureVector {
        let ear = raw_ear(frame);

        let is_blink = if ear < BLINK_EAR_THRESHOLD { 1.0 } else { 0.0 };
        self.blink_history.push_back(is_blink);
        while self.blink_history.len() > BLINK_HISTORY_CAPACITY {
            self.blink_history.pop_front();
        }
        let blink_rate: f64 = self.blink_history.iter().sum();

        let brow_tension = safe_relative_delta(raw_brow_gap(frame), baseline.brow, EPSILON);
        let jaw_openness = safe_relative_delta(raw_jaw_gap(frame), baseline.jaw, EPSILON);
        let mouth_corner_drop =
            safe_relative_delta(raw_corner_drop(frame), baseline.mouth_corner, EPSILON);

        let head_stability = self.update_head_stability(frame, baseline);
        let micro_movements = self.micro_movements(frame);

        self.previous_frame = Some(frame.clone());

        FeatureVector {
            eye_aspect_ratio: ear,
            blink_rate,
            brow_tension,
            jaw_openness,
            mouth_corner_drop,
            head_stability,
            micro_movements,
            timestamp_ms: frame.timestamp_ms,
        }
    }

    /// Clear all rolling state. After this the extractor behaves exactly like
    /// a freshly constructed instance.
    pub fn reset(&mut self) {
        self.blink_history.clear();
        self.head_history.clear();
        self.previous_frame = None;
    }

    /// Diagnostic introspection; not part of the inference contract.
    pub fn buffer_status(&self) -> BufferStatus {
        BufferStatus {
            blink_history_len: self.blink_history.len(),
            head_history_len: self.head_history.len(),
            has_previous_frame: self.previous_frame.is_some(),
        }
    }

    /// Push the head-reference point and score stillness: variance of the
    /// buffered distances from the baseline head position, scaled and
    /// inverted so low variance reads as high stability.
    fn update_head_stability(&mut self, frame: &LandmarkFrame, baseline: &Baseline) -> f64 {
        let head = head_point(frame);
        self.head_history.push_back((head, frame.timestamp_ms));
        while self.head_history.len() > HEAD_HISTORY_CAPACITY {
            self.head_history.pop_front();
        }

        let base = Point::new(baseline.head_x, baseline.head_y);
        let distances: Vec<f64> = self
            .head_history
            .iter()
            .map(|(p, _)| distance(*p, base))
            .collect();

        let m = mean(&distances);
        let variance = distances.iter().map(|d| (d - m).powi(2)).sum::<f64>()
            / distances.len().max(1) as f64;

        1.0 - (variance * 100.0).min(1.0)
    }

    /// Mean displacement of the key landmarks versus the previous frame;
    /// 0 on the first frame of a session.
    fn micro_movements(&self, frame: &LandmarkFrame) -> f64 {
        let previous = match &self.previous_frame {
            Some(prev) => prev,
            None => return 0.0,
        };

        let total: f64 = MICRO_MOVEMENT_INDICES
            .iter()
            .map(|&i| distance(frame.point(i), previous.point(i)))
            .sum();
        total / MICRO_MOVEMENT_INDICES.len() as f64
    }
}

/// Eye aspect ratio averaged over both eyes: vertical eyelid separation over
/// horizontal corner separation, per eye, guarded against zero eye width.
pub fn raw_ear(frame: &LandmarkFrame) -> f64 {
    let left = single_eye_ear(
        frame,
        landmark::LEFT_EYE_OUTER,
        landmark::LEFT_EYE_INNER,
        landmark::LEFT_EYE_UPPER,
        landmark::LEFT_EYE_LOWER,
    );
    let right = single_eye_ear(
        frame,
        landmark::RIGHT_EYE_INNER,
        landmark::RIGHT_EYE_OUTER,
        landmark::RIGHT_EYE_UPPER,
        landmark::RIGHT_EYE_LOWER,
    );
    (left + right) / 2.0
}

fn single_eye_ear(
    frame: &LandmarkFrame,
    corner_a: usize,
    corner_b: usize,
    upper: usize,
    lower: usize,
) -> f64 {
    let horizontal = distance(frame.point(corner_a), frame.point(corner_b));
    if horizontal < EPSILON {
        return 0.0;
    }
    let vertical = distance(frame.point(upper), frame.point(lower));
    vertical / horizontal
}

/// Average vertical gap between the brow points and the corresponding upper
/// eyelids; shrinks when the brow tenses down.
pub fn raw_brow_gap(frame: &LandmarkFrame) -> f64 {
    let left = vertical_gap(
        frame.point(landmark::LEFT_BROW),
        frame.point(landmark::LEFT_EYE_UPPER),
    );
    let right = vertical_gap(
        frame.point(landmark::RIGHT_BROW),
        frame.point(landmark::RIGHT_EYE_UPPER),
    );
    (left + right) / 2.0
}

/// Inner-lip separation; grows as the jaw opens.
pub fn raw_jaw_gap(frame: &LandmarkFrame) -> f64 {
    distance(
        frame.point(landmark::UPPER_LIP),
        frame.point(landmark::LOWER_LIP),
    )
}

/// Signed average vertical offset of the mouth corners below the mouth
/// center; positive when the corners sit lower than the center.
pub fn raw_corner_drop(frame: &LandmarkFrame) -> f64 {
    let center = frame.point(landmark::UPPER_LIP);
    let left = frame.point(landmark::LEFT_MOUTH_CORNER).y - center.y;
    let right = frame.point(landmark::RIGHT_MOUTH_CORNER).y - center.y;
    (left + right) / 2.0
}

/// The designated head-reference landmark.
pub fn head_point(frame: &LandmarkFrame) -> Point {
    frame.point(landmark::NOSE_TIP)
}

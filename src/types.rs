//! Core types for the Stresslens pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: landmark frames, session baselines, per-frame feature vectors,
//! and inference output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single 2D/3D landmark point in normalized image coordinates.
///
/// `x` and `y` are in `[0, 1]` relative to the image; `z` is the detector's
/// relative depth estimate and defaults to 0 when the detector only emits 2D.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }
}

/// Landmark indices into the face-mesh topology emitted by the upstream
/// detector. Index positions are semantically fixed by that detector; the
/// pipeline reads only the subset below.
pub mod landmark {
    /// Nose tip, used as the head-reference point.
    pub const NOSE_TIP: usize = 1;

    /// Left eye outer/inner corners (horizontal axis).
    pub const LEFT_EYE_OUTER: usize = 33;
    pub const LEFT_EYE_INNER: usize = 133;
    /// Left upper/lower eyelid midpoints (vertical axis).
    pub const LEFT_EYE_UPPER: usize = 159;
    pub const LEFT_EYE_LOWER: usize = 145;

    /// Right eye corners and eyelid midpoints.
    pub const RIGHT_EYE_INNER: usize = 362;
    pub const RIGHT_EYE_OUTER: usize = 263;
    pub const RIGHT_EYE_UPPER: usize = 386;
    pub const RIGHT_EYE_LOWER: usize = 374;

    /// Mid-brow points, left and right.
    pub const LEFT_BROW: usize = 105;
    pub const RIGHT_BROW: usize = 334;

    /// Mouth corners.
    pub const LEFT_MOUTH_CORNER: usize = 61;
    pub const RIGHT_MOUTH_CORNER: usize = 291;

    /// Inner-lip midpoints; their separation measures jaw openness and their
    /// upper point serves as the mouth center for corner-drop measurement.
    pub const UPPER_LIP: usize = 13;
    pub const LOWER_LIP: usize = 14;

    /// Highest index the pipeline dereferences. Frames shorter than this are
    /// rejected at the crate boundary.
    pub const MAX_INDEX: usize = RIGHT_EYE_UPPER;

    /// Minimum frame length accepted by [`crate::types::LandmarkFrame`].
    pub const MIN_FRAME_LEN: usize = MAX_INDEX + 1;
}

/// One frame of detector output: an ordered, fixed-length point sequence plus
/// the capture timestamp in milliseconds (monotonic, detector clock).
///
/// Frames are read-only to the pipeline; only the head-reference point and a
/// previous-frame snapshot are ever buffered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandmarkFrame {
    pub points: Vec<Point>,
    /// Capture time in milliseconds on the detector's monotonic clock.
    pub timestamp_ms: f64,
}

impl LandmarkFrame {
    /// Build a frame from detector points. Returns `None` when the sequence
    /// is too short to contain the indices the pipeline reads.
    pub fn new(points: Vec<Point>, timestamp_ms: f64) -> Option<Self> {
        if points.len() < landmark::MIN_FRAME_LEN {
            return None;
        }
        Some(Self {
            points,
            timestamp_ms,
        })
    }

    /// Build a frame from a flat `[x0, y0, z0, x1, y1, z1, ...]` buffer, the
    /// layout used on the FFI path.
    pub fn from_flat(coords: &[f64], timestamp_ms: f64) -> Option<Self> {
        if coords.len() % 3 != 0 {
            return None;
        }
        let points = coords
            .chunks_exact(3)
            .map(|c| Point {
                x: c[0],
                y: c[1],
                z: c[2],
            })
            .collect();
        Self::new(points, timestamp_ms)
    }

    #[inline]
    pub fn point(&self, index: usize) -> Point {
        self.points[index]
    }
}

/// Per-session resting reference values, computed once from the calibration
/// window and immutable for the remainder of the session.
///
/// The all-zero default is the pre-calibration sentinel: guarded division in
/// the feature extractor turns it into "no relative signal" rather than NaN.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Baseline {
    /// Resting eye aspect ratio.
    pub ear: f64,
    /// Resting brow-to-eyelid vertical gap.
    pub brow: f64,
    /// Resting inner-lip separation.
    pub jaw: f64,
    /// Resting signed mouth-corner drop.
    pub mouth_corner: f64,
    /// Resting head-reference position.
    pub head_x: f64,
    pub head_y: f64,
}

impl Baseline {
    /// Serialize to JSON (host-side debugging; baselines are never persisted
    /// across sessions by this crate).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Load from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Per-frame derived measurements. All fields are finite by construction;
/// relative metrics fall back to 0 when the baseline denominator is
/// degenerate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Absolute eye aspect ratio, averaged over both eyes.
    pub eye_aspect_ratio: f64,
    /// Count of blink frames within the blink-history window (~2 s).
    pub blink_rate: f64,
    /// Brow gap delta relative to baseline.
    pub brow_tension: f64,
    /// Inner-lip separation delta relative to baseline.
    pub jaw_openness: f64,
    /// Mouth-corner drop delta relative to baseline.
    pub mouth_corner_drop: f64,
    /// 1 − clamped variance of head displacement; high means still.
    pub head_stability: f64,
    /// Mean key-landmark displacement versus the previous frame.
    pub micro_movements: f64,
    /// Capture time of the source frame (ms).
    pub timestamp_ms: f64,
}

impl FeatureVector {
    /// Fixed-order numeric tuple layout used by
    /// [`crate::inference::StressEngine::recent_features`] for offline
    /// calibration exports. Timestamp is last.
    pub fn as_tuple(&self) -> [f64; 8] {
        [
            self.eye_aspect_ratio,
            self.blink_rate,
            self.brow_tension,
            self.jaw_openness,
            self.mouth_corner_drop,
            self.head_stability,
            self.micro_movements,
            self.timestamp_ms,
        ]
    }
}

/// Short-horizon direction of recent smoothed scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

/// Inference output produced on every frame once the engine is warm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InferenceResult {
    /// Smoothed stress estimate in `[0, 1]`.
    pub stress_level: f64,
    /// Combined history-fill and prediction-stability confidence in `[0, 1]`.
    pub confidence: f64,
    pub trend: Trend,
    /// Fraction of the minimum required sample count currently buffered.
    pub buffer_health: f64,
}

impl InferenceResult {
    /// Degraded placeholder returned while the feature window is still
    /// filling. Not an error state: it signals "keep collecting".
    pub fn warming_up(buffer_health: f64) -> Self {
        Self {
            stress_level: 0.5,
            confidence: 0.0,
            trend: Trend::Stable,
            buffer_health: buffer_health.clamp(0.0, 1.0),
        }
    }
}

/// Per-channel activity classification for live UI feedback, derived by
/// double-thresholding a channel delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalStatus {
    Stable,
    Minimal,
    Active,
}

/// Live per-channel signal statuses, independent of the smoothed pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveSignals {
    pub eye: SignalStatus,
    pub brow: SignalStatus,
    pub jaw: SignalStatus,
    pub head: SignalStatus,
}

/// Descriptive (not predictive) per-channel means over the most recent
/// buffered feature vectors, for explaining why a score was produced.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricBreakdown {
    /// Mean eye aspect ratio.
    pub eye: f64,
    /// Mean brow tension delta.
    pub brow: f64,
    /// Mean jaw openness delta.
    pub jaw: f64,
    /// Mean head stability.
    pub head: f64,
}

/// Categorical presentation band. The cut points (0.33, 0.66) are a
/// presentation convention, not part of the inference contract; they are
/// provided here so downstream consumers share one definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StressBand {
    Low,
    Moderate,
    High,
}

impl StressBand {
    pub fn from_level(level: f64) -> Self {
        if level < 0.33 {
            StressBand::Low
        } else if level < 0.66 {
            StressBand::Moderate
        } else {
            StressBand::High
        }
    }
}

/// Session provenance summary for downstream consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub producer: String,
    pub version: String,
    pub started_at: DateTime<Utc>,
    pub computed_at: DateTime<Utc>,
    /// Total frames observed, calibration window included.
    pub frames_seen: u64,
    /// Baseline in effect (all-zero if calibration never completed).
    pub baseline: Baseline,
    /// Most recent inference result, if any frame reached the engine.
    pub last_result: Option<InferenceResult>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_frame_rejects_short_sequences() {
        let points = vec![Point::new(0.5, 0.5); 10];
        assert!(LandmarkFrame::new(points, 0.0).is_none());
    }

    #[test]
    fn test_frame_from_flat() {
        let coords: Vec<f64> = (0..landmark::MIN_FRAME_LEN)
            .flat_map(|i| vec![i as f64 * 0.001, 0.5, 0.0])
            .collect();
        let frame = LandmarkFrame::from_flat(&coords, 33.0).unwrap();
        assert_eq!(frame.points.len(), landmark::MIN_FRAME_LEN);
        assert!((frame.point(1).x - 0.001).abs() < 1e-12);

        // Ragged buffer is rejected
        assert!(LandmarkFrame::from_flat(&coords[..coords.len() - 1], 0.0).is_none());
    }

    #[test]
    fn test_warming_up_placeholder() {
        let result = InferenceResult::warming_up(0.4);
        assert_eq!(result.stress_level, 0.5);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.trend, Trend::Stable);
        assert!((result.buffer_health - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_stress_bands() {
        assert_eq!(StressBand::from_level(0.1), StressBand::Low);
        assert_eq!(StressBand::from_level(0.33), StressBand::Moderate);
        assert_eq!(StressBand::from_level(0.9), StressBand::High);
    }

    #[test]
    fn test_baseline_json_round_trip() {
        let baseline = Baseline {
            ear: 0.31,
            brow: 0.05,
            jaw: 0.01,
            mouth_corner: -0.002,
            head_x: 0.5,
            head_y: 0.45,
        };
        let json = baseline.to_json().unwrap();
        let loaded = Baseline::from_json(&json).unwrap();
        assert_eq!(baseline, loaded);
    }
}

//! Baseline calibration
//!
//! The first seconds of a session establish the user's resting reference
//! values: raw EAR, brow gap, jaw gap, mouth-corner offset, and head
//! position are accumulated per frame and averaged into a [`Baseline`].
//! Relative features only mean anything against that baseline.
//!
//! A baseline is strictly per-session: a new camera angle, lighting
//! condition, or person invalidates it, so it is never persisted across
//! sessions.

use crate::features::{head_point, raw_brow_gap, raw_corner_drop, raw_ear, raw_jaw_gap};
use crate::geometry::mean;
use crate::types::{Baseline, LandmarkFrame};

/// Default calibration window in frames (~3 s at 30 fps).
pub const DEFAULT_CALIBRATION_FRAMES: usize = 90;

/// Accumulates raw per-frame measurements during the calibration window.
///
/// Raw values only; no relative feature is computed until the baseline
/// exists. Zero observed frames (detector never found a face) yields the
/// all-zero baseline, which the extractor's guarded division reads as
/// "no relative signal available".
#[derive(Debug, Clone)]
pub struct BaselineCalibrator {
    ear_samples: Vec<f64>,
    brow_samples: Vec<f64>,
    jaw_samples: Vec<f64>,
    corner_samples: Vec<f64>,
    head_x_samples: Vec<f64>,
    head_y_samples: Vec<f64>,
    target_frames: usize,
}

impl Default for BaselineCalibrator {
    fn default() -> Self {
        Self::new(DEFAULT_CALIBRATION_FRAMES)
    }
}

impl BaselineCalibrator {
    pub fn new(target_frames: usize) -> Self {
        Self {
            ear_samples: Vec::with_capacity(target_frames),
            brow_samples: Vec::with_capacity(target_frames),
            jaw_samples: Vec::with_capacity(target_frames),
            corner_samples: Vec::with_capacity(target_frames),
            head_x_samples: Vec::with_capacity(target_frames),
            head_y_samples: Vec::with_capacity(target_frames),
            target_frames: target_frames.max(1),
        }
    }

    /// Record one calibration frame's raw measurements.
    pub fn observe(&mut self, frame: &LandmarkFrame) {
        self.ear_samples.push(raw_ear(frame));
        self.brow_samples.push(raw_brow_gap(frame));
        self.jaw_samples.push(raw_jaw_gap(frame));
        self.corner_samples.push(raw_corner_drop(frame));
        let head = head_point(frame);
        self.head_x_samples.push(head.x);
        self.head_y_samples.push(head.y);
    }

    pub fn sample_count(&self) -> usize {
        self.ear_samples.len()
    }

    /// Fraction of the calibration window observed so far.
    pub fn progress(&self) -> f64 {
        (self.sample_count() as f64 / self.target_frames as f64).clamp(0.0, 1.0)
    }

    pub fn is_complete(&self) -> bool {
        self.sample_count() >= self.target_frames
    }

    /// Average the accumulated measurements into the session baseline.
    pub fn finish(&self) -> Baseline {
        Baseline {
            ear: mean(&self.ear_samples),
            brow: mean(&self.brow_samples),
            jaw: mean(&self.jaw_samples),
            mouth_corner: mean(&self.corner_samples),
            head_x: mean(&self.head_x_samples),
            head_y: mean(&self.head_y_samples),
        }
    }
}

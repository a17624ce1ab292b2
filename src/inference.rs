//! Stress inference engine
//!
//! Turns the stream of per-frame feature vectors into a stable
//! [`InferenceResult`] stream: buffers a sliding window of features,
//! aggregates it into a fixed descriptor, scores it through the pluggable
//! model, smooths the score sequence with recency weighting, and derives
//! confidence and trend.
//!
//! The engine never errors. Below the minimum sample count it returns the
//! warming-up placeholder; a misbehaving model is clamped or replaced by
//! the last-known-good smoothed value.

use std::collections::VecDeque;

use crate::geometry::{mean, std_dev};
use crate::model::{Descriptor, ModelKind, StressModel};
use crate::types::{
    FeatureVector, InferenceResult, LiveSignals, MetricBreakdown, SignalStatus, Trend,
};

/// Dimensions of the aggregated descriptor fed to the model.
pub const DESCRIPTOR_DIMS: usize = 7;

/// Feature-window capacity (~1 s at 30 fps).
pub const FEATURE_BUFFER_CAPACITY: usize = 30;

/// Raw-score buffer capacity used for smoothing.
pub const PREDICTION_BUFFER_CAPACITY: usize = 5;

/// Smoothed-score history capacity; trend needs six samples, which the
/// five-slot prediction buffer cannot hold.
const SMOOTHED_HISTORY_CAPACITY: usize = 30;

/// Minimum buffered features before real inference starts.
pub const MIN_SAMPLES: usize = 5;

/// Samples per trend comparison window.
const TREND_WINDOW: usize = 3;

/// Smoothed-score movement that registers as a trend.
const TREND_THRESHOLD: f64 = 0.10;

/// Feature vectors summarized by [`StressEngine::metric_breakdown`].
const BREAKDOWN_WINDOW: usize = 10;

/// Session-scoped inference engine. One instance per session; pairs with
/// one [`crate::features::FeatureExtractor`].
pub struct StressEngine {
    feature_buffer: VecDeque<FeatureVector>,
    prediction_buffer: VecDeque<f64>,
    smoothed_history: VecDeque<f64>,
    last_smoothed: f64,
    model: Box<dyn StressModel>,
}

impl Default for StressEngine {
    fn default() -> Self {
        Self::new(&ModelKind::Heuristic)
    }
}

impl StressEngine {
    /// Build an engine with the model selected at construction time.
    pub fn new(model: &ModelKind) -> Self {
        Self {
            feature_buffer: VecDeque::with_capacity(FEATURE_BUFFER_CAPACITY),
            prediction_buffer: VecDeque::with_capacity(PREDICTION_BUFFER_CAPACITY),
            smoothed_history: VecDeque::with_capacity(SMOOTHED_HISTORY_CAPACITY),
            last_smoothed: 0.5,
            model: model.build(),
        }
    }

    pub fn model_name(&self) -> &'static str {
        self.model.name()
    }

    /// Ingest one feature vector and produce the next inference result.
    pub fn add_features(&mut self, features: FeatureVector) -> InferenceResult {
        self.feature_buffer.push_back(features);
        while self.feature_buffer.len() > FEATURE_BUFFER_CAPACITY {
            self.feature_buffer.pop_front();
        }

        if self.feature_buffer.len() < MIN_SAMPLES {
            return InferenceResult::warming_up(
                self.feature_buffer.len() as f64 / MIN_SAMPLES as f64,
            );
        }

        let descriptor = self.aggregate();
        let raw_score = self.sanitized_prediction(&descriptor);

        self.prediction_buffer.push_back(raw_score);
        while self.prediction_buffer.len() > PREDICTION_BUFFER_CAPACITY {
            self.prediction_buffer.pop_front();
        }

        let smoothed = self.smooth();
        self.last_smoothed = smoothed;
        self.smoothed_history.push_back(smoothed);
        while self.smoothed_history.len() > SMOOTHED_HISTORY_CAPACITY {
            self.smoothed_history.pop_front();
        }

        InferenceResult {
            stress_level: smoothed,
            confidence: self.confidence(),
            trend: self.trend(),
            buffer_health: 1.0,
        }
    }

    /// Aggregate the feature window into the fixed descriptor:
    /// means for the relative deltas, sum for blink frames (the absolute
    /// count in the window matters), std for micro-movements (variability,
    /// not magnitude, signals agitation).
    fn aggregate(&self) -> Descriptor {
        let column = |f: fn(&FeatureVector) -> f64| -> Vec<f64> {
            self.feature_buffer.iter().map(f).collect()
        };

        let ears = column(|f| f.eye_aspect_ratio);
        let blinks = column(|f| f.blink_rate);
        let brows = column(|f| f.brow_tension);
        let jaws = column(|f| f.jaw_openness);
        let corners = column(|f| f.mouth_corner_drop);
        let heads = column(|f| f.head_stability);
        let micros = column(|f| f.micro_movements);

        [
            mean(&ears),
            blinks.iter().sum(),
            mean(&brows),
            mean(&jaws),
            mean(&corners),
            mean(&heads),
            std_dev(&micros),
        ]
    }

    /// Run the model and sanitize its output: clamp finite scores into
    /// `[0, 1]`; replace a no-op or non-finite result with the
    /// last-known-good smoothed value.
    fn sanitized_prediction(&self, descriptor: &Descriptor) -> f64 {
        match self.model.predict(descriptor) {
            Some(score) if score.is_finite() => score.clamp(0.0, 1.0),
            _ => self.last_smoothed,
        }
    }

    /// Exponentially recency-weighted average over the raw-score buffer:
    /// the i-th entry (oldest first) weighs `exp(i / len)`, so newer
    /// scores dominate without a single frame owning the output.
    fn smooth(&self) -> f64 {
        let len = self.prediction_buffer.len();
        if len == 0 {
            return self.last_smoothed;
        }

        let mut weighted = 0.0;
        let mut total = 0.0;
        for (i, score) in self.prediction_buffer.iter().enumerate() {
            let weight = (i as f64 / len as f64).exp();
            weighted += score * weight;
            total += weight;
        }
        (weighted / total).clamp(0.0, 1.0)
    }

    /// Confidence is half history fill, half prediction stability: low when
    /// there is little history and low when recent raw scores bounce.
    fn confidence(&self) -> f64 {
        let fill =
            (self.feature_buffer.len() as f64 / FEATURE_BUFFER_CAPACITY as f64).min(1.0);

        let scores: Vec<f64> = self.prediction_buffer.iter().copied().collect();
        let stability = if scores.len() > 1 {
            (1.0 - 2.0 * std_dev(&scores)).clamp(0.0, 1.0)
        } else {
            0.0
        };

        fill * 0.5 + stability * 0.5
    }

    /// Compare the mean of the last three smoothed scores against the mean
    /// of the three before them; fewer than six samples reads as stable.
    fn trend(&self) -> Trend {
        let len = self.smoothed_history.len();
        if len < TREND_WINDOW * 2 {
            return Trend::Stable;
        }

        let scores: Vec<f64> = self.smoothed_history.iter().copied().collect();
        let recent = mean(&scores[len - TREND_WINDOW..]);
        let older = mean(&scores[len - TREND_WINDOW * 2..len - TREND_WINDOW]);

        let delta = recent - older;
        if delta > TREND_THRESHOLD {
            Trend::Increasing
        } else if delta < -TREND_THRESHOLD {
            Trend::Decreasing
        } else {
            Trend::Stable
        }
    }

    /// Per-channel live statuses via double thresholding, independent of
    /// the smoothed pipeline: below the first threshold the channel is
    /// stable, below the second minimally active, above it active.
    pub fn live_signals(&self, features: &FeatureVector) -> LiveSignals {
        let blink_fraction =
            features.blink_rate / crate::features::BLINK_HISTORY_CAPACITY as f64;

        LiveSignals {
            eye: double_threshold(blink_fraction, 0.05, 0.20),
            brow: double_threshold(features.brow_tension.abs(), 0.05, 0.15),
            jaw: double_threshold(features.jaw_openness.abs(), 0.05, 0.15),
            head: double_threshold(1.0 - features.head_stability, 0.10, 0.30),
        }
    }

    /// Descriptive per-channel means over the last ten buffered feature
    /// vectors, for explaining why a score was produced. Not predictive.
    pub fn metric_breakdown(&self) -> MetricBreakdown {
        let start = self.feature_buffer.len().saturating_sub(BREAKDOWN_WINDOW);
        let recent: Vec<&FeatureVector> = self.feature_buffer.iter().skip(start).collect();
        if recent.is_empty() {
            return MetricBreakdown::default();
        }

        let avg = |f: fn(&FeatureVector) -> f64| -> f64 {
            recent.iter().map(|v| f(v)).sum::<f64>() / recent.len() as f64
        };

        MetricBreakdown {
            eye: avg(|f| f.eye_aspect_ratio),
            brow: avg(|f| f.brow_tension),
            jaw: avg(|f| f.jaw_openness),
            head: avg(|f| f.head_stability),
        }
    }

    /// Buffered feature vectors as fixed-order tuples, oldest first, for
    /// offline calibration or model training.
    pub fn recent_features(&self) -> Vec<[f64; 8]> {
        self.feature_buffer.iter().map(|f| f.as_tuple()).collect()
    }

    pub fn feature_buffer_len(&self) -> usize {
        self.feature_buffer.len()
    }

    pub fn prediction_buffer_len(&self) -> usize {
        self.prediction_buffer.len()
    }

    /// Clear all buffers. Subsequent behavior is identical to a freshly
    /// constructed engine with the same model.
    pub fn reset(&mut self) {
        self.feature_buffer.clear();
        self.prediction_buffer.clear();
        self.smoothed_history.clear();
        self.last_smoothed = 0.5;
    }
}

fn double_threshold(delta: f64, minimal: f64, active: f64) -> SignalStatus {
    if delta < minimal {
        SignalStatus::Stable
    } else if delta < active {
        SignalStatus::Minimal
    } else {
        SignalStatus::Active
    }
}

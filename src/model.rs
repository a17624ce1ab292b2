//! Scoring models
//!
//! The one deliberately swappable seam in the pipeline: a model maps the
//! aggregated 7-dimensional feature descriptor to a raw stress score in
//! `[0, 1]`. Implementations never panic; a model that cannot produce a
//! score returns `None` (the reserved no-op result) and the engine holds
//! its last-known-good smoothed value instead.

use serde::{Deserialize, Serialize};

use crate::inference::DESCRIPTOR_DIMS;

/// Descriptor layout fed to [`StressModel::predict`], fixed by the engine's
/// aggregation step:
/// `[mean ear, sum blink, mean brow, mean jaw, mean corner, mean head
/// stability, std micro-movements]`.
pub type Descriptor = [f64; DESCRIPTOR_DIMS];

/// Capability contract for scoring an aggregated descriptor.
///
/// Selected explicitly at session construction via [`ModelKind`]; the
/// inference engine is agnostic to which implementation is behind the
/// trait object.
pub trait StressModel: Send {
    /// Score the descriptor. `Some(score)` must be finite; the engine
    /// clamps to `[0, 1]` regardless. `None` means "cannot score this
    /// descriptor" and is never an error.
    fn predict(&self, descriptor: &Descriptor) -> Option<f64>;

    /// Implementation name for reports and diagnostics.
    fn name(&self) -> &'static str;
}

/// Construction-time model selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ModelKind {
    /// Weighted-sum heuristic, the default scoring path.
    #[default]
    Heuristic,
    /// Offline-trained linear classifier with explicit weights.
    Linear(LinearWeights),
    /// No model available; always returns the no-op result.
    Noop,
}

impl ModelKind {
    /// Instantiate the selected model.
    pub fn build(&self) -> Box<dyn StressModel> {
        match self {
            ModelKind::Heuristic => Box::new(HeuristicModel),
            ModelKind::Linear(weights) => Box::new(LinearModel::new(weights.clone())),
            ModelKind::Noop => Box::new(NoopModel),
        }
    }
}

/// Resting EAR assumed by the heuristic's absolute eye-closure term.
const HEURISTIC_REST_EAR: f64 = 0.3;

/// Eye-closure level above which the spike emphasis kicks in.
const SPIKE_EYE_DELTA: f64 = 0.3;

/// Additional score applied when the eye channel spikes.
const SPIKE_EMPHASIS: f64 = 0.25;

/// Default heuristic: per-dimension saturating subscores combined with
/// fixed weights, plus a spike-emphasis term when the eye channel departs
/// sharply from rest.
///
/// Relative deltas contribute by magnitude: a tensed brow shrinks the brow
/// gap (negative delta) but signals arousal just as an opened jaw
/// (positive delta) does.
pub struct HeuristicModel;

impl HeuristicModel {
    fn subscores(descriptor: &Descriptor) -> [f64; 7] {
        let [ear, blink_sum, brow, jaw, corner, head_stability, micro_std] = *descriptor;

        let eye_closure =
            ((HEURISTIC_REST_EAR - ear) / HEURISTIC_REST_EAR).clamp(0.0, 1.0);
        let blink_load = saturate(blink_sum, 8.0);
        let brow_term = saturate(brow.abs(), 0.2);
        let jaw_term = saturate(jaw.abs(), 0.3);
        let corner_term = saturate(corner.abs(), 0.3);
        let restlessness = (1.0 - head_stability).clamp(0.0, 1.0);
        let micro_term = saturate(micro_std, 0.01);

        [
            eye_closure,
            blink_load,
            brow_term,
            jaw_term,
            corner_term,
            restlessness,
            micro_term,
        ]
    }
}

impl StressModel for HeuristicModel {
    fn predict(&self, descriptor: &Descriptor) -> Option<f64> {
        let [eye_closure, blink_load, brow, jaw, corner, restlessness, micro] =
            Self::subscores(descriptor);

        let mut score = 0.10 * eye_closure
            + 0.20 * blink_load
            + 0.20 * brow
            + 0.15 * jaw
            + 0.05 * corner
            + 0.15 * restlessness
            + 0.15 * micro;

        // Sharp eye-channel departures get extra emphasis so rapid blinking
        // registers faster than the window means alone would allow.
        if eye_closure > SPIKE_EYE_DELTA {
            score += SPIKE_EMPHASIS;
        }

        Some(score.clamp(0.0, 1.0))
    }

    fn name(&self) -> &'static str {
        "heuristic-v1"
    }
}

/// Exponential saturation: 0 at 0, ~0.63 at `scale`, asymptotically 1.
fn saturate(value: f64, scale: f64) -> f64 {
    (1.0 - (-value.max(0.0) / scale).exp()).clamp(0.0, 1.0)
}

/// Weights for [`LinearModel`], loadable from JSON produced by offline
/// training against [`crate::inference::StressEngine::recent_features`]
/// exports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearWeights {
    pub weights: [f64; DESCRIPTOR_DIMS],
    pub bias: f64,
}

impl LinearWeights {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Adapter for an offline-trained linear classifier: dot product plus bias,
/// squashed through a logistic to `[0, 1]`.
pub struct LinearModel {
    weights: LinearWeights,
}

impl LinearModel {
    pub fn new(weights: LinearWeights) -> Self {
        Self { weights }
    }
}

impl StressModel for LinearModel {
    fn predict(&self, descriptor: &Descriptor) -> Option<f64> {
        let dot: f64 = descriptor
            .iter()
            .zip(self.weights.weights.iter())
            .map(|(x, w)| x * w)
            .sum();
        let logit = dot + self.weights.bias;
        if !logit.is_finite() {
            return None;
        }
        Some(1.0 / (1.0 + (-logit).exp()))
    }

    fn name(&self) -> &'static str {
        "linear-v1"
    }
}

/// Safe default when no real model is available: always the no-op result.
pub struct NoopModel;

impl StressModel for NoopModel {
    fn predict(&self, _descriptor: &Descriptor) -> Option<f64> {
        None
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CALM: Descriptor = [0.3, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0];
    const AGITATED: Descriptor = [0.08, 40.0, -0.3, 2.0, 0.4, 0.3, 0.05];

    #[test]
    fn test_heuristic_calm_scores_low() {
        let score = HeuristicModel.predict(&CALM).unwrap();
        assert!(score < 0.05, "calm descriptor scored {score}");
    }

    #[test]
    fn test_heuristic_agitated_scores_high() {
        let score = HeuristicModel.predict(&AGITATED).unwrap();
        assert!(score > 0.6, "agitated descriptor scored {score}");
        assert!(score <= 1.0);
    }

    #[test]
    fn test_heuristic_spike_emphasis() {
        // Identical except for the eye channel crossing the spike threshold
        let mild: Descriptor = [0.25, 2.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let spiked: Descriptor = [0.05, 2.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let mild_score = HeuristicModel.predict(&mild).unwrap();
        let spiked_score = HeuristicModel.predict(&spiked).unwrap();
        assert!(spiked_score - mild_score > SPIKE_EMPHASIS * 0.9);
    }

    #[test]
    fn test_heuristic_always_in_range() {
        let extreme: Descriptor = [-5.0, 1e6, -1e6, 1e6, -1e6, -5.0, 1e6];
        let score = HeuristicModel.predict(&extreme).unwrap();
        assert!((0.0..=1.0).contains(&score));
        assert!(score.is_finite());
    }

    #[test]
    fn test_linear_model_logistic_output() {
        let weights = LinearWeights {
            weights: [0.0; DESCRIPTOR_DIMS],
            bias: 0.0,
        };
        let model = LinearModel::new(weights);
        let score = model.predict(&CALM).unwrap();
        assert!((score - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_linear_weights_json_round_trip() {
        let weights = LinearWeights {
            weights: [0.1, -0.2, 0.3, 0.0, 0.0, -0.5, 1.0],
            bias: -0.25,
        };
        let json = weights.to_json().unwrap();
        let loaded = LinearWeights::from_json(&json).unwrap();
        assert_eq!(loaded.weights, weights.weights);
        assert_eq!(loaded.bias, weights.bias);
    }

    #[test]
    fn test_noop_model_is_noop() {
        assert!(NoopModel.predict(&AGITATED).is_none());
        assert_eq!(NoopModel.name(), "noop");
    }

    #[test]
    fn test_model_kind_builds_selected_model() {
        assert_eq!(ModelKind::Heuristic.build().name(), "heuristic-v1");
        assert_eq!(ModelKind::Noop.build().name(), "noop");
        let linear = ModelKind::Linear(LinearWeights {
            weights: [0.0; DESCRIPTOR_DIMS],
            bias: 0.0,
        });
        assert_eq!(linear.build().name(), "linear-v1");
    }
}

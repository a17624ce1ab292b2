//! Session orchestration
//!
//! A [`StressSession`] owns the full per-session pipeline: baseline
//! calibration for the first frames, then feature extraction and inference
//! for every frame after. One session per camera stream; sessions share no
//! state, and [`StressSession::reset`] is the only supported way to reuse
//! an instance.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::baseline::{BaselineCalibrator, DEFAULT_CALIBRATION_FRAMES};
use crate::error::StressError;
use crate::features::FeatureExtractor;
use crate::inference::StressEngine;
use crate::model::ModelKind;
use crate::types::{
    Baseline, FeatureVector, InferenceResult, LandmarkFrame, LiveSignals, MetricBreakdown,
    SessionReport,
};
use crate::{PRODUCER_NAME, VERSION};

/// Session construction parameters. The model is chosen here, once; there
/// is no runtime model swapping.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SessionConfig {
    /// Frames in the calibration window (~2-4 s at the detector rate).
    pub calibration_frames: usize,
    pub model: ModelKind,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            calibration_frames: DEFAULT_CALIBRATION_FRAMES,
            model: ModelKind::default(),
        }
    }
}

impl SessionConfig {
    pub fn from_json(json: &str) -> Result<Self, StressError> {
        let config: Self = serde_json::from_str(json)?;
        if config.calibration_frames == 0 {
            return Err(StressError::InvalidConfig(
                "calibration_frames must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }
}

/// Outcome of feeding one frame to a session.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case", tag = "phase")]
pub enum FrameOutcome {
    /// Still inside the calibration window.
    Calibrating { progress: f64 },
    /// Baseline established; inference is live.
    Inference(InferenceResult),
}

enum Phase {
    Calibrating(BaselineCalibrator),
    Running(Baseline),
}

/// One live analysis session: calibrator, extractor, and engine behind a
/// single per-frame entry point. Processing is synchronous per frame; the
/// caller paces invocations at the detector's callback rate.
pub struct StressSession {
    config: SessionConfig,
    phase: Phase,
    extractor: FeatureExtractor,
    engine: StressEngine,
    session_id: Uuid,
    started_at: DateTime<Utc>,
    frames_seen: u64,
    last_features: Option<FeatureVector>,
    last_result: Option<InferenceResult>,
}

impl Default for StressSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl StressSession {
    pub fn new(config: SessionConfig) -> Self {
        let engine = StressEngine::new(&config.model);
        Self {
            phase: Phase::Calibrating(BaselineCalibrator::new(config.calibration_frames)),
            extractor: FeatureExtractor::new(),
            engine,
            session_id: Uuid::new_v4(),
            started_at: Utc::now(),
            frames_seen: 0,
            last_features: None,
            last_result: None,
            config,
        }
    }

    /// Feed one detector frame through the pipeline.
    ///
    /// During the calibration window raw measurements accumulate and a
    /// progress fraction is returned; the baseline is finalized when the
    /// window fills, and every later frame yields an inference result.
    /// Never fails on frame content.
    pub fn process_frame(&mut self, frame: &LandmarkFrame) -> FrameOutcome {
        self.frames_seen += 1;

        if let Phase::Calibrating(calibrator) = &mut self.phase {
            calibrator.observe(frame);
            if !calibrator.is_complete() {
                return FrameOutcome::Calibrating {
                    progress: calibrator.progress(),
                };
            }
            let baseline = calibrator.finish();
            self.phase = Phase::Running(baseline);
        }

        let baseline = match &self.phase {
            Phase::Running(baseline) => *baseline,
            Phase::Calibrating(_) => unreachable!("calibration completed above"),
        };

        let features = self.extractor.extract(frame, &baseline);
        let result = self.engine.add_features(features);
        self.last_features = Some(features);
        self.last_result = Some(result);
        FrameOutcome::Inference(result)
    }

    /// Live per-channel signal statuses for the most recent frame; neutral
    /// before any post-calibration frame has been processed.
    pub fn live_signals(&self) -> Option<LiveSignals> {
        self.last_features
            .as_ref()
            .map(|f| self.engine.live_signals(f))
    }

    /// Descriptive summary of the recent feature window.
    pub fn metric_breakdown(&self) -> MetricBreakdown {
        self.engine.metric_breakdown()
    }

    /// Buffered feature tuples for offline calibration exports.
    pub fn recent_features(&self) -> Vec<[f64; 8]> {
        self.engine.recent_features()
    }

    /// The session baseline; all-zero until calibration completes.
    pub fn baseline(&self) -> Baseline {
        match &self.phase {
            Phase::Running(baseline) => *baseline,
            Phase::Calibrating(_) => Baseline::default(),
        }
    }

    pub fn is_calibrating(&self) -> bool {
        matches!(self.phase, Phase::Calibrating(_))
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Provenance summary for downstream consumers.
    pub fn report(&self) -> SessionReport {
        SessionReport {
            session_id: self.session_id,
            producer: PRODUCER_NAME.to_string(),
            version: VERSION.to_string(),
            started_at: self.started_at,
            computed_at: Utc::now(),
            frames_seen: self.frames_seen,
            baseline: self.baseline(),
            last_result: self.last_result,
        }
    }

    /// Discard all session state: baseline, rolling buffers, previous-frame
    /// snapshot, counters. The instance then behaves exactly like a freshly
    /// constructed one (new session id included).
    pub fn reset(&mut self) {
        self.phase = Phase::Calibrating(BaselineCalibrator::new(self.config.calibration_frames));
        self.extractor.reset();
        self.engine.reset();
        self.session_id = Uuid::new_v4();
        self.started_at = Utc::now();
        self.frames_seen = 0;
        self.last_features = None;
        self.last_result = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::MIN_SAMPLES;
    use crate::test_support::{calm_frame, stressed_frame};
    use crate::types::{StressBand, Trend};

    fn small_config() -> SessionConfig {
        SessionConfig {
            calibration_frames: 10,
            model: ModelKind::Heuristic,
        }
    }

    fn run_calm(session: &mut StressSession, frames: usize, start: usize) -> FrameOutcome {
        let mut last = FrameOutcome::Calibrating { progress: 0.0 };
        for i in start..start + frames {
            last = session.process_frame(&calm_frame(i as f64 * 33.0));
        }
        last
    }

    #[test]
    fn test_calibration_then_inference() {
        let mut session = StressSession::new(small_config());
        assert!(session.is_calibrating());

        for i in 0..9 {
            match session.process_frame(&calm_frame(i as f64 * 33.0)) {
                FrameOutcome::Calibrating { progress } => {
                    assert!(progress < 1.0);
                }
                FrameOutcome::Inference(_) => panic!("inference before calibration window"),
            }
        }

        // Tenth frame completes the window and starts inference
        let outcome = session.process_frame(&calm_frame(9.0 * 33.0));
        assert!(matches!(outcome, FrameOutcome::Inference(_)));
        assert!(!session.is_calibrating());

        let baseline = session.baseline();
        assert!((baseline.ear - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_calm_round_trip_lands_in_low_band() {
        let mut session = StressSession::new(small_config());
        let last = run_calm(&mut session, 60, 0);

        match last {
            FrameOutcome::Inference(result) => {
                assert!(result.stress_level < 0.33, "calm stress {}", result.stress_level);
                assert_eq!(StressBand::from_level(result.stress_level), StressBand::Low);
                assert!(result.confidence > 0.5, "calm confidence {}", result.confidence);
            }
            FrameOutcome::Calibrating { .. } => panic!("session never left calibration"),
        }
    }

    #[test]
    fn test_spike_raises_stress_and_trend() {
        let mut session = StressSession::new(small_config());
        let calm = match run_calm(&mut session, 50, 0) {
            FrameOutcome::Inference(result) => result,
            _ => panic!("expected inference"),
        };

        let mut last = calm;
        let mut saw_increasing = false;
        for i in 50..80 {
            if let FrameOutcome::Inference(result) =
                session.process_frame(&stressed_frame(i as f64 * 33.0))
            {
                if result.trend == Trend::Increasing {
                    saw_increasing = true;
                }
                last = result;
            }
        }

        assert!(last.stress_level > calm.stress_level + 0.2);
        assert!(saw_increasing, "trend never reported increasing");
    }

    #[test]
    fn test_live_signals_and_breakdown_passthrough() {
        let mut session = StressSession::new(small_config());
        assert!(session.live_signals().is_none());

        run_calm(&mut session, 30, 0);
        let signals = session.live_signals().unwrap();
        assert_eq!(signals.brow, crate::types::SignalStatus::Stable);

        let breakdown = session.metric_breakdown();
        assert!((breakdown.eye - 0.3).abs() < 1e-6);

        assert!(!session.recent_features().is_empty());
    }

    #[test]
    fn test_reset_restores_fresh_behavior() {
        let mut session = StressSession::new(small_config());
        run_calm(&mut session, 40, 0);
        let old_id = session.session_id();

        session.reset();
        assert!(session.is_calibrating());
        assert_ne!(session.session_id(), old_id);
        assert_eq!(session.baseline(), Baseline::default());
        assert!(session.live_signals().is_none());
        assert!(session.recent_features().is_empty());

        // Full warm-up repeats: calibration first, then placeholder results
        for i in 0..10 {
            let outcome = session.process_frame(&calm_frame(i as f64 * 33.0));
            if i < 9 {
                assert!(matches!(outcome, FrameOutcome::Calibrating { .. }));
            }
        }
        for i in 10..(10 + MIN_SAMPLES - 2) {
            if let FrameOutcome::Inference(result) =
                session.process_frame(&calm_frame(i as f64 * 33.0))
            {
                assert_eq!(result.confidence, 0.0);
                assert_eq!(result.stress_level, 0.5);
            }
        }
    }

    #[test]
    fn test_concurrent_sessions_do_not_share_state() {
        let mut calm_session = StressSession::new(small_config());
        let mut busy_session = StressSession::new(small_config());

        for i in 0..60 {
            calm_session.process_frame(&calm_frame(i as f64 * 33.0));
            // Busy session calibrates on a calm face, then sees stress
            let frame = if i < 10 {
                calm_frame(i as f64 * 33.0)
            } else {
                stressed_frame(i as f64 * 33.0)
            };
            busy_session.process_frame(&frame);
        }

        let calm_report = calm_session.report();
        let busy_report = busy_session.report();
        let calm_level = calm_report.last_result.unwrap().stress_level;
        let busy_level = busy_report.last_result.unwrap().stress_level;
        assert!(busy_level > calm_level + 0.2);
        assert_ne!(calm_report.session_id, busy_report.session_id);
    }

    #[test]
    fn test_report_contents() {
        let mut session = StressSession::new(small_config());
        run_calm(&mut session, 20, 0);

        let report = session.report();
        assert_eq!(report.frames_seen, 20);
        assert_eq!(report.producer, PRODUCER_NAME);
        assert!(report.last_result.is_some());
        assert!(report.computed_at >= report.started_at);
    }

    #[test]
    fn test_config_from_json_rejects_zero_window() {
        let err = SessionConfig::from_json(r#"{"calibration_frames":0,"model":{"kind":"heuristic"}}"#);
        assert!(err.is_err());

        let ok = SessionConfig::from_json(r#"{"calibration_frames":30,"model":{"kind":"noop"}}"#);
        assert_eq!(ok.unwrap().calibration_frames, 30);
    }
}

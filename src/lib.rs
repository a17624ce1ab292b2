//! Stresslens - On-device stress inference engine for facial landmark streams
//!
//! Stresslens turns the noisy, high-frequency landmark frames emitted by an
//! external face-mesh detector into a stable, explainable stress estimate
//! through a deterministic per-frame pipeline: baseline calibration →
//! feature extraction → windowed aggregation → model scoring → temporal
//! smoothing → confidence and trend.
//!
//! ## Design constraints
//!
//! - Frames arrive continuously (~30/s) and are processed incrementally;
//!   the pipeline never sees a whole session at once.
//! - A per-session baseline is established before relative deltas are
//!   interpreted; it is never persisted across sessions.
//! - Output is smoothed, bounded, and degrades gracefully: insufficient
//!   data yields a neutral placeholder, never an error.
//! - The scoring model is a pluggable seam so a learned classifier can
//!   replace the heuristic without changing the pipeline contract.

pub mod baseline;
pub mod error;
pub mod features;
pub mod geometry;
pub mod inference;
pub mod model;
pub mod session;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::StressError;
pub use inference::StressEngine;
pub use model::{HeuristicModel, LinearModel, ModelKind, NoopModel, StressModel};
pub use session::{FrameOutcome, SessionConfig, StressSession};
pub use types::{
    Baseline, FeatureVector, InferenceResult, LandmarkFrame, LiveSignals, MetricBreakdown,
    Point, SessionReport, SignalStatus, StressBand, Trend,
};

/// Crate version embedded in session reports
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for session reports
pub const PRODUCER_NAME: &str = "stresslens";

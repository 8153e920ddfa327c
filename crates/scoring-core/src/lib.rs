//! ZenPosture Scoring Core
//!
//! Turns detected keypoints into a stable posture score and alert decisions:
//! - **Features:** Scale-invariant geometry (distances, ratios, angles) from keypoints
//! - **Inference:** Learned dense model with a deterministic heuristic fallback
//! - **Smoothing:** Asymmetric exponential smoothing of the raw score
//! - **Alerts:** Cooldown-gated alert emission per alert class
//! - **Monitor:** Per-tick orchestration owning the smoothed score and alert state
//!
//! This crate is pure computation with no platform dependencies.
//! All inputs are data; all outputs are data.

pub mod alert;
pub mod error;
pub mod features;
pub mod geometry;
pub mod heuristic;
pub mod inference;
pub mod model;
pub mod monitor;
pub mod smoothing;

pub use alert::{AlertThrottler, ThrottleState};
pub use error::ScoringError;
pub use features::{FeatureExtractor, FeatureVector};
pub use heuristic::{HeuristicConfig, HeuristicScorer};
pub use inference::{ScoreInferenceEngine, ScoringStrategy};
pub use model::{DenseModel, PostureModel};
pub use monitor::{MonitorConfig, PostureMonitor, TickCounters, TickOutcome};
pub use smoothing::TemporalSmoother;

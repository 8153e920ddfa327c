//! Raw posture score inference with model-or-heuristic strategy selection.

use std::fmt;
use std::sync::Arc;

use crate::error::ScoringError;
use crate::features::FeatureVector;
use crate::heuristic::{HeuristicConfig, HeuristicScorer};
use crate::model::PostureModel;

/// Shared handle to a loaded model.
pub type ModelHandle = Arc<dyn PostureModel>;

/// How raw scores are produced. Selected once at startup.
#[derive(Clone)]
pub enum ScoringStrategy {
    /// Use the learned model, demoting to the heuristic per call when its
    /// output is unusable.
    Model(ModelHandle),
    /// Use the deterministic heuristic only.
    Heuristic,
}

impl ScoringStrategy {
    /// `Model` when a handle is present, `Heuristic` otherwise.
    pub fn from_optional(model: Option<ModelHandle>) -> Self {
        match model {
            Some(handle) => ScoringStrategy::Model(handle),
            None => ScoringStrategy::Heuristic,
        }
    }

    pub fn is_model(&self) -> bool {
        matches!(self, ScoringStrategy::Model(_))
    }
}

impl fmt::Debug for ScoringStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoringStrategy::Model(model) => f.debug_tuple("Model").field(&model.name()).finish(),
            ScoringStrategy::Heuristic => f.write_str("Heuristic"),
        }
    }
}

/// Why a model-backed call fell back to the heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// Model returned exactly zero.
    ZeroOutput,
    /// Model returned NaN/infinity, the wrong shape, or failed outright.
    InvalidOutput,
}

/// Which path produced a raw score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreSource {
    Model,
    Heuristic,
    Fallback(FallbackReason),
}

/// A raw score and the path that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreOutcome {
    /// Raw score in [0, 100].
    pub value: u8,
    pub source: ScoreSource,
}

/// Produces raw scores from feature vectors.
#[derive(Debug, Clone)]
pub struct ScoreInferenceEngine {
    strategy: ScoringStrategy,
    heuristic: HeuristicScorer,
}

impl ScoreInferenceEngine {
    pub fn new(strategy: ScoringStrategy, heuristic: HeuristicConfig) -> Self {
        Self {
            strategy,
            heuristic: HeuristicScorer::new(heuristic),
        }
    }

    /// Heuristic-only engine with default constants.
    pub fn heuristic_only() -> Self {
        Self::new(ScoringStrategy::Heuristic, HeuristicConfig::default())
    }

    pub fn strategy(&self) -> &ScoringStrategy {
        &self.strategy
    }

    pub fn heuristic(&self) -> &HeuristicScorer {
        &self.heuristic
    }

    /// Raw score in [0, 100].
    pub fn score(&self, features: &FeatureVector) -> u8 {
        self.evaluate(features).value
    }

    /// Raw score plus the path that produced it.
    pub fn evaluate(&self, features: &FeatureVector) -> ScoreOutcome {
        let ScoringStrategy::Model(model) = &self.strategy else {
            return ScoreOutcome {
                value: self.heuristic.score(features),
                source: ScoreSource::Heuristic,
            };
        };

        match model.predict(features).and_then(validate_output) {
            Ok(ModelOutput::Score(value)) => ScoreOutcome {
                value,
                source: ScoreSource::Model,
            },
            Ok(ModelOutput::Zero) => {
                tracing::debug!(model = model.name(), "Model returned zero, using heuristic");
                self.fallback(features, FallbackReason::ZeroOutput)
            }
            Err(e) => {
                tracing::debug!(model = model.name(), error = %e, "Model output unusable, using heuristic");
                self.fallback(features, FallbackReason::InvalidOutput)
            }
        }
    }

    fn fallback(&self, features: &FeatureVector, reason: FallbackReason) -> ScoreOutcome {
        ScoreOutcome {
            value: self.heuristic.score(features),
            source: ScoreSource::Fallback(reason),
        }
    }
}

enum ModelOutput {
    Score(u8),
    Zero,
}

/// Post-inference validity check: scale to [0, 100], demote exact zero.
fn validate_output(raw: f32) -> Result<ModelOutput, ScoringError> {
    if !raw.is_finite() {
        return Err(ScoringError::invalid_output(format!("non-finite output {raw}")));
    }
    if raw == 0.0 {
        return Ok(ModelOutput::Zero);
    }
    let scaled = (raw as f64 * 100.0).round().clamp(0.0, 100.0);
    Ok(ModelOutput::Score(scaled as u8))
}

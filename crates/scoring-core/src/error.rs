//! Scoring pipeline errors.

use zenposture_common::error::ZenError;
use zenposture_pose_model::keypoint::KeypointName;

/// Failures inside the scoring pipeline.
///
/// Every variant except `InvalidModel` is recoverable: the monitor absorbs
/// it locally and never surfaces it to the caller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    /// Required keypoints absent or below the confidence floor.
    #[error("missing keypoints: {}", format_names(.missing))]
    MissingKeypoints { missing: Vec<KeypointName> },

    /// Model produced an output that cannot be used as a score.
    #[error("invalid inference output: {reason}")]
    InvalidInferenceOutput { reason: String },

    /// A tensor did not have the size the model expects.
    #[error("shape mismatch: expected {expected} values, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Model weights could not be turned into a usable model.
    #[error("invalid model: {message}")]
    InvalidModel { message: String },
}

impl ScoringError {
    pub fn invalid_output(reason: impl Into<String>) -> Self {
        Self::InvalidInferenceOutput {
            reason: reason.into(),
        }
    }

    pub fn invalid_model(message: impl Into<String>) -> Self {
        Self::InvalidModel {
            message: message.into(),
        }
    }
}

impl From<ScoringError> for ZenError {
    fn from(err: ScoringError) -> Self {
        match err {
            ScoringError::InvalidModel { message } => ZenError::model(message),
            other => ZenError::scoring(other.to_string()),
        }
    }
}

fn format_names(names: &[KeypointName]) -> String {
    names
        .iter()
        .map(KeypointName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keypoints_message_lists_names() {
        let err = ScoringError::MissingKeypoints {
            missing: vec![KeypointName::LeftEar, KeypointName::Nose],
        };
        assert_eq!(err.to_string(), "missing keypoints: left_ear, nose");
    }

    #[test]
    fn test_invalid_model_maps_to_model_error() {
        let err: ZenError = ScoringError::invalid_model("empty weights").into();
        assert!(matches!(err, ZenError::Model { .. }));
    }
}

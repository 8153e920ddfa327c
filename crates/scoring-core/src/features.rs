//! Geometric feature extraction from pose keypoints.
//!
//! # Features
//!
//! Each keypoint is normalized by the frame dimensions first (`x / width`,
//! `y / height`), so every feature is invariant to camera resolution.
//!
//! | Index | Feature | Definition |
//! |---|---|---|
//! | 0 | `dist_nose_shoulders` | nose to shoulder midpoint |
//! | 1 | `ratio_nose_shoulders` | feature 0 / shoulder width (0 if width is 0) |
//! | 2 | `neck_tilt_angle_deg` | angle at nose between the ears |
//! | 3 | `dist_left_ear_nose` | left ear to nose |
//! | 4 | `dist_right_ear_nose` | right ear to nose |
//! | 5 | `angle_left_shoulder_deg` | angle at left shoulder between left ear and nose |
//! | 6 | `angle_right_shoulder_deg` | angle at right shoulder between right ear and nose |

use zenposture_pose_model::keypoint::{KeypointName, PoseFrame};

use crate::error::ScoringError;
use crate::geometry::{angle_at, Point2D};

/// Keypoints that must be present and confident for extraction to succeed.
pub const REQUIRED_KEYPOINTS: [KeypointName; 5] = [
    KeypointName::Nose,
    KeypointName::LeftShoulder,
    KeypointName::RightShoulder,
    KeypointName::LeftEar,
    KeypointName::RightEar,
];

/// Number of values in a feature vector.
pub const FEATURE_COUNT: usize = 7;

/// Default confidence floor for required keypoints.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.5;

/// Fully populated geometric summary of one pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub dist_nose_shoulders: f64,
    pub ratio_nose_shoulders: f64,
    pub neck_tilt_angle_deg: f64,
    pub dist_left_ear_nose: f64,
    pub dist_right_ear_nose: f64,
    pub angle_left_shoulder_deg: f64,
    pub angle_right_shoulder_deg: f64,
}

impl FeatureVector {
    /// Values in model input order.
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.dist_nose_shoulders,
            self.ratio_nose_shoulders,
            self.neck_tilt_angle_deg,
            self.dist_left_ear_nose,
            self.dist_right_ear_nose,
            self.angle_left_shoulder_deg,
            self.angle_right_shoulder_deg,
        ]
    }

    /// Build from values in model input order.
    pub fn from_array(values: [f64; FEATURE_COUNT]) -> Self {
        Self {
            dist_nose_shoulders: values[0],
            ratio_nose_shoulders: values[1],
            neck_tilt_angle_deg: values[2],
            dist_left_ear_nose: values[3],
            dist_right_ear_nose: values[4],
            angle_left_shoulder_deg: values[5],
            angle_right_shoulder_deg: values[6],
        }
    }

    /// Feature names in model input order.
    pub fn names() -> [&'static str; FEATURE_COUNT] {
        [
            "dist_nose_shoulders",
            "ratio_nose_shoulders",
            "neck_tilt_angle_deg",
            "dist_left_ear_nose",
            "dist_right_ear_nose",
            "angle_left_shoulder_deg",
            "angle_right_shoulder_deg",
        ]
    }
}

/// Stateless keypoint-to-feature transform.
#[derive(Debug, Clone, Copy)]
pub struct FeatureExtractor {
    min_keypoint_confidence: f64,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CONFIDENCE)
    }
}

impl FeatureExtractor {
    /// Create an extractor rejecting keypoints scored below `min_keypoint_confidence`.
    pub fn new(min_keypoint_confidence: f64) -> Self {
        Self {
            min_keypoint_confidence,
        }
    }

    pub fn min_keypoint_confidence(&self) -> f64 {
        self.min_keypoint_confidence
    }

    /// Extract the feature vector, or report every unusable required keypoint.
    pub fn extract(&self, frame: &PoseFrame) -> Result<FeatureVector, ScoringError> {
        let width = frame.width as f64;
        let height = frame.height as f64;

        let mut points = [Point2D::new(0.0, 0.0); REQUIRED_KEYPOINTS.len()];
        let mut missing = Vec::new();

        for (slot, name) in points.iter_mut().zip(REQUIRED_KEYPOINTS) {
            match frame.find(name) {
                Some(kp) if kp.score >= self.min_keypoint_confidence => {
                    *slot = Point2D::new(kp.x / width, kp.y / height);
                }
                _ => missing.push(name),
            }
        }

        if !missing.is_empty() {
            return Err(ScoringError::MissingKeypoints { missing });
        }

        let [nose, left_shoulder, right_shoulder, left_ear, right_ear] = points;
        Ok(compute_features(
            &nose,
            &left_shoulder,
            &right_shoulder,
            &left_ear,
            &right_ear,
        ))
    }
}

fn compute_features(
    nose: &Point2D,
    left_shoulder: &Point2D,
    right_shoulder: &Point2D,
    left_ear: &Point2D,
    right_ear: &Point2D,
) -> FeatureVector {
    let mid_shoulder = Point2D::midpoint(left_shoulder, right_shoulder);
    let dist_nose_shoulders = nose.distance_to(&mid_shoulder);
    let shoulder_width = left_shoulder.distance_to(right_shoulder);
    let ratio_nose_shoulders = if shoulder_width > 0.0 {
        dist_nose_shoulders / shoulder_width
    } else {
        0.0
    };

    FeatureVector {
        dist_nose_shoulders,
        ratio_nose_shoulders,
        neck_tilt_angle_deg: angle_at(left_ear, nose, right_ear),
        dist_left_ear_nose: left_ear.distance_to(nose),
        dist_right_ear_nose: right_ear.distance_to(nose),
        angle_left_shoulder_deg: angle_at(left_ear, left_shoulder, nose),
        angle_right_shoulder_deg: angle_at(right_ear, right_shoulder, nose),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zenposture_pose_model::keypoint::Keypoint;

    fn upright_keypoints(scale: f64) -> Vec<Keypoint> {
        vec![
            Keypoint::new(KeypointName::Nose, 500.0 * scale, 400.0 * scale, 0.95),
            Keypoint::new(KeypointName::LeftEar, 450.0 * scale, 400.0 * scale, 0.9),
            Keypoint::new(KeypointName::RightEar, 550.0 * scale, 400.0 * scale, 0.9),
            Keypoint::new(KeypointName::LeftShoulder, 300.0 * scale, 600.0 * scale, 0.9),
            Keypoint::new(KeypointName::RightShoulder, 700.0 * scale, 600.0 * scale, 0.9),
        ]
    }

    #[test]
    fn test_extracts_expected_geometry() {
        let frame = PoseFrame::new(upright_keypoints(1.0), 1000, 1000).unwrap();
        let features = FeatureExtractor::default().extract(&frame).unwrap();

        assert!((features.dist_nose_shoulders - 0.2).abs() < 1e-9);
        assert!((features.ratio_nose_shoulders - 0.5).abs() < 1e-9);
        assert!((features.neck_tilt_angle_deg - 180.0).abs() < 1e-9);
        assert!((features.dist_left_ear_nose - 0.05).abs() < 1e-9);
        assert!((features.dist_right_ear_nose - 0.05).abs() < 1e-9);
        assert!(
            (features.angle_left_shoulder_deg - features.angle_right_shoulder_deg).abs() < 1e-9
        );
    }

    #[test]
    fn test_features_are_resolution_invariant() {
        let small = PoseFrame::new(upright_keypoints(0.64), 640, 640).unwrap();
        let large = PoseFrame::new(upright_keypoints(1.92), 1920, 1920).unwrap();
        let extractor = FeatureExtractor::default();

        let a = extractor.extract(&small).unwrap().to_array();
        let b = extractor.extract(&large).unwrap().to_array();
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-9, "{x} != {y}");
        }
    }

    #[test]
    fn test_missing_and_low_confidence_keypoints_are_reported() {
        let mut keypoints = upright_keypoints(1.0);
        keypoints.retain(|kp| kp.name != KeypointName::LeftEar);
        keypoints
            .iter_mut()
            .filter(|kp| kp.name == KeypointName::Nose)
            .for_each(|kp| kp.score = 0.2);
        let frame = PoseFrame::new(keypoints, 1000, 1000).unwrap();

        let err = FeatureExtractor::new(0.5).extract(&frame).unwrap_err();
        assert_eq!(
            err,
            ScoringError::MissingKeypoints {
                missing: vec![KeypointName::Nose, KeypointName::LeftEar],
            }
        );
    }

    #[test]
    fn test_confidence_floor_is_configurable() {
        let mut keypoints = upright_keypoints(1.0);
        keypoints.iter_mut().for_each(|kp| kp.score = 0.35);
        let frame = PoseFrame::new(keypoints, 1000, 1000).unwrap();

        assert!(FeatureExtractor::new(0.5).extract(&frame).is_err());
        assert!(FeatureExtractor::new(0.3).extract(&frame).is_ok());
    }

    #[test]
    fn test_zero_shoulder_width_gives_zero_ratio() {
        let keypoints = vec![
            Keypoint::new(KeypointName::Nose, 500.0, 400.0, 0.9),
            Keypoint::new(KeypointName::LeftEar, 450.0, 400.0, 0.9),
            Keypoint::new(KeypointName::RightEar, 550.0, 400.0, 0.9),
            Keypoint::new(KeypointName::LeftShoulder, 500.0, 600.0, 0.9),
            Keypoint::new(KeypointName::RightShoulder, 500.0, 600.0, 0.9),
        ];
        let frame = PoseFrame::new(keypoints, 1000, 1000).unwrap();
        let features = FeatureExtractor::default().extract(&frame).unwrap();
        assert_eq!(features.ratio_nose_shoulders, 0.0);
        assert!(features.to_array().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_array_order_matches_names() {
        let features = FeatureVector::from_array([1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(features.neck_tilt_angle_deg, 3.0);
        assert_eq!(features.to_array()[6], 7.0);
        assert_eq!(FeatureVector::names()[2], "neck_tilt_angle_deg");
    }
}

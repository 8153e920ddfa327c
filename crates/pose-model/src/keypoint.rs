//! Keypoint vocabulary and per-tick pose frames.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use zenposture_common::error::{ZenError, ZenResult};

/// Anatomical landmark names produced by the pose detector (BlazePose topology).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeypointName {
    Nose,
    LeftEyeInner,
    LeftEye,
    LeftEyeOuter,
    RightEyeInner,
    RightEye,
    RightEyeOuter,
    LeftEar,
    RightEar,
    MouthLeft,
    MouthRight,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftPinky,
    RightPinky,
    LeftIndex,
    RightIndex,
    LeftThumb,
    RightThumb,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    LeftHeel,
    RightHeel,
    LeftFootIndex,
    RightFootIndex,
}

impl KeypointName {
    /// Every name in detector index order.
    pub const ALL: [KeypointName; 33] = [
        KeypointName::Nose,
        KeypointName::LeftEyeInner,
        KeypointName::LeftEye,
        KeypointName::LeftEyeOuter,
        KeypointName::RightEyeInner,
        KeypointName::RightEye,
        KeypointName::RightEyeOuter,
        KeypointName::LeftEar,
        KeypointName::RightEar,
        KeypointName::MouthLeft,
        KeypointName::MouthRight,
        KeypointName::LeftShoulder,
        KeypointName::RightShoulder,
        KeypointName::LeftElbow,
        KeypointName::RightElbow,
        KeypointName::LeftWrist,
        KeypointName::RightWrist,
        KeypointName::LeftPinky,
        KeypointName::RightPinky,
        KeypointName::LeftIndex,
        KeypointName::RightIndex,
        KeypointName::LeftThumb,
        KeypointName::RightThumb,
        KeypointName::LeftHip,
        KeypointName::RightHip,
        KeypointName::LeftKnee,
        KeypointName::RightKnee,
        KeypointName::LeftAnkle,
        KeypointName::RightAnkle,
        KeypointName::LeftHeel,
        KeypointName::RightHeel,
        KeypointName::LeftFootIndex,
        KeypointName::RightFootIndex,
    ];

    /// Wire name, identical to the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            KeypointName::Nose => "nose",
            KeypointName::LeftEyeInner => "left_eye_inner",
            KeypointName::LeftEye => "left_eye",
            KeypointName::LeftEyeOuter => "left_eye_outer",
            KeypointName::RightEyeInner => "right_eye_inner",
            KeypointName::RightEye => "right_eye",
            KeypointName::RightEyeOuter => "right_eye_outer",
            KeypointName::LeftEar => "left_ear",
            KeypointName::RightEar => "right_ear",
            KeypointName::MouthLeft => "mouth_left",
            KeypointName::MouthRight => "mouth_right",
            KeypointName::LeftShoulder => "left_shoulder",
            KeypointName::RightShoulder => "right_shoulder",
            KeypointName::LeftElbow => "left_elbow",
            KeypointName::RightElbow => "right_elbow",
            KeypointName::LeftWrist => "left_wrist",
            KeypointName::RightWrist => "right_wrist",
            KeypointName::LeftPinky => "left_pinky",
            KeypointName::RightPinky => "right_pinky",
            KeypointName::LeftIndex => "left_index",
            KeypointName::RightIndex => "right_index",
            KeypointName::LeftThumb => "left_thumb",
            KeypointName::RightThumb => "right_thumb",
            KeypointName::LeftHip => "left_hip",
            KeypointName::RightHip => "right_hip",
            KeypointName::LeftKnee => "left_knee",
            KeypointName::RightKnee => "right_knee",
            KeypointName::LeftAnkle => "left_ankle",
            KeypointName::RightAnkle => "right_ankle",
            KeypointName::LeftHeel => "left_heel",
            KeypointName::RightHeel => "right_heel",
            KeypointName::LeftFootIndex => "left_foot_index",
            KeypointName::RightFootIndex => "right_foot_index",
        }
    }
}

impl fmt::Display for KeypointName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not part of the keypoint vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown keypoint name: {0}")]
pub struct UnknownKeypoint(pub String);

impl FromStr for KeypointName {
    type Err = UnknownKeypoint;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KeypointName::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| UnknownKeypoint(s.to_string()))
    }
}

/// A single detected landmark.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub name: KeypointName,
    /// X coordinate in source-frame pixels.
    pub x: f64,
    /// Y coordinate in source-frame pixels.
    pub y: f64,
    /// Detection confidence in [0.0, 1.0].
    pub score: f64,
}

impl Keypoint {
    pub fn new(name: KeypointName, x: f64, y: f64, score: f64) -> Self {
        Self { name, x, y, score }
    }
}

/// All keypoints detected in one tick, plus the source frame size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseFrame {
    /// Source frame width in pixels.
    pub width: u32,
    /// Source frame height in pixels.
    pub height: u32,
    pub keypoints: Vec<Keypoint>,
}

impl PoseFrame {
    /// Create a frame, rejecting zero-sized dimensions.
    pub fn new(keypoints: Vec<Keypoint>, width: u32, height: u32) -> ZenResult<Self> {
        let frame = Self {
            width,
            height,
            keypoints,
        };
        frame.validate()?;
        Ok(frame)
    }

    /// Check the frame invariants (deserialized frames bypass `new`).
    pub fn validate(&self) -> ZenResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ZenError::frame(format!(
                "frame dimensions must be > 0, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// First keypoint with the given name.
    pub fn find(&self, name: KeypointName) -> Option<&Keypoint> {
        self.keypoints.iter().find(|kp| kp.name == name)
    }

    /// Keypoints at or above the given confidence.
    pub fn confident(&self, min_score: f64) -> impl Iterator<Item = &Keypoint> {
        self.keypoints.iter().filter(move |kp| kp.score >= min_score)
    }
}

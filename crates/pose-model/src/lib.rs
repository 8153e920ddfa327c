//! ZenPosture Pose Model
//!
//! Defines the data contracts that flow through the posture monitor:
//! - **Keypoints:** Named anatomical landmarks with pixel position and confidence
//! - **Frames:** One detection tick worth of keypoints plus the source frame size
//! - **Samples:** Raw and smoothed posture scores, alert events, session records
//!
//! Keypoint coordinates stay in source-frame pixels here; normalization
//! against the frame dimensions happens during feature extraction.

pub mod frame;
pub mod keypoint;
pub mod sample;

pub use frame::*;
pub use keypoint::*;
pub use sample::*;

//! Recorded pose frames in JSONL form.
//!
//! One JSON object per line, `#` comment lines and blank lines skipped:
//!
//! ```text
//! {"t":0,"width":640,"height":480,"keypoints":[{"name":"nose","x":320.0,"y":180.0,"score":0.98}]}
//! ```

use serde::{Deserialize, Serialize};
use zenposture_common::clock::TimestampNs;
use zenposture_common::error::{ZenError, ZenResult};

use crate::keypoint::PoseFrame;

/// A pose frame tagged with the tick timestamp it was detected at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    /// Monotonic nanoseconds since monitor start.
    #[serde(rename = "t")]
    pub timestamp_ns: TimestampNs,

    #[serde(flatten)]
    pub frame: PoseFrame,
}

impl RecordedFrame {
    pub fn new(timestamp_ns: TimestampNs, frame: PoseFrame) -> Self {
        Self {
            timestamp_ns,
            frame,
        }
    }

    /// Timestamp as fractional seconds since monitor start.
    pub fn timestamp_secs(&self) -> f64 {
        self.timestamp_ns as f64 / 1_000_000_000.0
    }
}

/// Parse recorded frames from JSONL content.
///
/// Each frame is validated; the error names the offending line.
pub fn parse_frames(jsonl: &str) -> ZenResult<Vec<RecordedFrame>> {
    let mut frames = Vec::new();
    for (index, line) in jsonl.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let recorded: RecordedFrame = serde_json::from_str(line)
            .map_err(|e| ZenError::frame(format!("line {}: {e}", index + 1)))?;
        recorded
            .frame
            .validate()
            .map_err(|e| ZenError::frame(format!("line {}: {e}", index + 1)))?;
        frames.push(recorded);
    }
    Ok(frames)
}

/// Serialize frames to JSONL format.
pub fn serialize_frames(frames: &[RecordedFrame]) -> Result<String, serde_json::Error> {
    let mut output = String::new();
    for frame in frames {
        output.push_str(&serde_json::to_string(frame)?);
        output.push('\n');
    }
    Ok(output)
}

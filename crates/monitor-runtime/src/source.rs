//! Pose frame sources.

use std::path::Path;

use zenposture_common::clock::TimestampNs;
use zenposture_common::error::{ZenError, ZenResult};
use zenposture_pose_model::frame::{parse_frames, RecordedFrame};
use zenposture_pose_model::keypoint::PoseFrame;

/// Trait for pose detection sources polled on the detection tick.
pub trait FrameSource: Send {
    /// Latest frame available at `now`. Returns `None` if no new frame is available.
    fn poll(&mut self, now: TimestampNs) -> ZenResult<Option<PoseFrame>>;

    /// Source name for logging.
    fn name(&self) -> &str;

    /// Whether the source will never produce another frame.
    fn is_exhausted(&self) -> bool {
        false
    }
}

/// Replays recorded frames against the monitor clock.
///
/// Each poll yields the newest frame whose timestamp is not after `now`.
/// Older unseen frames are dropped, the way a live detector only ever
/// reports its latest result.
#[derive(Debug, Clone)]
pub struct RecordedFrameSource {
    name: String,
    frames: Vec<RecordedFrame>,
    cursor: usize,
    dropped: u64,
}

impl RecordedFrameSource {
    pub fn new(mut frames: Vec<RecordedFrame>) -> Self {
        frames.sort_by_key(|f| f.timestamp_ns);
        Self {
            name: "recorded".to_string(),
            frames,
            cursor: 0,
            dropped: 0,
        }
    }

    /// Parse frames from JSONL content.
    pub fn from_jsonl(content: &str) -> ZenResult<Self> {
        Ok(Self::new(parse_frames(content)?))
    }

    /// Load frames from a JSONL file.
    pub fn from_path(path: &Path) -> ZenResult<Self> {
        if !path.exists() {
            return Err(ZenError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let source = Self::from_jsonl(&content)?;
        Ok(source.with_name(path.display().to_string()))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// All recorded frames in timestamp order.
    pub fn frames(&self) -> &[RecordedFrame] {
        &self.frames
    }

    /// Total frames in the recording.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames not yet yielded or dropped.
    pub fn remaining(&self) -> usize {
        self.frames.len() - self.cursor
    }

    /// Frames skipped because a newer one was already due.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Timestamp of the last recorded frame.
    pub fn end_ns(&self) -> Option<TimestampNs> {
        self.frames.last().map(|f| f.timestamp_ns)
    }
}

impl FrameSource for RecordedFrameSource {
    fn poll(&mut self, now: TimestampNs) -> ZenResult<Option<PoseFrame>> {
        let due = self.frames[self.cursor..]
            .iter()
            .take_while(|f| f.timestamp_ns <= now)
            .count();
        if due == 0 {
            return Ok(None);
        }

        self.dropped += (due - 1) as u64;
        self.cursor += due;
        Ok(Some(self.frames[self.cursor - 1].frame.clone()))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_exhausted(&self) -> bool {
        self.cursor >= self.frames.len()
    }
}

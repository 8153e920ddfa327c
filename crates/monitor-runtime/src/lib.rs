//! ZenPosture Monitor Runtime
//!
//! Runs the posture monitor against a pose source on three independent
//! schedules:
//!
//! - **Detection** (~100 ms): poll the source and score the frame
//! - **Publication** (~5 s): append the smoothed score to the session log
//! - **Reminders** (~60 s): evaluate the exercise-reminder alert class
//!
//! Output is fanned out to [`MonitorObserver`]s. Session logs are written in
//! append-only JSONL format for crash safety.

pub mod observer;
pub mod runtime;
pub mod session;
pub mod source;
pub mod writer;

pub use observer::{CollectingObserver, LogNotifier, MonitorObserver};
pub use runtime::{MonitorRuntime, RuntimeConfig, RuntimeStats};
pub use session::{parse_session_records, read_session_records, DailyStats};
pub use source::{FrameSource, RecordedFrameSource};
pub use writer::SessionWriter;

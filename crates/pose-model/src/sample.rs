//! Monitor outputs: score samples, alert events, and session log records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use zenposture_common::clock::TimestampNs;

/// Raw and smoothed posture score for one scored tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSample {
    /// Unsmoothed score in [0, 100].
    pub raw: u8,
    /// Exponentially smoothed score in [0, 100].
    pub smoothed: u8,
    #[serde(rename = "t")]
    pub timestamp_ns: TimestampNs,
}

/// Why an alert was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlertReason {
    /// Smoothed score dropped below the alert threshold.
    LowPosture,
    /// Periodic nudge to take an exercise break.
    ExerciseReminder,
}

impl AlertReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertReason::LowPosture => "low-posture",
            AlertReason::ExerciseReminder => "exercise-reminder",
        }
    }
}

impl std::fmt::Display for AlertReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An alert handed to the notification collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub reason: AlertReason,
    #[serde(rename = "t")]
    pub timestamp_ns: TimestampNs,
    /// Smoothed score that triggered the alert.
    pub score: u8,
}

/// Header line of a session log file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionLogHeader {
    /// Schema version for forward compatibility.
    pub schema_version: String,

    /// Wall-clock time at monitor start.
    pub epoch_wall: DateTime<Utc>,

    /// Publication period the records were written at.
    pub publish_interval_secs: u64,
}

/// One persisted posture record: the score observed over `duration_secs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Smoothed posture score in [0, 100].
    pub posture_score: u8,

    /// Seconds of monitoring this record covers.
    pub duration_secs: f64,

    /// Wall-clock publication time.
    pub recorded_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Calendar day (UTC) the record belongs to.
    pub fn day(&self) -> NaiveDate {
        self.recorded_at.date_naive()
    }
}

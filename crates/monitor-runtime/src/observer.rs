//! Consumers of monitor output: displays, notifiers, and collectors.

use std::sync::{Arc, Mutex};

use zenposture_common::clock::TimestampNs;
use zenposture_pose_model::keypoint::KeypointName;
use zenposture_pose_model::sample::{AlertEvent, AlertReason, ScoreSample, SessionRecord};

/// Receives monitor output. Every method defaults to a no-op.
pub trait MonitorObserver: Send {
    /// A frame was scored.
    fn on_sample(&mut self, _sample: &ScoreSample) {}

    /// An alert passed its throttler.
    fn on_alert(&mut self, _alert: &AlertEvent) {}

    /// A frame lacked usable required keypoints; the score was held.
    fn on_missing_keypoints(&mut self, _now: TimestampNs, _missing: &[KeypointName]) {}

    /// A session record was published.
    fn on_publish(&mut self, _record: &SessionRecord) {}
}

/// Reports alerts through `tracing`, standing in for a desktop notifier.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl MonitorObserver for LogNotifier {
    fn on_alert(&mut self, alert: &AlertEvent) {
        let message = match alert.reason {
            AlertReason::LowPosture => "Posture check: sit up straight",
            AlertReason::ExerciseReminder => "Time for a short stretch break",
        };
        tracing::info!(reason = %alert.reason, score = alert.score, "{message}");
    }
}

/// Everything a [`CollectingObserver`] has seen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collected {
    pub samples: Vec<ScoreSample>,
    pub alerts: Vec<AlertEvent>,
    pub held_ticks: Vec<TimestampNs>,
    pub records: Vec<SessionRecord>,
}

/// Collects monitor output behind a shared handle.
///
/// The runtime owns the observer, so callers keep a clone and read results
/// through [`CollectingObserver::snapshot`] afterwards.
#[derive(Debug, Clone, Default)]
pub struct CollectingObserver {
    inner: Arc<Mutex<Collected>>,
}

impl CollectingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything collected so far.
    pub fn snapshot(&self) -> Collected {
        match self.inner.lock() {
            Ok(collected) => collected.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn with(&self, f: impl FnOnce(&mut Collected)) {
        match self.inner.lock() {
            Ok(mut collected) => f(&mut *collected),
            Err(poisoned) => f(&mut *poisoned.into_inner()),
        }
    }
}

impl MonitorObserver for CollectingObserver {
    fn on_sample(&mut self, sample: &ScoreSample) {
        self.with(|c| c.samples.push(*sample));
    }

    fn on_alert(&mut self, alert: &AlertEvent) {
        self.with(|c| c.alerts.push(*alert));
    }

    fn on_missing_keypoints(&mut self, now: TimestampNs, _missing: &[KeypointName]) {
        self.with(|c| c.held_ticks.push(now));
    }

    fn on_publish(&mut self, record: &SessionRecord) {
        self.with(|c| c.records.push(record.clone()));
    }
}

//! Per-tick posture monitoring.
//!
//! [`PostureMonitor`] is the single owner of the pipeline's mutable state:
//! the last smoothed score, the latest published sample, and both alert
//! throttlers. Each detection tick runs
//! extract -> infer -> smooth -> throttle and reports a [`TickOutcome`].
//! Timing is supplied by the caller, so the monitor can be driven by a real
//! clock or by synthetic timestamps.

use std::time::Duration;

use zenposture_common::clock::TimestampNs;
use zenposture_common::config::MonitorDefaults;
use zenposture_pose_model::keypoint::{KeypointName, PoseFrame};
use zenposture_pose_model::sample::{AlertEvent, AlertReason, ScoreSample};

use crate::alert::AlertThrottler;
use crate::error::ScoringError;
use crate::features::{FeatureExtractor, DEFAULT_MIN_CONFIDENCE};
use crate::heuristic::HeuristicConfig;
use crate::inference::{ScoreInferenceEngine, ScoreSource, ScoringStrategy};
use crate::smoothing::TemporalSmoother;

/// Smoothed score assumed before the first scored tick.
pub const INITIAL_SMOOTHED_SCORE: u8 = 100;

/// Monitor tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    pub min_keypoint_confidence: f64,
    pub alert_threshold: u8,
    pub alert_cooldown: Duration,
    pub reminder_threshold: u8,
    pub reminder_cooldown: Duration,
    /// When false, scores are still computed but no throttler is evaluated.
    pub notifications_enabled: bool,
    pub heuristic: HeuristicConfig,
    pub smoother: TemporalSmoother,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            min_keypoint_confidence: DEFAULT_MIN_CONFIDENCE,
            alert_threshold: 70,
            alert_cooldown: Duration::from_secs(5),
            reminder_threshold: 70,
            reminder_cooldown: Duration::from_secs(60),
            notifications_enabled: true,
            heuristic: HeuristicConfig::default(),
            smoother: TemporalSmoother::default(),
        }
    }
}

impl From<&MonitorDefaults> for MonitorConfig {
    fn from(defaults: &MonitorDefaults) -> Self {
        Self {
            min_keypoint_confidence: defaults.min_keypoint_confidence,
            alert_threshold: defaults.alert_threshold,
            alert_cooldown: Duration::from_secs(defaults.alert_cooldown_secs),
            reminder_threshold: defaults.reminder_threshold,
            reminder_cooldown: Duration::from_secs(defaults.reminder_cooldown_secs),
            notifications_enabled: defaults.notifications_enabled,
            ..Self::default()
        }
    }
}

/// Result of one detection tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Features were extracted and a new sample was produced.
    Scored {
        sample: ScoreSample,
        alert: Option<AlertEvent>,
        source: ScoreSource,
    },
    /// Required keypoints were unusable; the smoothed score is unchanged.
    Held {
        smoothed: u8,
        missing: Vec<KeypointName>,
    },
}

impl TickOutcome {
    pub fn sample(&self) -> Option<&ScoreSample> {
        match self {
            TickOutcome::Scored { sample, .. } => Some(sample),
            TickOutcome::Held { .. } => None,
        }
    }

    pub fn alert(&self) -> Option<&AlertEvent> {
        match self {
            TickOutcome::Scored { alert, .. } => alert.as_ref(),
            TickOutcome::Held { .. } => None,
        }
    }

    /// Smoothed score after this tick.
    pub fn smoothed(&self) -> u8 {
        match self {
            TickOutcome::Scored { sample, .. } => sample.smoothed,
            TickOutcome::Held { smoothed, .. } => *smoothed,
        }
    }
}

/// Tick counters since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickCounters {
    pub scored: u64,
    pub held: u64,
    pub fallbacks: u64,
    pub alerts: u64,
}

#[derive(Debug)]
pub struct PostureMonitor {
    extractor: FeatureExtractor,
    engine: ScoreInferenceEngine,
    smoother: TemporalSmoother,
    low_posture: AlertThrottler,
    reminder: AlertThrottler,
    notifications_enabled: bool,
    smoothed: u8,
    latest: Option<ScoreSample>,
    counters: TickCounters,
}

impl PostureMonitor {
    pub fn new(config: MonitorConfig, strategy: ScoringStrategy) -> Self {
        tracing::debug!(
            ?strategy,
            threshold = config.alert_threshold,
            cooldown_secs = config.alert_cooldown.as_secs_f64(),
            notifications = config.notifications_enabled,
            "Posture monitor created"
        );
        Self {
            extractor: FeatureExtractor::new(config.min_keypoint_confidence),
            engine: ScoreInferenceEngine::new(strategy, config.heuristic),
            smoother: config.smoother,
            low_posture: AlertThrottler::new(
                AlertReason::LowPosture,
                config.alert_threshold,
                config.alert_cooldown,
            ),
            reminder: AlertThrottler::new(
                AlertReason::ExerciseReminder,
                config.reminder_threshold,
                config.reminder_cooldown,
            ),
            notifications_enabled: config.notifications_enabled,
            smoothed: INITIAL_SMOOTHED_SCORE,
            latest: None,
            counters: TickCounters::default(),
        }
    }

    /// Heuristic-only monitor with default settings.
    pub fn with_defaults() -> Self {
        Self::new(MonitorConfig::default(), ScoringStrategy::Heuristic)
    }

    /// Process one detected pose.
    pub fn tick(&mut self, frame: &PoseFrame, now: TimestampNs) -> TickOutcome {
        let features = match self.extractor.extract(frame) {
            Ok(features) => features,
            Err(ScoringError::MissingKeypoints { missing }) => {
                self.counters.held += 1;
                tracing::debug!(?missing, smoothed = self.smoothed, "Keypoints missing, holding score");
                return TickOutcome::Held {
                    smoothed: self.smoothed,
                    missing,
                };
            }
            Err(e) => {
                self.counters.held += 1;
                tracing::warn!(error = %e, "Feature extraction failed, holding score");
                return TickOutcome::Held {
                    smoothed: self.smoothed,
                    missing: Vec::new(),
                };
            }
        };

        let outcome = self.engine.evaluate(&features);
        if matches!(outcome.source, ScoreSource::Fallback(_)) {
            self.counters.fallbacks += 1;
        }

        let smoothed = self.smoother.smooth(outcome.value, self.smoothed);
        self.smoothed = smoothed;

        let sample = ScoreSample {
            raw: outcome.value,
            smoothed,
            timestamp_ns: now,
        };
        self.latest = Some(sample);
        self.counters.scored += 1;

        let alert = if self.notifications_enabled {
            self.low_posture.evaluate(smoothed, now)
        } else {
            None
        };
        if let Some(event) = &alert {
            self.counters.alerts += 1;
            tracing::info!(reason = %event.reason, score = event.score, "Posture alert");
        }

        tracing::trace!(raw = sample.raw, smoothed, source = ?outcome.source, "Tick scored");

        TickOutcome::Scored {
            sample,
            alert,
            source: outcome.source,
        }
    }

    /// Evaluate the exercise-reminder class against the current smoothed score.
    pub fn check_reminder(&mut self, now: TimestampNs) -> Option<AlertEvent> {
        if !self.notifications_enabled {
            return None;
        }
        let event = self.reminder.evaluate(self.smoothed, now)?;
        self.counters.alerts += 1;
        tracing::info!(score = event.score, "Exercise reminder");
        Some(event)
    }

    /// Last smoothed score (starts at 100).
    pub fn current_score(&self) -> u8 {
        self.smoothed
    }

    /// Most recent published sample; `None` until a frame has been scored.
    pub fn latest_sample(&self) -> Option<ScoreSample> {
        self.latest
    }

    pub fn notifications_enabled(&self) -> bool {
        self.notifications_enabled
    }

    pub fn set_notifications_enabled(&mut self, enabled: bool) {
        self.notifications_enabled = enabled;
    }

    pub fn strategy(&self) -> &ScoringStrategy {
        self.engine.strategy()
    }

    pub fn counters(&self) -> TickCounters {
        self.counters
    }

    pub fn low_posture_throttler(&self) -> &AlertThrottler {
        &self.low_posture
    }

    pub fn reminder_throttler(&self) -> &AlertThrottler {
        &self.reminder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::ThrottleState;
    use zenposture_pose_model::keypoint::Keypoint;

    const SEC: u64 = 1_000_000_000;

    fn frame(nose_y: f64) -> PoseFrame {
        PoseFrame::new(
            vec![
                Keypoint::new(KeypointName::Nose, 500.0, nose_y, 0.9),
                Keypoint::new(KeypointName::LeftEar, 250.0, 400.0, 0.9),
                Keypoint::new(KeypointName::RightEar, 750.0, 400.0, 0.9),
                Keypoint::new(KeypointName::LeftShoulder, 278.0, 600.0, 0.9),
                Keypoint::new(KeypointName::RightShoulder, 722.0, 600.0, 0.9),
            ],
            1000,
            1000,
        )
        .unwrap()
    }

    fn empty_frame() -> PoseFrame {
        PoseFrame::new(Vec::new(), 1000, 1000).unwrap()
    }

    #[test]
    fn test_initial_state() {
        let monitor = PostureMonitor::with_defaults();
        assert_eq!(monitor.current_score(), INITIAL_SMOOTHED_SCORE);
        assert!(monitor.latest_sample().is_none());
        assert!(monitor.notifications_enabled());
    }

    #[test]
    fn test_missing_keypoints_hold_score() {
        let mut monitor = PostureMonitor::with_defaults();
        let scored = monitor.tick(&frame(400.0), 0);
        let before = scored.smoothed();

        let held = monitor.tick(&empty_frame(), SEC);
        match held {
            TickOutcome::Held { smoothed, missing } => {
                assert_eq!(smoothed, before);
                assert_eq!(missing.len(), 5);
            }
            other => panic!("expected Held, got {other:?}"),
        }
        assert_eq!(monitor.current_score(), before);
        assert_eq!(monitor.latest_sample().map(|s| s.timestamp_ns), Some(0));
        assert_eq!(monitor.counters().held, 1);
    }

    #[test]
    fn test_smoothing_uses_previous_smoothed_score() {
        let mut monitor = PostureMonitor::with_defaults();
        let first = monitor.tick(&frame(400.0), 0);
        let sample = *first.sample().unwrap();
        let expected = TemporalSmoother::default().smooth(sample.raw, INITIAL_SMOOTHED_SCORE);
        assert_eq!(sample.smoothed, expected);

        let second = monitor.tick(&frame(400.0), SEC);
        let expected = TemporalSmoother::default().smooth(sample.raw, sample.smoothed);
        assert_eq!(second.smoothed(), expected);
    }

    #[test]
    fn test_slouching_raises_low_posture_alert() {
        let mut monitor = PostureMonitor::with_defaults();
        // Nose dropped almost to shoulder level.
        let slouched = frame(570.0);
        let alerts: Vec<AlertEvent> = (0..40)
            .filter_map(|i| monitor.tick(&slouched, i * SEC / 10).alert().copied())
            .collect();

        assert!(monitor.current_score() < 70, "score {}", monitor.current_score());
        assert!(!alerts.is_empty());
        assert!(alerts.iter().all(|a| a.reason == AlertReason::LowPosture));
        for pair in alerts.windows(2) {
            assert!(pair[1].timestamp_ns - pair[0].timestamp_ns >= 5 * SEC);
        }
    }

    #[test]
    fn test_notifications_disabled_suppresses_alerts() {
        let config = MonitorConfig {
            notifications_enabled: false,
            ..MonitorConfig::default()
        };
        let mut monitor = PostureMonitor::new(config, ScoringStrategy::Heuristic);
        for i in 0..40 {
            assert!(monitor.tick(&frame(570.0), i * SEC / 10).alert().is_none());
        }
        assert!(monitor.current_score() < 70);
        assert!(monitor.check_reminder(60 * SEC).is_none());

        monitor.set_notifications_enabled(true);
        assert!(monitor.check_reminder(61 * SEC).is_some());
    }

    #[test]
    fn test_reminder_uses_its_own_cooldown() {
        let mut monitor = PostureMonitor::with_defaults();
        for i in 0..40 {
            monitor.tick(&frame(570.0), i * SEC / 10);
        }
        let first = monitor.check_reminder(60 * SEC).expect("reminder fires");
        assert_eq!(first.reason, AlertReason::ExerciseReminder);
        assert_eq!(
            monitor.reminder_throttler().state(90 * SEC),
            ThrottleState::CoolingDown {
                remaining_ns: 30 * SEC
            }
        );
        assert_eq!(
            monitor.low_posture_throttler().cooldown(),
            Duration::from_secs(5)
        );
        assert!(monitor.check_reminder(90 * SEC).is_none());
        assert!(monitor.check_reminder(120 * SEC).is_some());
    }

    #[test]
    fn test_config_from_defaults() {
        let defaults = MonitorDefaults {
            alert_threshold: 60,
            alert_cooldown_secs: 10,
            notifications_enabled: false,
            ..MonitorDefaults::default()
        };
        let config = MonitorConfig::from(&defaults);
        assert_eq!(config.alert_threshold, 60);
        assert_eq!(config.alert_cooldown, Duration::from_secs(10));
        assert!(!config.notifications_enabled);
        assert_eq!(config.reminder_cooldown, Duration::from_secs(60));
    }
}

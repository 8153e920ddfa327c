//! The tick-driven monitor loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use zenposture_common::clock::{MonitorClock, RateController, TimestampNs};
use zenposture_common::config::MonitorDefaults;
use zenposture_common::error::ZenResult;
use zenposture_pose_model::sample::{AlertEvent, SessionRecord};
use zenposture_scoring_core::monitor::{PostureMonitor, TickOutcome};

use crate::observer::MonitorObserver;
use crate::source::FrameSource;
use crate::writer::SessionWriter;

/// Periods of the runtime's three schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub detection_interval: Duration,
    pub publish_interval: Duration,
    pub reminder_interval: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            detection_interval: Duration::from_millis(100),
            publish_interval: Duration::from_secs(5),
            reminder_interval: Duration::from_secs(60),
        }
    }
}

impl From<&MonitorDefaults> for RuntimeConfig {
    fn from(defaults: &MonitorDefaults) -> Self {
        Self {
            detection_interval: Duration::from_millis(defaults.detection_interval_ms.max(1)),
            publish_interval: Duration::from_secs(defaults.publish_interval_secs.max(1)),
            reminder_interval: Duration::from_secs(defaults.reminder_interval_secs.max(1)),
        }
    }
}

/// Counters for one runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    /// Detection ticks executed.
    pub detections: u64,
    /// Frames received from the source.
    pub frames: u64,
    pub scored: u64,
    pub held: u64,
    pub alerts: u64,
    pub published: u64,
    pub source_errors: u64,
}

/// Drives a [`PostureMonitor`] from a frame source on fixed schedules and
/// fans its output out to observers and the session log.
pub struct MonitorRuntime {
    monitor: PostureMonitor,
    source: Box<dyn FrameSource>,
    observers: Vec<Box<dyn MonitorObserver>>,
    session: Option<SessionWriter>,
    epoch_wall: DateTime<Utc>,
    detection: RateController,
    publication: RateController,
    reminders: RateController,
    last_publish_ns: Option<TimestampNs>,
    stop_flag: Arc<AtomicBool>,
    stats: RuntimeStats,
}

impl MonitorRuntime {
    pub fn new(
        monitor: PostureMonitor,
        source: Box<dyn FrameSource>,
        config: RuntimeConfig,
        epoch_wall: DateTime<Utc>,
    ) -> Self {
        Self {
            monitor,
            source,
            observers: Vec::new(),
            session: None,
            epoch_wall,
            detection: RateController::every(config.detection_interval),
            publication: RateController::every(config.publish_interval),
            reminders: RateController::every(config.reminder_interval),
            last_publish_ns: None,
            stop_flag: Arc::new(AtomicBool::new(false)),
            stats: RuntimeStats::default(),
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn MonitorObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn with_session_writer(mut self, writer: SessionWriter) -> Self {
        self.session = Some(writer);
        self
    }

    pub fn add_observer(&mut self, observer: Box<dyn MonitorObserver>) {
        self.observers.push(observer);
    }

    /// Poll the source once and score the frame, if any.
    ///
    /// Source errors are logged and the tick is skipped.
    pub fn detect(&mut self, now: TimestampNs) -> Option<TickOutcome> {
        self.stats.detections += 1;

        let frame = match self.source.poll(now) {
            Ok(Some(frame)) => frame,
            Ok(None) => return None,
            Err(e) => {
                self.stats.source_errors += 1;
                tracing::warn!(source = %self.source.name(), error = %e, "Frame source error");
                return None;
            }
        };
        self.stats.frames += 1;

        let outcome = self.monitor.tick(&frame, now);
        match &outcome {
            TickOutcome::Scored { sample, alert, .. } => {
                self.stats.scored += 1;
                for observer in &mut self.observers {
                    observer.on_sample(sample);
                }
                if let Some(alert) = alert {
                    self.dispatch_alert(alert);
                }
            }
            TickOutcome::Held { missing, .. } => {
                self.stats.held += 1;
                for observer in &mut self.observers {
                    observer.on_missing_keypoints(now, missing);
                }
            }
        }
        Some(outcome)
    }

    /// Publish the current smoothed score covering the time since the last
    /// publication. Nothing is published before the first scored frame or
    /// for an empty interval.
    pub fn publish(&mut self, now: TimestampNs) -> ZenResult<Option<SessionRecord>> {
        let Some(sample) = self.monitor.latest_sample() else {
            return Ok(None);
        };

        let since = self.last_publish_ns.unwrap_or(0);
        self.last_publish_ns = Some(now);
        let covered_ns = now.saturating_sub(since);
        if covered_ns == 0 {
            return Ok(None);
        }

        let record = SessionRecord {
            posture_score: sample.smoothed,
            duration_secs: MonitorClock::ns_to_secs(covered_ns),
            recorded_at: self.wall_time_at(now),
        };

        if let Some(writer) = &mut self.session {
            writer.write_record(&record)?;
        }
        for observer in &mut self.observers {
            observer.on_publish(&record);
        }
        self.stats.published += 1;
        tracing::debug!(score = record.posture_score, secs = record.duration_secs, "Published session record");
        Ok(Some(record))
    }

    /// Evaluate the exercise-reminder class.
    pub fn remind(&mut self, now: TimestampNs) -> Option<AlertEvent> {
        let alert = self.monitor.check_reminder(now)?;
        self.dispatch_alert(&alert);
        Some(alert)
    }

    /// Run every schedule that is due at `now`.
    pub fn step(&mut self, now: TimestampNs) -> ZenResult<()> {
        if self.detection.should_tick(now) {
            self.detect(now);
        }
        if self.publication.should_tick(now) {
            self.publish(now)?;
        }
        if self.reminders.should_tick(now) {
            self.remind(now);
        }
        Ok(())
    }

    /// Publish the partial interval since the last record and flush the log.
    pub fn finish(&mut self, now: TimestampNs) -> ZenResult<()> {
        self.publish(now)?;
        if let Some(writer) = &mut self.session {
            writer.flush()?;
        }
        Ok(())
    }

    /// Run in real time until stopped or the source is exhausted.
    ///
    /// Detection ticks come from a tokio interval; a tick that fires late is
    /// skipped rather than queued.
    pub async fn run(&mut self, clock: &MonitorClock) -> ZenResult<RuntimeStats> {
        tracing::info!(
            source = %self.source.name(),
            strategy = ?self.monitor.strategy(),
            "Posture monitor started"
        );

        let period = Duration::from_nanos(self.detection.interval_ns());
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            if self.stop_flag.load(Ordering::Relaxed) {
                break;
            }
            self.step(clock.elapsed_ns())?;
            if self.source.is_exhausted() {
                break;
            }
        }

        self.finish(clock.elapsed_ns())?;
        tracing::info!(
            detections = self.stats.detections,
            scored = self.stats.scored,
            alerts = self.stats.alerts,
            "Posture monitor stopped"
        );
        Ok(self.stats)
    }

    /// Run against a virtual clock that advances one detection period per
    /// tick, starting at zero. Stops when the source is exhausted, the stop
    /// flag is set, or `until` is passed.
    pub fn run_simulated(&mut self, until: Option<TimestampNs>) -> ZenResult<RuntimeStats> {
        let period = self.detection.interval_ns();
        let mut now: TimestampNs = 0;
        let mut last_step = 0;

        while !self.stop_flag.load(Ordering::Relaxed) && until.map_or(true, |end| now <= end) {
            self.step(now)?;
            last_step = now;
            if self.source.is_exhausted() {
                break;
            }
            now += period;
        }

        self.finish(last_step)?;
        Ok(self.stats)
    }

    fn dispatch_alert(&mut self, alert: &AlertEvent) {
        self.stats.alerts += 1;
        for observer in &mut self.observers {
            observer.on_alert(alert);
        }
    }

    fn wall_time_at(&self, ns: TimestampNs) -> DateTime<Utc> {
        self.epoch_wall + chrono::Duration::nanoseconds(ns.min(i64::MAX as u64) as i64)
    }

    /// Set the stop flag.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
    }

    /// Get the stop flag for external coordination.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    pub fn monitor(&self) -> &PostureMonitor {
        &self.monitor
    }

    pub fn monitor_mut(&mut self) -> &mut PostureMonitor {
        &mut self.monitor
    }

    pub fn stats(&self) -> RuntimeStats {
        self.stats
    }

    pub fn epoch_wall(&self) -> DateTime<Utc> {
        self.epoch_wall
    }
}

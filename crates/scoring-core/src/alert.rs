//! Cooldown-gated alert emission.
//!
//! One [`AlertThrottler`] exists per alert class. It is a two-state machine:
//!
//! - **Idle**: the next breach (`smoothed < threshold`) emits an alert and
//!   moves to CoolingDown.
//! - **CoolingDown**: breaches are suppressed until `cooldown` has elapsed
//!   since the last alert, after which the throttler is Idle again.
//!
//! The CoolingDown -> Idle transition is derived from elapsed time on each
//! query, so no timer is needed to leave the cooldown.

use std::time::Duration;

use zenposture_common::clock::TimestampNs;
use zenposture_pose_model::sample::{AlertEvent, AlertReason};

/// Throttler state at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleState {
    Idle,
    CoolingDown {
        /// Nanoseconds until the throttler is Idle again.
        remaining_ns: u64,
    },
}

#[derive(Debug, Clone)]
pub struct AlertThrottler {
    reason: AlertReason,
    threshold: u8,
    cooldown_ns: u64,
    last_alert_ns: Option<TimestampNs>,
}

impl AlertThrottler {
    pub fn new(reason: AlertReason, threshold: u8, cooldown: Duration) -> Self {
        Self {
            reason,
            threshold,
            cooldown_ns: cooldown.as_nanos().min(u64::MAX as u128) as u64,
            last_alert_ns: None,
        }
    }

    /// Low-posture throttler from a cooldown in seconds.
    pub fn low_posture(threshold: u8, cooldown_secs: u64) -> Self {
        Self::new(
            AlertReason::LowPosture,
            threshold,
            Duration::from_secs(cooldown_secs),
        )
    }

    /// Exercise-reminder throttler from a cooldown in seconds.
    pub fn exercise_reminder(threshold: u8, cooldown_secs: u64) -> Self {
        Self::new(
            AlertReason::ExerciseReminder,
            threshold,
            Duration::from_secs(cooldown_secs),
        )
    }

    pub fn reason(&self) -> AlertReason {
        self.reason
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_nanos(self.cooldown_ns)
    }

    /// Time of the most recent emitted alert.
    pub fn last_alert_ns(&self) -> Option<TimestampNs> {
        self.last_alert_ns
    }

    pub fn state(&self, now: TimestampNs) -> ThrottleState {
        match self.last_alert_ns {
            Some(last) => {
                let elapsed = now.saturating_sub(last);
                if elapsed >= self.cooldown_ns {
                    ThrottleState::Idle
                } else {
                    ThrottleState::CoolingDown {
                        remaining_ns: self.cooldown_ns - elapsed,
                    }
                }
            }
            None => ThrottleState::Idle,
        }
    }

    /// Feed a smoothed score observed at `now`. Returns an alert when the
    /// score breaches the threshold and the throttler is Idle.
    pub fn evaluate(&mut self, smoothed: u8, now: TimestampNs) -> Option<AlertEvent> {
        if smoothed >= self.threshold {
            return None;
        }

        if let ThrottleState::CoolingDown { remaining_ns } = self.state(now) {
            tracing::trace!(
                reason = %self.reason,
                score = smoothed,
                remaining_ms = remaining_ns / 1_000_000,
                "Alert suppressed by cooldown"
            );
            return None;
        }

        self.last_alert_ns = Some(now);
        Some(AlertEvent {
            reason: self.reason,
            timestamp_ns: now,
            score: smoothed,
        })
    }

    /// Forget the last alert; the next breach fires immediately.
    pub fn reset(&mut self) {
        self.last_alert_ns = None;
    }
}

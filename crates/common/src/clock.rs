//! Clock and scheduling utilities for the posture monitor.
//!
//! Every timestamp inside the monitor is a monotonic nanosecond offset
//! from the moment monitoring started. This module provides:
//! - The monitor clock and its wall-clock anchor
//! - Conversions between nanoseconds and seconds
//! - Periodic schedules that gate detection, publication, and reminders

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

/// Monotonic nanoseconds since monitor start.
pub type TimestampNs = u64;

/// A monitor clock that provides monotonic timestamps relative to
/// a fixed epoch (the moment monitoring started).
#[derive(Debug, Clone)]
pub struct MonitorClock {
    /// The instant monitoring started.
    epoch: Instant,

    /// Wall-clock time at epoch.
    epoch_wall: DateTime<Utc>,
}

impl MonitorClock {
    /// Create a new clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: Utc::now(),
        }
    }

    /// Create a clock from a known epoch (for replaying recorded sessions).
    pub fn from_epoch(epoch: Instant, wall: DateTime<Utc>) -> Self {
        Self {
            epoch,
            epoch_wall: wall,
        }
    }

    /// Get nanoseconds elapsed since monitor start.
    pub fn elapsed_ns(&self) -> TimestampNs {
        self.epoch.elapsed().as_nanos() as u64
    }

    /// Get seconds elapsed since monitor start.
    pub fn elapsed_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Wall-clock time at monitor start.
    pub fn epoch_wall(&self) -> DateTime<Utc> {
        self.epoch_wall
    }

    /// Wall-clock time corresponding to a monotonic offset.
    pub fn wall_time_at(&self, ns: TimestampNs) -> DateTime<Utc> {
        self.epoch_wall + chrono::Duration::nanoseconds(ns.min(i64::MAX as u64) as i64)
    }

    /// Convert an elapsed nanosecond value to seconds.
    pub fn ns_to_secs(ns: TimestampNs) -> f64 {
        ns as f64 / 1_000_000_000.0
    }

    /// Convert seconds to nanoseconds.
    pub fn secs_to_ns(secs: f64) -> TimestampNs {
        (secs * 1_000_000_000.0) as u64
    }
}

/// Periodic schedule for the monitor's timer-driven tasks.
///
/// Fed with timestamps rather than reading a clock, so tests can drive
/// it with synthetic ticks.
#[derive(Debug, Clone)]
pub struct RateController {
    target_interval_ns: u64,
    last_tick_ns: Option<TimestampNs>,
}

impl RateController {
    /// Create a controller targeting the given Hz rate.
    pub fn new(target_hz: u32) -> Self {
        Self::with_interval_ns(1_000_000_000 / target_hz.max(1) as u64)
    }

    /// Create a controller firing once per `interval`.
    pub fn every(interval: Duration) -> Self {
        Self::with_interval_ns(interval.as_nanos() as u64)
    }

    /// Create a controller from a raw nanosecond interval.
    pub fn with_interval_ns(interval_ns: u64) -> Self {
        Self {
            target_interval_ns: interval_ns.max(1),
            last_tick_ns: None,
        }
    }

    /// Check if enough time has passed for the next tick.
    /// Returns true and updates internal state if ready.
    /// The first call always returns true.
    pub fn should_tick(&mut self, current_ns: TimestampNs) -> bool {
        match self.last_tick_ns {
            None => {
                self.last_tick_ns = Some(current_ns);
                true
            }
            Some(last) if current_ns >= last.saturating_add(self.target_interval_ns) => {
                self.last_tick_ns = Some(current_ns);
                true
            }
            _ => false,
        }
    }

    /// Timestamp of the last tick that fired.
    pub fn last_tick_ns(&self) -> Option<TimestampNs> {
        self.last_tick_ns
    }

    /// Forget the last tick; the next call to `should_tick` fires.
    pub fn reset(&mut self) {
        self.last_tick_ns = None;
    }

    /// Target interval in nanoseconds.
    pub fn interval_ns(&self) -> u64 {
        self.target_interval_ns
    }
}

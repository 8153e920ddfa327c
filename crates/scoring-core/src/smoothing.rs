//! Temporal smoothing of raw posture scores.
//!
//! Exponential moving average with an asymmetric factor:
//! `smoothed = round(previous * factor + raw * (1 - factor))`, where
//! `factor` is high when the new raw score is good (improvements are
//! reported cautiously) and low when it is bad (deterioration is reported
//! quickly).

/// Asymmetric EMA over integer scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemporalSmoother {
    /// Weight on the previous value when `raw >= pivot`.
    pub improving_factor: f64,
    /// Weight on the previous value when `raw < pivot`.
    pub deteriorating_factor: f64,
    /// Raw scores at or above this use `improving_factor`.
    pub pivot: u8,
}

impl Default for TemporalSmoother {
    fn default() -> Self {
        Self {
            improving_factor: 0.85,
            deteriorating_factor: 0.7,
            pivot: 50,
        }
    }
}

impl TemporalSmoother {
    /// Smoothing factor applied for a given raw score.
    pub fn factor_for(&self, raw: u8) -> f64 {
        if raw >= self.pivot {
            self.improving_factor
        } else {
            self.deteriorating_factor
        }
    }

    /// Blend `raw` into `previous`.
    pub fn smooth(&self, raw: u8, previous: u8) -> u8 {
        let factor = self.factor_for(raw).clamp(0.0, 1.0);
        let blended = previous as f64 * factor + raw as f64 * (1.0 - factor);
        blended.round().clamp(0.0, 100.0) as u8
    }

    /// Smooth against an optional previous value; the first sample passes through.
    pub fn smooth_from(&self, raw: u8, previous: Option<u8>) -> u8 {
        self.smooth(raw, previous.unwrap_or(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_factor_selection() {
        let smoother = TemporalSmoother::default();
        assert_eq!(smoother.factor_for(50), 0.85);
        assert_eq!(smoother.factor_for(49), 0.7);
    }

    #[test]
    fn test_known_values() {
        let smoother = TemporalSmoother::default();
        // 90 * 0.7 + 40 * 0.3 = 75
        assert_eq!(smoother.smooth(40, 90), 75);
        // 40 * 0.85 + 90 * 0.15 = 47.5 -> 48
        assert_eq!(smoother.smooth(90, 40), 48);
    }

    #[test]
    fn test_deterioration_is_reported_faster_than_improvement() {
        let smoother = TemporalSmoother::default();
        let crashing = smoother.smooth(40, 90);
        let recovering = smoother.smooth(90, 40);

        let crash_gap = (crashing as i32 - 40).abs();
        let recover_gap = (90 - recovering as i32).abs();
        assert!(
            crash_gap < recover_gap,
            "crash gap {crash_gap} should be smaller than recovery gap {recover_gap}"
        );
    }

    #[test]
    fn test_first_sample_passes_through() {
        let smoother = TemporalSmoother::default();
        assert_eq!(smoother.smooth_from(37, None), 37);
        assert_eq!(smoother.smooth_from(40, Some(90)), 75);
    }

    proptest! {
        #[test]
        fn prop_equal_inputs_are_a_fixed_point(score in 0u8..=100) {
            prop_assert_eq!(TemporalSmoother::default().smooth(score, score), score);
        }

        #[test]
        fn prop_result_lies_between_inputs(raw in 0u8..=100, previous in 0u8..=100) {
            let smoothed = TemporalSmoother::default().smooth(raw, previous);
            prop_assert!(smoothed >= raw.min(previous));
            prop_assert!(smoothed <= raw.max(previous));
        }
    }
}

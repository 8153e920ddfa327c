//! Deterministic heuristic posture score.
//!
//! # Algorithm
//!
//! 1. **Neck tilt:** `(neck_tilt_angle / 180)^1.5 * 100`, highest when the ears
//!    and nose line up.
//! 2. **Head position:** blend of a four-bucket score on the nose-to-shoulder
//!    distance and a three-bucket score on the nose/shoulder-width ratio.
//! 3. **Ears:** penalize ear-to-nose asymmetry and overall closeness.
//! 4. **Shoulders:** scaled mean of the two shoulder angles, capped at 100.
//! 5. **Composite:** weighted sum of the four sub-scores.
//! 6. **Stability reshaping:** compress scores above 80, amplify scores
//!    below 50, round, clamp to `[10, 100]`.
//!
//! Every constant lives in [`HeuristicConfig`] so a deployment can retune
//! against a reference dataset without code changes.

use serde::{Deserialize, Serialize};
use zenposture_common::error::{ZenError, ZenResult};

use crate::features::FeatureVector;

/// Highest score any path may report.
const MAX_SCORE: u8 = 100;

/// Tunable constants for the heuristic scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HeuristicConfig {
    pub weights: CompositeWeights,
    pub distance: DistanceBuckets,
    pub ratio: RatioBuckets,
    pub ears: EarPenalties,
    pub shoulders: ShoulderGain,
    pub stability: StabilityShaping,
}

impl HeuristicConfig {
    /// Reject constants that would make the scorer panic or leave `[0, 100]`.
    pub fn validate(&self) -> ZenResult<()> {
        let w = &self.weights;
        let d = &self.distance;
        let r = &self.ratio;
        let st = &self.stability;

        let values = [
            w.neck_tilt,
            w.head_position,
            w.ears,
            w.shoulders,
            w.neck_tilt_exponent,
            w.head_distance_share,
            w.head_ratio_share,
            d.heavy_below,
            d.heavy_max,
            d.moderate_below,
            d.moderate_max,
            d.good_until,
            d.good_max,
            d.lean_back_slope,
            d.lean_back_floor,
            r.good_below,
            r.good_score,
            r.medium_below,
            r.medium_min,
            r.poor_slope,
            self.ears.asymmetry,
            self.ears.closeness,
            self.shoulders.gain,
            st.compress_above,
            st.compress_factor,
            st.amplify_below,
            st.amplify_factor,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ZenError::config("heuristic constants must be finite"));
        }
        if st.floor > st.ceiling || st.ceiling > MAX_SCORE {
            return Err(ZenError::config(format!(
                "stability bounds must satisfy floor <= ceiling <= {MAX_SCORE}, got [{}, {}]",
                st.floor, st.ceiling
            )));
        }
        let ordered = 0.0 < d.heavy_below
            && d.heavy_below < d.moderate_below
            && d.moderate_below <= d.good_until;
        if !ordered {
            return Err(ZenError::config(
                "distance buckets must satisfy 0 < heavy_below < moderate_below <= good_until",
            ));
        }
        if r.good_below >= r.medium_below {
            return Err(ZenError::config("ratio buckets must satisfy good_below < medium_below"));
        }
        Ok(())
    }
}

/// Weights of the four sub-scores and of the head-position blend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeWeights {
    pub neck_tilt: f64,
    pub head_position: f64,
    pub ears: f64,
    pub shoulders: f64,
    /// Exponent applied to the normalized neck tilt angle.
    pub neck_tilt_exponent: f64,
    /// Share of the distance score inside the head-position score.
    pub head_distance_share: f64,
    /// Share of the ratio score inside the head-position score.
    pub head_ratio_share: f64,
}

/// Breakpoints of the nose-to-shoulder distance score.
///
/// `[0, heavy_below)` rises from 0 to `heavy_max`, `[heavy_below, moderate_below)`
/// rises to `moderate_max`, `[moderate_below, good_until]` rises to `good_max`,
/// and beyond `good_until` the score falls by `lean_back_slope` per unit
/// distance but never below `lean_back_floor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceBuckets {
    pub heavy_below: f64,
    pub heavy_max: f64,
    pub moderate_below: f64,
    pub moderate_max: f64,
    pub good_until: f64,
    pub good_max: f64,
    pub lean_back_slope: f64,
    pub lean_back_floor: f64,
}

/// Breakpoints of the nose/shoulder-width ratio score.
///
/// Below `good_below` the score is `good_score`; up to `medium_below` it
/// falls linearly to `medium_min`; beyond that it keeps falling by
/// `poor_slope` per unit ratio down to 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatioBuckets {
    pub good_below: f64,
    pub good_score: f64,
    pub medium_below: f64,
    pub medium_min: f64,
    pub poor_slope: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EarPenalties {
    /// Points lost per unit of left/right ear-nose distance difference.
    pub asymmetry: f64,
    /// Points lost per unit of mean ear-nose distance.
    pub closeness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShoulderGain {
    /// Multiplier on the mean shoulder angle (degrees).
    pub gain: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilityShaping {
    pub compress_above: f64,
    pub compress_factor: f64,
    pub amplify_below: f64,
    pub amplify_factor: f64,
    pub floor: u8,
    pub ceiling: u8,
}

impl Default for CompositeWeights {
    fn default() -> Self {
        Self {
            neck_tilt: 0.35,
            head_position: 0.45,
            ears: 0.10,
            shoulders: 0.10,
            neck_tilt_exponent: 1.5,
            head_distance_share: 0.7,
            head_ratio_share: 0.3,
        }
    }
}

impl Default for DistanceBuckets {
    fn default() -> Self {
        Self {
            heavy_below: 0.12,
            heavy_max: 50.0,
            moderate_below: 0.18,
            moderate_max: 90.0,
            good_until: 0.25,
            good_max: 100.0,
            lean_back_slope: 200.0,
            lean_back_floor: 60.0,
        }
    }
}

impl Default for RatioBuckets {
    fn default() -> Self {
        Self {
            good_below: 0.5,
            good_score: 100.0,
            medium_below: 0.7,
            medium_min: 60.0,
            poor_slope: 150.0,
        }
    }
}

impl Default for EarPenalties {
    fn default() -> Self {
        Self {
            asymmetry: 200.0,
            closeness: 100.0,
        }
    }
}

impl Default for ShoulderGain {
    fn default() -> Self {
        Self { gain: 1.5 }
    }
}

impl Default for StabilityShaping {
    fn default() -> Self {
        Self {
            compress_above: 80.0,
            compress_factor: 0.8,
            amplify_below: 50.0,
            amplify_factor: 1.1,
            floor: 10,
            ceiling: 100,
        }
    }
}

/// Per-component view of one heuristic evaluation, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeuristicBreakdown {
    pub neck_tilt: f64,
    pub head_position: f64,
    pub ears: f64,
    pub shoulders: f64,
    /// Weighted sum before stability reshaping.
    pub composite: f64,
    /// Final score after reshaping, rounding, and clamping.
    pub score: u8,
}

/// The heuristic scorer.
#[derive(Debug, Clone, Default)]
pub struct HeuristicScorer {
    config: HeuristicConfig,
}

impl HeuristicScorer {
    pub fn new(config: HeuristicConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HeuristicConfig {
        &self.config
    }

    /// Score in `[floor, ceiling]` (default `[10, 100]`).
    pub fn score(&self, features: &FeatureVector) -> u8 {
        self.breakdown(features).score
    }

    /// Evaluate every component and the final score.
    pub fn breakdown(&self, features: &FeatureVector) -> HeuristicBreakdown {
        let w = &self.config.weights;

        let neck_tilt = neck_tilt_score(features.neck_tilt_angle_deg, w.neck_tilt_exponent);
        let head_position = w.head_distance_share
            * distance_score(features.dist_nose_shoulders, &self.config.distance)
            + w.head_ratio_share * ratio_score(features.ratio_nose_shoulders, &self.config.ratio);
        let ears = ear_score(
            features.dist_left_ear_nose,
            features.dist_right_ear_nose,
            &self.config.ears,
        );
        let shoulders = shoulder_score(
            features.angle_left_shoulder_deg,
            features.angle_right_shoulder_deg,
            &self.config.shoulders,
        );

        let composite = w.neck_tilt * neck_tilt
            + w.head_position * head_position
            + w.ears * ears
            + w.shoulders * shoulders;

        HeuristicBreakdown {
            neck_tilt,
            head_position,
            ears,
            shoulders,
            composite,
            score: reshape(composite, &self.config.stability),
        }
    }
}

fn neck_tilt_score(angle_deg: f64, exponent: f64) -> f64 {
    (angle_deg.clamp(0.0, 180.0) / 180.0).powf(exponent) * 100.0
}

fn distance_score(d: f64, b: &DistanceBuckets) -> f64 {
    let d = d.max(0.0);
    if d < b.heavy_below {
        lerp(0.0, b.heavy_max, d / b.heavy_below)
    } else if d < b.moderate_below {
        lerp(
            b.heavy_max,
            b.moderate_max,
            (d - b.heavy_below) / (b.moderate_below - b.heavy_below),
        )
    } else if d <= b.good_until {
        lerp(
            b.moderate_max,
            b.good_max,
            (d - b.moderate_below) / (b.good_until - b.moderate_below),
        )
    } else {
        (b.good_max - (d - b.good_until) * b.lean_back_slope).max(b.lean_back_floor)
    }
}

fn ratio_score(r: f64, b: &RatioBuckets) -> f64 {
    let r = r.max(0.0);
    if r < b.good_below {
        b.good_score
    } else if r < b.medium_below {
        lerp(
            b.good_score,
            b.medium_min,
            (r - b.good_below) / (b.medium_below - b.good_below),
        )
    } else {
        (b.medium_min - (r - b.medium_below) * b.poor_slope).max(0.0)
    }
}

fn ear_score(left: f64, right: f64, p: &EarPenalties) -> f64 {
    let asymmetry = (left - right).abs();
    let mean = (left + right) / 2.0;
    (100.0 - p.asymmetry * asymmetry - p.closeness * mean).max(0.0)
}

fn shoulder_score(left_deg: f64, right_deg: f64, g: &ShoulderGain) -> f64 {
    (g.gain * (left_deg + right_deg) / 2.0).min(100.0)
}

/// Stability reshaping, rounding, and clamping.
fn reshape(score: f64, s: &StabilityShaping) -> u8 {
    let ceiling = s.ceiling.min(MAX_SCORE);
    let floor = s.floor.min(ceiling);
    if !score.is_finite() {
        return floor;
    }
    let shaped = if score > s.compress_above {
        s.compress_above + (score - s.compress_above) * s.compress_factor
    } else if score < s.amplify_below {
        score * s.amplify_factor
    } else {
        score
    };
    shaped.round().clamp(floor as f64, ceiling as f64) as u8
}

fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn good_features() -> FeatureVector {
        FeatureVector {
            dist_nose_shoulders: 0.20,
            ratio_nose_shoulders: 0.45,
            neck_tilt_angle_deg: 180.0,
            dist_left_ear_nose: 0.1,
            dist_right_ear_nose: 0.1,
            angle_left_shoulder_deg: 70.0,
            angle_right_shoulder_deg: 70.0,
        }
    }

    #[test]
    fn test_neck_tilt_rewards_straight_line() {
        assert!((neck_tilt_score(180.0, 1.5) - 100.0).abs() < 1e-9);
        assert!((neck_tilt_score(90.0, 1.5) - 35.355).abs() < 1e-3);
        assert_eq!(neck_tilt_score(0.0, 1.5), 0.0);
    }

    #[test]
    fn test_distance_buckets() {
        let b = DistanceBuckets::default();
        assert_eq!(distance_score(0.0, &b), 0.0);
        assert!((distance_score(0.06, &b) - 25.0).abs() < 1e-9);
        assert!((distance_score(0.12, &b) - 50.0).abs() < 1e-9);
        assert!((distance_score(0.15, &b) - 70.0).abs() < 1e-9);
        assert!((distance_score(0.18, &b) - 90.0).abs() < 1e-9);
        assert!((distance_score(0.25, &b) - 100.0).abs() < 1e-9);
        // Leaning back costs a little, bounded by the floor.
        assert!((distance_score(0.30, &b) - 90.0).abs() < 1e-9);
        assert_eq!(distance_score(0.90, &b), 60.0);
    }

    #[test]
    fn test_ratio_buckets() {
        let b = RatioBuckets::default();
        assert_eq!(ratio_score(0.3, &b), 100.0);
        assert!((ratio_score(0.6, &b) - 80.0).abs() < 1e-9);
        assert!((ratio_score(0.7, &b) - 60.0).abs() < 1e-9);
        assert!((ratio_score(0.8, &b) - 45.0).abs() < 1e-9);
        assert_eq!(ratio_score(5.0, &b), 0.0);
    }

    #[test]
    fn test_ear_and_shoulder_scores() {
        let p = EarPenalties::default();
        assert!((ear_score(0.1, 0.1, &p) - 90.0).abs() < 1e-9);
        assert!((ear_score(0.1, 0.2, &p) - 65.0).abs() < 1e-9);
        assert_eq!(ear_score(0.9, 0.1, &p), 0.0);

        let g = ShoulderGain::default();
        assert!((shoulder_score(20.0, 40.0, &g) - 45.0).abs() < 1e-9);
        assert_eq!(shoulder_score(90.0, 90.0, &g), 100.0);
    }

    #[test]
    fn test_reshape_compresses_and_amplifies() {
        let s = StabilityShaping::default();
        assert_eq!(reshape(100.0, &s), 96);
        assert_eq!(reshape(90.0, &s), 88);
        assert_eq!(reshape(65.0, &s), 65);
        assert_eq!(reshape(40.0, &s), 44);
        assert_eq!(reshape(0.0, &s), 10);
        assert_eq!(reshape(f64::NAN, &s), 10);
    }

    #[test]
    fn test_good_posture_scores_high() {
        let breakdown = HeuristicScorer::default().breakdown(&good_features());
        assert!((breakdown.neck_tilt - 100.0).abs() < 1e-9);
        assert_eq!(breakdown.shoulders, 100.0);
        assert!(breakdown.score >= 90, "score = {}", breakdown.score);
    }

    #[test]
    fn test_slouched_posture_scores_low() {
        let slouched = FeatureVector {
            dist_nose_shoulders: 0.08,
            ratio_nose_shoulders: 0.85,
            neck_tilt_angle_deg: 120.0,
            dist_left_ear_nose: 0.05,
            dist_right_ear_nose: 0.15,
            angle_left_shoulder_deg: 10.0,
            angle_right_shoulder_deg: 15.0,
        };
        let score = HeuristicScorer::default().score(&slouched);
        assert!(score < 50, "score = {score}");
        assert!(score >= 10);
    }

    #[test]
    fn test_config_deserializes_partially() {
        let config: HeuristicConfig =
            serde_json::from_str(r#"{"weights":{"neck_tilt":0.5}}"#).unwrap();
        assert_eq!(config.weights.neck_tilt, 0.5);
        assert_eq!(config.weights.head_position, 0.45);
        assert_eq!(config.distance, DistanceBuckets::default());
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(HeuristicConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_stability_bounds() {
        let config: HeuristicConfig =
            serde_json::from_str(r#"{"stability":{"floor":60,"ceiling":40}}"#).unwrap();
        assert!(matches!(config.validate(), Err(ZenError::Config { .. })));

        // Scoring with it directly still stays in range instead of panicking.
        let score = HeuristicScorer::new(config).score(&good_features());
        assert!(score <= 40);
    }

    #[test]
    fn test_ceiling_above_100_is_rejected_and_capped() {
        let config: HeuristicConfig =
            serde_json::from_str(r#"{"stability":{"ceiling":250,"compress_factor":3.0}}"#)
                .unwrap();
        assert!(config.validate().is_err());
        assert_eq!(HeuristicScorer::new(config).score(&good_features()), 100);
    }

    #[test]
    fn test_validate_rejects_bad_buckets_and_weights() {
        let mut config = HeuristicConfig::default();
        config.distance.moderate_below = 0.10;
        assert!(config.validate().is_err());

        let mut config = HeuristicConfig::default();
        config.ratio.good_below = 0.8;
        assert!(config.validate().is_err());

        let mut config = HeuristicConfig::default();
        config.weights.ears = f64::NAN;
        assert!(config.validate().is_err());
    }

    proptest! {
        #[test]
        fn prop_heuristic_in_floor_ceiling(
            dist in 0.0f64..2.0,
            ratio in 0.0f64..10.0,
            tilt in 0.0f64..=180.0,
            left_ear in 0.0f64..2.0,
            right_ear in 0.0f64..2.0,
            left_sh in 0.0f64..=180.0,
            right_sh in 0.0f64..=180.0,
        ) {
            let features = FeatureVector {
                dist_nose_shoulders: dist,
                ratio_nose_shoulders: ratio,
                neck_tilt_angle_deg: tilt,
                dist_left_ear_nose: left_ear,
                dist_right_ear_nose: right_ear,
                angle_left_shoulder_deg: left_sh,
                angle_right_shoulder_deg: right_sh,
            };
            let score = HeuristicScorer::default().score(&features);
            prop_assert!((10..=100).contains(&score));
        }
    }
}

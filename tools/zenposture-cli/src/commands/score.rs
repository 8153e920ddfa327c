//! Per-frame feature and raw score dump.

use std::path::PathBuf;

use zenposture_monitor_runtime::RecordedFrameSource;
use zenposture_scoring_core::inference::ScoreSource;
use zenposture_scoring_core::{FeatureExtractor, FeatureVector, ScoreInferenceEngine, ScoringError};

use super::{format_ts, MonitorArgs};

pub fn run(frames: PathBuf, args: MonitorArgs, json: bool) -> anyhow::Result<()> {
    let config = args.resolve_config()?;
    let (monitor_config, strategy) = args.scoring_setup(&config)?;
    let extractor = FeatureExtractor::new(monitor_config.min_keypoint_confidence);
    let engine = ScoreInferenceEngine::new(strategy, monitor_config.heuristic);

    let source = RecordedFrameSource::from_path(&frames)
        .map_err(|e| anyhow::anyhow!("Failed to load frames: {e}"))?;

    for recorded in source.frames() {
        let t = recorded.timestamp_ns;
        match extractor.extract(&recorded.frame) {
            Ok(features) => {
                let outcome = engine.evaluate(&features);
                if json {
                    let line = serde_json::json!({
                        "t": t,
                        "features": features_json(&features),
                        "raw": outcome.value,
                        "source": source_label(outcome.source),
                    });
                    println!("{line}");
                } else {
                    println!(
                        "{:>9}  raw {:>3} ({})",
                        format_ts(t),
                        outcome.value,
                        source_label(outcome.source)
                    );
                    for (name, value) in FeatureVector::names().iter().zip(features.to_array()) {
                        println!("           {name:<26} {value:>10.4}");
                    }
                }
            }
            Err(ScoringError::MissingKeypoints { missing }) => {
                let names: Vec<&str> = missing.iter().map(|k| k.as_str()).collect();
                if json {
                    println!("{}", serde_json::json!({ "t": t, "missing": names }));
                } else {
                    println!("{:>9}  missing {}", format_ts(t), names.join(", "));
                }
            }
            Err(e) => return Err(anyhow::anyhow!("Feature extraction failed: {e}")),
        }
    }

    Ok(())
}

fn features_json(features: &FeatureVector) -> serde_json::Value {
    FeatureVector::names()
        .iter()
        .zip(features.to_array())
        .map(|(name, value)| (name.to_string(), serde_json::json!(value)))
        .collect::<serde_json::Map<_, _>>()
        .into()
}

fn source_label(source: ScoreSource) -> &'static str {
    match source {
        ScoreSource::Model => "model",
        ScoreSource::Heuristic => "heuristic",
        ScoreSource::Fallback(_) => "heuristic fallback",
    }
}

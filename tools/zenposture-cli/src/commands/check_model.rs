//! Load model weights and score reference poses.

use std::path::PathBuf;

use zenposture_scoring_core::inference::ScoreSource;
use zenposture_scoring_core::{
    FeatureVector, HeuristicConfig, PostureModel, ScoreInferenceEngine, ScoringStrategy,
};

use super::load_model;

/// Reference poses: (label, features in model input order).
const REFERENCE_POSES: [(&str, [f64; 7]); 3] = [
    ("upright", [0.20, 0.45, 180.0, 0.10, 0.10, 60.0, 60.0]),
    ("forward head", [0.14, 0.62, 150.0, 0.08, 0.12, 35.0, 40.0]),
    ("slouched", [0.05, 0.85, 120.0, 0.25, 0.30, 20.0, 25.0]),
];

pub fn run(weights: PathBuf) -> anyhow::Result<()> {
    let model = load_model(&weights)?;
    let name = model.name().to_string();
    let engine = ScoreInferenceEngine::new(
        ScoringStrategy::Model(model.clone()),
        HeuristicConfig::default(),
    );
    let heuristic = ScoreInferenceEngine::heuristic_only();

    println!("Model: {name} ({})", weights.display());
    println!();
    println!("{:<14} {:>10} {:>8} {:>10}  Source", "Pose", "Output", "Score", "Heuristic");

    let mut usable = 0;
    for (label, values) in REFERENCE_POSES {
        let features = FeatureVector::from_array(values);
        let output = match model.predict(&features) {
            Ok(value) => format!("{value:.4}"),
            Err(e) => format!("error: {e}"),
        };
        let outcome = engine.evaluate(&features);
        if outcome.source == ScoreSource::Model {
            usable += 1;
        }
        println!(
            "{:<14} {:>10} {:>8} {:>10}  {:?}",
            label,
            output,
            outcome.value,
            heuristic.score(&features),
            outcome.source
        );
    }

    println!();
    if usable == REFERENCE_POSES.len() {
        println!("Model produced usable scores for every reference pose.");
    } else {
        println!(
            "Model fell back to the heuristic for {} of {} reference poses.",
            REFERENCE_POSES.len() - usable,
            REFERENCE_POSES.len()
        );
    }

    Ok(())
}

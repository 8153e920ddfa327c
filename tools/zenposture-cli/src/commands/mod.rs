//! Subcommands and the monitor settings they share.

pub mod check_model;
pub mod init_config;
pub mod replay;
pub mod score;
pub mod stats;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use zenposture_common::clock::{MonitorClock, TimestampNs};
use zenposture_common::config::AppConfig;
use zenposture_pose_model::sample::{AlertEvent, ScoreSample, SessionRecord};
use zenposture_monitor_runtime::MonitorObserver;
use zenposture_scoring_core::inference::ModelHandle;
use zenposture_scoring_core::{
    DenseModel, HeuristicConfig, MonitorConfig, PostureMonitor, ScoringStrategy,
};

/// Monitor overrides accepted by every scoring command.
#[derive(Args, Debug, Clone, Default)]
pub struct MonitorArgs {
    /// Configuration file (defaults to the standard location)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Exported posture model weights; the heuristic is used when omitted
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Alert when the smoothed score drops below this value
    #[arg(long)]
    pub threshold: Option<u8>,

    /// Minimum seconds between two low-posture alerts
    #[arg(long)]
    pub cooldown: Option<u64>,

    /// Confidence floor for required keypoints
    #[arg(long)]
    pub min_confidence: Option<f64>,

    /// Heuristic constants (JSON)
    #[arg(long)]
    pub heuristic_config: Option<PathBuf>,

    /// Score without raising alerts
    #[arg(long)]
    pub no_notifications: bool,
}

impl MonitorArgs {
    /// Load the configuration and apply command-line overrides.
    pub fn resolve_config(&self) -> anyhow::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load_from(path)
                .map_err(|e| anyhow::anyhow!("Failed to load config: {e}"))?,
            None => AppConfig::load(),
        };

        let monitor = &mut config.monitor;
        if let Some(threshold) = self.threshold {
            monitor.alert_threshold = threshold;
            monitor.reminder_threshold = threshold;
        }
        if let Some(cooldown) = self.cooldown {
            monitor.alert_cooldown_secs = cooldown;
        }
        if let Some(min_confidence) = self.min_confidence {
            monitor.min_keypoint_confidence = min_confidence;
        }
        if self.no_notifications {
            monitor.notifications_enabled = false;
        }
        if let Some(model) = &self.model {
            monitor.model_path = Some(model.clone());
        }
        monitor
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid monitor settings: {e}"))?;

        Ok(config)
    }

    /// Monitor settings and scoring strategy from the resolved configuration.
    pub fn scoring_setup(
        &self,
        config: &AppConfig,
    ) -> anyhow::Result<(MonitorConfig, ScoringStrategy)> {
        let mut monitor_config = MonitorConfig::from(&config.monitor);
        if let Some(path) = &self.heuristic_config {
            monitor_config.heuristic = load_heuristic_config(path)?;
        }

        let model = config
            .monitor
            .model_path
            .as_deref()
            .map(load_model)
            .transpose()?;

        Ok((monitor_config, ScoringStrategy::from_optional(model)))
    }

    pub fn build_monitor(&self, config: &AppConfig) -> anyhow::Result<PostureMonitor> {
        let (monitor_config, strategy) = self.scoring_setup(config)?;
        Ok(PostureMonitor::new(monitor_config, strategy))
    }
}

/// Load exported model weights.
pub fn load_model(path: &Path) -> anyhow::Result<ModelHandle> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read model {}: {e}", path.display()))?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dense-mlp".to_string());
    let model = DenseModel::from_weights_json(&json)
        .map_err(|e| anyhow::anyhow!("Failed to load model {}: {e}", path.display()))?
        .with_name(name);
    tracing::info!(path = %path.display(), layers = model.depth(), "Posture model loaded");
    Ok(Arc::new(model))
}

fn load_heuristic_config(path: &Path) -> anyhow::Result<HeuristicConfig> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read heuristic config {}: {e}", path.display()))?;
    let config: HeuristicConfig = serde_json::from_str(&json)
        .map_err(|e| anyhow::anyhow!("Invalid heuristic config {}: {e}", path.display()))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid heuristic config {}: {e}", path.display()))?;
    Ok(config)
}

/// Prints samples and alerts as they happen.
pub struct ConsoleObserver {
    pub show_samples: bool,
}

impl MonitorObserver for ConsoleObserver {
    fn on_sample(&mut self, sample: &ScoreSample) {
        if self.show_samples {
            println!(
                "{:>9}  raw {:>3}  smoothed {:>3}",
                format_ts(sample.timestamp_ns),
                sample.raw,
                sample.smoothed
            );
        }
    }

    fn on_alert(&mut self, alert: &AlertEvent) {
        println!(
            "{:>9}  ALERT {} (score {})",
            format_ts(alert.timestamp_ns),
            alert.reason,
            alert.score
        );
    }

    fn on_publish(&mut self, record: &SessionRecord) {
        if self.show_samples {
            println!(
                "{:>9}  published score {} over {:.1}s",
                record.recorded_at.format("%H:%M:%S"),
                record.posture_score,
                record.duration_secs
            );
        }
    }
}

pub fn format_ts(ns: TimestampNs) -> String {
    format!("{:.3}s", MonitorClock::ns_to_secs(ns))
}

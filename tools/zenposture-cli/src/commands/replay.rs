//! Replay recorded frames on a virtual clock.

use std::path::PathBuf;

use chrono::Utc;
use zenposture_monitor_runtime::session::SESSION_SCHEMA_VERSION;
use zenposture_monitor_runtime::{
    MonitorRuntime, RecordedFrameSource, RuntimeConfig, SessionWriter,
};
use zenposture_pose_model::sample::SessionLogHeader;

use super::{format_ts, ConsoleObserver, MonitorArgs};

pub fn run(
    frames: PathBuf,
    args: MonitorArgs,
    session_log: Option<PathBuf>,
    append: bool,
    alerts_only: bool,
) -> anyhow::Result<()> {
    let config = args.resolve_config()?;
    let monitor = args.build_monitor(&config)?;
    let source = RecordedFrameSource::from_path(&frames)
        .map_err(|e| anyhow::anyhow!("Failed to load frames: {e}"))?;
    let frame_count = source.len();
    let runtime_config = RuntimeConfig::from(&config.monitor);
    let epoch_wall = Utc::now();

    println!("Replaying {} ({frame_count} frames)", frames.display());
    println!("  Strategy: {:?}", monitor.strategy());
    println!(
        "  Threshold: {} (cooldown {}s)",
        config.monitor.alert_threshold, config.monitor.alert_cooldown_secs
    );
    println!();

    let mut runtime = MonitorRuntime::new(monitor, Box::new(source), runtime_config, epoch_wall)
        .with_observer(Box::new(ConsoleObserver {
            show_samples: !alerts_only,
        }));

    if let Some(path) = &session_log {
        let header = SessionLogHeader {
            schema_version: SESSION_SCHEMA_VERSION.to_string(),
            epoch_wall,
            publish_interval_secs: runtime_config.publish_interval.as_secs(),
        };
        let writer = if append {
            SessionWriter::append(path.clone(), header)
        } else {
            SessionWriter::create(path.clone(), header)
        }
        .map_err(|e| anyhow::anyhow!("Failed to open session log: {e}"))?;
        runtime = runtime.with_session_writer(writer);
    }

    let stats = runtime
        .run_simulated(None)
        .map_err(|e| anyhow::anyhow!("Replay failed: {e}"))?;
    let counters = runtime.monitor().counters();

    println!();
    println!("Summary:");
    println!("  Frames: {} ({} scored, {} held)", stats.frames, stats.scored, stats.held);
    println!("  Model fallbacks: {}", counters.fallbacks);
    println!("  Alerts: {}", stats.alerts);
    println!("  Final smoothed score: {}", runtime.monitor().current_score());
    if let Some(sample) = runtime.monitor().latest_sample() {
        println!("  Last scored at: {}", format_ts(sample.timestamp_ns));
    }
    if let Some(path) = session_log {
        println!("  Session log: {} ({} records)", path.display(), stats.published);
    }

    Ok(())
}

//! Run the monitor in real time.

use std::path::PathBuf;
use std::sync::atomic::Ordering;

use zenposture_common::clock::MonitorClock;
use zenposture_monitor_runtime::session::{session_file_name, SESSION_SCHEMA_VERSION};
use zenposture_monitor_runtime::{
    LogNotifier, MonitorRuntime, RecordedFrameSource, RuntimeConfig, SessionWriter,
};
use zenposture_pose_model::sample::SessionLogHeader;

use super::{ConsoleObserver, MonitorArgs};

pub async fn run(frames: PathBuf, args: MonitorArgs, write_log: bool) -> anyhow::Result<()> {
    let config = args.resolve_config()?;
    let monitor = args.build_monitor(&config)?;
    let source = RecordedFrameSource::from_path(&frames)
        .map_err(|e| anyhow::anyhow!("Failed to load frames: {e}"))?;
    let runtime_config = RuntimeConfig::from(&config.monitor);
    let clock = MonitorClock::start();

    let mut runtime = MonitorRuntime::new(
        monitor,
        Box::new(source),
        runtime_config,
        clock.epoch_wall(),
    )
    .with_observer(Box::new(ConsoleObserver { show_samples: true }))
    .with_observer(Box::new(LogNotifier));

    let log_path = write_log.then(|| config.session_dir.join(session_file_name(clock.epoch_wall())));
    if let Some(path) = &log_path {
        let header = SessionLogHeader {
            schema_version: SESSION_SCHEMA_VERSION.to_string(),
            epoch_wall: clock.epoch_wall(),
            publish_interval_secs: runtime_config.publish_interval.as_secs(),
        };
        let writer = SessionWriter::create(path.clone(), header)
            .map_err(|e| anyhow::anyhow!("Failed to create session log: {e}"))?;
        runtime = runtime.with_session_writer(writer);
    }

    println!("Watching {} (Ctrl+C to stop)", frames.display());
    println!();

    let stop = runtime.stop_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stop.store(true, Ordering::SeqCst);
        }
    });

    let stats = runtime
        .run(&clock)
        .await
        .map_err(|e| anyhow::anyhow!("Monitor failed: {e}"))?;

    println!();
    println!(
        "Stopped after {:.1}s: {} scored, {} held, {} alerts",
        clock.elapsed_secs(),
        stats.scored,
        stats.held,
        stats.alerts
    );
    if let Some(path) = log_path {
        println!("Session log: {}", path.display());
    }

    Ok(())
}

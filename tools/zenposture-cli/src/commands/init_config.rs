//! Write the default configuration file.

use std::path::PathBuf;

use zenposture_common::config::{config_file_path, AppConfig};

pub fn run(output: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let path = output.unwrap_or_else(config_file_path);
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    let config = AppConfig::default();
    config
        .save_to(&path)
        .map_err(|e| anyhow::anyhow!("Failed to write config: {e}"))?;

    println!("Configuration written to {}", path.display());
    println!("  Session logs: {}", config.session_dir.display());
    println!(
        "  Alert threshold: {} (cooldown {}s)",
        config.monitor.alert_threshold, config.monitor.alert_cooldown_secs
    );
    println!(
        "  Exercise reminders: below {} every {}s",
        config.monitor.reminder_threshold, config.monitor.reminder_cooldown_secs
    );

    Ok(())
}

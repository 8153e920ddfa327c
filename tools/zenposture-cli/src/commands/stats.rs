//! Daily posture statistics from session logs.

use std::path::PathBuf;

use chrono::NaiveDate;
use zenposture_monitor_runtime::{read_session_records, DailyStats};

pub fn run(path: PathBuf, date: Option<NaiveDate>, json: bool) -> anyhow::Result<()> {
    let records = read_session_records(&path)
        .map_err(|e| anyhow::anyhow!("Failed to read session logs: {e}"))?;

    let days = match date {
        Some(date) => vec![DailyStats::for_day(&records, date)],
        None => DailyStats::by_day(&records),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&days)?);
        return Ok(());
    }

    if days.is_empty() {
        println!("No session records in {}", path.display());
        return Ok(());
    }

    println!("{:<12} {:>9} {:>12} {:>9}", "Date", "Average", "Monitored", "Records");
    for day in &days {
        println!(
            "{:<12} {:>9.1} {:>12} {:>9}",
            day.date.to_string(),
            day.average_posture_score,
            format_duration(day.total_posture_secs),
            day.sessions_count
        );
    }

    Ok(())
}

fn format_duration(secs: f64) -> String {
    let total = secs.round() as u64;
    format!("{}h {:02}m {:02}s", total / 3600, (total % 3600) / 60, total % 60)
}
